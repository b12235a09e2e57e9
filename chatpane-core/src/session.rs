use crate::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected {
        username: String,
    },
}

/// One-shot join: the first non-empty username is accepted and the field is
/// locked for the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    state: SessionState,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connected { username } => Some(username),
            SessionState::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    /// Whether the username field still accepts edits.
    pub fn is_editable(&self) -> bool {
        !self.is_connected()
    }

    pub fn connect(&mut self, username: &str) -> Result<&str, CoreError> {
        if let SessionState::Connected { username: current } = &self.state {
            return Err(CoreError::AlreadyConnected(current.clone()));
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::EmptyUsername);
        }

        self.state = SessionState::Connected {
            username: username.to_owned(),
        };
        Ok(self.username().unwrap_or_default())
    }
}
