use std::{collections::HashMap, sync::Arc, sync::mpsc as std_mpsc};

use chatpane_client::{
    bridge::{BridgeController, UiEvent, bridge},
    config::{ClientConfig, config_path, save_config_with_retry},
    runtime::run_client_runtime,
    ui_state::{
        MIN_WINDOW_H, MIN_WINDOW_W, SavedUiState, WindowPlacement, clamp_placement_in_rect,
        save_ui_state_with_retry,
    },
};
use chatpane_core::{
    ChatSurface, CoreError, EMOJI_PALETTE, ScaledImage, TranscriptEntry, emoji::EMOJI_GRID_COLUMNS,
};
use eframe::egui::{self, Color32, Key, Modifiers, RichText, TextureHandle, Vec2};
use tokio::runtime::Runtime;
use tracing::{info, warn};

pub const WINDOW_TITLE: &str = "Client Chat";

const BUTTON_SIZE: Vec2 = Vec2::new(60.0, 35.0);
const EMOJI_BUTTON_FILL: Color32 = Color32::from_rgb(255, 255, 0);
const IMAGE_BUTTON_FILL: Color32 = Color32::from_rgb(255, 175, 175);
const RECORD_BUTTON_FILL: Color32 = Color32::from_rgb(0, 100, 0);
const SEND_BUTTON_FILL: Color32 = Color32::from_rgb(0, 122, 255);
const MONITOR_MARGIN: f32 = 16.0;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

pub struct ChatApp {
    runtime: Option<Runtime>,
    surface: ChatSurface<BridgeController>,
    events: std_mpsc::Receiver<UiEvent>,
    config: ClientConfig,
    persist_config: bool,
    username_input: String,
    connection_status: String,
    emoji_picker_open: bool,
    /// Keyed by transcript index; entries never move once appended.
    textures: HashMap<usize, TextureHandle>,
    placement: Option<WindowPlacement>,
    placement_checked: bool,
}

impl ChatApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ClientConfig,
        runtime: Runtime,
        placement: Option<WindowPlacement>,
        persist_config: bool,
    ) -> Self {
        let egui_ctx = cc.egui_ctx.clone();
        let ends = bridge(Some(Arc::new(move || egui_ctx.request_repaint())));

        runtime.spawn(run_client_runtime(
            config.server_url.clone(),
            ends.commands,
            ends.events_tx,
        ));

        let mut app = Self {
            runtime: Some(runtime),
            surface: ChatSurface::new(ends.controller),
            events: ends.events,
            username_input: config.username.clone().unwrap_or_default(),
            config,
            persist_config,
            connection_status: "Not connected".to_owned(),
            emoji_picker_open: false,
            textures: HashMap::new(),
            placement,
            placement_checked: placement.is_none(),
        };

        if app.config.username.is_some() {
            app.join();
        }
        app
    }

    /// Enter in the username field. Blank names are ignored.
    fn join(&mut self) {
        let username = self.username_input.trim().to_owned();
        match self.surface.connect(&username) {
            Ok(()) => self.username_input = username,
            Err(CoreError::EmptyUsername) => {}
            Err(err) => warn!("join rejected: {err}"),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                UiEvent::ConnectionStatus(status) => self.connection_status = status,
                UiEvent::TextReceived { sender, body } => {
                    self.surface.on_text_received(&sender, &body);
                }
                UiEvent::ImageReceived { sender, bytes } => {
                    self.surface.on_image_received(&sender, bytes);
                }
                UiEvent::RuntimeError(message) => {
                    self.connection_status = format!("Error: {message}");
                    self.surface
                        .transcript_mut()
                        .append_text(format!("Error: {message}"));
                }
            }
        }
    }

    /// Pull a restored window back on screen once the monitor size is known.
    fn check_placement(&mut self, ctx: &egui::Context) {
        if self.placement_checked {
            return;
        }
        let Some(monitor) = ctx.input(|i| i.viewport().monitor_size) else {
            return;
        };
        self.placement_checked = true;

        let Some(saved) = self.placement else {
            return;
        };
        let clamped = clamp_placement_in_rect(
            saved,
            MIN_WINDOW_W,
            MIN_WINDOW_H,
            MONITOR_MARGIN,
            [0.0, 0.0, monitor.x, monitor.y],
        );
        if clamped != saved {
            info!(?saved, ?clamped, "moving window back on screen");
            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(
                clamped.x, clamped.y,
            )));
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                clamped.w, clamped.h,
            )));
            self.placement = Some(clamped);
        }
    }

    fn track_placement(&mut self, ctx: &egui::Context) {
        let rects = ctx.input(|i| (i.viewport().outer_rect, i.viewport().inner_rect));
        if let (Some(outer), Some(inner)) = rects {
            self.placement = Some(WindowPlacement {
                x: outer.min.x,
                y: outer.min.y,
                w: inner.width(),
                h: inner.height(),
            });
        }
    }

    fn pick_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Choose an image")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        let receiver = self.config.receiver.clone();
        self.surface.submit_image_file(&path, &receiver);
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("chat_header")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Your Username:");
                let editable = self.surface.session().is_editable();
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.username_input)
                        .interactive(editable)
                        .desired_width(f32::INFINITY),
                );
                if editable
                    && response.lost_focus()
                    && ui.input(|i| i.key_pressed(Key::Enter))
                {
                    self.join();
                }
                ui.end_row();

                ui.label("Receiver Username:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.config.receiver)
                        .desired_width(f32::INFINITY),
                );
                ui.end_row();
            });
        ui.label(RichText::new(&self.connection_status).small().weak());
    }

    fn show_compose(&mut self, ui: &mut egui::Ui) {
        let send_shortcut = ui.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Enter));
        let receiver = self.config.receiver.clone();

        ui.horizontal(|ui| {
            let buttons_width = BUTTON_SIZE.x * 4.0 + ui.spacing().item_spacing.x * 4.0;
            ui.add(
                egui::TextEdit::multiline(self.surface.compose_mut().buffer_mut())
                    .desired_rows(3)
                    .desired_width((ui.available_width() - buttons_width).max(120.0))
                    .hint_text("Type a message (Ctrl+Enter to send)"),
            );

            if colored_button(ui, "😊", EMOJI_BUTTON_FILL, Color32::BLACK).clicked() {
                self.emoji_picker_open = !self.emoji_picker_open;
            }
            if colored_button(ui, "📷", IMAGE_BUTTON_FILL, Color32::BLACK).clicked() {
                self.pick_image();
            }
            if colored_button(ui, "🎙", RECORD_BUTTON_FILL, Color32::WHITE).clicked() {
                self.surface.submit_audio(&receiver);
            }
            if colored_button(ui, "➤", SEND_BUTTON_FILL, Color32::WHITE).clicked() || send_shortcut
            {
                self.surface.submit_text(&receiver);
            }
        });
    }

    fn show_emoji_picker(&mut self, ctx: &egui::Context) {
        if !self.emoji_picker_open {
            return;
        }

        let mut open = true;
        let mut chosen = None;
        egui::Window::new("Emoji")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("emoji_grid").show(ui, |ui| {
                    for (index, glyph) in EMOJI_PALETTE.iter().enumerate() {
                        if ui.button(RichText::new(*glyph).size(20.0)).clicked() {
                            chosen = Some(*glyph);
                        }
                        if (index + 1) % EMOJI_GRID_COLUMNS == 0 {
                            ui.end_row();
                        }
                    }
                });
            });

        if let Some(glyph) = chosen {
            if let Err(err) = self.surface.insert_emoji(glyph) {
                warn!("emoji insert failed: {err}");
            }
            open = false;
        }
        self.emoji_picker_open = open;
    }

    fn show_transcript(&mut self, ui: &mut egui::Ui) {
        let scroll_to_end = self.surface.transcript_mut().take_scroll_request();
        let entries = self.surface.transcript().entries();
        let textures = &mut self.textures;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for (index, entry) in entries.iter().enumerate() {
                    match entry {
                        TranscriptEntry::Text {
                            sender: Some(sender),
                            body,
                        } => {
                            ui.label(format!("{sender}: {body}"));
                        }
                        TranscriptEntry::Text { sender: None, body } => {
                            ui.colored_label(ui.visuals().warn_fg_color, body);
                        }
                        TranscriptEntry::Image { sender, image } => {
                            let texture = transcript_texture(ui.ctx(), textures, index, image);
                            ui.horizontal(|ui| {
                                ui.label(format!("{sender}: "));
                                ui.image(egui::load::SizedTexture::from_handle(texture));
                            });
                        }
                    }
                    ui.add_space(8.0);
                }

                if scroll_to_end {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.check_placement(ctx);
        self.track_placement(ctx);

        egui::TopBottomPanel::top("header_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_header(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("compose_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_compose(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_transcript(ui);
        });

        self.show_emoji_picker(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let state = SavedUiState {
            window: self.placement,
        };
        if let Err(err) = save_ui_state_with_retry(&state) {
            warn!("failed to save window placement: {}", err);
        }

        if self.persist_config {
            if let Err(err) = save_config_with_retry(&config_path(), &self.config.to_saved()) {
                warn!("failed to save config: {}", err);
            }
        }

        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        info!("chat window closed");
    }
}

fn colored_button(ui: &mut egui::Ui, glyph: &str, fill: Color32, text: Color32) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(glyph).size(18.0).color(text))
            .fill(fill)
            .min_size(BUTTON_SIZE),
    )
}

fn transcript_texture<'a>(
    ctx: &egui::Context,
    textures: &'a mut HashMap<usize, TextureHandle>,
    index: usize,
    image: &ScaledImage,
) -> &'a TextureHandle {
    textures.entry(index).or_insert_with(|| {
        ctx.load_texture(
            format!("transcript-image-{index}"),
            egui::ColorImage::from_rgba_unmultiplied(image.size(), &image.rgba),
            egui::TextureOptions::LINEAR,
        )
    })
}
