/// Glyphs offered by the emoji picker, laid out row by row.
pub const EMOJI_PALETTE: [&str; 40] = [
    "😀", "😁", "😂", "🤣", "😃", "😄", "😅", "😆", "😉", "😊", //
    "😋", "😎", "😍", "😘", "🥰", "😗", "😙", "😚", "🙂", "🤗", //
    "🤩", "🤔", "🤨", "😐", "😑", "😶", "🙄", "😏", "😣", "😥", //
    "😮", "🤐", "😯", "😪", "😫", "😴", "😌", "😛", "😜", "😝",
];

pub const EMOJI_GRID_COLUMNS: usize = 8;
pub const EMOJI_GRID_ROWS: usize = 5;

pub fn is_palette_emoji(glyph: &str) -> bool {
    EMOJI_PALETTE.contains(&glyph)
}
