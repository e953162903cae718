use ratatui::style::Color;

/// Selection and titles
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(137, 180, 250);
/// Errors and failures
pub const ACCENT_PRIMARY: Color = Color::Rgb(243, 139, 168);
/// Directories and successful results
pub const ACCENT_SECONDARY: Color = Color::Rgb(166, 227, 161);
pub const TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
pub const TEXT_SECONDARY: Color = Color::Rgb(127, 132, 156);
pub const BORDER_COLOR: Color = Color::Rgb(88, 91, 112);
pub const BG_DARK: Color = Color::Rgb(30, 30, 46);
