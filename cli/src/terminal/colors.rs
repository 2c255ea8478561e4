use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 137, g: 180, b: 250 };
pub const ACCENT: Color = Color::TrueColor { r: 249, g: 226, b: 175 };
pub const SEPARATOR: Color = Color::TrueColor { r: 108, g: 112, b: 134 };
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 205, g: 214, b: 244 };
pub const PORT: Color = Color::TrueColor { r: 250, g: 179, b: 135 };
pub const SERVICE: Color = Color::TrueColor { r: 203, g: 166, b: 247 };
pub const ERROR: Color = Color::TrueColor { r: 243, g: 139, b: 168 };
