//! Declarative table styling.
//!
//! The renderer never decides colors or fonts on its own: everything it
//! paints comes from a [`TableStyle`], which can be loaded from the
//! `[render]` section of the configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// `rgb(r,g,b)` for SVG paint attributes.
    pub fn svg_rgb(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Opacity in `0.0..=1.0` for SVG `*-opacity` attributes.
    pub fn opacity(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("invalid color '{}', expected #RRGGBB or #RRGGBBAA", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Which way the result grid is laid out in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// One row per metric, one column per channel.
    #[default]
    MetricsByRow,
    /// One row per channel, one column per metric.
    ChannelsByRow,
}

/// Row parity selector for data-row rules. Indices are zero-based and do
/// not count the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn matches(&self, index: usize) -> bool {
        match self {
            Parity::Even => index % 2 == 0,
            Parity::Odd => index % 2 == 1,
        }
    }
}

/// Header row appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderStyle {
    #[serde(default = "default_header_background")]
    pub background: Color,

    #[serde(default = "default_header_text")]
    pub text_color: Color,

    #[serde(default = "default_true")]
    pub bold: bool,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            background: default_header_background(),
            text_color: default_header_text(),
            bold: true,
        }
    }
}

fn default_header_background() -> Color {
    Color::BLACK
}

fn default_header_text() -> Color {
    Color::WHITE
}

fn default_true() -> bool {
    true
}

/// Style applied to data rows whose index matches `parity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRule {
    pub parity: Parity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Color>,
}

/// Effective style of one data row after applying the rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowStyle {
    /// `None` keeps the page background.
    pub background: Option<Color>,
    pub text_color: Color,
}

/// Complete rendering style for the statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    /// Output resolution, also written into the PNG `pHYs` chunk.
    #[serde(default = "default_dpi")]
    pub dpi: f32,

    /// Font size in points, shared by header and data rows.
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// CSS font-family list.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Extra directories to load fonts from, on top of the system fonts.
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub orientation: Orientation,

    /// Margin around the table in points.
    #[serde(default = "default_margin")]
    pub margin: f32,

    /// Horizontal padding inside each cell in points.
    #[serde(default = "default_cell_padding")]
    pub cell_padding: f32,

    /// Row height as a multiple of the font size.
    #[serde(default = "default_row_height")]
    pub row_height: f32,

    #[serde(default = "default_page_background")]
    pub page_background: Color,

    #[serde(default = "default_text_color")]
    pub text_color: Color,

    #[serde(default = "default_border_color")]
    pub border_color: Color,

    /// Border stroke width in points.
    #[serde(default = "default_border_width")]
    pub border_width: f32,

    #[serde(default)]
    pub header: HeaderStyle,

    /// Data-row rules; the first matching rule wins.
    #[serde(default = "default_row_rules")]
    pub rows: Vec<RowRule>,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            font_dirs: Vec::new(),
            orientation: Orientation::default(),
            margin: default_margin(),
            cell_padding: default_cell_padding(),
            row_height: default_row_height(),
            page_background: default_page_background(),
            text_color: default_text_color(),
            border_color: default_border_color(),
            border_width: default_border_width(),
            header: HeaderStyle::default(),
            rows: default_row_rules(),
        }
    }
}

fn default_dpi() -> f32 {
    300.0
}

fn default_font_size() -> f32 {
    16.0
}

fn default_font_family() -> String {
    "DejaVu Sans, Arial, Helvetica, sans-serif".to_string()
}

fn default_margin() -> f32 {
    7.2 // 0.1 inch
}

fn default_cell_padding() -> f32 {
    8.0
}

fn default_row_height() -> f32 {
    1.9
}

fn default_page_background() -> Color {
    Color::WHITE
}

fn default_text_color() -> Color {
    Color::BLACK
}

fn default_border_color() -> Color {
    Color::BLACK
}

fn default_border_width() -> f32 {
    1.0
}

fn default_row_rules() -> Vec<RowRule> {
    vec![RowRule {
        parity: Parity::Even,
        // 204,0,0 at 30% opacity
        background: Some(Color::rgba(204, 0, 0, 77)),
        text_color: None,
    }]
}

impl TableStyle {
    /// Resolve the style of the data row at `index`.
    pub fn row_style(&self, index: usize) -> RowStyle {
        let rule = self.rows.iter().find(|r| r.parity.matches(index));
        RowStyle {
            background: rule.and_then(|r| r.background),
            text_color: rule.and_then(|r| r.text_color).unwrap_or(self.text_color),
        }
    }

    /// Device pixels per point.
    pub fn scale(&self) -> f32 {
        self.dpi / 72.0
    }

    /// First family of the font-family list, used as the rasterizer default.
    pub fn primary_family(&self) -> &str {
        self.font_family
            .split(',')
            .map(str::trim)
            .find(|f| !f.is_empty())
            .unwrap_or("sans-serif")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#000000"), Some(Color::BLACK));
        assert_eq!(Color::parse("#CC00004D"), Some(Color::rgba(204, 0, 0, 77)));
        assert_eq!(Color::parse("cc0000"), None);
        assert_eq!(Color::parse("#CC00"), None);
        assert_eq!(Color::parse("#GG0000"), None);
        assert_eq!(Color::rgba(204, 0, 0, 77).to_string(), "#CC00004D");
    }

    #[test]
    fn test_default_row_rules_stripe_even_rows() {
        let style = TableStyle::default();
        let stripe = style.row_style(0);
        assert_eq!(stripe.background, Some(Color::rgba(204, 0, 0, 77)));
        assert_eq!(stripe.text_color, Color::BLACK);

        assert_eq!(style.row_style(1).background, None);
        assert_eq!(style.row_style(2).background, stripe.background);
        assert_eq!(style.row_style(5).background, None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut style = TableStyle::default();
        style.rows.insert(
            0,
            RowRule {
                parity: Parity::Even,
                background: Some(Color::WHITE),
                text_color: Some(Color::rgb(10, 20, 30)),
            },
        );
        let row = style.row_style(4);
        assert_eq!(row.background, Some(Color::WHITE));
        assert_eq!(row.text_color, Color::rgb(10, 20, 30));
    }

    #[test]
    fn test_parse_style_from_toml() {
        let toml_content = r##"
dpi = 150.0
orientation = "channels-by-row"

[header]
background = "#112233"

[[rows]]
parity = "odd"
background = "#00FF0080"
"##;
        let style: TableStyle = toml::from_str(toml_content).unwrap();
        assert_eq!(style.dpi, 150.0);
        assert_eq!(style.font_size, 16.0);
        assert_eq!(style.orientation, Orientation::ChannelsByRow);
        assert_eq!(style.header.background, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(style.header.text_color, Color::WHITE);
        assert!(style.header.bold);
        assert_eq!(style.row_style(0).background, None);
        assert_eq!(style.row_style(1).background, Some(Color::rgba(0, 255, 0, 128)));
    }

    #[test]
    fn test_invalid_color_in_toml_is_rejected() {
        let result: Result<TableStyle, _> = toml::from_str("[header]\nbackground = \"black\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_primary_family_and_scale() {
        let style = TableStyle::default();
        assert_eq!(style.primary_family(), "DejaVu Sans");
        assert!((style.scale() - 300.0 / 72.0).abs() < f32::EPSILON);
    }
}
