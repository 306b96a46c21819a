//! Text styling shared by the overlay store and the materializer
//!
//! The editor offers three font families. On the wire each family travels
//! under the name of the standard PDF font it embeds as, and the bold flag
//! picks the bold face of that family.

use serde::{Deserialize, Serialize};

/// Default point size for newly placed text.
pub const DEFAULT_TEXT_SIZE: f64 = 16.0;

/// Smallest size a text element can be shrunk to.
pub const MIN_TEXT_SIZE: f64 = 10.0;

/// Default text color for newly placed text.
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

/// Font families offered by the editor.
///
/// Serialized as `Helvetica`, `TimesRoman` and `Courier`. Any other name
/// deserializes to [`FontFamily::Sans`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [FontFamily::Sans, FontFamily::Serif, FontFamily::Mono];

    /// Resolve a wire name, falling back to Sans for anything unrecognized.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "TimesRoman" => FontFamily::Serif,
            "Courier" => FontFamily::Mono,
            _ => FontFamily::Sans,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            FontFamily::Sans => "Helvetica",
            FontFamily::Serif => "TimesRoman",
            FontFamily::Mono => "Courier",
        }
    }

    /// Label shown in the editor UI.
    pub fn label(self) -> &'static str {
        match self {
            FontFamily::Sans => "Sans",
            FontFamily::Serif => "Serif",
            FontFamily::Mono => "Mono",
        }
    }

    /// PDF standard 14 font name for this family.
    pub fn base_font(self, bold: bool) -> &'static str {
        match (self, bold) {
            (FontFamily::Sans, false) => "Helvetica",
            (FontFamily::Sans, true) => "Helvetica-Bold",
            (FontFamily::Serif, false) => "Times-Roman",
            (FontFamily::Serif, true) => "Times-Bold",
            (FontFamily::Mono, false) => "Courier",
            (FontFamily::Mono, true) => "Courier-Bold",
        }
    }
}

impl From<String> for FontFamily {
    fn from(name: String) -> Self {
        FontFamily::from_wire(&name)
    }
}

impl From<FontFamily> for String {
    fn from(family: FontFamily) -> Self {
        family.wire_name().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub font: FontFamily,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: DEFAULT_TEXT_SIZE,
            color: DEFAULT_TEXT_COLOR.to_string(),
            bold: false,
            font: FontFamily::Sans,
        }
    }
}

impl TextStyle {
    pub fn pdf_font_name(&self) -> &'static str {
        self.font.base_font(self.bold)
    }
}

/// Partial update for a text element's style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylePatch {
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub font: Option<FontFamily>,
    #[serde(default)]
    pub color: Option<String>,
}

impl StylePatch {
    pub fn size(size: f64) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.bold.is_none() && self.font.is_none() && self.color.is_none()
    }

    /// Apply the patch. Shrinking stops at [`MIN_TEXT_SIZE`]; growing is unbounded.
    pub fn apply_to(&self, style: &mut TextStyle) {
        if let Some(size) = self.size.filter(|size| size.is_finite()) {
            style.size = if size < style.size {
                size.max(MIN_TEXT_SIZE)
            } else {
                size
            };
        }
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(font) = self.font {
            style.font = font;
        }
        if let Some(color) = &self.color {
            style.color = color.clone();
        }
    }
}

/// Parse a hex color ("#ff0000" or "ff0000") into RGB components in 0..=1.
///
/// Best effort: a channel that is not valid hex reads as 0 and anything
/// shorter than six digits is black.
pub fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .map_or(0.0, |value| f32::from(value) / 255.0)
    };
    if hex.len() >= 6 {
        (channel(0..2), channel(2..4), channel(4..6))
    } else {
        (0.0, 0.0, 0.0)
    }
}
