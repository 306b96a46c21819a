//! Records exchanged between the overlay store and the materializer
//!
//! A save request carries three JSON arrays, `texts`, `highlights` and
//! `images`. Element ids never cross this boundary; the materializer works
//! purely from array position and the declared page.

use serde::{Deserialize, Serialize};

use crate::error::PdfEditError;
use crate::style::FontFamily;

/// Point size used when a text record omits `size` or sends 0.
pub const WIRE_DEFAULT_TEXT_SIZE: f64 = 14.0;

/// Color used when a text record omits `color` or sends an empty string.
pub const WIRE_DEFAULT_TEXT_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRecord {
    pub page: i64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontFamily>,
}

impl TextRecord {
    pub fn font_size(&self) -> f64 {
        self.size
            .filter(|size| *size != 0.0 && !size.is_nan())
            .unwrap_or(WIRE_DEFAULT_TEXT_SIZE)
    }

    pub fn color(&self) -> &str {
        self.color
            .as_deref()
            .filter(|color| !color.is_empty())
            .unwrap_or(WIRE_DEFAULT_TEXT_COLOR)
    }

    /// Standard font to draw with. Unknown or missing families are Helvetica.
    pub fn base_font(&self) -> &'static str {
        self.font
            .unwrap_or_default()
            .base_font(self.bold.unwrap_or(false))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightRecord {
    pub page: i64,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRecord {
    pub page: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Data URI, e.g. `data:image/png;base64,...`
    pub src: String,
}

// `page` is a signed integer on the wire. Pages below 1 are out of range like
// any other missing page, so they must survive parsing.

/// One flattened element, tagged with its variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ElementRecord {
    Text(TextRecord),
    Highlight(HighlightRecord),
    Image(ImageRecord),
}

impl ElementRecord {
    pub fn page(&self) -> i64 {
        match self {
            ElementRecord::Text(r) => r.page,
            ElementRecord::Highlight(r) => r.page,
            ElementRecord::Image(r) => r.page,
        }
    }
}

/// The three overlay groups sent alongside the original document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverlayRequest {
    #[serde(default)]
    pub texts: Vec<TextRecord>,
    #[serde(default)]
    pub highlights: Vec<HighlightRecord>,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

impl OverlayRequest {
    /// Parse the three JSON form fields. Missing or blank fields are empty
    /// lists; anything that is not a JSON array of records is an error.
    pub fn from_parts(
        texts: Option<&str>,
        highlights: Option<&str>,
        images: Option<&str>,
    ) -> Result<Self, PdfEditError> {
        Ok(Self {
            texts: parse_field("texts", texts)?,
            highlights: parse_field("highlights", highlights)?,
            images: parse_field("images", images)?,
        })
    }

    /// Split an ordered element list into the three groups, keeping the
    /// relative order inside each group.
    pub fn from_records(records: impl IntoIterator<Item = ElementRecord>) -> Self {
        let mut request = Self::default();
        for record in records {
            match record {
                ElementRecord::Text(r) => request.texts.push(r),
                ElementRecord::Highlight(r) => request.highlights.push(r),
                ElementRecord::Image(r) => request.images.push(r),
            }
        }
        request
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.highlights.is_empty() && self.images.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.texts.len() + self.highlights.len() + self.images.len()
    }

    /// Encode as the `(name, json)` form fields a save request carries.
    pub fn to_form_fields(&self) -> Result<[(&'static str, String); 3], PdfEditError> {
        let encode = |value: Result<String, serde_json::Error>| {
            value.map_err(|e| PdfEditError::InvalidPayload(e.to_string()))
        };
        Ok([
            ("texts", encode(serde_json::to_string(&self.texts))?),
            ("highlights", encode(serde_json::to_string(&self.highlights))?),
            ("images", encode(serde_json::to_string(&self.images))?),
        ])
    }
}

fn parse_field<T: serde::de::DeserializeOwned>(
    name: &str,
    raw: Option<&str>,
) -> Result<Vec<T>, PdfEditError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| PdfEditError::InvalidPayload(format!("{}: {}", name, e))),
    }
}
