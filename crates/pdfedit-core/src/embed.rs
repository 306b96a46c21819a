//! Objects the overlay draws with: standard fonts, the highlight graphics
//! state and image XObjects decoded from data URIs.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::{write::ZlibEncoder, Compression};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfEditError;

/// Fill opacity of highlight rectangles.
pub const HIGHLIGHT_OPACITY: f32 = 0.4;

/// Image formats the materializer can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Picks PNG when the data URI header mentions "png", JPEG otherwise.
    /// The image bytes themselves are not inspected.
    pub fn from_header(header: &str) -> Self {
        if header.contains("png") {
            ImageKind::Png
        } else {
            ImageKind::Jpeg
        }
    }
}

/// Split a data URI into its header and decoded payload.
pub fn decode_data_uri(src: &str) -> Result<(&str, Vec<u8>), PdfEditError> {
    let (header, payload) = src
        .split_once(',')
        .ok_or_else(|| PdfEditError::InvalidImage("Missing data URI payload".into()))?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| PdfEditError::InvalidImage(format!("Invalid base64: {}", e)))?;
    Ok((header, bytes))
}

/// An image XObject added to the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Lazily created shared objects for one materialization.
#[derive(Debug, Default)]
pub struct OverlayResources {
    fonts: HashMap<&'static str, ObjectId>,
    highlight_state: Option<ObjectId>,
    image_count: usize,
}

impl OverlayResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name used for a standard font, e.g. `OvFHelveticaBold`.
    pub fn font_name(base_font: &str) -> Vec<u8> {
        format!("OvF{}", base_font.replace('-', "")).into_bytes()
    }

    pub fn highlight_state_name() -> Vec<u8> {
        b"OvGS".to_vec()
    }

    /// Font object for a standard 14 font, created once per document.
    pub fn font(&mut self, doc: &mut Document, base_font: &'static str) -> ObjectId {
        *self.fonts.entry(base_font).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base_font,
                "Encoding" => "WinAnsiEncoding",
            })
        })
    }

    pub fn highlight_state(&mut self, doc: &mut Document) -> ObjectId {
        *self.highlight_state.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(HIGHLIGHT_OPACITY),
                "CA" => Object::Real(HIGHLIGHT_OPACITY),
            })
        })
    }

    /// Decode and embed an image, returning it with a fresh resource name.
    pub fn image(
        &mut self,
        doc: &mut Document,
        src: &str,
    ) -> Result<(Vec<u8>, EmbeddedImage), PdfEditError> {
        let (header, bytes) = decode_data_uri(src)?;
        let embedded = match ImageKind::from_header(header) {
            ImageKind::Png => embed_png(doc, &bytes)?,
            ImageKind::Jpeg => embed_jpeg(doc, bytes)?,
        };
        self.image_count += 1;
        let name = format!("OvIm{}", self.image_count).into_bytes();
        Ok((name, embedded))
    }
}

fn flate(data: &[u8]) -> Result<Vec<u8>, PdfEditError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfEditError::OperationError(format!("Compression failed: {}", e)))
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &'static str,
    data: Vec<u8>,
    filter: &'static str,
) -> Stream {
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => filter,
        },
        data,
    );
    // Already encoded
    stream.allows_compression = false;
    stream
}

fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage, PdfEditError> {
    let invalid = |e: png::DecodingError| PdfEditError::InvalidImage(format!("PNG: {}", e));

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(invalid)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(invalid)?;
    let pixels = &buf[..info.buffer_size()];

    let (color_space, color, alpha) = match info.color_type {
        png::ColorType::Grayscale => ("DeviceGray", pixels.to_vec(), None),
        png::ColorType::Rgb => ("DeviceRGB", pixels.to_vec(), None),
        png::ColorType::GrayscaleAlpha => {
            let (color, alpha) = split_alpha(pixels, 2);
            ("DeviceGray", color, Some(alpha))
        }
        png::ColorType::Rgba => {
            let (color, alpha) = split_alpha(pixels, 4);
            ("DeviceRGB", color, Some(alpha))
        }
        png::ColorType::Indexed => {
            return Err(PdfEditError::InvalidImage(
                "PNG palette was not expanded".into(),
            ))
        }
    };

    let mut stream = image_stream(
        info.width,
        info.height,
        color_space,
        flate(&color)?,
        "FlateDecode",
    );

    // Fully opaque alpha channels are dropped
    if let Some(alpha) = alpha.filter(|a| a.iter().any(|&v| v != u8::MAX)) {
        let mask = image_stream(
            info.width,
            info.height,
            "DeviceGray",
            flate(&alpha)?,
            "FlateDecode",
        );
        let mask_id = doc.add_object(mask);
        stream.dict.set("SMask", Object::Reference(mask_id));
    }

    Ok(EmbeddedImage {
        id: doc.add_object(stream),
        width: info.width,
        height: info.height,
    })
}

fn split_alpha(pixels: &[u8], channels: usize) -> (Vec<u8>, Vec<u8>) {
    let count = pixels.len() / channels;
    let mut color = Vec::with_capacity(count * (channels - 1));
    let mut alpha = Vec::with_capacity(count);
    for pixel in pixels.chunks_exact(channels) {
        color.extend_from_slice(&pixel[..channels - 1]);
        alpha.push(pixel[channels - 1]);
    }
    (color, alpha)
}

/// JPEG data is embedded as-is with DCTDecode; decoding only validates it
/// and reads the dimensions.
fn embed_jpeg(doc: &mut Document, bytes: Vec<u8>) -> Result<EmbeddedImage, PdfEditError> {
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg)
        .map_err(|e| PdfEditError::InvalidImage(format!("JPEG: {}", e)))?;
    let (width, height) = (decoded.width(), decoded.height());
    let color_space = match decoded.color() {
        image::ColorType::L8 | image::ColorType::L16 => "DeviceGray",
        _ => "DeviceRGB",
    };
    let stream = image_stream(width, height, color_space, bytes, "DCTDecode");
    Ok(EmbeddedImage {
        id: doc.add_object(stream),
        width,
        height,
    })
}

/// Encode text for a WinAnsiEncoding standard font.
///
/// Latin-1 maps directly; the handful of typographic characters WinAnsi
/// places in 0x80..0x9F are translated. Anything else becomes `?` and
/// control characters become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            c if c.is_control() => b' ',
            c if (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => c as u8,
            _ => b'?',
        })
        .collect()
}
