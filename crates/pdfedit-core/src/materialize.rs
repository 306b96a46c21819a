//! Overlay materializer
//!
//! Bakes an [`OverlayRequest`] into the page content of a document. Each
//! touched page gets one appended content stream holding, in order, every
//! text element, then every highlight, then every image, so images always
//! sit on top.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat};
use tracing::{debug, info};

use crate::embed::{encode_win_ansi, OverlayResources};
use crate::error::PdfEditError;
use crate::page::{append_content, has_contents, install_resources, page_height, ResourceEntry};
use crate::style::parse_hex_color;
use crate::wire::{HighlightRecord, ImageRecord, OverlayRequest, TextRecord};

/// Highlight fill, yellow.
const HIGHLIGHT_RGB: (f32, f32, f32) = (1.0, 1.0, 0.0);

/// Counts of what a materialization drew and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawSummary {
    pub texts: usize,
    pub highlights: usize,
    pub images: usize,
    pub skipped: usize,
}

/// Operations and resources queued for one page.
#[derive(Debug, Default)]
struct PageCanvas {
    operations: Vec<Operation>,
    resources: Vec<ResourceEntry>,
}

impl PageCanvas {
    fn use_resource(&mut self, category: &'static str, name: Vec<u8>, id: ObjectId) {
        let entry = ResourceEntry { category, name, id };
        if !self.resources.contains(&entry) {
            self.resources.push(entry);
        }
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn name(value: &[u8]) -> Object {
    Object::Name(value.to_vec())
}

/// Point resource operands (`Tf`, `gs`, `Do`) at the names they were
/// installed under.
fn rename_resources(operations: &mut [Operation], renames: &[(Vec<u8>, Vec<u8>)]) {
    for operand in operations.iter_mut().flat_map(|op| op.operands.iter_mut()) {
        if let Object::Name(current) = operand {
            if let Some((_, installed)) = renames.iter().find(|(from, _)| *from == *current) {
                *current = installed.clone();
            }
        }
    }
}

struct Materializer {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    canvases: BTreeMap<u32, PageCanvas>,
    shared: OverlayResources,
    summary: DrawSummary,
}

impl Materializer {
    fn load(pdf_bytes: &[u8]) -> Result<Self, PdfEditError> {
        let doc =
            Document::load_mem(pdf_bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
        let pages = doc.get_pages();
        Ok(Self {
            doc,
            pages,
            canvases: BTreeMap::new(),
            shared: OverlayResources::new(),
            summary: DrawSummary::default(),
        })
    }

    /// Resolve a 1-based page to its number and height, recording a skip
    /// when it does not exist.
    fn target_page(&mut self, kind: &str, page: i64) -> Option<(u32, f64)> {
        let resolved = u32::try_from(page)
            .ok()
            .and_then(|number| Some((number, *self.pages.get(&number)?)));
        match resolved {
            Some((number, page_id)) => Some((number, page_height(&self.doc, page_id))),
            None => {
                debug!(
                    kind,
                    page,
                    page_count = self.pages.len(),
                    "Dropping overlay element on missing page"
                );
                self.summary.skipped += 1;
                None
            }
        }
    }

    fn draw_text(&mut self, text: &TextRecord) {
        let Some((page, height)) = self.target_page("text", text.page) else {
            return;
        };
        let base_font = text.base_font();
        let font_id = self.shared.font(&mut self.doc, base_font);
        let font_name = OverlayResources::font_name(base_font);
        let (r, g, b) = parse_hex_color(text.color());

        let canvas = self.canvases.entry(page).or_default();
        canvas.use_resource("Font", font_name.clone(), font_id);
        canvas.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![name(&font_name), real(text.font_size())]),
            Operation::new("Td", vec![real(text.x), real(height - text.y)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&text.value),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self.summary.texts += 1;
    }

    fn draw_highlight(&mut self, highlight: &HighlightRecord) {
        let Some((page, height)) = self.target_page("highlight", highlight.page) else {
            return;
        };
        let state_id = self.shared.highlight_state(&mut self.doc);
        let state_name = OverlayResources::highlight_state_name();
        let (r, g, b) = HIGHLIGHT_RGB;

        let canvas = self.canvases.entry(page).or_default();
        canvas.use_resource("ExtGState", state_name.clone(), state_id);
        canvas.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("gs", vec![name(&state_name)]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new(
                "re",
                vec![
                    real(highlight.x),
                    real(height - highlight.y - highlight.h),
                    real(highlight.w),
                    real(highlight.h),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        self.summary.highlights += 1;
    }

    fn draw_image(&mut self, image: &ImageRecord) -> Result<(), PdfEditError> {
        let Some((page, height)) = self.target_page("image", image.page) else {
            return Ok(());
        };
        let (xobject_name, embedded) = self.shared.image(&mut self.doc, &image.src)?;

        let canvas = self.canvases.entry(page).or_default();
        canvas.use_resource("XObject", xobject_name.clone(), embedded.id);
        canvas.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(image.width),
                    Object::Integer(0),
                    Object::Integer(0),
                    real(image.height),
                    real(image.x),
                    real(height - image.y - image.height),
                ],
            ),
            Operation::new("Do", vec![name(&xobject_name)]),
            Operation::new("Q", vec![]),
        ]);
        self.summary.images += 1;
        Ok(())
    }

    /// Write every queued canvas into its page.
    fn flush(&mut self) -> Result<(), PdfEditError> {
        for (page, canvas) in std::mem::take(&mut self.canvases) {
            let Some(&page_id) = self.pages.get(&page) else {
                continue;
            };
            let installed = install_resources(&mut self.doc, page_id, &canvas.resources)?;
            let renames: Vec<(Vec<u8>, Vec<u8>)> = canvas
                .resources
                .into_iter()
                .zip(installed)
                .filter(|(entry, name)| entry.name != *name)
                .map(|(entry, name)| (entry.name, name))
                .collect();

            let mut operations = canvas.operations;
            if !renames.is_empty() {
                debug!(page, renamed = renames.len(), "Renamed clashing overlay resources");
                rename_resources(&mut operations, &renames);
            }

            let encoded = Content { operations }
                .encode()
                .map_err(|e| PdfEditError::OperationError(format!("Encode content: {}", e)))?;

            // Existing content may not end in whitespace
            let mut stream = b"\n".to_vec();
            if has_contents(&self.doc, page_id)? {
                stream.extend_from_slice(b"Q\n");
            }
            stream.extend(encoded);
            append_content(&mut self.doc, page_id, stream)?;
        }
        Ok(())
    }

    fn save(mut self) -> Result<Vec<u8>, PdfEditError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfEditError::OperationError(format!("Save failed: {}", e)))?;
        Ok(buffer)
    }
}

/// Draw the overlay onto a copy of the document and return the new bytes.
///
/// Unparsable documents and undecodable images fail the whole call.
/// Elements that name a page the document does not have are dropped.
pub fn materialize(pdf_bytes: &[u8], request: &OverlayRequest) -> Result<Vec<u8>, PdfEditError> {
    materialize_with_summary(pdf_bytes, request).map(|(bytes, _)| bytes)
}

/// Like [`materialize`], also reporting what was drawn.
pub fn materialize_with_summary(
    pdf_bytes: &[u8],
    request: &OverlayRequest,
) -> Result<(Vec<u8>, DrawSummary), PdfEditError> {
    let mut materializer = Materializer::load(pdf_bytes)?;

    for text in &request.texts {
        materializer.draw_text(text);
    }
    for highlight in &request.highlights {
        materializer.draw_highlight(highlight);
    }
    for image in &request.images {
        materializer.draw_image(image)?;
    }

    materializer.flush()?;
    let summary = materializer.summary;
    info!(
        texts = summary.texts,
        highlights = summary.highlights,
        images = summary.images,
        skipped = summary.skipped,
        "Materialized overlay"
    );
    Ok((materializer.save()?, summary))
}
