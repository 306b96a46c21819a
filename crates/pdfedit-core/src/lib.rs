//! PDF overlay editing
//!
//! An [`OverlayStore`] collects the text, highlight and image annotations a
//! user places on a rendered document. On save it becomes an
//! [`OverlayRequest`], which [`materialize`] draws onto the document's pages
//! in a fixed order: text, then highlights, then images.
//!
//! Merge and range split round out the page operations the service offers.

pub mod embed;
pub mod error;
pub mod materialize;
pub mod merge;
pub mod overlay;
pub mod page;
pub mod split;
pub mod style;
pub mod wire;

#[cfg(test)]
mod fixtures;

pub use error::PdfEditError;
pub use materialize::{materialize, materialize_with_summary, DrawSummary};
pub use merge::merge_documents;
pub use overlay::{ElementId, ImageAnchor, OverlayElement, OverlayStore};
pub use split::{parse_page_range, split_range};
pub use style::{FontFamily, StylePatch, TextStyle};
pub use wire::{ElementRecord, HighlightRecord, ImageRecord, OverlayRequest, TextRecord};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfEditError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_page_count() {
        assert_eq!(get_page_count(&fixtures::create_test_pdf(4)).unwrap(), 4);
        assert!(matches!(
            get_page_count(b"%PDF-"),
            Err(PdfEditError::ParseError(_))
        ));
    }

    #[test]
    fn test_store_to_materialized_document() {
        let mut store = OverlayStore::new();
        let id = store.place_text(1, 50.0, 100.0);
        assert!(store.set_text(id, "Signed"));
        store.place_highlight(1, 0.0, 0.0, 200.0, 50.0);
        store.place_text(7, 0.0, 0.0);

        let request = store.into_request();
        let (bytes, summary) =
            materialize_with_summary(&fixtures::create_test_pdf(2), &request).unwrap();
        assert_eq!(summary.texts, 1);
        assert_eq!(summary.highlights, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(get_page_count(&bytes).unwrap(), 2);
    }
}
