//! Annotation overlay store
//!
//! Holds the text, image and highlight elements a user has placed on a
//! loaded document. Coordinates are screen-space pixels relative to the
//! rendered page's top-left corner; conversion to page space happens only
//! when the overlay is materialized.

use serde::{Deserialize, Serialize};

use crate::style::{StylePatch, TextStyle};
use crate::wire::{ElementRecord, HighlightRecord, ImageRecord, OverlayRequest, TextRecord};

pub type ElementId = u64;

/// Placeholder content of freshly placed text.
pub const DEFAULT_TEXT_VALUE: &str = "Edit text";

/// Side of the square box a new image starts in.
pub const DEFAULT_IMAGE_SIZE: f64 = 150.0;

/// Where [`OverlayStore::place_image_default`] anchors new images.
pub const DEFAULT_IMAGE_ANCHOR: ImageAnchor = ImageAnchor {
    page: 1,
    x: 120.0,
    y: 120.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageAnchor {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum OverlayElement {
    Text {
        id: ElementId,
        page: u32,
        x: f64,
        y: f64,
        value: String,
        style: TextStyle,
    },
    Image {
        id: ElementId,
        page: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        src: String,
    },
    /// Fixed yellow fill at 40% opacity
    Highlight {
        id: ElementId,
        page: u32,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

impl OverlayElement {
    pub fn id(&self) -> ElementId {
        match self {
            OverlayElement::Text { id, .. } => *id,
            OverlayElement::Image { id, .. } => *id,
            OverlayElement::Highlight { id, .. } => *id,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            OverlayElement::Text { page, .. } => *page,
            OverlayElement::Image { page, .. } => *page,
            OverlayElement::Highlight { page, .. } => *page,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        match self {
            OverlayElement::Text { x, y, .. } => (*x, *y),
            OverlayElement::Image { x, y, .. } => (*x, *y),
            OverlayElement::Highlight { x, y, .. } => (*x, *y),
        }
    }

    fn set_position(&mut self, new_x: f64, new_y: f64) {
        let (x, y) = match self {
            OverlayElement::Text { x, y, .. } => (x, y),
            OverlayElement::Image { x, y, .. } => (x, y),
            OverlayElement::Highlight { x, y, .. } => (x, y),
        };
        *x = new_x;
        *y = new_y;
    }

    /// Flatten into the wire record for this variant.
    pub fn to_record(&self) -> ElementRecord {
        match self {
            OverlayElement::Text {
                page,
                x,
                y,
                value,
                style,
                ..
            } => ElementRecord::Text(TextRecord {
                page: i64::from(*page),
                x: *x,
                y: *y,
                value: value.clone(),
                size: Some(style.size),
                color: Some(style.color.clone()),
                bold: Some(style.bold),
                font: Some(style.font),
            }),
            OverlayElement::Image {
                page,
                x,
                y,
                width,
                height,
                src,
                ..
            } => ElementRecord::Image(ImageRecord {
                page: i64::from(*page),
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                src: src.clone(),
            }),
            OverlayElement::Highlight {
                page, x, y, w, h, ..
            } => ElementRecord::Highlight(HighlightRecord {
                page: i64::from(*page),
                x: *x,
                y: *y,
                w: *w,
                h: *h,
            }),
        }
    }
}

/// Ordered collection of overlay elements for one loaded document.
///
/// Insertion order is draw order within each element group. Ids are handed
/// out from a counter and never reused, even after removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayStore {
    next_id: ElementId,
    elements: Vec<OverlayElement>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a text element with default styling.
    pub fn place_text(&mut self, page: u32, x: f64, y: f64) -> ElementId {
        let id = self.allocate_id();
        self.elements.push(OverlayElement::Text {
            id,
            page,
            x,
            y,
            value: DEFAULT_TEXT_VALUE.to_string(),
            style: TextStyle::default(),
        });
        id
    }

    /// Append an image element in a default-sized box.
    ///
    /// `src` is the encoded image as a data URI. An empty payload places
    /// nothing and returns `None`.
    pub fn place_image(&mut self, page: u32, x: f64, y: f64, src: &str) -> Option<ElementId> {
        if src.trim().is_empty() {
            return None;
        }
        let id = self.allocate_id();
        self.elements.push(OverlayElement::Image {
            id,
            page,
            x,
            y,
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            src: src.to_string(),
        });
        Some(id)
    }

    pub fn place_image_default(&mut self, src: &str) -> Option<ElementId> {
        let ImageAnchor { page, x, y } = DEFAULT_IMAGE_ANCHOR;
        self.place_image(page, x, y, src)
    }

    pub fn place_highlight(&mut self, page: u32, x: f64, y: f64, w: f64, h: f64) -> ElementId {
        let id = self.allocate_id();
        self.elements
            .push(OverlayElement::Highlight { id, page, x, y, w, h });
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&OverlayElement> {
        self.elements.iter().find(|el| el.id() == id)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut OverlayElement> {
        self.elements.iter_mut().find(|el| el.id() == id)
    }

    /// Move an element. Page, size and content are untouched.
    pub fn move_to(&mut self, id: ElementId, x: f64, y: f64) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                element.set_position(x, y);
                true
            }
            None => false,
        }
    }

    /// Resize an image element. Other variants are left alone.
    pub fn resize(&mut self, id: ElementId, new_width: f64, new_height: f64) -> bool {
        match self.get_mut(id) {
            Some(OverlayElement::Image { width, height, .. }) => {
                *width = new_width;
                *height = new_height;
                true
            }
            _ => false,
        }
    }

    pub fn set_text(&mut self, id: ElementId, new_value: &str) -> bool {
        match self.get_mut(id) {
            Some(OverlayElement::Text { value, .. }) => {
                *value = new_value.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn restyle_text(&mut self, id: ElementId, patch: &StylePatch) -> bool {
        match self.get_mut(id) {
            Some(OverlayElement::Text { style, .. }) => {
                patch.apply_to(style);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: ElementId) -> bool {
        if let Some(pos) = self.elements.iter().position(|el| el.id() == id) {
            self.elements.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn elements(&self) -> &[OverlayElement] {
        &self.elements
    }

    pub fn elements_for_page(&self, page: u32) -> Vec<&OverlayElement> {
        self.elements.iter().filter(|el| el.page() == page).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Flattened records in store order.
    pub fn serialize(&self) -> Vec<ElementRecord> {
        self.elements.iter().map(OverlayElement::to_record).collect()
    }

    pub fn to_request(&self) -> OverlayRequest {
        OverlayRequest::from_records(self.serialize())
    }

    /// Hand the overlay off for materialization. The store is consumed;
    /// editing again starts from a freshly loaded document.
    pub fn into_request(self) -> OverlayRequest {
        self.to_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FontFamily, MIN_TEXT_SIZE};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_new_store_is_empty() {
        let store = OverlayStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.serialize().is_empty());
    }

    #[test]
    fn test_place_text_uses_default_style() {
        let mut store = OverlayStore::new();
        let id = store.place_text(2, 40.0, 60.0);
        match store.get(id).unwrap() {
            OverlayElement::Text {
                page,
                x,
                y,
                value,
                style,
                ..
            } => {
                assert_eq!((*page, *x, *y), (2, 40.0, 60.0));
                assert_eq!(value, DEFAULT_TEXT_VALUE);
                assert_eq!(style, &TextStyle::default());
            }
            other => panic!("Expected text element, got {:?}", other),
        }
    }

    #[test]
    fn test_ids_are_unique_and_never_reused() {
        let mut store = OverlayStore::new();
        let a = store.place_text(1, 0.0, 0.0);
        let b = store.place_highlight(1, 0.0, 0.0, 10.0, 10.0);
        assert_ne!(a, b);
        assert!(store.remove(b));
        let c = store.place_text(1, 5.0, 5.0);
        assert_ne!(c, b);
        assert_ne!(c, a);
    }

    #[test]
    fn test_place_image_without_payload_is_noop() {
        let mut store = OverlayStore::new();
        assert_eq!(store.place_image(1, 0.0, 0.0, ""), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_place_image_default_anchor_and_box() {
        let mut store = OverlayStore::new();
        let id = store.place_image_default(PNG_URI).unwrap();
        match store.get(id).unwrap() {
            OverlayElement::Image {
                page,
                x,
                y,
                width,
                height,
                ..
            } => {
                assert_eq!((*page, *x, *y), (1, 120.0, 120.0));
                assert_eq!((*width, *height), (150.0, 150.0));
            }
            other => panic!("Expected image element, got {:?}", other),
        }
    }

    #[test]
    fn test_move_keeps_page_and_content() {
        let mut store = OverlayStore::new();
        let id = store.place_text(3, 10.0, 10.0);
        store.restyle_text(id, &StylePatch::size(24.0));
        assert!(store.move_to(id, 99.0, 42.0));
        let element = store.get(id).unwrap();
        assert_eq!(element.position(), (99.0, 42.0));
        assert_eq!(element.page(), 3);
        if let OverlayElement::Text { value, style, .. } = element {
            assert_eq!(value, DEFAULT_TEXT_VALUE);
            assert_eq!(style.size, 24.0);
        }
    }

    #[test]
    fn test_move_unknown_id_is_noop() {
        let mut store = OverlayStore::new();
        store.place_text(1, 1.0, 1.0);
        assert!(!store.move_to(999, 5.0, 5.0));
        assert_eq!(store.elements()[0].position(), (1.0, 1.0));
    }

    #[test]
    fn test_resize_only_applies_to_images() {
        let mut store = OverlayStore::new();
        let text = store.place_text(1, 0.0, 0.0);
        let image = store.place_image(1, 0.0, 0.0, PNG_URI).unwrap();
        assert!(!store.resize(text, 300.0, 300.0));
        assert!(store.resize(image, 300.0, 80.0));
        match store.get(image).unwrap() {
            OverlayElement::Image { width, height, .. } => {
                assert_eq!((*width, *height), (300.0, 80.0));
            }
            other => panic!("Expected image element, got {:?}", other),
        }
    }

    #[test]
    fn test_restyle_text_clamps_shrink() {
        let mut store = OverlayStore::new();
        let id = store.place_text(1, 0.0, 0.0);
        assert!(store.restyle_text(id, &StylePatch::size(2.0)));
        if let Some(OverlayElement::Text { style, .. }) = store.get(id) {
            assert_eq!(style.size, MIN_TEXT_SIZE);
        }
    }

    #[test]
    fn test_restyle_non_text_is_noop() {
        let mut store = OverlayStore::new();
        let id = store.place_highlight(1, 0.0, 0.0, 10.0, 10.0);
        assert!(!store.restyle_text(id, &StylePatch::size(30.0)));
        assert!(!store.set_text(id, "nope"));
    }

    #[test]
    fn test_set_text() {
        let mut store = OverlayStore::new();
        let id = store.place_text(1, 0.0, 0.0);
        assert!(store.set_text(id, "Signed"));
        if let Some(OverlayElement::Text { value, .. }) = store.get(id) {
            assert_eq!(value, "Signed");
        }
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = OverlayStore::new();
        store.place_text(1, 0.0, 0.0);
        assert!(!store.remove(42));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_elements_for_page() {
        let mut store = OverlayStore::new();
        store.place_text(1, 0.0, 0.0);
        store.place_text(2, 0.0, 0.0);
        store.place_highlight(1, 0.0, 0.0, 5.0, 5.0);
        assert_eq!(store.elements_for_page(1).len(), 2);
        assert_eq!(store.elements_for_page(2).len(), 1);
        assert!(store.elements_for_page(3).is_empty());
    }

    #[test]
    fn test_serialize_flattens_text_style() {
        let mut store = OverlayStore::new();
        let id = store.place_text(1, 50.0, 100.0);
        store.set_text(id, "Hi");
        store.restyle_text(
            id,
            &StylePatch {
                color: Some("#ff0000".to_string()),
                font: Some(FontFamily::Serif),
                bold: Some(true),
                ..StylePatch::default()
            },
        );
        let records = store.serialize();
        assert_eq!(
            records,
            vec![ElementRecord::Text(TextRecord {
                page: 1,
                x: 50.0,
                y: 100.0,
                value: "Hi".to_string(),
                size: Some(16.0),
                color: Some("#ff0000".to_string()),
                bold: Some(true),
                font: Some(FontFamily::Serif),
            })]
        );
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["font"], "TimesRoman");
    }

    #[test]
    fn test_into_request_splits_groups_in_order() {
        let mut store = OverlayStore::new();
        let first = store.place_text(1, 0.0, 0.0);
        store.place_highlight(1, 0.0, 0.0, 10.0, 10.0);
        store.place_image(1, 0.0, 0.0, PNG_URI);
        let second = store.place_text(1, 0.0, 0.0);
        store.set_text(first, "first");
        store.set_text(second, "second");

        let request = store.into_request();
        let values: Vec<&str> = request.texts.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["first", "second"]);
        assert_eq!(request.highlights.len(), 1);
        assert_eq!(request.images.len(), 1);
    }

    proptest! {
        #[test]
        fn serialize_preserves_store_order(pages in proptest::collection::vec(1u32..10, 0..20)) {
            let mut store = OverlayStore::new();
            for (i, page) in pages.iter().enumerate() {
                if i % 2 == 0 {
                    store.place_text(*page, i as f64, 0.0);
                } else {
                    store.place_highlight(*page, i as f64, 0.0, 1.0, 1.0);
                }
            }
            let serialized: Vec<i64> = store.serialize().iter().map(ElementRecord::page).collect();
            let expected: Vec<i64> = pages.iter().copied().map(i64::from).collect();
            prop_assert_eq!(serialized, expected);
        }

        #[test]
        fn move_never_changes_page(page in 1u32..100, x in 0.0f64..2000.0, y in 0.0f64..2000.0) {
            let mut store = OverlayStore::new();
            let id = store.place_text(page, 0.0, 0.0);
            store.move_to(id, x, y);
            let element = store.get(id).unwrap();
            prop_assert_eq!(element.page(), page);
            prop_assert_eq!(element.position(), (x, y));
        }
    }
}
