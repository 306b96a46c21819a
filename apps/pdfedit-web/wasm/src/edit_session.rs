//! Edit session for the browser editor
//!
//! Wraps an [`OverlayStore`] for one loaded document. The page canvas calls
//! into the session on every placement or drag gesture; saving bakes the
//! overlay into the document and starts a fresh store on the result.

use pdfedit_core::overlay::ElementId;
use pdfedit_core::{
    get_page_count, materialize, FontFamily, OverlayRequest, OverlayStore, PdfEditError,
    StylePatch,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Session for annotating a single PDF document
#[wasm_bindgen]
pub struct EditSession {
    document_bytes: Vec<u8>,
    document_name: String,
    page_count: u32,
    store: OverlayStore,
}

impl EditSession {
    pub fn open(name: &str, bytes: &[u8]) -> Result<EditSession, PdfEditError> {
        let page_count = get_page_count(bytes)?;
        Ok(EditSession {
            document_bytes: bytes.to_vec(),
            document_name: name.to_string(),
            page_count,
            store: OverlayStore::new(),
        })
    }

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    pub fn restyle_from_json(
        &mut self,
        id: ElementId,
        patch_json: &str,
    ) -> Result<bool, PdfEditError> {
        let patch: StylePatch = serde_json::from_str(patch_json)
            .map_err(|e| PdfEditError::InvalidPayload(format!("style patch: {}", e)))?;
        Ok(self.store.restyle_text(id, &patch))
    }

    /// Bake the overlay into the document.
    ///
    /// On success the session continues on the new bytes with an empty
    /// store. On failure nothing changes.
    pub fn save_overlay(&mut self) -> Result<Vec<u8>, PdfEditError> {
        let request = self.store.to_request();
        let edited = materialize(&self.document_bytes, &request)?;
        self.page_count = get_page_count(&edited)?;
        self.document_bytes = edited.clone();
        self.store = OverlayStore::new();
        Ok(edited)
    }

    pub fn request(&self) -> OverlayRequest {
        self.store.to_request()
    }
}

#[derive(Serialize)]
struct FontOption {
    label: &'static str,
    value: &'static str,
}

#[wasm_bindgen]
impl EditSession {
    /// Create a new edit session with the given PDF
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str, bytes: &[u8]) -> Result<EditSession, JsValue> {
        EditSession::open(name, bytes).map_err(js_error)
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    #[wasm_bindgen(getter, js_name = documentName)]
    pub fn document_name(&self) -> String {
        self.document_name.clone()
    }

    /// Current document bytes for PDF.js rendering
    #[wasm_bindgen(js_name = getDocumentBytes)]
    pub fn get_document_bytes(&self) -> Vec<u8> {
        self.document_bytes.clone()
    }

    /// Place default-styled text at a click position
    #[wasm_bindgen(js_name = addText)]
    pub fn add_text(&mut self, page: u32, x: f64, y: f64) -> ElementId {
        self.store.place_text(page, x, y)
    }

    /// Place an image (data URI) with its top-left corner at `(x, y)`
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(&mut self, page: u32, x: f64, y: f64, src: &str) -> Option<ElementId> {
        self.store.place_image(page, x, y, src)
    }

    /// Place an image at the default anchor on the first page
    #[wasm_bindgen(js_name = addImageDefault)]
    pub fn add_image_default(&mut self, src: &str) -> Option<ElementId> {
        self.store.place_image_default(src)
    }

    #[wasm_bindgen(js_name = addHighlight)]
    pub fn add_highlight(&mut self, page: u32, x: f64, y: f64, w: f64, h: f64) -> ElementId {
        self.store.place_highlight(page, x, y, w, h)
    }

    #[wasm_bindgen(js_name = moveElement)]
    pub fn move_element(&mut self, id: ElementId, x: f64, y: f64) -> bool {
        self.store.move_to(id, x, y)
    }

    #[wasm_bindgen(js_name = resizeImage)]
    pub fn resize_image(&mut self, id: ElementId, width: f64, height: f64) -> bool {
        self.store.resize(id, width, height)
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, id: ElementId, value: &str) -> bool {
        self.store.set_text(id, value)
    }

    /// Apply a partial style, e.g. `{"size":18,"font":"Courier"}`
    #[wasm_bindgen(js_name = restyleText)]
    pub fn restyle_text(&mut self, id: ElementId, patch_json: &str) -> Result<bool, JsValue> {
        self.restyle_from_json(id, patch_json).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeElement)]
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        self.store.remove(id)
    }

    #[wasm_bindgen(js_name = hasChanges)]
    pub fn has_changes(&self) -> bool {
        !self.store.is_empty()
    }

    #[wasm_bindgen(js_name = getElementCount)]
    pub fn get_element_count(&self) -> usize {
        self.store.len()
    }

    /// Elements with ids, for redrawing the overlay layer
    #[wasm_bindgen(js_name = getElementsJson)]
    pub fn get_elements_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.store.elements()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getPageElementsJson)]
    pub fn get_page_elements_json(&self, page: u32) -> Result<String, JsValue> {
        serde_json::to_string(&self.store.elements_for_page(page)).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getElementJson)]
    pub fn get_element_json(&self, id: ElementId) -> Option<String> {
        self.store
            .get(id)
            .and_then(|element| serde_json::to_string(element).ok())
    }

    /// The `texts`, `highlights` and `images` fields for a server save
    #[wasm_bindgen(js_name = getRequestJson)]
    pub fn get_request_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.request()).map_err(js_error)
    }

    /// Font choices for the style panel
    #[wasm_bindgen(js_name = getFontOptionsJson)]
    pub fn get_font_options_json(&self) -> Result<String, JsValue> {
        let options: Vec<FontOption> = FontFamily::ALL
            .iter()
            .map(|family| FontOption {
                label: family.label(),
                value: family.wire_name(),
            })
            .collect();
        serde_json::to_string(&options).map_err(js_error)
    }

    /// Bake the overlay in the browser and return the new document
    #[wasm_bindgen]
    pub fn save(&mut self) -> Result<Vec<u8>, JsValue> {
        self.save_overlay().map_err(js_error)
    }
}
