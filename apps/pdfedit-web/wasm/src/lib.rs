//! WASM bindings for the PDF overlay editor
//!
//! The browser keeps its annotation overlay in a Rust `EditSession`, the
//! same store type the server materializes from. JavaScript handles DOM
//! events and rendering only.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { EditSession } from './pkg/pdfedit_wasm.js';
//!
//! await init();
//!
//! const session = new EditSession("file.pdf", bytes);
//! const id = session.addText(1, 50, 100);
//! session.setText(id, "Approved");
//! session.restyleText(id, JSON.stringify({ size: 18, color: "#ff0000" }));
//!
//! // Either bake locally...
//! const edited = session.save();
//! // ...or post the overlay to /edit-pdf
//! const { texts, highlights, images } = JSON.parse(session.getRequestJson());
//! ```

pub mod edit_session;

use wasm_bindgen::prelude::*;

pub use edit_session::EditSession;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
