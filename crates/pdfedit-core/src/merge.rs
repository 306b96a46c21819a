//! Document merge
//!
//! Appends the pages of every input, in order, onto the first one.

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::PdfEditError;

/// Merge two or more documents into one.
///
/// Object ids of each appended document are shifted past the current
/// maximum so nothing collides, then its pages are added to the first
/// document's root page node.
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfEditError> {
    if documents.len() < 2 {
        return Err(PdfEditError::OperationError(
            "At least two documents are required to merge".into(),
        ));
    }

    let mut loaded = documents
        .iter()
        .enumerate()
        .map(|(i, bytes)| {
            Document::load_mem(bytes).map_err(|e| {
                PdfEditError::ParseError(format!("Failed to load document {}: {}", i + 1, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    let Some(mut dest) = loaded.next() else {
        return Err(PdfEditError::OperationError("No documents to merge".into()));
    };
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();
    pin_inherited(&mut dest, &page_refs);

    for mut source in loaded {
        let offset = dest.max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        pin_inherited(&mut source, &source_pages);
        debug!(pages = source_pages.len(), offset, "Appending document");

        for (id, object) in source.objects {
            dest.objects
                .insert((id.0 + offset, id.1), shift_refs(object, offset));
        }
        page_refs.extend(source_pages.into_iter().map(|(n, g)| (n + offset, g)));
        dest.max_id = offset + source.max_id;
    }

    let pages_id = root_pages_id(&dest)?;
    for &page_id in &page_refs {
        if let Ok(page) = dest.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }
    let pages = dest
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| PdfEditError::OperationError("Invalid pages dictionary".into()))?;
    pages.set(
        "Kids",
        page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>(),
    );
    pages.set("Count", page_refs.len() as i64);

    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfEditError::OperationError(format!("Failed to save merged PDF: {}", e)))?;
    Ok(buffer)
}

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Copy inherited attributes onto each page, since pages are re-parented
/// directly under the root page node.
fn pin_inherited(doc: &mut Document, page_ids: &[ObjectId]) {
    for &page_id in page_ids {
        let mut found = Vec::new();
        for key in INHERITABLE {
            let mut current = Some(page_id);
            let mut depth = 0;
            while let Some(id) = current {
                let Ok(node) = doc.get_object(id).and_then(Object::as_dict) else {
                    break;
                };
                if let Ok(value) = node.get(key) {
                    if id != page_id {
                        found.push((key.to_vec(), value.clone()));
                    }
                    break;
                }
                current = node.get(b"Parent").and_then(Object::as_reference).ok();
                depth += 1;
                if depth > 32 {
                    break;
                }
            }
        }
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in found {
                page.set(key, value);
            }
        }
    }
}

fn shift_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference((n, g)) => Object::Reference((n + offset, g)),
        Object::Array(arr) => {
            Object::Array(arr.into_iter().map(|o| shift_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = shift_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = shift_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

fn root_pages_id(doc: &Document) -> Result<ObjectId, PdfEditError> {
    let catalog = doc
        .catalog()
        .map_err(|e| PdfEditError::OperationError(format!("Catalog: {}", e)))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfEditError::OperationError("Pages is not a reference".into()))
}
