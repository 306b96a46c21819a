//! Page-level plumbing: geometry, resource dictionaries and content streams

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfEditError;

/// US Letter, used when no MediaBox can be found.
pub const DEFAULT_PAGE_SIZE: (f64, f64) = (612.0, 792.0);

/// Guard against cyclic Parent chains in malformed page trees.
const MAX_TREE_DEPTH: usize = 32;

fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, PdfEditError> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfEditError::OperationError(format!("Page {:?}: {}", page_id, e)))
}

fn obj_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn media_box_size(doc: &Document, dict: &Dictionary) -> Option<(f64, f64)> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = obj_to_f64(&arr[0])?;
    let lly = obj_to_f64(&arr[1])?;
    let urx = obj_to_f64(&arr[2])?;
    let ury = obj_to_f64(&arr[3])?;
    Some(((urx - llx).abs(), (ury - lly).abs()))
}

/// Width and height of a page in points, inheriting MediaBox through the
/// page tree.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        if let Some(size) = media_box_size(doc, dict) {
            return size;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    DEFAULT_PAGE_SIZE
}

pub fn page_height(doc: &Document, page_id: ObjectId) -> f64 {
    page_size(doc, page_id).1
}

/// A named entry to register in a page's resource dictionary,
/// e.g. `/Font /OvFHelvetica 12 0 R`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub category: &'static str,
    pub name: Vec<u8>,
    pub id: ObjectId,
}

enum ResourceHome {
    Page,
    Shared(ObjectId),
}

fn inherited_resources(doc: &Document, page: &Dictionary) -> Option<Dictionary> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(id) = parent {
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let node = doc.get_object(id).and_then(Object::as_dict).ok()?;
        match node.get(b"Resources") {
            Ok(Object::Reference(res_id)) => {
                return doc.get_object(*res_id).and_then(Object::as_dict).ok().cloned()
            }
            Ok(Object::Dictionary(dict)) => return Some(dict.clone()),
            _ => {}
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    None
}

fn resolve_resources(
    doc: &Document,
    page_id: ObjectId,
) -> Result<(ResourceHome, Dictionary), PdfEditError> {
    let page = page_dict(doc, page_id)?;
    match page.get(b"Resources") {
        Ok(Object::Reference(id)) => {
            let dict = doc
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_err(|e| PdfEditError::OperationError(format!("Resources: {}", e)))?;
            Ok((ResourceHome::Shared(*id), dict.clone()))
        }
        Ok(Object::Dictionary(dict)) => Ok((ResourceHome::Page, dict.clone())),
        // Pages that inherit resources get their own copy so the additions
        // stay local to them.
        _ => Ok((
            ResourceHome::Page,
            inherited_resources(doc, page).unwrap_or_else(Dictionary::new),
        )),
    }
}

/// First name in `category` that is free or already bound to `id`: `wanted`
/// itself, then `wanted_2`, `wanted_3` and so on.
fn free_name(category: &Dictionary, wanted: &[u8], id: ObjectId) -> Vec<u8> {
    let available = |name: &[u8]| match category.get(name) {
        Ok(Object::Reference(existing)) => *existing == id,
        Ok(_) => false,
        Err(_) => true,
    };
    if available(wanted) {
        return wanted.to_vec();
    }
    let mut suffix = 2u32;
    loop {
        let candidate = [wanted, format!("_{}", suffix).as_bytes()].concat();
        if available(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Register resources on a page, creating the category dictionaries as
/// needed. Existing entries are never replaced: an entry whose name is
/// already bound to another object is installed under a fresh name.
///
/// Returns the installed name of each entry, in order.
pub fn install_resources(
    doc: &mut Document,
    page_id: ObjectId,
    entries: &[ResourceEntry],
) -> Result<Vec<Vec<u8>>, PdfEditError> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let (home, mut resources) = resolve_resources(doc, page_id)?;
    let mut installed = Vec::with_capacity(entries.len());

    for entry in entries {
        let reference = Object::Reference(entry.id);
        let name = match resources.get(entry.category.as_bytes()).ok().cloned() {
            Some(Object::Reference(category_id)) => {
                let category = doc
                    .get_object_mut(category_id)
                    .and_then(Object::as_dict_mut)
                    .map_err(|e| {
                        PdfEditError::OperationError(format!("{}: {}", entry.category, e))
                    })?;
                let name = free_name(category, &entry.name, entry.id);
                category.set(name.clone(), reference);
                name
            }
            Some(Object::Dictionary(mut category)) => {
                let name = free_name(&category, &entry.name, entry.id);
                category.set(name.clone(), reference);
                resources.set(entry.category, Object::Dictionary(category));
                name
            }
            _ => {
                let mut category = Dictionary::new();
                category.set(entry.name.clone(), reference);
                resources.set(entry.category, Object::Dictionary(category));
                entry.name.clone()
            }
        };
        installed.push(name);
    }

    match home {
        ResourceHome::Page => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
            page.set("Resources", Object::Dictionary(resources));
        }
        ResourceHome::Shared(id) => {
            let shared = doc
                .get_object_mut(id)
                .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
            *shared = Object::Dictionary(resources);
        }
    }
    Ok(installed)
}

/// Whether the page already has content that overlay content must follow.
pub fn has_contents(doc: &Document, page_id: ObjectId) -> Result<bool, PdfEditError> {
    let page = page_dict(doc, page_id)?;
    Ok(matches!(
        page.get(b"Contents"),
        Ok(Object::Reference(_)) | Ok(Object::Array(_))
    ))
}

/// Append a content stream after the page's existing content.
///
/// Existing content is preceded by a `q` stream so that the caller's stream,
/// which must open with `Q` in that case, starts from the default graphics
/// state.
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfEditError> {
    let existing = page_dict(doc, page_id)?.get(b"Contents").ok().cloned();

    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let contents = match existing {
        Some(Object::Reference(existing_id)) => {
            let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            Object::Array(vec![
                Object::Reference(save_id),
                Object::Reference(existing_id),
                Object::Reference(overlay_id),
            ])
        }
        Some(Object::Array(existing)) => {
            let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let mut arr = Vec::with_capacity(existing.len() + 2);
            arr.push(Object::Reference(save_id));
            arr.extend(existing);
            arr.push(Object::Reference(overlay_id));
            Object::Array(arr)
        }
        _ => Object::Reference(overlay_id),
    };

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
    page.set("Contents", contents);
    Ok(())
}
