//! Page range extraction

use lopdf::Document;

use crate::error::PdfEditError;

/// Parse a `start-end` range (1-based, inclusive).
pub fn parse_page_range(input: &str) -> Result<(u32, u32), PdfEditError> {
    let (start, end) = input
        .trim()
        .split_once('-')
        .ok_or_else(|| PdfEditError::InvalidRange(format!("Expected start-end, got {:?}", input)))?;

    let parse = |part: &str, label: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|_| PdfEditError::InvalidRange(format!("Invalid {}: {:?}", label, part)))
    };
    let start = parse(start, "start")?;
    let end = parse(end, "end")?;

    if start == 0 {
        return Err(PdfEditError::InvalidRange(
            "Page numbers must be >= 1".into(),
        ));
    }
    if start > end {
        return Err(PdfEditError::InvalidRange(format!(
            "Start {} > end {}",
            start, end
        )));
    }
    Ok((start, end))
}

/// Keep only pages `start..=end` of a document.
pub fn split_range(bytes: &[u8], start: u32, end: u32) -> Result<Vec<u8>, PdfEditError> {
    if start == 0 || start > end {
        return Err(PdfEditError::InvalidRange(format!(
            "Invalid range {}-{}",
            start, end
        )));
    }

    let mut doc = Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    let page_count = doc.get_pages().len() as u32;
    if end > page_count {
        return Err(PdfEditError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            end, page_count
        )));
    }

    // Highest first so earlier page numbers stay valid
    let to_delete: Vec<u32> = (1..=page_count)
        .rev()
        .filter(|p| !(start..=end).contains(p))
        .collect();
    for &page in &to_delete {
        doc.delete_pages(&[page]);
    }
    if !to_delete.is_empty() {
        doc.prune_objects();
    }
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfEditError::OperationError(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn labels(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| {
                let ops = fixtures::page_operations(&doc, id);
                let tj = ops.iter().find(|op| op.operator == "Tj").unwrap();
                String::from_utf8_lossy(tj.operands[0].as_str().unwrap()).into_owned()
            })
            .collect()
    }

    #[test]
    fn test_parse_page_range() {
        assert_eq!(parse_page_range("2-4").unwrap(), (2, 4));
        assert_eq!(parse_page_range(" 3 - 3 ").unwrap(), (3, 3));
    }

    #[test]
    fn test_parse_page_range_rejects_malformed() {
        for input in ["", "3", "a-b", "0-2", "5-2", "1-2-3", "-1-2"] {
            assert!(
                matches!(parse_page_range(input), Err(PdfEditError::InvalidRange(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_split_middle_pages() {
        let pdf = fixtures::create_test_pdf(5);
        let result = split_range(&pdf, 2, 4).unwrap();
        assert_eq!(labels(&result), vec!["Page 2", "Page 3", "Page 4"]);
    }

    #[test]
    fn test_split_whole_document() {
        let pdf = fixtures::create_test_pdf(3);
        let result = split_range(&pdf, 1, 3).unwrap();
        assert_eq!(labels(&result).len(), 3);
    }

    #[test]
    fn test_split_past_end_names_page_count() {
        let pdf = fixtures::create_test_pdf(3);
        let err = split_range(&pdf, 2, 9).unwrap_err();
        assert!(matches!(err, PdfEditError::InvalidRange(_)));
        assert!(err.to_string().contains("3 pages"));
    }

    #[test]
    fn test_split_page_zero_fails() {
        let pdf = fixtures::create_test_pdf(3);
        assert!(split_range(&pdf, 0, 1).is_err());
    }

    #[test]
    fn test_split_garbage_fails() {
        assert!(matches!(
            split_range(b"not a pdf", 1, 1),
            Err(PdfEditError::ParseError(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn split_keeps_requested_count(start in 1u32..=6, len in 0u32..6) {
            let end = (start + len).min(6);
            let pdf = fixtures::create_test_pdf(6);
            let result = split_range(&pdf, start, end).unwrap();
            let doc = Document::load_mem(&result).unwrap();
            prop_assert_eq!(doc.get_pages().len() as u32, end - start + 1);
        }
    }
}
