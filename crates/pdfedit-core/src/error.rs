use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfEditError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Invalid overlay payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
