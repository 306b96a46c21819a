//! API handlers for the PDF edit server
//!
//! Every document route takes a multipart upload. Document work runs on the
//! blocking pool under the configured timeout.

use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use pdfedit_core::{
    get_page_count, materialize, merge_documents, parse_page_range, split_range, OverlayRequest,
    PdfEditError,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfedit-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Named parts of a multipart upload, in arrival order.
#[derive(Debug, Default)]
pub struct UploadParts {
    parts: Vec<(String, Vec<u8>)>,
}

impl UploadParts {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            debug!(part = %name, bytes = bytes.len(), "Received upload part");
            parts.push((name, bytes.to_vec()));
        }
        Ok(Self { parts })
    }

    /// First part with this name, taken out of the upload.
    fn take_file(&mut self, name: &str) -> Option<Vec<u8>> {
        let pos = self.parts.iter().position(|(n, _)| n == name)?;
        Some(self.parts.remove(pos).1)
    }

    fn require_file(&mut self, name: &str) -> Result<Vec<u8>, ServerError> {
        self.take_file(name)
            .ok_or_else(|| ServerError::InvalidRequest(format!("Missing '{}' upload", name)))
    }

    /// Every part with this name, in order.
    fn take_all(&mut self, name: &str) -> Vec<Vec<u8>> {
        let (matching, rest) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition::<Vec<_>, _>(|(n, _)| n == name);
        self.parts = rest;
        matching.into_iter().map(|(_, bytes)| bytes).collect()
    }

    fn take_text(&mut self, name: &str) -> Result<Option<String>, ServerError> {
        self.take_file(name)
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|_| {
                    ServerError::InvalidRequest(format!("Field '{}' is not UTF-8", name))
                })
            })
            .transpose()
    }
}

/// Run document work on the blocking pool, bounded by the state's timeout.
pub(crate) async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PdfEditError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(Duration::from_millis(state.timeout_ms), task).await {
        Ok(Ok(result)) => result.map_err(ServerError::from),
        Ok(Err(join_err)) => Err(ServerError::Internal(format!(
            "Worker failed: {}",
            join_err
        ))),
        Err(_) => Err(ServerError::Timeout(state.timeout_ms)),
    }
}

fn pdf_attachment(bytes: Vec<u8>, filename: &str) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

/// Handler: POST /edit-pdf
///
/// Parts: `file` (required), `texts`, `highlights` and `images` (JSON
/// arrays, each optional).
pub async fn handle_edit_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut upload = UploadParts::read(multipart).await?;
    let file = upload.require_file("file")?;
    let request = OverlayRequest::from_parts(
        upload.take_text("texts")?.as_deref(),
        upload.take_text("highlights")?.as_deref(),
        upload.take_text("images")?.as_deref(),
    )?;

    info!(
        bytes = file.len(),
        elements = request.element_count(),
        "Edit request"
    );

    let edited = run_blocking(&state, move || materialize(&file, &request)).await?;
    Ok(pdf_attachment(edited, "edited.pdf"))
}

/// Handler: POST /merge-pdf
///
/// Parts: two or more `pdfs`, merged in upload order.
pub async fn handle_merge_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut upload = UploadParts::read(multipart).await?;
    let documents = upload.take_all("pdfs");
    if documents.len() < 2 {
        return Err(ServerError::InvalidRequest(
            "Upload at least two PDFs to merge".into(),
        ));
    }

    info!(documents = documents.len(), "Merge request");

    let merged = run_blocking(&state, move || merge_documents(documents)).await?;
    Ok(pdf_attachment(merged, "merged.pdf"))
}

/// Handler: POST /split-pdf
///
/// Parts: `pdf` and `pages` in the form `start-end`.
pub async fn handle_split_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut upload = UploadParts::read(multipart).await?;
    let pdf = upload.require_file("pdf")?;
    let pages = upload
        .take_text("pages")?
        .ok_or_else(|| ServerError::InvalidRequest("Missing 'pages' range".into()))?;
    let (start, end) = parse_page_range(&pages)?;

    info!(start, end, "Split request");

    let split = run_blocking(&state, move || split_range(&pdf, start, end)).await?;
    Ok(pdf_attachment(split, "split.pdf"))
}

#[derive(Serialize)]
pub struct PageCountResponse {
    pub success: bool,
    pub page_count: u32,
}

/// Handler: POST /page-count
pub async fn handle_page_count(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PageCountResponse>, ServerError> {
    let mut upload = UploadParts::read(multipart).await?;
    let pdf = upload.require_file("pdf")?;
    let page_count = run_blocking(&state, move || get_page_count(&pdf)).await?;
    Ok(Json(PageCountResponse {
        success: true,
        page_count,
    }))
}
