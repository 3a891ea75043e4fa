//! Translation route - whole-document upload and download.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use axum_extra::extract::Multipart;
use paper_translator_core::{Error, PdfDocument, MERGED_FILE_NAME};
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Multipart field carrying the input document
pub const INPUT_FIELD: &str = "input_pdf";

/// Translate an uploaded PDF and answer with the merged side-by-side document.
pub async fn translate_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() == Some(INPUT_FIELD) {
            let filename = field.file_name().unwrap_or("document.pdf").to_string();
            let data = field.bytes().await.or_bad_request()?;
            upload = Some((filename, data));
            break;
        }
    }
    let (filename, data) = upload.or_bad_request("No input_pdf uploaded")?;

    // Parse PDF in a blocking task to avoid blocking the async runtime
    let data_vec = data.to_vec();
    let doc = tokio::task::spawn_blocking(move || PdfDocument::from_bytes(data_vec))
        .await
        .map_err(|e| {
            error!("PDF parsing task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PDF parsing failed".to_string(),
            )
        })?
        .map_err(|e| {
            error!("Failed to parse PDF: {}", e);
            (StatusCode::BAD_REQUEST, format!("Invalid PDF: {e}"))
        })?;

    info!("Translating {} ({} pages)", filename, doc.page_count());

    let translated = state.translate(&doc).await.map_err(|e| {
        error!("Translation of {} failed: {}", filename, e);
        (status_for(&e), e.to_string())
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{MERGED_FILE_NAME}\""),
        )
        .body(Body::from(translated))
        .or_internal_error()
}

/// Model services being down is not the server's own fault.
const fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Layout(_)
        | Error::Ocr(_)
        | Error::TranslationRequest(_)
        | Error::TranslationInvalidResponse(_)
        | Error::TranslationRateLimited { .. }
        | Error::TranslationMaxRetriesExceeded => StatusCode::BAD_GATEWAY,
        Error::TranslationTimeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
