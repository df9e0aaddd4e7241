use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::dal::ApiUsageDal;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::invoice::{classify_document, pdf_text, upload_kind, UploadKind};

#[derive(Debug, Deserialize)]
pub struct InvoiceTextRequest {
    pub text: String,
}

/// POST /api/v1/invoices/extract/invoice - classify and extract from raw text
pub async fn extract_from_text(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<InvoiceTextRequest>,
) -> ApiResult<Value> {
    if input.text.trim().is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }
    let document_type = classify_document(&input.text);
    tracing::debug!("Document classified as {}", document_type);

    let extraction = state.invoice.extract_from_text(&input.text, document_type).await?;
    ApiUsageDal::new(state.db.clone()).increment_invoice_usage(current.user_id()).await?;

    Ok(ApiResponse::success(json!({
        "document_type": document_type,
        "data": extraction.data,
        "token_usage": extraction.token_usage,
    })))
}

/// POST /api/v1/invoices/extract/pdf-image-text - extract from an uploaded file
///
/// Accepts `.pdf`, `.png`, `.jpg`, `.jpeg` and `.bmp` in the multipart `file`
/// field. Images go through the vision model; PDFs are read from their text layer.
pub async fn extract_from_upload(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let kind = upload_kind(&filename)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;

        let extraction = match kind {
            UploadKind::Image(mime_type) => state.invoice.extract_from_image(&STANDARD.encode(&bytes), mime_type).await?,
            UploadKind::Pdf => {
                let text = pdf_text(bytes.to_vec()).await?;
                let document_type = classify_document(&text);
                tracing::debug!("PDF {} classified as {}", filename, document_type);
                state.invoice.extract_from_text(&text, document_type).await?
            }
        };
        ApiUsageDal::new(state.db.clone()).increment_invoice_usage(current.user_id()).await?;

        return Ok(ApiResponse::success(json!({
            "data": extraction.data,
            "token_usage": extraction.token_usage,
        })));
    }

    Err(ApiError::bad_request("File is required"))
}
