//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::tree::UploadRequest;
use crate::web::dto::{ApiResponse, FileResponse};
use crate::web::error::ApiError;
use crate::web::handlers::{run_blocking, AppState};

/// Build a `Content-Disposition` value for a download of `filename`.
///
/// Control characters never reach the header. Names that are not plain ASCII, or that
/// contain `"` or `\`, get a sanitized `filename` fallback plus an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' || !c.is_ascii() { '_' } else { c })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    filename: Option<String>,
    name: Option<String>,
    content: Option<Vec<u8>>,
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to read multipart field");
        ApiError::from_multipart_error(&e)
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                form.filename = Some(field.file_name().unwrap_or("").to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::debug!(error = %e, "Failed to read file content");
                    ApiError::from_multipart_error(&e)
                })?;
                form.content = Some(bytes.to_vec());
            }
            "name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::from_multipart_error(&e))?;
                form.name = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/files/:folder_id - Upload a file into a folder.
///
/// Multipart fields: `file` (required) and `name` (optional display name).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let form = read_upload_form(&mut multipart).await?;

    let (Some(filename), Some(content)) = (form.filename, form.content) else {
        return Err(ApiError::bad_request("No file provided"));
    };

    let mut request = UploadRequest::new(folder_id, filename, content);
    request.name = form.name;

    let service = state.service.clone();
    let file = run_blocking(move || service.create_file(request)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(&file))),
    ))
}

/// GET /api/files/:id - Get a file descriptor. Counts as an access.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let service = state.service.clone();
    let file = run_blocking(move || service.get_file(&file_id)).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(&file))))
}

/// GET /api/files/:id/content - Download a file's bytes.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let service = state.service.clone();
    let download = run_blocking(move || service.open_file(&file_id)).await?;

    let content_type = mime_guess::from_path(&download.file.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file.name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            ApiError::internal("Failed to build response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition_header("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_quotes_and_backslashes() {
        let header = content_disposition_header("a\"b\\c.txt");
        assert!(header.starts_with("attachment; filename=\"a_b_c.txt\"; filename*=UTF-8''"));
        assert!(header.contains("a%22b%5Cc.txt"));
    }

    #[test]
    fn test_content_disposition_strips_control_chars() {
        let header = content_disposition_header("evil\r\nSet-Cookie: x.txt");
        assert!(!header.contains('\r'));
        assert!(!header.contains('\n'));
    }

    #[test]
    fn test_content_disposition_unicode() {
        let header = content_disposition_header("résumé.pdf");
        assert!(header.contains("filename=\"r_sum_.pdf\""));
        assert!(header.contains("filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"));
    }
}
