// handlers/protected/files/download.rs - GET /files/download/:id

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::middleware::{authorize, AuthUser};
use crate::types::Action;

/// Stream the stored bytes under the original file name and media type.
pub async fn get(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> Result<Response, ApiError> {
    authorize(&user, Action::ViewFiles.allowed_roles())?;

    let (meta, file, len) = state.files.open(user.scope(None), id).await?;

    let content_type = HeaderValue::from_str(&meta.file_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&meta.file_name))
        .map_err(|_| ApiError::internal_server_error("Internal server error"))?;

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, HeaderValue::from(len)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// `attachment` disposition with a quoted ASCII fallback and an RFC 5987
/// `filename*` carrying the exact UTF-8 name.
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(name.len() * 3);
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_'
            | b'`' | b'|' | b'~' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", fallback, encoded)
}
