// handlers/protected/files/upload.rs - POST /files/upload (multipart: `file`, `record_id`)

use axum::extract::{
    multipart::{Multipart, MultipartRejection},
    State,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::services::file_vault::{discard, StoredUpload, VaultError};
use crate::types::Action;

const FILE_FIELD: &str = "file";
const RECORD_ID_FIELD: &str = "record_id";

pub async fn post(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    // Role check comes before any byte is written
    authorize(&user, Action::UploadFile.allowed_roles())?;
    let multipart = multipart?;

    let (upload, record_id) = read_form(&state, multipart).await?;
    let upload = upload.ok_or(VaultError::NoFile)?;

    let file = state.files.attach(&user, record_id.as_deref(), upload).await?;

    Ok(ApiResponse::created(json!({
        "message": "File uploaded successfully",
        "file": {
            "id": file.id,
            "filename": file.file_name,
            "size": file.file_size_bytes,
            "type": file.file_type,
        },
    })))
}

/// Stream the `file` part to the vault and collect `record_id`, in whatever
/// order they arrive. A stored file is removed again if the form turns out
/// to be malformed.
async fn read_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(Option<StoredUpload>, Option<String>), ApiError> {
    let mut upload: Option<StoredUpload> = None;
    let mut record_id: Option<String> = None;

    let outcome = async {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(FILE_FIELD) if upload.is_none() => {
                    upload = Some(state.files.vault().receive(field).await?);
                }
                Some(RECORD_ID_FIELD) => {
                    record_id = Some(field.text().await?);
                }
                _ => {}
            }
        }
        Ok::<(), ApiError>(())
    }
    .await;

    if let Err(e) = outcome {
        if let Some(stored) = &upload {
            discard(&stored.path).await;
        }
        return Err(e);
    }
    Ok((upload, record_id))
}
