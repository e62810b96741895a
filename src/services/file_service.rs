use std::sync::Arc;

use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tokio::fs::File;

use super::file_vault::{discard, FileVault, StoredUpload, VaultError};
use super::record_service::{RecordError, RecordStore};
use crate::database::models::{RecordFile, RecordFileView};
use crate::database::DatabaseError;
use crate::filter::DepartmentScope;
use crate::middleware::AuthUser;

#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for FileError {
    fn from(err: sqlx::Error) -> Self {
        FileError::Database(DatabaseError::Sqlx(err))
    }
}

/// Parse the multipart `record_id` text field.
pub fn parse_record_id(raw: Option<&str>) -> Result<i64, RecordError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RecordError::Invalid("Record ID is required".to_string()))?;
    raw.parse::<i64>()
        .map_err(|_| RecordError::Invalid("Record ID must be a number".to_string()))
}

/// Attachment metadata in `record_files`, with bytes kept in the vault
#[derive(Clone)]
pub struct FileService {
    pool: PgPool,
    vault: Arc<FileVault>,
    records: RecordStore,
}

impl FileService {
    pub fn new(pool: PgPool, vault: Arc<FileVault>) -> Self {
        Self {
            records: RecordStore::new(pool.clone()),
            pool,
            vault,
        }
    }

    pub fn vault(&self) -> &FileVault {
        &self.vault
    }

    /// Register an already-written upload against a visible record.
    /// The file is removed again on every failure path.
    pub async fn attach(
        &self,
        user: &AuthUser,
        record_id: Option<&str>,
        upload: StoredUpload,
    ) -> Result<RecordFile, FileError> {
        match self.try_attach(user, record_id, &upload).await {
            Ok(file) => {
                tracing::info!("File uploaded for record {} by user {}", file.record_id, user.user_id);
                Ok(file)
            }
            Err(e) => {
                discard(&upload.path).await;
                Err(e)
            }
        }
    }

    async fn try_attach(
        &self,
        user: &AuthUser,
        record_id: Option<&str>,
        upload: &StoredUpload,
    ) -> Result<RecordFile, FileError> {
        let record_id = parse_record_id(record_id)?;
        if self.records.find_scoped(user.scope(None), record_id).await?.is_none() {
            return Err(RecordError::NotFound.into());
        }

        let file = sqlx::query_as::<_, RecordFile>(
            "INSERT INTO record_files (record_id, file_name, file_path, file_type, file_size_bytes, uploaded_by_user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(record_id)
        .bind(&upload.original_name)
        .bind(upload.path.to_string_lossy().into_owned())
        .bind(&upload.content_type)
        .bind(upload.size)
        .bind(user.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(file)
    }

    /// Attachments of a visible record, newest first.
    pub async fn list_for_record(&self, scope: DepartmentScope, record_id: i64) -> Result<Vec<RecordFileView>, FileError> {
        if self.records.find_scoped(scope, record_id).await?.is_none() {
            return Err(RecordError::NotFound.into());
        }
        self.files_of(record_id).await
    }

    /// Attachments of a record the caller already holds.
    pub async fn files_of(&self, record_id: i64) -> Result<Vec<RecordFileView>, FileError> {
        let files = sqlx::query_as::<_, RecordFileView>(
            "SELECT f.*, u.full_name AS uploaded_by_name
             FROM record_files f
             LEFT JOIN users u ON f.uploaded_by_user_id = u.id
             WHERE f.record_id = $1
             ORDER BY f.uploaded_at DESC, f.id DESC",
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    // Attachments of deleted records stay reachable to Administrators only
    async fn find(&self, scope: DepartmentScope, id: i64) -> Result<RecordFile, FileError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT f.* FROM record_files f LEFT JOIN records r ON r.id = f.record_id WHERE f.id = ",
        );
        qb.push_bind(id);
        scope.push_condition(&mut qb, "r.department_id");
        qb.build_query_as::<RecordFile>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(FileError::Vault(VaultError::Missing))
    }

    pub async fn open(&self, scope: DepartmentScope, id: i64) -> Result<(RecordFile, File, u64), FileError> {
        let meta = self.find(scope, id).await?;
        let (file, len) = self.vault.open(&meta.file_path).await?;
        Ok((meta, file, len))
    }

    /// Remove the bytes and the row. A file already gone from disk is logged
    /// and the row is deleted anyway; a path outside the root aborts.
    pub async fn delete(&self, user: &AuthUser, scope: DepartmentScope, id: i64) -> Result<(), FileError> {
        let meta = self.find(scope, id).await?;

        match self.vault.remove(&meta.file_path).await {
            Ok(()) => {}
            Err(VaultError::OutsideRoot(path)) => return Err(VaultError::OutsideRoot(path).into()),
            Err(e) => tracing::warn!("Failed to delete file from filesystem {}: {}", meta.file_path, e),
        }

        sqlx::query("DELETE FROM record_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!("File {} deleted by user {}", id, user.user_id);
        Ok(())
    }
}
