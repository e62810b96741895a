//! Attachment storage on the local filesystem.
//!
//! Every stored path is resolved against the canonical upload root and
//! refused when it lands outside it, whatever the operating system would allow.

use std::path::{Component, Path, PathBuf};

use axum::extract::multipart::Field;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::UploadConfig;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("No file uploaded")]
    NoFile,

    #[error("File type {0} not allowed")]
    DisallowedType(String),

    #[error("File exceeds maximum size of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("File not found")]
    Missing,

    /// Stored path escapes the upload root
    #[error("Path outside upload root: {}", .0.display())]
    OutsideRoot(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A file fully written to the vault, not yet registered in the database
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub original_name: String,
    pub path: PathBuf,
    pub content_type: String,
    pub size: i64,
}

/// An upload in progress. Call `abort` on any failure so the partial file is removed.
pub struct PendingFile {
    upload: StoredUpload,
    file: File,
    limit: usize,
    written: usize,
}

impl PendingFile {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), VaultError> {
        if self.written + chunk.len() > self.limit {
            return Err(VaultError::TooLarge { limit: self.limit });
        }
        self.file.write_all(chunk).await?;
        self.written += chunk.len();
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredUpload, VaultError> {
        self.file.flush().await?;
        self.upload.size = self.written as i64;
        Ok(self.upload)
    }

    pub async fn abort(self) {
        drop(self.file);
        discard(&self.upload.path).await;
    }
}

/// Remove a file written during a request that did not complete.
pub async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::warn!("Failed to clean up uploaded file {}: {}", path.display(), e);
    }
}

#[derive(Debug, Clone)]
pub struct FileVault {
    root: PathBuf,
    max_file_size: usize,
    allowed_types: Vec<String>,
}

impl FileVault {
    /// Create the upload root if needed and pin it to its canonical form.
    pub fn new(config: &UploadConfig) -> Result<Self, VaultError> {
        std::fs::create_dir_all(&config.dir)?;
        let root = std::fs::canonicalize(&config.dir)?;
        Ok(Self {
            root,
            max_file_size: config.max_file_size,
            allowed_types: config.allowed_types.iter().map(|t| t.to_lowercase()).collect(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lowercased extension (with the dot) when it is on the allow-list.
    pub fn check_extension(&self, original_name: &str) -> Result<String, VaultError> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        if ext.is_empty() || !self.allowed_types.contains(&ext) {
            return Err(VaultError::DisallowedType(ext));
        }
        Ok(ext)
    }

    /// Open a fresh file under a generated name.
    pub async fn begin(&self, original_name: &str, content_type: &str) -> Result<PendingFile, VaultError> {
        let original_name = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or(VaultError::NoFile)?
            .to_string();
        let ext = self.check_extension(&original_name)?;

        let path = self.root.join(generated_name(&ext));
        let file = fs::OpenOptions::new().write(true).create_new(true).open(&path).await?;

        Ok(PendingFile {
            upload: StoredUpload {
                original_name,
                path,
                content_type: content_type.to_string(),
                size: 0,
            },
            file,
            limit: self.max_file_size,
            written: 0,
        })
    }

    /// Stream one multipart field to disk.
    pub async fn receive(&self, mut field: Field<'_>) -> Result<StoredUpload, VaultError> {
        let original_name = field.file_name().map(str::to_string).ok_or(VaultError::NoFile)?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut pending = self.begin(&original_name, &content_type).await?;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = pending.write(&chunk).await {
                        pending.abort().await;
                        return Err(e);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    pending.abort().await;
                    return Err(VaultError::Upload(e.body_text()));
                }
            }
        }
        pending.finish().await
    }

    /// Resolve a stored path and confirm it stays under the root.
    pub async fn resolve(&self, stored: &str) -> Result<PathBuf, VaultError> {
        let candidate = Path::new(stored);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let lexical = normalize(&joined);
        if !lexical.starts_with(&self.root) {
            return Err(VaultError::OutsideRoot(lexical));
        }

        // Symlinks inside the root may still point elsewhere
        let resolved = match fs::canonicalize(&lexical).await {
            Ok(real) if real.starts_with(&self.root) => real,
            Ok(real) => return Err(VaultError::OutsideRoot(real)),
            Err(_) => lexical,
        };

        // The root is a directory, never a stored file
        if resolved == self.root {
            return Err(VaultError::Missing);
        }
        Ok(resolved)
    }

    pub async fn open(&self, stored: &str) -> Result<(File, u64), VaultError> {
        let path = self.resolve(stored).await?;
        let file = File::open(&path).await.map_err(not_found_as_missing)?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(VaultError::Missing);
        }
        Ok((file, metadata.len()))
    }

    pub async fn remove(&self, stored: &str) -> Result<(), VaultError> {
        let path = self.resolve(stored).await?;
        match fs::metadata(&path).await {
            Ok(metadata) if !metadata.is_file() => return Err(VaultError::Missing),
            Ok(_) => {}
            Err(e) => return Err(not_found_as_missing(e)),
        }
        fs::remove_file(&path).await.map_err(not_found_as_missing)
    }
}

fn not_found_as_missing(err: std::io::Error) -> VaultError {
    if err.kind() == std::io::ErrorKind::NotFound {
        VaultError::Missing
    } else {
        VaultError::Io(err)
    }
}

/// `<epoch-millis>-<uuid><ext>`
pub fn generated_name(ext: &str) -> String {
    format!(
        "{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        ext
    )
}

// Lexical `..`/`.` folding; never touches the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
