//! Physical storage for uploaded images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Upper bound for any single uploaded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// URL prefix every stored file is published under.
pub const PUBLIC_PREFIX: &str = "/uploads/";

pub const PRODUCT_IMAGE_DIR: &str = "product-images";
pub const STORE_AVATAR_DIR: &str = "store-avatar";
pub const STORE_BANNER_DIR: &str = "store-banner";
pub const ARTICLE_IMAGE_DIR: &str = "images";

/// A file received in a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    fn validate(&self, file: &UploadFile, max_bytes: usize) -> AppResult<()>;

    /// Persists the file under `directory` and returns its public path.
    async fn store(&self, file: &UploadFile, directory: &str) -> AppResult<String>;

    /// Removes the file behind a public path. A missing file is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;
}

/// Checks size and extension of an image upload.
pub fn validate_image(file: &UploadFile, max_bytes: usize) -> AppResult<()> {
    if file.size() > max_bytes {
        return Err(AppError::validation(format!(
            "file {} exceeds the {max_bytes} byte limit",
            file.file_name
        )));
    }

    match file.extension() {
        Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::validation(format!(
            "file {} has an unsupported type, only JPG, JPEG, PNG, GIF and WEBP are allowed",
            file.file_name
        ))),
    }
}

/// True when `path` looks like something this storage handed out.
pub fn is_public_upload_path(path: &str) -> bool {
    path.starts_with(PUBLIC_PREFIX)
}

/// Stores files below a root directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a public path back to a location under the root, refusing
    /// anything that would escape it.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .unwrap_or_else(|| public_path.trim_start_matches('/'));
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    fn validate(&self, file: &UploadFile, max_bytes: usize) -> AppResult<()> {
        validate_image(file, max_bytes)
    }

    async fn store(&self, file: &UploadFile, directory: &str) -> AppResult<String> {
        let dir = self.root.join(directory);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::internal(format!("failed to create upload directory: {e}")))?;

        let file_name = match file.extension() {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        fs::write(dir.join(&file_name), &file.bytes)
            .await
            .map_err(|e| AppError::internal(format!("failed to save file: {e}")))?;

        Ok(format!("{PUBLIC_PREFIX}{directory}/{file_name}"))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        if path.is_empty() {
            return Ok(());
        }
        let Some(target) = self.resolve(path) else {
            return Err(AppError::validation(format!("invalid file path {path}")));
        };
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::internal(format!(
                "failed to delete {}: {e}",
                target.display()
            ))),
        }
    }
}

/// Best-effort removal of files, used for compensation and cleanup.
pub async fn discard_files<S: FileStorage + ?Sized>(storage: &S, paths: &[String]) {
    for path in paths {
        if let Err(err) = storage.delete(path).await {
            tracing::warn!(path = %path, error = %err, "failed to remove stored file");
        }
    }
}
