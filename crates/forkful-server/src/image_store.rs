//! Menu item images on local disk.
//!
//! Files are named by the BLAKE3 hash of their contents plus the original
//! extension, so re-uploading the same picture reuses one file.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::ServerError;

/// URL prefix under which stored images are served back.
pub const PUBLIC_PREFIX: &str = "uploads";

const ALLOWED: [(&str, &str); 4] = [
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Resolve `name` under `base`, refusing anything that would escape it.
fn ensure_within(base: &Path, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(file)), None) => Some(base.join(file)),
        _ => None,
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Content type for an allowed extension.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = extension_of(file_name)?;
    ALLOWED
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, mime)| *mime)
}

/// Result of [`ImageStore::store_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public relative path, `uploads/<hash>.<ext>`.
    pub path: String,
    file_name: String,
    /// False when identical content was already on disk.
    fresh: bool,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
    max_size: usize,
}

impl ImageStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Image store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Validate and write an uploaded image.
    pub async fn store_image(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<StoredImage, ServerError> {
        let ext = extension_of(original_name)
            .filter(|ext| ALLOWED.iter().any(|(allowed, _)| allowed == ext))
            .ok_or_else(|| ServerError::validation("image", "Images only!"))?;

        let mime_ok = content_type
            .map(|ct| ALLOWED.iter().any(|(_, mime)| ct.eq_ignore_ascii_case(mime)))
            .unwrap_or(false);
        if !mime_ok {
            return Err(ServerError::validation("image", "Images only!"));
        }

        if data.is_empty() {
            return Err(ServerError::validation("image", "Image file is empty"));
        }
        if data.len() > self.max_size {
            return Err(ServerError::validation(
                "image",
                format!(
                    "Image is {} bytes, the limit is {} bytes",
                    data.len(),
                    self.max_size
                ),
            ));
        }

        let hash = blake3::hash(data).to_hex();
        let file_name = format!("{}.{ext}", &hash[..32]);
        let path = self.base_path.join(&file_name);

        let fresh = !fs::try_exists(&path).await.unwrap_or(false);
        if fresh {
            fs::write(&path, data).await.map_err(|e| {
                ServerError::Internal(format!("Failed to write image {file_name}: {e}"))
            })?;
        }

        debug!(file = %file_name, size = data.len(), fresh, "Stored menu image");
        Ok(StoredImage {
            path: format!("{PUBLIC_PREFIX}/{file_name}"),
            file_name,
            fresh,
        })
    }

    /// Undo a [`store_image`](Self::store_image) whose record was never
    /// written. Files that existed beforehand may be shared and are kept.
    pub async fn discard(&self, image: &StoredImage) {
        if !image.fresh {
            return;
        }
        let path = self.base_path.join(&image.file_name);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(file = %image.file_name, "Discarded unreferenced image"),
            Err(e) => warn!(file = %image.file_name, error = %e, "Failed to discard image"),
        }
    }

    /// Read a stored image by bare file name, with its content type.
    pub async fn read_image(&self, file_name: &str) -> Result<(Vec<u8>, &'static str), ServerError> {
        let not_found = || ServerError::NotFound("Image not found".to_string());

        let content_type = content_type_for(file_name).ok_or_else(not_found)?;
        let path = ensure_within(&self.base_path, file_name).ok_or_else(not_found)?;

        match fs::read(&path).await {
            Ok(data) => Ok((data, content_type)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(ServerError::Internal(format!(
                "Failed to read image {file_name}: {e}"
            ))),
        }
    }
}
