use std::path::Path;

use tokio::fs;
use uuid::Uuid;

use crate::error::AppError;

/// Reserved picture value meaning "this product has no associated image file".
pub const NO_IMAGE: &str = "no-image";

/// Build a collision-resistant filename that keeps the upload's extension.
///
/// The extension is taken from the client-supplied name but only trusted when
/// it is short and purely alphanumeric; anything else is dropped.
pub fn unique_filename(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

/// Write image bytes under the uploads dir, creating the dir if needed.
pub async fn save_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create uploads dir: {e}")))?;
    fs::write(dir.join(file_name), bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write image '{file_name}': {e}")))?;
    Ok(())
}

/// Best-effort removal of a stored image.
///
/// The sentinel value, names with path separators, and already-missing files
/// are all silently ignored.
pub async fn delete_image(dir: &Path, file_name: &str) {
    if file_name == NO_IMAGE || file_name.contains('/') || file_name.contains('\\') {
        return;
    }

    if let Err(e) = fs::remove_file(dir.join(file_name)).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to delete image '{}': {}", file_name, e);
        }
    }
}
