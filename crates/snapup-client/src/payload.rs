//! The file being uploaded.

use std::path::{Path, PathBuf};

use snapup_core::{SnapError, SnapResult};

/// A validated regular file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub path: PathBuf,
    /// Name the appliance stores the file under.
    pub file_name: String,
    pub size: u64,
}

impl Payload {
    /// Check that `path` is an existing regular file and capture its size.
    pub async fn open(path: &Path) -> SnapResult<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| SnapError::InvalidInput(format!("cannot stat '{}': {e}", path.display())))?;

        if metadata.is_dir() {
            return Err(SnapError::InvalidInput(format!(
                "'{}' is a directory",
                path.display()
            )));
        }
        if !metadata.is_file() {
            return Err(SnapError::InvalidInput(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }

        let file_name = upload_name(path);
        if file_name.is_empty() {
            return Err(SnapError::InvalidInput(format!(
                "'{}' has no usable file name",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
        })
    }
}

/// Base name of `path` with leading `.`, `/`, `\` and `~` removed.
pub fn upload_name(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.trim_start_matches(['.', '/', '\\', '~']).to_string()
}
