use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum file size fed to a parser (100 MB)
/// This prevents DoS attacks via excessively large files
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validates that a path is not a symbolic link
///
/// # Security
/// This function uses `symlink_metadata()` instead of `metadata()` to ensure
/// we check the symlink itself, not the target it points to.
///
/// # Errors
/// Returns an error if the path is a symbolic link or if metadata cannot be read
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, {} operations on symbolic links are not allowed.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Checks whether a file is small enough to be handed to a parser.
pub fn within_size_limit(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.len() <= MAX_FILE_SIZE,
        Err(_) => false,
    }
}
