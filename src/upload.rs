//! Upload staging: validate and persist incoming document bytes.
//!
//! The transport layer (out of scope) parses the multipart body; this module
//! is where its bytes become a file the orchestrator can convert. Staged
//! names carry a `-{unix_millis}-{random}` suffix so two uploads of
//! `report.docx` never collide, and the derived output paths (same stem, new
//! extension) inherit that uniqueness for free.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::format::DocumentFormat;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// An upload written to the upload directory, ready for conversion.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Where the bytes were written.
    pub path: PathBuf,
    /// Format inferred from the original filename's extension.
    pub input_format: DocumentFormat,
    /// Size in bytes.
    pub size: u64,
}

/// Validate an original filename against the accepted extension set and
/// resolve its format.
pub fn validate_extension(
    config: &GatewayConfig,
    original_name: &str,
) -> Result<DocumentFormat, GatewayError> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if !config.allows_extension(ext) {
        return Err(GatewayError::UnsupportedExtension {
            extension: if ext.is_empty() {
                original_name.to_string()
            } else {
                format!(".{}", ext.to_ascii_lowercase())
            },
        });
    }
    DocumentFormat::from_extension(ext).ok_or_else(|| GatewayError::UnsupportedExtension {
        extension: format!(".{}", ext.to_ascii_lowercase()),
    })
}

/// Validate an upload's size against the configured limit.
pub fn validate_size(config: &GatewayConfig, size: u64) -> Result<(), GatewayError> {
    if size > config.max_upload_size {
        return Err(GatewayError::UploadTooLarge {
            size,
            max: config.max_upload_size,
        });
    }
    Ok(())
}

/// Derive a collision-resistant staged filename from the original:
/// `{stem}-{unix_millis}-{random 0..1e9}{.ext}`.
pub fn unique_filename(original_name: &str) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);

    format!("{stem}-{millis}-{suffix}{ext}")
}

/// Write uploaded bytes into the upload directory under a unique name.
///
/// Validates the extension and size first, and creates the upload directory
/// on demand. Returns the staged path and inferred input format.
pub async fn stage_upload(
    config: &GatewayConfig,
    original_name: &str,
    bytes: &[u8],
) -> Result<StagedUpload, GatewayError> {
    let input_format = validate_extension(config, original_name)?;
    validate_size(config, bytes.len() as u64)?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| GatewayError::UploadWriteFailed {
            path: config.upload_dir.clone(),
            source: e,
        })?;

    let path = config.upload_dir.join(unique_filename(original_name));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| GatewayError::UploadWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    debug!(path = %path.display(), size = bytes.len(), "staged upload");

    Ok(StagedUpload {
        path,
        input_format,
        size: bytes.len() as u64,
    })
}
