//! Error types for the udf-gateway library.
//!
//! Every failure class the orchestration core can hit is a [`GatewayError`]
//! variant. Internal seams (route lookup, upload staging, path computation)
//! propagate it with `?`; [`crate::orchestrator::Orchestrator::convert`]
//! is the recovery boundary that folds any error into a
//! [`crate::output::ConversionResult`] value, so callers at the transport
//! boundary always receive structured data rather than a fault.
//!
//! The taxonomy mirrors how the failures differ operationally:
//!
//! * [`GatewayError::UnsupportedRoute`] — caller asked for a conversion the
//!   toolkit does not ship; detected before any process is spawned.
//! * [`GatewayError::LaunchFailure`] — the interpreter or script could not be
//!   started at all; a configuration problem, not a per-request fault.
//! * [`GatewayError::ConversionFailure`] — the converter ran and exited
//!   non-zero; the diagnostic is whatever the toolkit printed.

use crate::format::DocumentFormat;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the udf-gateway library.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Routing errors ────────────────────────────────────────────────────
    /// The (input, output) pair has no converter in the route table.
    ///
    /// The message names the restriction the way the reference service did,
    /// keyed on the input format.
    #[error("{}", route_restriction(*.input))]
    UnsupportedRoute {
        input: DocumentFormat,
        output: DocumentFormat,
    },

    // ── Process errors ────────────────────────────────────────────────────
    /// The external executable could not be started (missing binary,
    /// permission denied, bad working directory).
    #[error("Failed to start converter process '{program}': {reason}")]
    LaunchFailure { program: String, reason: String },

    /// The converter process ran but exited non-zero.
    ///
    /// `diagnostic` is the captured stderr, falling back to stdout, falling
    /// back to a generic exit-code message.
    #[error("{diagnostic}")]
    ConversionFailure { diagnostic: String },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The uploaded file's extension is not in the accepted set.
    #[error("Unsupported file type: {extension}")]
    UnsupportedExtension { extension: String },

    /// The upload exceeds the configured size limit.
    #[error("File too large: {size} bytes (limit {max} bytes)")]
    UploadTooLarge { size: u64, max: u64 },

    /// Could not stage the upload onto disk.
    #[error("Failed to stage upload '{path}': {source}")]
    UploadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error during path computation or result assembly.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Restriction text for an unroutable pair, keyed on the input format and
/// matching the reference service verbatim.
fn route_restriction(input: DocumentFormat) -> &'static str {
    match input {
        DocumentFormat::Docx => "DOCX can only be converted to UDF",
        DocumentFormat::Udf => "UDF can be converted to DOCX or PDF",
        DocumentFormat::Pdf => "Unsupported input format: pdf",
    }
}
