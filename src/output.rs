//! Response contract exposed to transport layers.
//!
//! Every conversion resolves to exactly one [`ConversionResult`]: success
//! with a message, output path, and download reference — or failure with an
//! error text. There are no partial or streaming responses, and no variant a
//! transport layer has to special-case. All types here are `Serialize` so an
//! HTTP layer (out of scope for this crate) can render them directly.

use crate::format::DocumentFormat;
use serde::Serialize;
use std::path::PathBuf;

/// A conversion request, constructed by the caller from an already-staged
/// upload.
///
/// The core reads it and nothing more: it never mutates or deletes the input
/// file, and assumes the upload collaborator guaranteed its existence.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Path to the staged input file.
    pub input_path: PathBuf,
    /// Format of the input file, derived upstream from its extension.
    pub input_format: DocumentFormat,
    /// Requested output format.
    pub output_format: DocumentFormat,
    /// Advisory flag carried through from the upload form. No routing
    /// decision consults it; the reference service accepted and ignored it.
    pub preserve_formatting: bool,
}

impl ConversionRequest {
    pub fn new(
        input_path: impl Into<PathBuf>,
        input_format: DocumentFormat,
        output_format: DocumentFormat,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            input_format,
            output_format,
            preserve_formatting: false,
        }
    }

    pub fn preserve_formatting(mut self, v: bool) -> Self {
        self.preserve_formatting = v;
        self
    }
}

/// Terminal outcome of a conversion call.
///
/// The exit code of the external process is deliberately not exposed here;
/// only its diagnostic text is, matching the reference contract. Callers
/// needing the code must work at the [`crate::process::ProcessInvoker`]
/// level.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    pub message: String,
    /// Where the converted artifact was written, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Opaque locator a retrieval collaborator resolves into file bytes.
    /// Not a filesystem path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_reference: Option<String>,
    /// Human-readable failure reason, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    /// A successful conversion from `input` to `output`.
    pub fn succeeded(
        input: DocumentFormat,
        output: DocumentFormat,
        output_path: PathBuf,
        download_reference: String,
    ) -> Self {
        Self {
            success: true,
            message: format!("File converted successfully from {input} to {output}"),
            output_path: Some(output_path),
            download_reference: Some(download_reference),
            error: None,
        }
    }

    /// A failed conversion with the given error text.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: "Conversion failed".to_string(),
            output_path: None,
            download_reference: None,
            error: Some(error.into()),
        }
    }
}

/// Formats the gateway can accept and produce, derived from the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedFormats {
    pub input: Vec<DocumentFormat>,
    pub output: Vec<DocumentFormat>,
}

/// Result of a toolkit health probe.
#[derive(Debug, Clone, Serialize)]
pub struct ToolkitHealth {
    /// Whether the configured interpreter responded to `--version`.
    pub healthy: bool,
    /// The interpreter that was probed.
    pub interpreter: String,
    /// Version string or failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
