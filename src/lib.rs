//! # udf-gateway
//!
//! Conversion orchestration for a document gateway built around the external
//! UDF toolkit: accept a staged DOCX/UDF/PDF file, resolve the requested
//! (input, output) format pair to a toolkit converter, run that converter as
//! an isolated child process, and fold its outcome into a stable
//! [`ConversionResult`] a transport layer can render directly.
//!
//! ## Why subprocess orchestration?
//!
//! The toolkit's converters are opaque scripts — this crate never parses a
//! document itself. Its job is the decision logic around them: which script
//! handles which pair, where the artifact lands, and how success and the
//! several distinct failure classes (unroutable pair, launch failure,
//! non-zero exit) map onto one response contract.
//!
//! ## Flow Overview
//!
//! ```text
//! upload bytes
//!  │
//!  ├─ 1. Stage     validate extension/size, write under a unique name
//!  ├─ 2. Route     (input, output) → toolkit script, or fail fast
//!  ├─ 3. Plan      output path + argument relative to the toolkit root
//!  ├─ 4. Invoke    one child process, streams buffered, awaited
//!  └─ 5. Fold      exit 0 → artifact + download reference; else diagnostic
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use udf_gateway::{
//!     ConversionRequest, DocumentFormat, GatewayConfig, Orchestrator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder()
//!         .toolkit_root("../UDF-Toolkit")
//!         .build()?;
//!     let orchestrator = Orchestrator::new(config);
//!
//!     let request = ConversionRequest::new(
//!         "uploads/report.docx",
//!         DocumentFormat::Docx,
//!         DocumentFormat::Udf,
//!     );
//!     let result = orchestrator.convert(&request).await;
//!     match result.success {
//!         true => println!("artifact at {:?}", result.output_path),
//!         false => eprintln!("failed: {:?}", result.error),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `udfgate` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! udf-gateway = { version = "0.1", default-features = false }
//! ```
//!
//! ## What this crate deliberately does not do
//!
//! No HTTP transport, no multipart parsing, no static file serving, no
//! retries, and no cancellation of a launched converter beyond the optional
//! per-process timeout. A hung converter with no timeout configured holds
//! its request open indefinitely — the reference behavior.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod format;
pub mod orchestrator;
pub mod output;
pub mod process;
pub mod route;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GatewayConfig, GatewayConfigBuilder, DEFAULT_MAX_UPLOAD_SIZE};
pub use error::GatewayError;
pub use format::DocumentFormat;
pub use orchestrator::Orchestrator;
pub use output::{ConversionRequest, ConversionResult, SupportedFormats, ToolkitHealth};
pub use process::{ProcessInvoker, ProcessOutcome, TokioInvoker};
pub use route::{ConversionRoute, RouteTable};
pub use upload::{stage_upload, StagedUpload};
