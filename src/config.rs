//! Gateway configuration.
//!
//! Everything the orchestration core needs from its environment lives in
//! [`GatewayConfig`], built via [`GatewayConfigBuilder`] and passed into the
//! orchestrator's constructor. The core performs no hidden process-wide
//! lookups — the CLI (or any embedding server) maps flags and environment
//! variables onto the builder once at startup, and the struct is read-only
//! from then on.
//!
//! # Design choice: builder over constructor
//! Callers usually only care about the toolkit root; everything else has a
//! sensible default matching the reference deployment. The builder lets them
//! set exactly that and validates the rest at `build()`.

use crate::error::GatewayError;
use std::path::PathBuf;
use std::time::Duration;

/// Default maximum accepted upload size: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Configuration for the conversion gateway.
///
/// # Example
/// ```rust
/// use udf_gateway::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .toolkit_root("../UDF-Toolkit")
///     .interpreter_path("python3")
///     .process_timeout_secs(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Root directory of the external converter toolkit. Every converter
    /// process runs with this as its working directory, and script arguments
    /// are expressed relative to it.
    pub toolkit_root: PathBuf,

    /// Interpreter used to launch toolkit scripts. Default: `python3`.
    pub interpreter_path: PathBuf,

    /// Directory where uploads are staged and converted artifacts appear.
    /// Default: `./uploads`.
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes. Default: 50 MiB.
    pub max_upload_size: u64,

    /// Accepted upload extensions, lowercase, without dots.
    /// Default: `pdf`, `docx`, `udf`.
    pub allowed_extensions: Vec<String>,

    /// Optional wall-clock limit for a single converter process.
    ///
    /// `None` (the default) reproduces the reference behavior: a hung
    /// converter holds its request open indefinitely. When set, the child is
    /// killed on expiry and the conversion fails with a timeout diagnostic.
    pub process_timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            toolkit_root: PathBuf::from("../UDF-Toolkit"),
            interpreter_path: PathBuf::from("python3"),
            upload_dir: PathBuf::from("./uploads"),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_extensions: vec!["pdf".into(), "docx".into(), "udf".into()],
            process_timeout_secs: None,
        }
    }
}

impl GatewayConfig {
    /// Create a new builder for `GatewayConfig`.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self::default(),
        }
    }

    /// The process timeout as a [`Duration`], if one is configured.
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_secs.map(Duration::from_secs)
    }

    /// Whether an extension (with or without a leading dot, any case) is in
    /// the accepted set.
    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| *a == ext)
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn toolkit_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.toolkit_root = root.into();
        self
    }

    pub fn interpreter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.interpreter_path = path.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_upload_size(mut self, bytes: u64) -> Self {
        self.config.max_upload_size = bytes;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|s| s.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn process_timeout_secs(mut self, secs: u64) -> Self {
        self.config.process_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GatewayConfig, GatewayError> {
        let c = &self.config;
        if c.toolkit_root.as_os_str().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "toolkit_root must not be empty".into(),
            ));
        }
        if c.interpreter_path.as_os_str().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "interpreter_path must not be empty".into(),
            ));
        }
        if c.max_upload_size == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_upload_size must be greater than zero".into(),
            ));
        }
        if c.allowed_extensions.is_empty() {
            return Err(GatewayError::InvalidConfig(
                "allowed_extensions must not be empty".into(),
            ));
        }
        if c.process_timeout_secs == Some(0) {
            return Err(GatewayError::InvalidConfig(
                "process_timeout_secs must be greater than zero when set".into(),
            ));
        }
        Ok(self.config)
    }
}
