//! Conversion orchestration: route a request, run the converter, fold the
//! outcome.
//!
//! This is the only component with decision logic. It owns an immutable
//! [`RouteTable`], derives the output artifact's path deterministically from
//! the input, launches the bound toolkit script through an injected
//! [`ProcessInvoker`], and translates whatever happens into a
//! [`ConversionResult`] — [`Orchestrator::convert`] never returns `Err`, so
//! every transport layer receives a well-formed value to render.
//!
//! ## Why relative arguments?
//!
//! The toolkit scripts resolve their input against their own working
//! directory, so every child runs with `toolkit_root` as cwd and receives
//! the input path expressed relative to that root, not absolute.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::format::DocumentFormat;
use crate::output::{ConversionRequest, ConversionResult, SupportedFormats, ToolkitHealth};
use crate::process::{ProcessInvoker, TokioInvoker};
use crate::route::RouteTable;
use crate::upload;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Route prefix the retrieval collaborator serves converted artifacts under.
/// Opaque to this crate; combined with the output file's basename to form a
/// download reference.
const DOWNLOAD_ROUTE: &str = "/api/udf/download";

/// Everything needed to launch one converter, computed before any spawn.
#[derive(Debug)]
struct InvocationPlan {
    /// Interpreter arguments: the script's path followed by the input path
    /// relative to the toolkit root.
    args: Vec<String>,
    /// Deterministic output location: input directory, input stem, output
    /// extension.
    output_path: PathBuf,
    /// Absolute toolkit root the child runs in.
    workdir: PathBuf,
}

/// Drives conversions end to end.
///
/// Holds fixed configuration, an immutable route table, and a process
/// invoker. All three are set at construction; the orchestrator itself has
/// no mutable state, so one instance serves any number of concurrent
/// conversions (each awaiting its own child process) without locking.
pub struct Orchestrator {
    config: GatewayConfig,
    routes: RouteTable,
    invoker: Arc<dyn ProcessInvoker>,
}

impl Orchestrator {
    /// Orchestrator with the standard route table and the production
    /// [`TokioInvoker`] (honouring `config.process_timeout_secs`).
    pub fn new(config: GatewayConfig) -> Self {
        let invoker = Arc::new(TokioInvoker::with_timeout(config.process_timeout()));
        Self::with_parts(config, RouteTable::standard(), invoker)
    }

    /// Fully injected constructor: alternate routes and/or invoker.
    /// This is the seam tests use to substitute a recording stub.
    pub fn with_parts(
        config: GatewayConfig,
        routes: RouteTable,
        invoker: Arc<dyn ProcessInvoker>,
    ) -> Self {
        Self {
            config,
            routes,
            invoker,
        }
    }

    /// The injected route table.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Formats this orchestrator can accept and produce.
    pub fn supported_formats(&self) -> SupportedFormats {
        self.routes.supported_formats()
    }

    /// Convert a staged input file to the requested format.
    ///
    /// Exactly one external process is launched per call, and the calling
    /// task suspends until it exits — other conversions proceed
    /// concurrently. No retries; a launched process cannot be cancelled
    /// (only the configured timeout, if any, bounds it).
    ///
    /// All failures fold into the returned [`ConversionResult`]; this
    /// method never panics or returns an error.
    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        info!(
            input = %request.input_path.display(),
            from = %request.input_format,
            to = %request.output_format,
            "starting conversion"
        );

        match self.try_convert(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "conversion failed");
                ConversionResult::failed(e.to_string())
            }
        }
    }

    /// Stage uploaded bytes and convert them in one step.
    ///
    /// Validates the original filename's extension and the byte length
    /// against the configured limits, writes the upload under a
    /// collision-resistant name, infers the input format, then converts.
    pub async fn convert_bytes(
        &self,
        original_name: &str,
        bytes: &[u8],
        output_format: DocumentFormat,
    ) -> ConversionResult {
        let staged = match upload::stage_upload(&self.config, original_name, bytes).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!(error = %e, name = original_name, "upload rejected");
                return ConversionResult::failed(e.to_string());
            }
        };
        let request =
            ConversionRequest::new(staged.path, staged.input_format, output_format);
        self.convert(&request).await
    }

    /// Probe the toolkit's interpreter with `--version`.
    ///
    /// A responsive interpreter is the precondition every route shares; a
    /// failure here is a deployment problem, not a per-request fault.
    pub async fn health(&self) -> ToolkitHealth {
        let interpreter = self.config.interpreter_path.display().to_string();
        let outcome = self
            .invoker
            .run(
                &self.config.interpreter_path,
                &["--version".to_string()],
                &self.config.toolkit_root,
            )
            .await;

        if outcome.succeeded() {
            // python prints its version on stdout or stderr depending on age.
            let version = if outcome.stdout.trim().is_empty() {
                outcome.stderr.trim().to_string()
            } else {
                outcome.stdout.trim().to_string()
            };
            ToolkitHealth {
                healthy: true,
                interpreter,
                detail: (!version.is_empty()).then_some(version),
            }
        } else {
            ToolkitHealth {
                healthy: false,
                interpreter,
                detail: Some(outcome.diagnostic()),
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────────

    async fn try_convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, GatewayError> {
        // Fail fast on unroutable pairs: nothing is spawned for them.
        let plan = self.plan(request)?;
        debug!(args = ?plan.args, "resolved converter invocation");

        let outcome = self
            .invoker
            .run(&self.config.interpreter_path, &plan.args, &plan.workdir)
            .await;

        if let Some(reason) = &outcome.launch_error {
            return Err(GatewayError::LaunchFailure {
                program: self.config.interpreter_path.display().to_string(),
                reason: reason.clone(),
            });
        }
        if !outcome.succeeded() {
            return Err(GatewayError::ConversionFailure {
                diagnostic: outcome.diagnostic(),
            });
        }

        let download_reference = download_reference(&plan.output_path)?;
        info!(
            output = %plan.output_path.display(),
            "conversion succeeded"
        );
        Ok(ConversionResult::succeeded(
            request.input_format,
            request.output_format,
            plan.output_path,
            download_reference,
        ))
    }

    /// Resolve the route and compute paths. Deterministic given the request,
    /// the configuration, and the process working directory.
    fn plan(&self, request: &ConversionRequest) -> Result<InvocationPlan, GatewayError> {
        let route = self
            .routes
            .resolve(request.input_format, request.output_format)
            .ok_or(GatewayError::UnsupportedRoute {
                input: request.input_format,
                output: request.output_format,
            })?;

        let output_path = request
            .input_path
            .with_extension(request.output_format.extension());

        // Anchor both sides before relating them: the default deployment
        // configures a relative root (`../UDF-Toolkit`) and stages uploads
        // under a relative directory, and two relative paths cannot be
        // expressed against each other.
        let toolkit_root = absolutize(&self.config.toolkit_root)?;
        let input_path = absolutize(&request.input_path)?;

        let script_path = toolkit_root.join(&route.script);

        // The child runs with toolkit_root as cwd, so its input argument is
        // expressed relative to that root.
        let relative_input =
            pathdiff::diff_paths(&input_path, &toolkit_root).ok_or_else(|| {
                GatewayError::Internal(format!(
                    "cannot express '{}' relative to toolkit root '{}'",
                    input_path.display(),
                    toolkit_root.display()
                ))
            })?;

        Ok(InvocationPlan {
            args: vec![
                script_path.to_string_lossy().into_owned(),
                relative_input.to_string_lossy().into_owned(),
            ],
            output_path,
            workdir: toolkit_root,
        })
    }
}

/// Resolve `path` against the process working directory and collapse `.`
/// and `..` components lexically, without touching the filesystem.
fn absolutize(path: &Path) -> Result<PathBuf, GatewayError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| {
                GatewayError::Internal(format!("cannot resolve working directory: {e}"))
            })?
            .join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}

/// Build the opaque download locator for an output artifact.
fn download_reference(output_path: &Path) -> Result<String, GatewayError> {
    let name = output_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            GatewayError::Internal(format!(
                "output path '{}' has no usable file name",
                output_path.display()
            ))
        })?;
    Ok(format!("{DOWNLOAD_ROUTE}/{name}"))
}
