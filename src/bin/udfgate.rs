//! CLI binary for udf-gateway.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GatewayConfig`, drives one conversion (or a formats/health query), and
//! prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use udf_gateway::{
    ConversionRequest, DocumentFormat, GatewayConfig, Orchestrator,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a Word document to UDF (artifact lands next to the input)
  udfgate uploads/report.docx --to udf

  # Convert UDF to PDF with an explicit toolkit location
  udfgate karar.udf --to pdf --toolkit /opt/UDF-Toolkit

  # Bound a misbehaving converter to five minutes
  udfgate report.docx --to udf --timeout 300

  # Machine-readable result
  udfgate report.udf --to docx --json

  # What can this toolkit do?
  udfgate --formats

  # Is the interpreter reachable?
  udfgate --health

SUPPORTED CONVERSIONS:
  docx → udf
  udf  → docx
  udf  → pdf

ENVIRONMENT VARIABLES:
  UDF_TOOLKIT_PATH   Toolkit root directory (default: ../UDF-Toolkit)
  PYTHON_PATH        Interpreter for toolkit scripts (default: python3)
  UPLOAD_DIR         Upload/artifact directory (default: ./uploads)
"#;

/// Convert DOCX/UDF/PDF documents via the external UDF toolkit.
#[derive(Parser, Debug)]
#[command(
    name = "udfgate",
    version,
    about = "Convert DOCX/UDF/PDF documents via the external UDF toolkit",
    long_about = "Routes a document conversion to the matching UDF-Toolkit script and runs it \
as an isolated child process. The converted artifact is written next to the input file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document (.docx, .udf, or .pdf).
    #[arg(required_unless_present_any = ["formats", "health"])]
    input: Option<PathBuf>,

    /// Target format: docx, udf, or pdf.
    #[arg(short, long, value_enum, required_unless_present_any = ["formats", "health"])]
    to: Option<FormatArg>,

    /// Toolkit root directory (working directory for every converter).
    #[arg(long, env = "UDF_TOOLKIT_PATH", default_value = "../UDF-Toolkit")]
    toolkit: PathBuf,

    /// Interpreter used to launch toolkit scripts.
    #[arg(long, env = "PYTHON_PATH", default_value = "python3")]
    interpreter: PathBuf,

    /// Directory where uploads are staged and artifacts appear.
    #[arg(long, env = "UPLOAD_DIR", default_value = "./uploads")]
    upload_dir: PathBuf,

    /// Kill the converter after this many seconds (unbounded if unset).
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the supported conversions and exit.
    #[arg(long)]
    formats: bool,

    /// Probe the toolkit interpreter and exit.
    #[arg(long)]
    health: bool,

    /// Output structured JSON instead of friendly text.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Docx,
    Udf,
    Pdf,
}

impl From<FormatArg> for DocumentFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Docx => DocumentFormat::Docx,
            FormatArg::Udf => DocumentFormat::Udf,
            FormatArg::Pdf => DocumentFormat::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Config + orchestrator ────────────────────────────────────────────
    let mut builder = GatewayConfig::builder()
        .toolkit_root(&cli.toolkit)
        .interpreter_path(&cli.interpreter)
        .upload_dir(&cli.upload_dir);
    if let Some(secs) = cli.timeout {
        builder = builder.process_timeout_secs(secs);
    }
    let config = builder.build().context("Invalid gateway configuration")?;
    let orchestrator = Orchestrator::new(config);

    // ── Formats mode ─────────────────────────────────────────────────────
    if cli.formats {
        let formats = orchestrator.supported_formats();
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&formats)?);
        } else {
            println!("input:  {}", join_formats(&formats.input));
            println!("output: {}", join_formats(&formats.output));
        }
        return Ok(());
    }

    // ── Health mode ──────────────────────────────────────────────────────
    if cli.health {
        let health = orchestrator.health().await;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&health)?);
        } else if health.healthy {
            println!(
                "{} {} {}",
                green("✔"),
                bold(&health.interpreter),
                dim(health.detail.as_deref().unwrap_or(""))
            );
        } else {
            println!(
                "{} {}: {}",
                red("✘"),
                bold(&health.interpreter),
                health.detail.as_deref().unwrap_or("unavailable")
            );
        }
        std::process::exit(if health.healthy { 0 } else { 1 });
    }

    // ── Convert ──────────────────────────────────────────────────────────
    // Presence enforced by clap's required_unless_present_any.
    let input = cli.input.clone().context("missing input")?;
    let output_format: DocumentFormat = cli.to.context("missing --to")?.into();

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let input_format = DocumentFormat::from_path(&input).with_context(|| {
        format!(
            "Cannot infer a document format from '{}' (expected .docx, .udf, or .pdf)",
            input.display()
        )
    })?;

    let spinner = if cli.quiet || cli.json {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!(
            "Converting {} ({} → {})…",
            input.display(),
            input_format,
            output_format
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    };

    let request = ConversionRequest::new(&input, input_format, output_format);
    let result = orchestrator.convert(&request).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.success {
        println!("{} {}", green("✔"), result.message);
        if let Some(ref path) = result.output_path {
            println!("  {} {}", dim("artifact:"), path.display());
        }
        if let Some(ref reference) = result.download_reference {
            println!("  {} {}", dim("download:"), reference);
        }
    } else {
        eprintln!(
            "{} {}: {}",
            red("✘"),
            result.message,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    std::process::exit(if result.success { 0 } else { 1 });
}

fn join_formats(formats: &[DocumentFormat]) -> String {
    formats
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
