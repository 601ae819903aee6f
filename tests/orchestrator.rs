//! Integration tests for the conversion orchestrator.
//!
//! Two layers:
//! * a recording stub invoker proves the routing / path-derivation / result
//!   folding contract without python or the toolkit installed;
//! * Unix-gated end-to-end tests run the real `TokioInvoker` against a
//!   shell-script toolkit fixture in a temp directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use udf_gateway::{
    ConversionRequest, DocumentFormat, GatewayConfig, Orchestrator, ProcessInvoker,
    ProcessOutcome, RouteTable,
};

// ── Recording stub invoker ───────────────────────────────────────────────────

/// One observed call to the stub invoker.
#[derive(Debug, Clone)]
struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    cwd: PathBuf,
}

/// Spy invoker: records every call and replays a canned outcome.
struct StubInvoker {
    outcome: ProcessOutcome,
    calls: Mutex<Vec<Invocation>>,
}

impl StubInvoker {
    fn returning(outcome: ProcessOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn exit(code: i32) -> Arc<Self> {
        Self::returning(ProcessOutcome {
            exit_code: Some(code),
            ..Default::default()
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessInvoker for StubInvoker {
    async fn run(&self, program: &Path, args: &[String], cwd: &Path) -> ProcessOutcome {
        self.calls.lock().unwrap().push(Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });
        self.outcome.clone()
    }
}

fn test_config() -> GatewayConfig {
    GatewayConfig::builder()
        .toolkit_root("/srv/toolkit")
        .interpreter_path("python3")
        .upload_dir("/srv/uploads")
        .build()
        .unwrap()
}

fn orchestrator_with(stub: Arc<StubInvoker>) -> Orchestrator {
    Orchestrator::with_parts(test_config(), RouteTable::standard(), stub)
}

// ── Routing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_pairs_fail_without_spawning() {
    use DocumentFormat::*;
    let unsupported = [
        (Docx, Docx),
        (Docx, Pdf),
        (Udf, Udf),
        (Pdf, Docx),
        (Pdf, Udf),
        (Pdf, Pdf),
    ];

    for (input, output) in unsupported {
        let stub = StubInvoker::exit(0);
        let orchestrator = orchestrator_with(stub.clone());
        let request = ConversionRequest::new("/srv/uploads/report.any", input, output);

        let result = orchestrator.convert(&request).await;

        assert!(!result.success, "{input}->{output} should fail");
        assert!(result.error.is_some(), "{input}->{output} should carry an error");
        assert_eq!(
            stub.call_count(),
            0,
            "{input}->{output} must never reach the invoker"
        );
    }
}

#[tokio::test]
async fn docx_to_pdf_names_the_docx_restriction() {
    let stub = StubInvoker::exit(0);
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/report.docx",
        DocumentFormat::Docx,
        DocumentFormat::Pdf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("DOCX can only be converted to UDF"));
}

#[tokio::test]
async fn udf_to_udf_names_the_udf_restriction() {
    let stub = StubInvoker::exit(0);
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/karar.udf",
        DocumentFormat::Udf,
        DocumentFormat::Udf,
    );

    let result = orchestrator.convert(&request).await;

    assert_eq!(result.error.as_deref(), Some("UDF can be converted to DOCX or PDF"));
}

// ── Successful conversions ───────────────────────────────────────────────────

#[tokio::test]
async fn docx_to_udf_resolves_route_and_derives_paths() {
    let stub = StubInvoker::exit(0);
    let orchestrator = orchestrator_with(stub.clone());
    let request = ConversionRequest::new(
        "/srv/toolkit/report.docx",
        DocumentFormat::Docx,
        DocumentFormat::Udf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.message, "File converted successfully from docx to udf");
    assert_eq!(result.output_path, Some(PathBuf::from("/srv/toolkit/report.udf")));
    assert_eq!(
        result.download_reference.as_deref(),
        Some("/api/udf/download/report.udf")
    );

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, PathBuf::from("python3"));
    assert_eq!(calls[0].cwd, PathBuf::from("/srv/toolkit"));
    assert_eq!(calls[0].args[0], "/srv/toolkit/docx_to_udf.py");
    // Input sits in the toolkit root, so the relative argument is bare.
    assert_eq!(calls[0].args[1], "report.docx");
}

#[tokio::test]
async fn udf_to_pdf_never_considers_docx_route() {
    let stub = StubInvoker::exit(0);
    let orchestrator = orchestrator_with(stub.clone());
    let request = ConversionRequest::new(
        "/srv/toolkit/report.udf",
        DocumentFormat::Udf,
        DocumentFormat::Pdf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(result.success);
    assert_eq!(result.output_path, Some(PathBuf::from("/srv/toolkit/report.pdf")));

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args[0], "/srv/toolkit/udf_to_pdf.py");
    assert_eq!(calls[0].args[1], "report.udf");
}

#[tokio::test]
async fn input_outside_toolkit_root_gets_relative_argument() {
    let stub = StubInvoker::exit(0);
    let orchestrator = orchestrator_with(stub.clone());
    let request = ConversionRequest::new(
        "/srv/uploads/report-1712-42.docx",
        DocumentFormat::Docx,
        DocumentFormat::Udf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(result.success);
    assert_eq!(
        result.output_path,
        Some(PathBuf::from("/srv/uploads/report-1712-42.udf"))
    );
    // Relative to /srv/toolkit, the upload dir is a sibling.
    assert_eq!(
        PathBuf::from(&stub.calls()[0].args[1]),
        PathBuf::from("../uploads/report-1712-42.docx")
    );
}

#[tokio::test]
async fn default_relative_paths_resolve_against_working_directory() {
    // The stock deployment leaves every path relative: toolkit root
    // ../UDF-Toolkit, uploads under ./uploads. Routing must still work —
    // both sides get anchored to the process working directory before the
    // child's input argument is computed.
    let stub = StubInvoker::exit(0);
    let orchestrator =
        Orchestrator::with_parts(GatewayConfig::default(), RouteTable::standard(), stub.clone());
    let request = ConversionRequest::new(
        "uploads/report.docx",
        DocumentFormat::Docx,
        DocumentFormat::Udf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.output_path, Some(PathBuf::from("uploads/report.udf")));

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    // The child runs in the resolved toolkit root, not the raw ../UDF-Toolkit.
    assert!(calls[0].cwd.is_absolute(), "cwd: {:?}", calls[0].cwd);
    assert!(calls[0].cwd.ends_with("UDF-Toolkit"), "cwd: {:?}", calls[0].cwd);
    assert!(calls[0].args[0].ends_with("docx_to_udf.py"), "args: {:?}", calls[0].args);

    let relative_input = PathBuf::from(&calls[0].args[1]);
    assert!(relative_input.is_relative());
    assert!(relative_input.starts_with(".."), "arg: {relative_input:?}");
    assert!(
        relative_input.ends_with("uploads/report.docx"),
        "arg: {relative_input:?}"
    );
}

#[tokio::test]
async fn identical_requests_derive_identical_output_paths() {
    let stub = StubInvoker::exit(0);
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/report.udf",
        DocumentFormat::Udf,
        DocumentFormat::Docx,
    );

    let first = orchestrator.convert(&request).await;
    let second = orchestrator.convert(&request).await;

    assert_eq!(first.output_path, second.output_path);
    assert_eq!(first.download_reference, second.download_reference);
}

#[tokio::test]
async fn preserve_formatting_flag_changes_nothing() {
    let plain = StubInvoker::exit(0);
    let flagged = StubInvoker::exit(0);

    let result_plain = orchestrator_with(plain.clone())
        .convert(&ConversionRequest::new(
            "/srv/uploads/report.docx",
            DocumentFormat::Docx,
            DocumentFormat::Udf,
        ))
        .await;
    let result_flagged = orchestrator_with(flagged.clone())
        .convert(
            &ConversionRequest::new(
                "/srv/uploads/report.docx",
                DocumentFormat::Docx,
                DocumentFormat::Udf,
            )
            .preserve_formatting(true),
        )
        .await;

    assert_eq!(result_plain.output_path, result_flagged.output_path);
    assert_eq!(plain.calls()[0].args, flagged.calls()[0].args);
}

// ── Failure folding ──────────────────────────────────────────────────────────

#[tokio::test]
async fn nonzero_exit_surfaces_stderr() {
    let stub = StubInvoker::returning(ProcessOutcome {
        exit_code: Some(1),
        stdout: "progress noise".into(),
        stderr: "boom".into(),
        launch_error: None,
    });
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/report.docx",
        DocumentFormat::Docx,
        DocumentFormat::Udf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("boom"));
    assert!(result.output_path.is_none());
    assert!(result.download_reference.is_none());
}

#[tokio::test]
async fn nonzero_exit_falls_back_to_stdout() {
    let stub = StubInvoker::returning(ProcessOutcome {
        exit_code: Some(1),
        stdout: "log line".into(),
        stderr: String::new(),
        launch_error: None,
    });
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/report.udf",
        DocumentFormat::Udf,
        DocumentFormat::Pdf,
    );

    let result = orchestrator.convert(&request).await;

    assert_eq!(result.error.as_deref(), Some("log line"));
}

#[tokio::test]
async fn silent_nonzero_exit_reports_the_code() {
    let stub = StubInvoker::exit(7);
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/report.udf",
        DocumentFormat::Udf,
        DocumentFormat::Docx,
    );

    let result = orchestrator.convert(&request).await;

    assert_eq!(result.error.as_deref(), Some("Process exited with code 7"));
}

#[tokio::test]
async fn launch_failure_reports_reason_and_program() {
    let stub = StubInvoker::returning(ProcessOutcome {
        exit_code: None,
        stdout: String::new(),
        stderr: String::new(),
        launch_error: Some("No such file or directory (os error 2)".into()),
    });
    let orchestrator = orchestrator_with(stub);
    let request = ConversionRequest::new(
        "/srv/uploads/report.docx",
        DocumentFormat::Docx,
        DocumentFormat::Udf,
    );

    let result = orchestrator.convert(&request).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("No such file or directory"), "got: {error}");
    assert!(error.contains("python3"), "got: {error}");
}

// ── Alternate route tables ───────────────────────────────────────────────────

#[tokio::test]
async fn injected_route_table_overrides_standard_routes() {
    use udf_gateway::ConversionRoute;

    let mut routes = RouteTable::empty();
    routes.insert(
        DocumentFormat::Pdf,
        DocumentFormat::Udf,
        ConversionRoute::new("pdf_to_udf_experimental.py"),
    );

    let stub = StubInvoker::exit(0);
    let orchestrator = Orchestrator::with_parts(test_config(), routes, stub.clone());

    // The experimental pair now routes…
    let result = orchestrator
        .convert(&ConversionRequest::new(
            "/srv/uploads/scan.pdf",
            DocumentFormat::Pdf,
            DocumentFormat::Udf,
        ))
        .await;
    assert!(result.success);
    assert_eq!(stub.calls()[0].args[0], "/srv/toolkit/pdf_to_udf_experimental.py");

    // …and the standard ones are gone.
    let gone = orchestrator
        .convert(&ConversionRequest::new(
            "/srv/uploads/report.docx",
            DocumentFormat::Docx,
            DocumentFormat::Udf,
        ))
        .await;
    assert!(!gone.success);
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn supported_formats_follow_injected_table() {
    let orchestrator = orchestrator_with(StubInvoker::exit(0));
    let formats = orchestrator.supported_formats();
    assert_eq!(formats.input, vec![DocumentFormat::Docx, DocumentFormat::Udf]);
    assert_eq!(
        formats.output,
        vec![DocumentFormat::Docx, DocumentFormat::Pdf, DocumentFormat::Udf]
    );
}

// ── End-to-end with a real toolkit fixture (Unix only) ───────────────────────

#[cfg(unix)]
mod e2e {
    use super::*;

    /// Build a fake toolkit: shell scripts with the toolkit's entry-point
    /// names that copy their input to the derived output path, launched via
    /// `/bin/sh` standing in for the python interpreter.
    fn fake_toolkit(dir: &Path, behavior: &str) {
        for script in ["docx_to_udf.py", "udf_to_docx.py", "udf_to_pdf.py"] {
            std::fs::write(dir.join(script), behavior).unwrap();
        }
    }

    fn e2e_config(toolkit: &Path, uploads: &Path) -> GatewayConfig {
        GatewayConfig::builder()
            .toolkit_root(toolkit)
            .interpreter_path("/bin/sh")
            .upload_dir(uploads)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn converts_a_real_file_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let toolkit = root.path().join("toolkit");
        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&toolkit).unwrap();
        std::fs::create_dir_all(&uploads).unwrap();

        // Copies the input to the same path with a .udf extension, like the
        // real converters do.
        fake_toolkit(
            &toolkit,
            "#!/bin/sh\nout=\"${1%.*}.udf\"\ncp \"$1\" \"$out\"\n",
        );

        let input = uploads.join("report.docx");
        std::fs::write(&input, b"fake docx body").unwrap();

        let orchestrator = Orchestrator::new(e2e_config(&toolkit, &uploads));
        let request =
            ConversionRequest::new(&input, DocumentFormat::Docx, DocumentFormat::Udf);

        let result = orchestrator.convert(&request).await;

        assert!(result.success, "error: {:?}", result.error);
        let output = result.output_path.unwrap();
        assert_eq!(output, uploads.join("report.udf"));
        assert_eq!(std::fs::read(&output).unwrap(), b"fake docx body");
        assert_eq!(
            result.download_reference.as_deref(),
            Some("/api/udf/download/report.udf")
        );
    }

    #[tokio::test]
    async fn failing_converter_surfaces_its_stderr() {
        let root = tempfile::tempdir().unwrap();
        let toolkit = root.path().join("toolkit");
        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&toolkit).unwrap();
        std::fs::create_dir_all(&uploads).unwrap();

        fake_toolkit(&toolkit, "#!/bin/sh\necho 'corrupt document' 1>&2\nexit 2\n");

        let input = uploads.join("report.udf");
        std::fs::write(&input, b"not really udf").unwrap();

        let orchestrator = Orchestrator::new(e2e_config(&toolkit, &uploads));
        let request =
            ConversionRequest::new(&input, DocumentFormat::Udf, DocumentFormat::Pdf);

        let result = orchestrator.convert(&request).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("corrupt document"));
    }

    #[tokio::test]
    async fn missing_interpreter_reports_launch_failure() {
        let root = tempfile::tempdir().unwrap();
        let toolkit = root.path().join("toolkit");
        std::fs::create_dir_all(&toolkit).unwrap();
        fake_toolkit(&toolkit, "#!/bin/sh\ntrue\n");

        let config = GatewayConfig::builder()
            .toolkit_root(&toolkit)
            .interpreter_path("/nonexistent/python3")
            .build()
            .unwrap();
        let orchestrator = Orchestrator::new(config);

        let input = toolkit.join("report.docx");
        std::fs::write(&input, b"x").unwrap();
        let request =
            ConversionRequest::new(&input, DocumentFormat::Docx, DocumentFormat::Udf);

        let result = orchestrator.convert(&request).await;

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(
            error.contains("/nonexistent/python3"),
            "launch failure should name the program, got: {error}"
        );
    }

    #[tokio::test]
    async fn configured_timeout_bounds_a_hung_converter() {
        let root = tempfile::tempdir().unwrap();
        let toolkit = root.path().join("toolkit");
        std::fs::create_dir_all(&toolkit).unwrap();
        fake_toolkit(&toolkit, "#!/bin/sh\nsleep 30\n");

        let config = GatewayConfig::builder()
            .toolkit_root(&toolkit)
            .interpreter_path("/bin/sh")
            .process_timeout_secs(1)
            .build()
            .unwrap();
        let orchestrator = Orchestrator::new(config);

        let input = toolkit.join("report.udf");
        std::fs::write(&input, b"x").unwrap();
        let request =
            ConversionRequest::new(&input, DocumentFormat::Udf, DocumentFormat::Pdf);

        let started = std::time::Instant::now();
        let result = orchestrator.convert(&request).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
        assert!(
            started.elapsed() < std::time::Duration::from_secs(10),
            "timeout should fire well before the converter finishes"
        );
    }

    #[tokio::test]
    async fn convert_bytes_stages_then_converts() {
        let root = tempfile::tempdir().unwrap();
        let toolkit = root.path().join("toolkit");
        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&toolkit).unwrap();

        fake_toolkit(
            &toolkit,
            "#!/bin/sh\nout=\"${1%.*}.udf\"\ncp \"$1\" \"$out\"\n",
        );

        let orchestrator = Orchestrator::new(e2e_config(&toolkit, &uploads));
        let result = orchestrator
            .convert_bytes("report.docx", b"docx payload", DocumentFormat::Udf)
            .await;

        assert!(result.success, "error: {:?}", result.error);
        let output = result.output_path.unwrap();
        let name = output.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("report-"), "staged stem kept: {name}");
        assert!(name.ends_with(".udf"), "got: {name}");
        assert_eq!(std::fs::read(&output).unwrap(), b"docx payload");
    }

    #[tokio::test]
    async fn convert_bytes_rejects_disallowed_extension() {
        let root = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(e2e_config(root.path(), &root.path().join("up")));

        let result = orchestrator
            .convert_bytes("payload.exe", b"MZ", DocumentFormat::Udf)
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unsupported file type"));
    }
}
