//! End-to-end tests of the `reportflow` binary against a mock executor.

use assert_cmd::Command;
use mockito::Server;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary, run from an empty directory so no project config is read.
fn reportflow(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reportflow").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("REPORTFLOW_API_URL")
        .env_remove("REPORTFLOW_TICK_MS")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    reportflow(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("tui"));
}

#[test]
fn test_list_prints_workflows() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let _m = server
        .mock("GET", "/workflows")
        .with_status(200)
        .with_body(r#"[{"id_evaluation": 4, "pipeline": "Informe 4B", "input": "EXCEL", "output": "PDF"}]"#)
        .create();

    reportflow(&dir)
        .args(["--api-url", &server.url(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Informe 4B"))
        .stdout(predicate::str::contains("EXCEL"));

    reportflow(&dir)
        .args(["--api-url", &server.url(), "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id_evaluation": "4""#));
}

#[test]
fn test_run_all_prints_artifacts() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let _config = server
        .mock("GET", "/workflows/4/config")
        .with_status(200)
        .with_body(r#"{"pipeline": [{"step": "InitRun", "params": {}}, {"step": "RenderReport", "params": {}}]}"#)
        .create();
    let run = server
        .mock("POST", "/workflows/4/run")
        .with_status(200)
        .with_body(r#"{"status": "success", "artifacts": ["report.pdf"]}"#)
        .expect(1)
        .create();
    let reset = server
        .mock("POST", "/workflows/4/reset")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();

    reportflow(&dir)
        .args(["--api-url", &server.url(), "run", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline finished"))
        .stdout(predicate::str::contains("report.pdf"));

    run.assert();
    reset.assert();
}

#[test]
fn test_run_failure_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let _config = server
        .mock("GET", "/workflows/4/config")
        .with_status(200)
        .with_body(r#"{"pipeline": [{"step": "InitRun", "params": {}}]}"#)
        .create();
    let _run = server
        .mock("POST", "/workflows/4/run")
        .with_status(200)
        .with_body(r#"{"status": "error", "message": "boom"}"#)
        .create();
    let _reset = server
        .mock("POST", "/workflows/4/reset")
        .with_status(200)
        .create();

    reportflow(&dir)
        .args(["--api-url", &server.url(), "run", "4"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn test_run_requires_files_for_file_request_step() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let _config = server
        .mock("GET", "/workflows/9/config")
        .with_status(200)
        .with_body(
            r#"{"pipeline": [
                {"step": "RequestUserFiles", "params": {"file_specs": [{"id": "notas", "label": "Notas"}]}},
                {"step": "RunExcelETL", "params": {}}
            ]}"#,
        )
        .create();
    let run = server.mock("POST", "/workflows/9/run").expect(0).create();
    let _reset = server
        .mock("POST", "/workflows/9/reset")
        .with_status(200)
        .create();

    reportflow(&dir)
        .args(["--api-url", &server.url(), "run", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Notas"));

    let data = dir.path().join("notas.xlsx");
    std::fs::write(&data, "x").unwrap();
    reportflow(&dir)
        .args(["--api-url", &server.url(), "run", "9", "--file"])
        .arg(format!("otro={}", data.display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown file slot"));

    run.assert();
}

#[test]
fn test_malformed_file_assignment_fails_before_network() {
    let dir = TempDir::new().unwrap();
    reportflow(&dir)
        .args(["--api-url", "http://127.0.0.1:9", "run", "4", "--file", "no-equals"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<spec>=<path>"));
}

#[test]
fn test_invalid_api_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    reportflow(&dir)
        .args(["--api-url", "ftp://executor", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http(s) URL"));
}
