// SPDX-License-Identifier: Apache-2.0

//! Offline workflows: everything here runs without network access or an
//! API credential.

use assert_cmd::Command;
use std::io::{Read, Write};
use std::net::TcpListener;

fn apiverge() -> Command {
    Command::new(env!("CARGO_BIN_EXE_apiverge"))
}

fn spawn_stub(status: u16, hits: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        for _ in 0..hits {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0_u8; 4096];
            let _ = stream.read(&mut buf);
            let reply =
                format!("HTTP/1.1 {status} X\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}");
            let _ = stream.write_all(reply.as_bytes());
        }
    });
    format!("http://{addr}")
}

#[test]
fn contract_command_reports_declared_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let contract = dir.path().join("openapi.json");
    std::fs::write(
        &contract,
        r#"{"openapi":"3.0.0","paths":{"/users":{"get":{}},"/orders":{"post":{}}}}"#,
    )
    .expect("write contract");

    let output = apiverge()
        .args(["--json", "contract", "--source"])
        .arg(&contract)
        .output()
        .expect("run contract");
    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("contract json");
    assert_eq!(payload["path_count"], 2);
    let paths = payload["paths"].as_array().expect("paths");
    assert!(paths.iter().any(|p| p == "/users"));
}

#[test]
fn extract_patterns_only_finds_route_literals() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).expect("mkdir");
    std::fs::write(
        src.join("routes.js"),
        "router.get('/orders', handler);\nrouter.post('/orders', handler);\n",
    )
    .expect("write routes");

    let output = apiverge()
        .args(["--json", "extract", "--patterns-only", "--root"])
        .arg(dir.path())
        .output()
        .expect("run extract");
    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("routes json");
    assert_eq!(payload["pattern_routes"], serde_json::json!(["/orders"]));
    assert_eq!(payload["model_routes"], serde_json::json!([]));
}

#[test]
fn extract_without_credential_fails_as_dependency_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("src")).expect("mkdir");

    let output = apiverge()
        .env_remove("APIVERGE_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .args(["--json", "extract", "--root"])
        .arg(dir.path())
        .output()
        .expect("run extract");
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn execute_replays_persisted_cases_and_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let testcases = dir.path().join("testcases.json");
    std::fs::write(
        &testcases,
        r#"[{"endpoint":"/missing","method":"GET","purpose":"Verify 404",
            "steps":["Send GET request to /missing","Expect status 404 Not Found"]}]"#,
    )
    .expect("write testcases");
    let base_url = spawn_stub(404, 1);

    let output = apiverge()
        .env("APIVERGE_WORKDIR", dir.path())
        .args(["--json", "execute", "--base-url", &base_url, "--testcases"])
        .arg(&testcases)
        .output()
        .expect("run execute");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("execution json");
    assert_eq!(payload["results"][0]["verdict"], "PASS");
    let report_path = payload["report_path"].as_str().expect("report path");
    assert!(std::path::Path::new(report_path).exists());
}

#[test]
fn execute_against_unreachable_server_records_error_verdicts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let testcases = dir.path().join("testcases.json");
    std::fs::write(
        &testcases,
        r#"[{"endpoint":"/a","method":"GET","purpose":"p","steps":["Send GET request to /a"]},
            {"endpoint":"/b","method":"GET","purpose":"p","steps":["Send GET request to /b"]}]"#,
    )
    .expect("write testcases");

    let output = apiverge()
        .env("APIVERGE_WORKDIR", dir.path())
        .args([
            "--json",
            "execute",
            "--base-url",
            "http://127.0.0.1:9",
            "--testcases",
        ])
        .arg(&testcases)
        .output()
        .expect("run execute");
    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("execution json");
    let results = payload["results"].as_array().expect("results");
    assert_eq!(results.len(), 2, "one dead request must not halt the next");
    for result in results {
        assert_eq!(result["verdict"], "ERROR");
        assert!(!result["details"].as_str().expect("details").is_empty());
    }
}
