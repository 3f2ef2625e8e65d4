//! Startup tests running the real binary.

use std::io::Write;
use std::net::TcpListener;
use std::process::ExitStatus;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::time::timeout;

/// Find a port nothing is listening on
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

async fn run_worker(config_path: &std::path::Path, db_dir: &std::path::Path) -> ExitStatus {
    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_autosrt-worker"))
        .env("AUTOSRT_CONFIG", config_path)
        .env("AUTOSRT_DATABASE__PATH", db_dir.join("test.db"))
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn worker");

    timeout(Duration::from_secs(20), child.wait())
        .await
        .expect("Worker did not exit")
        .expect("Failed to wait for worker")
}

#[tokio::test]
async fn test_missing_config_file_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_worker(&dir.path().join("absent.toml"), dir.path()).await;
    assert!(!status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        r#"
[compute]
endpoint = "http://localhost:9000"
function_name = "srt-generator"

[workers]
concurrency = 0
"#,
    );

    let status = run_worker(config.path(), dir.path()).await;
    assert!(!status.success());
}

#[tokio::test]
async fn test_unreachable_queue_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let nats_port = get_available_port();
    let config = write_config(&format!(
        r#"
[compute]
endpoint = "http://localhost:9000"
function_name = "srt-generator"

[server]
host = "127.0.0.1"
port = {}

[queue]
url = "nats://127.0.0.1:{}"
connect_timeout_secs = 2
"#,
        get_available_port(),
        nats_port
    ));

    let status = run_worker(config.path(), dir.path()).await;
    assert!(!status.success());
}
