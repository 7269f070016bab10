//! Integration tests for graceful shutdown of `rafiq serve`.

#![cfg(unix)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

fn rafiq_binary() -> std::path::PathBuf {
    assert_cmd::cargo::cargo_bin!("rafiq").into()
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn_serve(data_dir: &TempDir, port: u16) -> Child {
    Command::new(rafiq_binary())
        .args(["serve", "--bind", &format!("127.0.0.1:{port}")])
        .env("RAFIQ_DATA_DIR", data_dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn rafiq serve")
}

/// Wait until the server accepts connections.
fn wait_for_listen(port: u16) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("server did not start listening on port {port}");
}

/// Minimal HTTP/1.1 request; returns the raw response.
fn http(port: u16, method: &str, path: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nx-user-id: 1\r\n\
         Content-Length: 0\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn sigterm(child: &Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
}

#[test]
fn serve_exits_on_sigterm() {
    let dir = TempDir::new().unwrap();
    let port = free_port();
    let mut child = spawn_serve(&dir, port);
    wait_for_listen(port);

    let health = http(port, "GET", "/api/health");
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");

    sigterm(&child);
    let start = Instant::now();
    let status = child.wait().expect("wait");
    let elapsed = start.elapsed();

    assert!(status.success(), "rafiq serve should exit 0 on SIGTERM, got {status}");
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[test]
fn wal_checkpoint_on_exit() {
    let dir = TempDir::new().unwrap();
    let port = free_port();
    let mut child = spawn_serve(&dir, port);
    wait_for_listen(port);

    let like = http(port, "POST", "/api/likes/1");
    assert!(like.starts_with("HTTP/1.1 200"), "{like}");

    sigterm(&child);
    child.wait().expect("wait");

    let wal = dir.path().join("rafiq.db-wal");
    if wal.exists() {
        let size = std::fs::metadata(&wal).unwrap().len();
        assert_eq!(size, 0, "WAL should be truncated after clean shutdown");
    }

    // The like survived the restart.
    let mut child = spawn_serve(&dir, port);
    wait_for_listen(port);
    let info = http(port, "GET", "/api/likes/1");
    assert!(info.contains(r#""count":1"#), "{info}");
    sigterm(&child);
    child.wait().expect("wait");
}
