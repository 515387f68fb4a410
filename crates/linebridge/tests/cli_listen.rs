#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/linebridge-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn linebridge() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_linebridge"));
    cmd.env_remove("LINEBRIDGE_DEVICE")
        .env_remove("LINEBRIDGE_MAX_LINE_BYTES")
        .arg("--log-level")
        .arg("error");
    cmd
}

fn listen_stdin(extra: &[&str], chunks: &[&[u8]]) -> Output {
    let mut child = linebridge()
        .arg("--format")
        .arg("json")
        .arg("listen")
        .arg("-")
        .args(extra)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("listen should start");

    {
        let mut stdin = child.stdin.take().expect("stdin should be piped");
        for chunk in chunks {
            stdin.write_all(chunk).expect("write to listen stdin");
            stdin.flush().expect("flush listen stdin");
        }
    }

    child.wait_with_output().expect("listen should exit")
}

fn make_fifo(path: &Path) {
    let status = Command::new("mkfifo")
        .arg(path)
        .status()
        .expect("mkfifo should run");
    assert!(status.success(), "mkfifo failed");
}

fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().expect("child status should be readable") {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();
    let _ = child.wait();
    None
}

fn records(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each stdout line is JSON"))
        .collect()
}

#[test]
fn listen_stdin_classifies_chunked_stream() {
    let output = listen_stdin(&[], &[b"12.5\r\nhe", b"llo\r\n-3\r\n", b"\xff\xfe\r\n", b"42"]);
    assert!(output.status.success());

    let records = records(&output);
    assert_eq!(records.len(), 3, "stdout: {records:?}");

    assert_eq!(records[0]["kind"], "value");
    assert_eq!(records[0]["amount"], 12.5);
    assert_eq!(records[0]["source"], "stdin");
    assert_eq!(records[1]["kind"], "message");
    assert_eq!(records[1]["text"], "hello");
    assert_eq!(records[2]["kind"], "value");
    assert_eq!(records[2]["amount"], -3.0);
}

#[test]
fn listen_empty_line_is_an_empty_message() {
    let output = listen_stdin(&[], &[b"\r\n"]);
    assert!(output.status.success());

    let records = records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "message");
    assert_eq!(records[0]["text"], "");
}

#[test]
fn listen_kind_filter_and_count() {
    let output = listen_stdin(
        &["--kinds", "value", "--count", "2"],
        &[b"boot\n1\nready\n2\n3\n"],
    );
    assert!(output.status.success());

    let records = records(&output);
    let amounts: Vec<f64> = records
        .iter()
        .map(|r| r["amount"].as_f64().expect("value record"))
        .collect();
    assert_eq!(amounts, vec![1.0, 2.0]);
}

#[test]
fn listen_lossy_mode_keeps_invalid_lines() {
    let output = listen_stdin(&["--invalid-utf8", "lossy"], &[b"ok\xff\n"]);
    assert!(output.status.success());

    let records = records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["text"], "ok\u{FFFD}");
}

#[test]
fn listen_skips_oversized_lines_when_capped() {
    let output = listen_stdin(
        &["--max-line-bytes", "8"],
        &[b"0123456789abcdef", b"\n7\n", b"temperature=21", b"45\nok\n"],
    );
    assert!(output.status.success());

    let records = records(&output);
    assert_eq!(records.len(), 2, "stdout: {records:?}");
    assert_eq!(records[0]["kind"], "value");
    assert_eq!(records[0]["amount"], 7.0);
    assert_eq!(records[1]["kind"], "message");
    assert_eq!(records[1]["text"], "ok");
}

#[test]
fn listen_stops_on_sigint_while_link_is_idle() {
    let dir = unique_temp_dir("sigint");
    let fifo = dir.join("tap");
    make_fifo(&fifo);

    let mut child = linebridge()
        .arg("listen")
        .arg(&fifo)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("listen should start");

    std::thread::sleep(Duration::from_millis(1000));
    let status = Command::new("kill")
        .arg("-INT")
        .arg(child.id().to_string())
        .status()
        .expect("kill should run");
    assert!(status.success());

    let exit = wait_for_exit(&mut child, Duration::from_secs(5));
    let _ = std::fs::remove_dir_all(&dir);
    let exit = exit.expect("listen should exit after SIGINT");
    assert_eq!(exit.code(), Some(0));
}

#[test]
fn listen_exits_when_stdout_is_closed() {
    let mut child = linebridge()
        .arg("--format")
        .arg("json")
        .arg("listen")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("listen should start");

    drop(child.stdout.take());
    let mut stdin = child.stdin.take().expect("stdin should be piped");
    let _ = stdin.write_all(b"1\n2\n3\n");
    let _ = stdin.flush();

    // stdin stays open: only the output failure can end the run.
    let exit = wait_for_exit(&mut child, Duration::from_secs(5));
    drop(stdin);
    let exit = exit.expect("listen should exit once stdout is gone");
    assert_eq!(exit.code(), Some(1));
}

#[test]
fn listen_reads_capture_file() {
    let dir = unique_temp_dir("capture");
    let capture = dir.join("board.log");
    std::fs::write(&capture, b"21.5\r\nfan on\r\n").expect("capture should be writable");

    let output = linebridge()
        .arg("--format")
        .arg("raw")
        .arg("listen")
        .arg(&capture)
        .output()
        .expect("listen should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "21.5\nfan on\n");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_missing_device_reports_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = linebridge()
        .arg("listen")
        .arg(dir.join("ttyNOPE"))
        .output()
        .expect("listen should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open failed"), "stderr: {stderr}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_writes_terminated_line() {
    let dir = unique_temp_dir("send");
    let target = dir.join("sink");
    std::fs::write(&target, b"").expect("sink should be creatable");

    let status = linebridge()
        .arg("send")
        .arg(&target)
        .arg("--data")
        .arg("RATE 10")
        .arg("--crlf")
        .status()
        .expect("send should run");

    assert!(status.success());
    assert_eq!(std::fs::read(&target).expect("sink readable"), b"RATE 10\r\n");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_rejects_embedded_newline() {
    let dir = unique_temp_dir("send-nl");
    let target = dir.join("sink");
    std::fs::write(&target, b"").expect("sink should be creatable");

    let output = linebridge()
        .arg("send")
        .arg(&target)
        .arg("--data")
        .arg("a\nb")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn doctor_passes_with_dev_null() {
    let output = linebridge()
        .arg("--format")
        .arg("json")
        .arg("doctor")
        .arg("--device")
        .arg("/dev/null")
        .output()
        .expect("doctor should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"overall\":\"pass\""), "stdout: {stdout}");
}

#[test]
fn version_prints_package_version() {
    let output = linebridge()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("linebridge {}", env!("CARGO_PKG_VERSION")));
}
