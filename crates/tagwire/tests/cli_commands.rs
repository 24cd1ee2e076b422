#![cfg(feature = "cli")]

use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tagwire_codec::{Complex, NdArray, Value};
use tagwire_peer::{connect, ValueChannel};

/// A loopback address nobody is listening on right now.
fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("probe bind should succeed");
    let addr = listener
        .local_addr()
        .expect("probe should have an address");
    addr.to_string()
}

fn spawn_cli(args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("tagwire should start")
}

fn wait_for_connect(addr: &str, timeout: Duration) -> ValueChannel<std::net::TcpStream> {
    let start = Instant::now();
    loop {
        match connect(addr) {
            Ok(channel) => return channel,
            Err(err) => {
                if start.elapsed() >= timeout {
                    panic!("connect timeout: {err}");
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn echo_returns_every_value() {
    let addr = free_addr();
    let child = spawn_cli(&["echo", addr.as_str()]);

    let mut channel = wait_for_connect(&addr, Duration::from_secs(3));
    let values = [
        Value::from("Hello World"),
        Value::Int(678_900_786),
        Value::SignedInt(-56),
        Value::Float(34.7),
        Value::Complex(Complex::new(45.0, 9.0)),
        Value::Bool(false),
        Value::from(
            NdArray::from((0..30i64).collect::<Vec<_>>())
                .reshape(vec![5, 6])
                .expect("reshape should succeed"),
        ),
        Value::from(vec![Value::from("hjk"), Value::Int(23), Value::Float(34.7)]),
    ];
    for value in &values {
        channel.send_value(value).expect("value should send");
        let echoed = channel.recv_value().expect("echo should reply");
        assert_eq!(&echoed, value);
    }

    stop(child);
}

#[test]
fn send_wait_prints_echoed_json() {
    let addr = free_addr();
    let child = spawn_cli(&["echo", addr.as_str()]);
    drop(wait_for_connect(&addr, Duration::from_secs(3)));

    let output = Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .args(["--log-level", "error", "--format", "json", "send", addr.as_str()])
        .args(["--json", r#"["hjk", 23, [-56, true]]"#, "--wait"])
        .output()
        .expect("send should run");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let line: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be one json line");
    assert_eq!(line["tag"], "list");
    assert_eq!(line["value"], serde_json::json!(["hjk", 23, [-56, true]]));

    stop(child);
}

#[test]
fn address_can_come_from_environment() {
    let addr = free_addr();
    let child = spawn_cli(&["echo", addr.as_str()]);
    drop(wait_for_connect(&addr, Duration::from_secs(3)));

    let output = Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .env("TAGWIRE_ADDR", &addr)
        .args(["--log-level", "error", "--format", "pretty", "send", "--str", "hi", "--wait"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("tag=str "), "unexpected output: {stdout}");
    assert!(stdout.trim_end().ends_with("value=\"hi\""));

    stop(child);
}

#[test]
fn listen_prints_count_values_then_exits() {
    let addr = free_addr();
    let child = spawn_cli(&["--format", "json", "listen", addr.as_str(), "--count", "2"]);

    let mut channel = wait_for_connect(&addr, Duration::from_secs(3));
    channel
        .send_value(&Value::from("first"))
        .expect("first value should send");
    channel
        .send_value(&Value::from(NdArray::from(vec![1.5f64, 2.5])))
        .expect("second value should send");

    let output = child.wait_with_output().expect("listen should exit");
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["value"], "first");
    assert_eq!(lines[1]["tag"], "ndarray");
    assert_eq!(lines[1]["value"]["data"], serde_json::json!([1.5, 2.5]));
}

#[test]
fn send_wait_times_out_with_124() {
    let addr = free_addr();
    let child = spawn_cli(&["--format", "json", "listen", addr.as_str()]);
    drop(wait_for_connect(&addr, Duration::from_secs(3)));

    let output = Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .args(["--log-level", "error", "send", addr.as_str(), "--int", "6"])
        .args(["--wait", "--wait-timeout", "200ms"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(124));

    stop(child);
}

#[test]
fn negative_int_is_rejected_before_connecting() {
    let output = Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .args(["--log-level", "error", "send", free_addr().as_str(), "--int", "-56"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
}

#[test]
fn refused_connection_is_transport_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .args(["--log-level", "error", "send", free_addr().as_str(), "--str", "x"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn version_extended_lists_tags() {
    let output = Command::new(env!("CARGO_BIN_EXE_tagwire"))
        .args(["version", "--extended"])
        .output()
        .expect("version should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(concat!("version: ", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("tags: bool, bytes, complex, float, int, list, ndarray, sint, str"));
}
