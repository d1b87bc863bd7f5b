use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use serde_json::Value;
use tempfile::TempDir;

fn temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

fn gpt_command(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gpt"));
    cmd.env("HOME", home.path()).env_remove("OPENAI_API_KEY");
    cmd
}

fn config_dir(home: &TempDir) -> PathBuf {
    home.path().join(".gpt4shell")
}

fn config_file(home: &TempDir) -> PathBuf {
    config_dir(home).join("config.json")
}

fn write_config(home: &TempDir, contents: &str) {
    fs::create_dir_all(config_dir(home)).expect("failed to create config dir");
    fs::write(config_file(home), contents).expect("failed to write config file");
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run gpt binary")
}

#[test]
fn config_example_writes_the_documented_file() {
    let home = temp_home();

    let output = run(gpt_command(&home).arg("--config-example"));

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Example configuration created at"),
        "unexpected stdout: {stdout}"
    );

    let raw = fs::read_to_string(config_file(&home)).expect("config file should exist");
    let parsed: Value = serde_json::from_str(&raw).expect("config should be valid JSON");
    for key in [
        "model",
        "provider",
        "temperature",
        "prompt_template",
        "max_tokens",
        "api_base",
    ] {
        assert!(parsed.get(key).is_some(), "missing key '{key}'");
    }
    assert_eq!(parsed["model"], "gpt-4");
    assert_eq!(parsed["provider"], "openai");
    assert_eq!(parsed["temperature"], 0.7);
}

#[test]
fn config_example_takes_precedence_over_a_question() {
    let home = temp_home();

    let output = run(gpt_command(&home).args(["What is Python?", "--config-example"]));

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(config_file(&home).exists());
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("Example configuration created at")
    );
}

#[test]
fn config_example_overwrites_an_existing_file() {
    let home = temp_home();
    write_config(&home, "stale, not even json");

    let output = run(gpt_command(&home).arg("--config-example"));

    assert!(output.status.success());
    let raw = fs::read_to_string(config_file(&home)).expect("config file should exist");
    let parsed: Value = serde_json::from_str(&raw).expect("config should be valid JSON");
    assert_eq!(parsed["model"], "gpt-4");
}

#[test]
fn missing_question_fails_with_usage_error_and_no_config_io() {
    let home = temp_home();

    let output = run(&mut gpt_command(&home));

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
    assert!(stderr.contains("error"), "unexpected stderr: {stderr}");
    assert!(stderr.contains("question"), "unexpected stderr: {stderr}");
    assert!(
        !config_dir(&home).exists(),
        "usage error should not touch the config directory"
    );
}

#[test]
fn help_describes_the_question_and_flag() {
    let home = temp_home();

    let output = run(gpt_command(&home).arg("--help"));

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ask a question"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("--config-example"), "unexpected stdout: {stdout}");
}

#[test]
fn unsupported_provider_fails_before_any_network_call() {
    let home = temp_home();
    write_config(&home, r#"{"provider": "unsupported_x"}"#);

    let output = run(gpt_command(&home).arg("hi"));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unsupported provider: unsupported_x"),
        "unexpected stderr: {stderr}"
    );
    assert!(stderr.contains("openai"), "unexpected stderr: {stderr}");
}

#[test]
fn missing_api_key_names_the_environment_variable() {
    let home = temp_home();

    let output = run(gpt_command(&home).arg("hi"));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("OPENAI_API_KEY"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn answers_a_question_through_a_local_model_endpoint() {
    let home = temp_home();
    let (addr, peer) = spawn_completion_peer(
        r#"{"choices":[{"message":{"role":"assistant","content":"Python is a programming language."}}]}"#,
    );
    write_config(&home, &format!(r#"{{"api_base": "http://{addr}"}}"#));

    let output = run(gpt_command(&home)
        .arg("What is Python?")
        .env("OPENAI_API_KEY", "test-key"));

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "Python is a programming language."
    );

    let request = peer.join().expect("peer thread should join");
    let request = String::from_utf8_lossy(&request).to_string();
    assert!(
        request.starts_with("POST /chat/completions"),
        "unexpected request: {request}"
    );
    assert!(
        request.to_lowercase().contains("authorization: bearer test-key"),
        "unexpected request: {request}"
    );
    assert!(request.contains("gpt-3.5-turbo"), "unexpected request: {request}");
    assert!(
        request.contains("Answer the question from the user in simple terms:\\nWhat is Python?"),
        "request should carry the rendered default prompt: {request}"
    );
}

// Single-use chat-completions peer: accepts one connection, captures the
// request, answers with the canned body.
fn spawn_completion_peer(body: &'static str) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        let request = read_http_request(&mut stream);
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .expect("write should succeed");
        stream.flush().ok();
        request
    });

    (addr, handle)
}

fn read_http_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        if let Some(body_start) = header_end(&request) {
            let content_length = content_length(&request[..body_start]);
            if request.len() >= body_start + content_length {
                return request;
            }
        }

        let read = stream.read(&mut chunk).expect("read should succeed");
        if read == 0 {
            return request;
        }
        request.extend_from_slice(&chunk[..read]);
    }
}

fn header_end(request: &[u8]) -> Option<usize> {
    request
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn content_length(headers: &[u8]) -> usize {
    String::from_utf8_lossy(headers)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}
