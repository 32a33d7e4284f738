use std::ffi::OsStr;
use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

struct ParsedRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl ParsedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Spawn a small tasks API: password login, a two-step OTP login, and
/// bearer-protected task routes.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_api_server() -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

/// An address nothing listens on.
///
/// # Errors
///
/// Returns an error if a probe listener cannot be bound.
pub fn closed_port_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

fn handle_client(mut stream: TcpStream) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let (status, body) = route(&request);
    let reason = match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn read_request(stream: &mut TcpStream) -> Option<ParsedRequest> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 1024];
    let head_end = loop {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            return None;
        }
        data.extend_from_slice(buffer.get(..read)?);
        if let Some(pos) = data.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(data.get(..head_end)?).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(0);
    let body_start = head_end.checked_add(4)?;
    let mut body = data.get(body_start..)?.to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(buffer.get(..read)?);
    }

    Some(ParsedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn route(request: &ParsedRequest) -> (u16, String) {
    let authorized = request.header("Authorization") == Some("Bearer tok-1")
        || request.header("Authorization") == Some("Bearer tok-2");
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/auth/login") if request.body.contains("\"password\":\"pw\"") => (
            200,
            r#"{"data":{"accessToken":"tok-1"}}"#.to_owned(),
        ),
        ("POST", "/auth/login") => (401, r#"{"error":"bad credentials"}"#.to_owned()),
        ("POST", "/auth/otp") => (200, r#"{"data":{"sessionId":"s-77"}}"#.to_owned()),
        ("POST", "/auth/verify") if request.body.contains("\"sessionId\":\"s-77\"") => (
            200,
            r#"{"data":{"accessToken":"tok-2"}}"#.to_owned(),
        ),
        ("POST", "/auth/verify") => (400, r#"{"error":"unknown session"}"#.to_owned()),
        (_, _) if !authorized => (401, r#"{"error":"missing token"}"#.to_owned()),
        ("POST", "/api/tasks") => (201, r#"{"data":{"id":42}}"#.to_owned()),
        ("GET", "/api/tasks/42") => (200, r#"{"data":{"id":42,"title":"Load test"}}"#.to_owned()),
        ("GET", path) if path.starts_with("/api/tasks?") => (200, r#"{"data":[]}"#.to_owned()),
        ("DELETE", "/api/tasks/42") => (200, "{}".to_owned()),
        _ => (404, r#"{"error":"not found"}"#.to_owned()),
    }
}

pub fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// Run the `loadflow` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_loadflow<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = loadflow_bin()?;
    Command::new(bin)
        .args(args)
        .env("LOADFLOW_LOG", "info")
        .output()
        .map_err(|err| format!("run loadflow failed: {}", err))
}

fn loadflow_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_loadflow").map_or_else(
        || Err("CARGO_BIN_EXE_loadflow missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
