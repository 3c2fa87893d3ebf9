//! Canned one-shot HTTP server for exercising the live client paths.

use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Client that ignores proxy settings so requests reach the local listener.
pub fn local_client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .expect("failed to build test client")
}

/// Accept one connection, answer it with `status`, and hand back the raw
/// request text once the response is written.
pub async fn serve_once(
    status: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");

    let mut response = format!("HTTP/1.1 {}\r\nconnection: close\r\n", status).into_bytes();
    if !status.starts_with("204") {
        response.extend_from_slice(format!("content-length: {}\r\n", body.len()).as_bytes());
    }
    if let Some(content_type) = content_type {
        response.extend_from_slice(format!("content-type: {}\r\n", content_type).as_bytes());
    }
    response.extend_from_slice(b"\r\n");
    response.extend_from_slice(body);

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("no test connection");
        let request = read_request(&mut stream).await;
        stream
            .write_all(&response)
            .await
            .expect("failed to write test response");
        let _ = stream.shutdown().await;
        request
    });

    (format!("http://{}", addr), handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = stream.read(&mut buf).await.expect("failed to read test request");
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if request_complete(&data) {
            break;
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

fn request_complete(data: &[u8]) -> bool {
    let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
    let body = &data[end + 4..];

    if head.contains("transfer-encoding: chunked") {
        return body.ends_with(b"0\r\n\r\n");
    }
    let expected = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|len| len.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= expected
}
