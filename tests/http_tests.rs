//! HTTP endpoint tests against a throwaway in-process server.

use std::time::Duration;

use narrator_stream::classify::StructuredPolicy;
use narrator_stream::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct Captured {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

async fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&chunk[..n]);

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut req = httparse::Request::new(&mut headers);
        if let httparse::Status::Complete(head_len) = req.parse(&buf).unwrap() {
            let header = |name: &str| {
                req.headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .and_then(|h| std::str::from_utf8(h.value).ok())
                    .map(|v| v.trim().to_string())
            };
            let content_length = header("content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_len + content_length {
                return Captured {
                    method: req.method.unwrap().to_string(),
                    path: req.path.unwrap().to_string(),
                    content_type: header("content-type"),
                    body: buf[head_len..head_len + content_length].to_vec(),
                };
            }
        }
    }
}

/// Serve exactly one connection: capture the request, then write `parts`
/// with a short pause between them so the client sees separate chunks.
async fn serve_once(parts: Vec<Vec<u8>>) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut stream).await;
        for part in parts {
            stream.write_all(&part).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let _ = stream.shutdown().await;
        captured
    });
    (base, handle)
}

fn streaming_head() -> Vec<u8> {
    b"HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n".to_vec()
}

fn json_response(status_line: &str, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
    .into_bytes()
}

fn endpoint(base: &str) -> HttpEndpoint {
    HttpEndpoint::new(base, "/start_game", "/save_conversation", Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_start_game_streams_chunked_body() {
    let body = "{\"type\":\"event\",\"content\":\"Situación misteriosa: ¿quién?\"}\n{\"type\":\"narrator\",\"content\":\"No\"}";
    let bytes = body.as_bytes();
    // Split inside the multi-byte "ó" and in the middle of the second record.
    let split_a = body.find('ó').unwrap() + 1;
    let split_b = body.find("narrator").unwrap();
    let (base, server) = serve_once(vec![
        streaming_head(),
        bytes[..split_a].to_vec(),
        bytes[split_a..split_b].to_vec(),
        bytes[split_b..].to_vec(),
    ])
    .await;

    let output = JsonOutput::new(Vec::new());
    let mut renderer = StreamRenderer::new(
        endpoint(&base),
        output,
        Policy::Structured(StructuredPolicy::default()),
    );
    let form = FormSubmission::from_pairs([("difficulty", "facil")]);
    let report = renderer.submit(&form).await.unwrap();
    assert_eq!(report.rendered, 2);

    let captured = server.await.unwrap();
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/start_game");
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    let sent: serde_json::Value = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(sent, serde_json::json!({ "difficulty": "facil" }));

    let out = String::from_utf8(renderer.into_output().into_inner()).unwrap();
    let records: Vec<serde_json::Value> =
        out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["content"], "Situación misteriosa: ¿quién?");
    assert_eq!(records[1]["type"], "narrator");
}

#[tokio::test]
async fn test_start_game_error_status() {
    let (base, server) = serve_once(vec![json_response("500 INTERNAL SERVER ERROR", "boom")]).await;
    let result = endpoint(&base).start_game(&FormSubmission::default()).await;
    match result {
        Err(StreamError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("expected an error status"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_save_conversation_success() {
    let (base, server) = serve_once(vec![json_response("200 OK", r#"{"status":"success"}"#)]).await;
    endpoint(&base).save_conversation().await.unwrap();

    let captured = server.await.unwrap();
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/save_conversation");
    assert!(captured.body.is_empty());
}

#[tokio::test]
async fn test_save_conversation_rejected_before_game() {
    let (base, server) = serve_once(vec![json_response(
        "400 BAD REQUEST",
        r#"{"status":"error","message":"Game not started"}"#,
    )])
    .await;
    let result = endpoint(&base).save_conversation().await;
    assert!(matches!(result, Err(StreamError::SaveRejected(ref m)) if m == "Game not started"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_save_conversation_empty_ack_is_success() {
    let (base, server) = serve_once(vec![json_response("200 OK", "")]).await;
    endpoint(&base).save_conversation().await.unwrap();
    server.await.unwrap();
}
