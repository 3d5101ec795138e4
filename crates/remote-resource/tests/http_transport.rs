//! HttpTransport against a minimal local HTTP/1.1 responder.

use remote_resource::{
    HttpTransport, HttpTransportConfig, Method, RemoteResource, Transport, TransportRequest,
};
use portal_types::{Conversation, QueryKey};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A captured request: request line, headers (lowercased names), body.
#[derive(Debug, Clone)]
struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Serves `responses` in order, one connection each, and records requests.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            sink.lock().unwrap().push(request);

            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{addr}/api"), captured)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if n == 0 {
            break buf.len();
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Captured {
        request_line,
        headers,
        body,
    }
}

#[tokio::test]
async fn get_unwraps_data_envelope_and_sends_bearer() {
    let (base_url, captured) = serve(vec![(
        200,
        r#"{"data":[{"id":"c1","lastMessagePreview":"hi","updatedAt":"2024-05-01T10:00:00Z"}]}"#,
    )])
    .await;

    let transport = HttpTransport::new(HttpTransportConfig {
        base_url,
        timeout_secs: 5,
        auth_token: Some("secret-token".to_string()),
    })
    .unwrap();
    let resource = RemoteResource::new(Arc::new(transport));

    let conversations: Vec<Conversation> = resource
        .fetch(&QueryKey::root("conversations"))
        .await
        .unwrap();
    assert_eq!(conversations[0].id.as_str(), "c1");

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests[0].request_line, "GET /api/conversations HTTP/1.1");
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn post_sends_json_body() {
    let (base_url, captured) = serve(vec![(201, r#"{"data":{"ok":true}}"#)]).await;
    let transport = HttpTransport::new(HttpTransportConfig {
        base_url,
        timeout_secs: 5,
        auth_token: None,
    })
    .unwrap();

    let response = transport
        .send(TransportRequest::post(
            "/posts/p1/comments",
            Some(json!({ "text": "great post" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.data, json!({ "ok": true }));

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests[0].request_line, "POST /api/posts/p1/comments HTTP/1.1");
    assert!(requests[0].header("authorization").is_none());
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({ "text": "great post" }));
}

#[tokio::test]
async fn non_success_maps_to_transport_error() {
    let (base_url, _) = serve(vec![(403, r#"{"message":"not a participant"}"#)]).await;
    let transport = HttpTransport::new(HttpTransportConfig {
        base_url,
        timeout_secs: 5,
        auth_token: None,
    })
    .unwrap();

    let err = transport
        .send(TransportRequest::get("/conversations/c9/messages"))
        .await
        .unwrap_err();
    assert_eq!(err.status, Some(403));
    assert_eq!(err.message, "not a participant");
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    // Bind and drop to obtain a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(HttpTransportConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: 5,
        auth_token: None,
    })
    .unwrap();

    let err = transport
        .send(TransportRequest {
            method: Method::Delete,
            path: "/posts/p1/comments/k1".to_string(),
            body: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, None);
    assert!(err.is_retryable());
}
