#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use resume_relay::config::Config;
use resume_relay::matcher_client::MatcherClient;
use resume_relay::routes::build_router;
use resume_relay::state::AppState;

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Build a test `Config` with the production defaults, pointed at `matcher_url`.
pub fn test_config(matcher_url: &str, timeout: Duration) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.matcher_url = matcher_url.to_string();
    config.matcher_timeout = timeout;
    config
}

/// Build the full relay router exactly as `main.rs` does.
pub fn build_test_app(config: Config) -> Router {
    let matcher = MatcherClient::new(&config.matcher_url, config.matcher_timeout).unwrap();
    build_router(AppState { matcher, config })
}

pub fn app_for(matcher_url: &str) -> Router {
    build_test_app(test_config(matcher_url, Duration::from_secs(5)))
}

// ---------------------------------------------------------------------------
// Mock matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub content_type: String,
    pub raw_body: Bytes,
    pub parts: Vec<ReceivedPart>,
}

#[derive(Clone)]
pub enum MatcherReply {
    Respond {
        status: StatusCode,
        content_type: &'static str,
        body: &'static str,
    },
    Stall(Duration),
}

#[derive(Clone)]
pub struct MockMatcher {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockMatcher {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    reply: MatcherReply,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// Starts an in-process matcher on an ephemeral port.
///
/// Every forwarded body is re-parsed with axum's strict multipart parser; a
/// payload with a mismatched boundary or missing closing delimiter is answered
/// with 422 so relay tests fail loudly.
pub async fn spawn_matcher(reply: MatcherReply) -> MockMatcher {
    let hits = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply,
        hits: Arc::clone(&hits),
        received: Arc::clone(&received),
    };

    let app = Router::new()
        .route("/matcher", post(mock_matcher))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockMatcher {
        base_url: format!("http://{addr}"),
        hits,
        received,
    }
}

async fn mock_matcher(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let parts = match parse_parts(&content_type, body.clone()).await {
        Ok(parts) => parts,
        Err(msg) => return (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
    };

    state.received.lock().unwrap().push(ReceivedRequest {
        content_type,
        raw_body: body,
        parts,
    });

    match state.reply {
        MatcherReply::Respond {
            status,
            content_type,
            body,
        } => (status, [(header::CONTENT_TYPE, content_type)], body).into_response(),
        MatcherReply::Stall(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::OK.into_response()
        }
    }
}

async fn parse_parts(content_type: &str, body: Bytes) -> Result<Vec<ReceivedPart>, String> {
    let request = Request::builder()
        .method("POST")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| e.body_text())?;

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| e.body_text())?;
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Ok(parts)
}

/// A matcher that sends a complete header block promising more body than it
/// delivers, then closes the connection.
pub async fn spawn_truncating_matcher() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.ends_with(b"--\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\r\n\
                  {\"matches\": [",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}")
}

/// Returns an address that refuses connections.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub const BOUNDARY: &str = "----browser-form-boundary-7MA4YWxkTrZu0gW";

pub struct Upload<'a> {
    pub job_description: Option<&'a str>,
    pub resumes: Vec<(&'a str, &'a [u8])>,
}

/// Encodes an upload the way a browser `FormData` submission does.
pub fn encode_upload(upload: &Upload) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(jd) = upload.job_description {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{jd}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, data) in &upload.resumes {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resumes\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_raw(app: Router, content_type: &str, body: Vec<u8>) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_upload(app: Router, upload: &Upload<'_>) -> Response {
    post_raw(
        app,
        &format!("multipart/form-data; boundary={BOUNDARY}"),
        encode_upload(upload),
    )
    .await
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
