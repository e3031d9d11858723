//! Integration tests for `HttpNarrationBackend` against a local axum server.
//!
//! The fake server mimics the narration server contract: `POST /api/tts`
//! answers with a WAV body or a JSON `{ error, detail }` failure,
//! `GET /api/health` with the health DTO.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use dictee_core::{NarrationBackend, NarrationError};
use dictee_narration::{HttpNarrationBackend, NarrationClientConfig, NarrationService};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

// ── Fake server ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Behaviour {
    /// Echo the request as a fake WAV body.
    Ok,
    /// 500 until the given attempt number, then OK.
    FailUntil(usize),
    /// Always 400.
    BadRequest,
    /// Sleep longer than the client timeout.
    Slow,
}

#[derive(Clone)]
struct FakeServer {
    behaviour: Behaviour,
    hits: Arc<AtomicUsize>,
}

async fn tts(State(server): State<FakeServer>, Json(body): Json<Value>) -> Response {
    let attempt = server.hits.fetch_add(1, Ordering::SeqCst) + 1;

    match server.behaviour {
        Behaviour::Ok => {}
        Behaviour::FailUntil(n) if attempt < n => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "TTS synthesis failed", "detail": "warming up"})),
            )
                .into_response();
        }
        Behaviour::FailUntil(_) => {}
        Behaviour::BadRequest => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Text too long (max 2000 chars)"})),
            )
                .into_response();
        }
        Behaviour::Slow => tokio::time::sleep(Duration::from_secs(5)).await,
    }

    let text = body["text"].as_str().unwrap_or_default();
    let speed = body["speed"].as_f64().unwrap_or_default();
    let payload = format!("RIFF|{text}|{speed}");
    ([(header::CONTENT_TYPE, "audio/wav")], payload).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "ttsServer": "http://localhost:8880",
        "ttsReachable": true,
        "model": "kokoro",
        "cacheSize": 3
    }))
}

async fn spawn_server(behaviour: Behaviour) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = FakeServer {
        behaviour,
        hits: Arc::clone(&hits),
    };
    let app = Router::new()
        .route("/api/tts", post(tts))
        .route("/api/health", get(health))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn backend(addr: SocketAddr, config: NarrationClientConfig) -> HttpNarrationBackend {
    HttpNarrationBackend::new(
        config
            .with_base_url(format!("http://{addr}"))
            .with_retry_delay(Duration::from_millis(10)),
    )
    .unwrap()
}

// ── POST /api/tts ────────────────────────────────────────────────────────────

#[tokio::test]
async fn synthesize_posts_text_and_speed() {
    let (addr, hits) = spawn_server(Behaviour::Ok).await;
    let backend = backend(addr, NarrationClientConfig::new());

    let audio = backend.synthesize("Bonjour.", 1.0).await.unwrap();

    assert_eq!(audio.as_ref(), b"RIFF|Bonjour.|1");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let (addr, hits) = spawn_server(Behaviour::FailUntil(2)).await;
    let backend = backend(addr, NarrationClientConfig::new().with_max_retries(1));

    let audio = backend.synthesize("Texte", 1.0).await.unwrap();

    assert!(audio.starts_with(b"RIFF"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn exhausted_retries_surface_the_server_message() {
    let (addr, hits) = spawn_server(Behaviour::FailUntil(usize::MAX)).await;
    let backend = backend(addr, NarrationClientConfig::new().with_max_retries(2));

    let err = backend.synthesize("Texte", 1.0).await.unwrap_err();

    let message = match err {
        NarrationError::Unavailable(message) => message,
        other => panic!("expected Unavailable, got {other:?}"),
    };
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("TTS synthesis failed (warming up)"), "{message}");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (addr, hits) = spawn_server(Behaviour::BadRequest).await;
    let backend = backend(addr, NarrationClientConfig::new().with_max_retries(3));

    let err = backend.synthesize("Texte", 1.0).await.unwrap_err();

    assert!(matches!(err, NarrationError::Unavailable(ref m) if m.contains("Text too long")));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn slow_server_times_out() {
    let (addr, hits) = spawn_server(Behaviour::Slow).await;
    let timeout = Duration::from_millis(200);
    let backend = backend(
        addr,
        NarrationClientConfig::new()
            .with_timeout(timeout)
            .with_max_retries(2),
    );

    let err = backend.synthesize("Texte", 1.0).await.unwrap_err();

    assert_eq!(err, NarrationError::Timeout(timeout));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = backend(addr, NarrationClientConfig::new().with_max_retries(0));
    let err = backend.synthesize("Texte", 1.0).await.unwrap_err();

    assert!(matches!(err, NarrationError::Unavailable(_)));
}

// ── GET /api/health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_parses_the_server_payload() {
    let (addr, _) = spawn_server(Behaviour::Ok).await;
    let backend = backend(addr, NarrationClientConfig::new());

    let health = backend.health().await.unwrap();

    assert!(health.tts_reachable);
    assert_eq!(health.model.as_deref(), Some("kokoro"));
    assert_eq!(health.cache_size, Some(3));
}

// ── Service over HTTP ────────────────────────────────────────────────────────

#[tokio::test]
async fn service_caches_http_narrations() {
    let (addr, hits) = spawn_server(Behaviour::Ok).await;
    let service = NarrationService::new(Arc::new(backend(addr, NarrationClientConfig::new())));
    let token = CancellationToken::new();

    let first = service.fetch("La mer brillait.", 1.0, &token).await.unwrap();
    let second = service.fetch("La mer brillait.", 1.0, &token).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
