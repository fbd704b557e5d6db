//! Integration tests for the buffered pre-render loader.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::header::HeaderValue;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use backend_relay::{AppState, LoadOptions, RelayError};

mod common;

#[derive(Debug, Deserialize, PartialEq)]
struct Document {
    id: String,
    title: String,
}

fn loader_for(addr: std::net::SocketAddr) -> backend_relay::Loader {
    AppState::from_config(&common::relay_config(addr))
        .unwrap()
        .loader()
}

async fn hop(Path(n): Path<u32>) -> Response {
    if n == 0 {
        Json(json!({ "id": "d0", "title": "Ende" })).into_response()
    } else {
        (StatusCode::FOUND, [(header::LOCATION, (n - 1).to_string())]).into_response()
    }
}

#[tokio::test]
async fn test_load_parses_typed_document() {
    let backend = Router::new().route(
        "/api/v1/documents/{id}",
        get(|Path(id): Path<String>| async move { Json(json!({ "id": id, "title": "Handbuch" })) }),
    );
    let (addr, recorder) = common::start_backend(backend).await;

    let doc: Document = loader_for(addr)
        .load(
            "documents/d1?tenant_id=t1",
            LoadOptions::default()
                .with_header(header::HeaderName::from_static("x-api-key"), HeaderValue::from_static("k")),
        )
        .await
        .unwrap();

    assert_eq!(
        doc,
        Document {
            id: "d1".into(),
            title: "Handbuch".into()
        }
    );
    let seen = recorder.last();
    assert_eq!(seen.path_and_query, "/api/v1/documents/d1?tenant_id=t1");
    assert_eq!(seen.headers["accept"], "application/json");
    assert_eq!(seen.headers["x-api-key"], "k");
}

#[tokio::test]
async fn test_load_follows_redirects() {
    let backend = Router::new().route("/api/v1/hop/{n}", get(hop));
    let (addr, recorder) = common::start_backend(backend).await;

    let doc: Document = loader_for(addr)
        .load("hop/3", LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(doc.id, "d0");
    assert_eq!(recorder.calls(), 4);
}

#[tokio::test]
async fn test_load_too_many_redirects() {
    let backend = Router::new().route("/api/v1/hop/{n}", get(hop));
    let (addr, recorder) = common::start_backend(backend).await;

    let err = loader_for(addr)
        .load::<Document>("hop/6", LoadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::TooManyRedirects { max_hops: 5 }));
    assert_eq!(recorder.calls(), 6);
}

#[tokio::test]
async fn test_load_non_success_rejects_with_status_and_body() {
    let backend = Router::new().route(
        "/api/v1/documents/{id}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "Document not found" }))) }),
    );
    let (addr, _) = common::start_backend(backend).await;

    let err = loader_for(addr)
        .load::<Document>("documents/nope", LoadOptions::default())
        .await
        .unwrap_err();

    match err {
        RelayError::UpstreamStatus { status, body } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(&body[..], br#"{"detail":"Document not found"}"#);
        }
        other => panic!("expected UpstreamStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_malformed_body() {
    let backend = Router::new().route("/api/v1/broken", get(|| async { "<html>not json</html>" }));
    let (addr, _) = common::start_backend(backend).await;

    let err = loader_for(addr)
        .load::<Document>("broken", LoadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::MalformedResponse(_)));
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_load_with_explicit_method() {
    let backend = Router::new().route(
        "/api/v1/search",
        post(|| async { Json(json!({ "id": "s1", "title": "Treffer" })) }),
    );
    let (addr, recorder) = common::start_backend(backend).await;

    let options = LoadOptions {
        method: Some(Method::POST),
        ..LoadOptions::default()
    };
    let doc: Document = loader_for(addr).load("search", options).await.unwrap();

    assert_eq!(doc.title, "Treffer");
    assert_eq!(recorder.last().method, "POST");
}

#[tokio::test]
async fn test_load_unreachable_backend() {
    let dead = common::unused_addr().await;
    let err = loader_for(dead)
        .load::<Document>("documents/d1", LoadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Network { timed_out: false, .. }));
}

#[tokio::test]
async fn test_redirect_to_other_origin() {
    let other = Router::new().route(
        "/v2/doc",
        get(|| async { Json(json!({ "id": "moved", "title": "Neu" })) }),
    );
    let (other_addr, _) = common::start_backend(other).await;
    let target = format!("http://{}/v2/doc", other_addr);
    let backend = Router::new().route(
        "/api/v1/old",
        get(move || {
            let target = target.clone();
            async move { Redirect::permanent(&target) }
        }),
    );
    let (addr, _) = common::start_backend(backend).await;

    let doc: Document = loader_for(addr).load("old", LoadOptions::default()).await.unwrap();
    assert_eq!(doc.id, "moved");
}
