// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! HTTP surface of the server, driven in-process with `oneshot`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use odoh_common::{
    decrypt_response, encrypt_query, Error, KeyMaterial, ObliviousConfigs, ObliviousResponse,
    Result, OBLIVIOUS_DNS_MESSAGE,
};
use odoh_proxy::{ProxyRelay, Transport};
use odoh_server::routes::{router, AppState};
use odoh_target::{Resolver, TargetHandler, UdpResolver};
use tower::ServiceExt;
use url::Url;

struct FixedResolver(Vec<u8>);

#[async_trait]
impl Resolver for FixedResolver {
    async fn resolve(&self, _query: &[u8]) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

struct StalledResolver;

#[async_trait]
impl Resolver for StalledResolver {
    async fn resolve(&self, _query: &[u8]) -> Result<Vec<u8>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

/// Records what it was asked to send and replies with a fixed body.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, Bytes)>>,
    reply: Bytes,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, url: &Url, body: Bytes) -> Result<Bytes> {
        self.sent.lock().unwrap().push((url.to_string(), body));
        Ok(self.reply.clone())
    }
}

struct FailingTransport(fn(&Url) -> Error);

#[async_trait]
impl Transport for FailingTransport {
    async fn post(&self, url: &Url, _body: Bytes) -> Result<Bytes> {
        Err((self.0)(url))
    }
}

/// Delivers relayed queries straight into another in-process router.
struct LoopbackTransport(Router);

#[async_trait]
impl Transport for LoopbackTransport {
    async fn post(&self, url: &Url, body: Bytes) -> Result<Bytes> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(url.path())
            .header(header::CONTENT_TYPE, OBLIVIOUS_DNS_MESSAGE)
            .body(Body::from(body))
            .unwrap();
        let response = self.0.clone().oneshot(request).await.unwrap();
        if !response.status().is_success() {
            return Err(Error::RelayFailure {
                target: url.host_str().unwrap_or_default().to_string(),
                reason: format!("target returned HTTP {}", response.status().as_u16()),
            });
        }
        Ok(to_bytes(response.into_body(), usize::MAX).await.unwrap())
    }
}

fn seeded_keys() -> Arc<KeyMaterial> {
    let seed: Vec<u8> = (0x00u8..=0x0f).collect();
    Arc::new(KeyMaterial::from_seed(&seed).unwrap())
}

fn app(
    keys: Arc<KeyMaterial>,
    resolver: Arc<dyn Resolver>,
    transport: Arc<dyn Transport>,
) -> Router {
    let target =
        TargetHandler::new(keys, resolver).with_resolve_timeout(Duration::from_millis(100));
    let state = AppState::new("test.example", target, ProxyRelay::new(transport)).unwrap();
    router(Arc::new(state))
}

fn target_app(answer: &[u8]) -> Router {
    app(
        seeded_keys(),
        Arc::new(FixedResolver(answer.to_vec())),
        Arc::new(RecordingTransport::default()),
    )
}

fn post(uri: &str, body: impl Into<Bytes>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, OBLIVIOUS_DNS_MESSAGE)
        .body(Body::from(body.into()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_of(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

#[tokio::test]
async fn health_says_ok() {
    let response = target_app(b"").oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, "ok");
}

#[tokio::test]
async fn index_names_the_instance() {
    let response = target_app(b"").oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert!(String::from_utf8_lossy(&body).contains("test.example"));
}

#[tokio::test]
async fn configs_publish_the_target_key() {
    let response = target_app(b"")
        .oneshot(get("/.well-known/odohconfigs"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );

    let configs = ObliviousConfigs::decode(&body_of(response).await).unwrap();
    let config = configs.first_supported().unwrap();
    assert_eq!(config.public_key, seeded_keys().public_key());
}

#[tokio::test]
async fn target_mode_answers_sealed_query() {
    let keys = seeded_keys();
    let (query, ctx) = encrypt_query(&keys.config(), &[0xAA, 0xBB, 0xCC]).unwrap();

    let response = target_app(&[0xDD, 0xEE, 0xFF])
        .oneshot(post("/proxy", query.encode().unwrap()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], OBLIVIOUS_DNS_MESSAGE);

    let wire = body_of(response).await;
    let answer = decrypt_response(ctx, &ObliviousResponse::decode(&wire).unwrap()).unwrap();
    assert_eq!(answer, [0xDD, 0xEE, 0xFF]);
}

#[tokio::test]
async fn malformed_and_undecryptable_look_alike() {
    let garbage = target_app(b"")
        .oneshot(post("/proxy", vec![0x00, 0x20, 0x00]))
        .await
        .unwrap();

    let stranger = KeyMaterial::generate();
    let (query, _ctx) = encrypt_query(&stranger.config(), b"query").unwrap();
    let wrong_key = target_app(b"")
        .oneshot(post("/proxy", query.encode().unwrap()))
        .await
        .unwrap();

    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
    assert_eq!(wrong_key.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_of(garbage).await, body_of(wrong_key).await);
}

#[tokio::test]
async fn wrong_content_type_is_rejected() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/proxy")
        .header(header::CONTENT_TYPE, "application/dns-message")
        .body(Body::from("query"))
        .unwrap();
    let response = target_app(b"").oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn targetpath_alone_is_bad_request() {
    let response = target_app(b"")
        .oneshot(post("/proxy?targetpath=/dns-query", "query"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stalled_resolver_is_gateway_timeout() {
    let keys = seeded_keys();
    let (query, _ctx) = encrypt_query(&keys.config(), b"query").unwrap();
    let app = app(
        keys,
        Arc::new(StalledResolver),
        Arc::new(RecordingTransport::default()),
    );

    let response = app.oneshot(post("/proxy", query.encode().unwrap())).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn proxy_mode_relays_bytes_verbatim() {
    let transport = Arc::new(RecordingTransport {
        reply: Bytes::from_static(b"sealed answer"),
        ..Default::default()
    });
    let app = app(
        seeded_keys(),
        Arc::new(FixedResolver(Vec::new())),
        transport.clone(),
    );

    let body = Bytes::from_static(&[0x00, 0x20, 0x00, 0x01, 0x7f]);
    let response = app
        .oneshot(post(
            "/proxy?targethost=target.example&targetpath=/dns-query",
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], OBLIVIOUS_DNS_MESSAGE);
    assert_eq!(body_of(response).await, "sealed answer");

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "https://target.example/dns-query");
    assert_eq!(sent[0].1, body);
}

#[tokio::test]
async fn relay_failures_map_to_gateway_statuses() {
    let failed = app(
        seeded_keys(),
        Arc::new(FixedResolver(Vec::new())),
        Arc::new(FailingTransport(|url| Error::RelayFailure {
            target: url.host_str().unwrap_or_default().to_string(),
            reason: "connection refused".into(),
        })),
    );
    let response = failed
        .oneshot(post("/proxy?targethost=target.example", "q"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let timed_out = app(
        seeded_keys(),
        Arc::new(FixedResolver(Vec::new())),
        Arc::new(FailingTransport(|url| Error::RelayTimeout {
            target: url.host_str().unwrap_or_default().to_string(),
        })),
    );
    let response = timed_out
        .oneshot(post("/proxy?targethost=target.example", "q"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn invalid_targethost_is_bad_request() {
    let response = target_app(b"")
        .oneshot(post("/proxy?targethost=user%40evil.example", "q"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn client_proxy_target_round_trip() {
    let keys = seeded_keys();
    let target = target_app(&[0xDD, 0xEE, 0xFF]);
    let proxy = app(
        KeyMaterial::generate().into(),
        Arc::new(FixedResolver(Vec::new())),
        Arc::new(LoopbackTransport(target)),
    );

    let (query, ctx) = encrypt_query(&keys.config(), &[0xAA, 0xBB, 0xCC]).unwrap();
    let response = proxy
        .oneshot(post(
            "/proxy?targethost=target.example&targetpath=/proxy",
            query.encode().unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let wire = body_of(response).await;
    let answer = decrypt_response(ctx, &ObliviousResponse::decode(&wire).unwrap()).unwrap();
    assert_eq!(answer, [0xDD, 0xEE, 0xFF]);
}

#[tokio::test]
async fn sealed_non_dns_plaintext_is_bad_gateway() {
    let keys = seeded_keys();
    let resolver = UdpResolver::new("127.0.0.1:9".parse().unwrap(), Duration::from_millis(100));
    let app = app(
        keys.clone(),
        Arc::new(resolver),
        Arc::new(RecordingTransport::default()),
    );

    let (query, _ctx) = encrypt_query(&keys.config(), &[0xAA, 0xBB, 0xCC]).unwrap();
    let response = app.oneshot(post("/proxy", query.encode().unwrap())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
