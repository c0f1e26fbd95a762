//! Shared test setup: an app wired to in-memory adapters

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use coldpost_engine::testing::{MemoryStore, MockTransport};
use coldpost_server::{App, AppState, routes};
use coldpost_types::types::SenderIdentity;

pub fn test_senders() -> Vec<SenderIdentity> {
	vec![
		SenderIdentity::new("sales@acme.com", "Acme Sales"),
		SenderIdentity::new("support@acme.org", "Acme Support"),
	]
}

pub fn test_app() -> (Router, App, Arc<MockTransport>, Arc<MemoryStore>) {
	let transport = MockTransport::new();
	let store = MemoryStore::new();
	let app = AppState::new(transport.clone(), store.clone(), test_senders());
	(routes::init(app.clone()), app, transport, store)
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
	let request = Request::post(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap();
	send(router, request).await
}

pub async fn post_empty(router: &Router, uri: &str) -> (StatusCode, Value) {
	let request = Request::post(uri).body(Body::empty()).unwrap();
	send(router, request).await
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
	let request = Request::get(uri).body(Body::empty()).unwrap();
	send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = router.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	let value = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap_or(Value::Null)
	};
	(status, value)
}

// vim: ts=4
