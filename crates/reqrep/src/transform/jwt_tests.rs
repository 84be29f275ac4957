use base64::Engine;
use bytes::Bytes;
use http::Method;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::message::{Address, MessageContext};
use crate::payload::Payload;
use crate::plan::Side;

fn b64(value: &serde_json::Value) -> String {
	base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
}

fn fake_jwt(claims: serde_json::Value) -> String {
	let header = serde_json::json!({"alg": "HS256", "typ": "JWT"});
	format!("{}.{}.sig", b64(&header), b64(&claims))
}

fn ctx_with_auth(auth: Option<&str>) -> MessageContext {
	let mut headers = http::HeaderMap::new();
	if let Some(auth) = auth {
		headers.insert(http::header::AUTHORIZATION, auth.parse().unwrap());
	}
	MessageContext::new(
		Method::GET,
		Address::parse("http://backend.internal/api/orders").unwrap(),
		headers,
		Payload::from_buffer(None, Bytes::new()),
		Side::Request,
		CancellationToken::new(),
	)
}

#[tokio::test]
async fn passthrough_applies_only_with_bearer_token() {
	let mut c = ctx_with_auth(None);
	let view = BufferedView::new(&mut c);
	assert!(!JwtPassthrough.should_apply(&view));
}

#[tokio::test]
async fn claim_extraction_projects_string_and_scalar_claims() {
	let token = fake_jwt(serde_json::json!({"sub": "user-42", "admin": true}));
	let mut c = ctx_with_auth(Some(&format!("Bearer {token}")));
	let mut view = BufferedView::new(&mut c);
	let t = JwtClaimExtraction {
		mappings: vec![
			("sub".to_string(), "X-User-Id".to_string()),
			("admin".to_string(), "X-User-Admin".to_string()),
		],
	};
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert_eq!(view.headers().get("X-User-Id").unwrap(), "user-42");
	assert_eq!(view.headers().get("X-User-Admin").unwrap(), "true");
}

#[tokio::test]
async fn claim_extraction_silently_skips_malformed_token() {
	let mut c = ctx_with_auth(Some("Bearer not-a-jwt"));
	let mut view = BufferedView::new(&mut c);
	let t = JwtClaimExtraction {
		mappings: vec![("sub".to_string(), "X-User-Id".to_string())],
	};
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert!(!view.headers().contains_key("X-User-Id"));
}

#[tokio::test]
async fn claim_extraction_skips_header_for_absent_claim() {
	let token = fake_jwt(serde_json::json!({"sub": "user-42"}));
	let mut c = ctx_with_auth(Some(&format!("Bearer {token}")));
	let mut view = BufferedView::new(&mut c);
	let t = JwtClaimExtraction {
		mappings: vec![("email".to_string(), "X-User-Email".to_string())],
	};
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert!(!view.headers().contains_key("X-User-Email"));
}
