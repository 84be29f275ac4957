use http::Method;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::message::{Address, BufferedView, MessageContext};
use crate::payload::Payload;
use crate::plan::Side;

fn ctx(side: Side) -> MessageContext {
	MessageContext::new(
		Method::GET,
		Address::parse("http://backend.internal/api/orders").unwrap(),
		http::HeaderMap::new(),
		Payload::empty(),
		side,
		CancellationToken::new(),
	)
}

#[tokio::test]
async fn add_header_skips_when_present() {
	let mut c = ctx(Side::Request);
	c.headers_mut().insert("x-foo", "existing".parse().unwrap());
	let mut view = BufferedView::new(&mut c);
	let t = AddHeader {
		name: "x-foo".into(),
		value: "new".into(),
	};
	assert!(!t.should_apply(&view));
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert_eq!(view.headers().get("x-foo").unwrap(), "existing");
}

#[tokio::test]
async fn rename_header_moves_all_values() {
	let mut c = ctx(Side::Request);
	c.headers_mut().append("x-old", "a".parse().unwrap());
	c.headers_mut().append("x-old", "b".parse().unwrap());
	let mut view = BufferedView::new(&mut c);
	let t = RenameHeader {
		from: "x-old".into(),
		to: "x-new".into(),
	};
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert!(!view.headers().contains_key("x-old"));
	let values: Vec<_> = view.headers().get_all("x-new").iter().collect();
	assert_eq!(values.len(), 2);
}

#[tokio::test]
async fn correlation_id_only_applies_when_absent() {
	let mut c = ctx(Side::Request);
	let view = BufferedView::new(&mut c);
	let t = CorrelationId::default();
	assert!(t.should_apply(&view));
}

#[tokio::test]
async fn request_id_mints_32_hex_id_with_no_dashes() {
	let mut c = ctx(Side::Request);
	let mut view = BufferedView::new(&mut c);
	let t = RequestId::default();
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	let v = view.headers().get("X-Request-Id").unwrap().to_str().unwrap();
	assert_eq!(v.len(), 32);
	assert!(!v.contains('-'));
	assert!(v.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn strip_authorization_removes_bearer_token() {
	let mut c = ctx(Side::Request);
	c
		.headers_mut()
		.insert(http::header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
	let mut view = BufferedView::new(&mut c);
	let t = StripAuthorization;
	assert!(t.should_apply(&view));
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert!(!view.headers().contains_key(http::header::AUTHORIZATION));
}

#[tokio::test]
async fn remove_internal_response_headers_scrubs_default_set() {
	let mut c = ctx(Side::Response);
	c.headers_mut().insert("Server", "nginx".parse().unwrap());
	c.headers_mut().insert("X-Backend-Version", "1.2.3".parse().unwrap());
	let mut view = BufferedView::new(&mut c);
	let t = RemoveInternalResponseHeaders::default();
	assert!(t.should_apply(&view));
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert!(!view.headers().contains_key("Server"));
	assert!(!view.headers().contains_key("X-Backend-Version"));
}

#[tokio::test]
async fn gateway_response_tag_always_applies() {
	let mut c = ctx(Side::Response);
	let mut view = BufferedView::new(&mut c);
	let t = GatewayResponseTag {
		version: "9.9.9".into(),
	};
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert_eq!(view.headers().get("X-Gateway-Version").unwrap(), "9.9.9");
	assert_eq!(view.headers().get("X-Processed-By").unwrap(), "reqrep");
}
