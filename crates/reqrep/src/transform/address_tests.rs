use http::Method;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::message::{Address, MessageContext};
use crate::payload::Payload;
use crate::plan::Side;

fn ctx(path: &str) -> MessageContext {
	MessageContext::new(
		Method::GET,
		Address::parse(&format!("http://backend.internal{path}")).unwrap(),
		http::HeaderMap::new(),
		Payload::empty(),
		Side::Request,
		CancellationToken::new(),
	)
}

#[tokio::test]
async fn path_prefix_rewrite_only_touches_matching_prefix() {
	let mut c = ctx("/v1/orders/42");
	let mut view = BufferedView::new(&mut c);
	let t = PathPrefixRewrite {
		from: "/v1".into(),
		to: "/internal/v2".into(),
	};
	assert!(t.should_apply(&view));
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert_eq!(view.address().path(), "/internal/v2/orders/42");
}

#[tokio::test]
async fn path_prefix_rewrite_skips_non_matching_path() {
	let mut c = ctx("/v2/orders/42");
	let view = BufferedView::new(&mut c);
	let t = PathPrefixRewrite {
		from: "/v1".into(),
		to: "/internal/v2".into(),
	};
	assert!(!t.should_apply(&view));
}

#[tokio::test]
async fn path_regex_rewrite_expands_capture_groups() {
	let mut c = ctx("/api/orders/42");
	let mut view = BufferedView::new(&mut c);
	let t = PathRegexRewrite {
		pattern: Regex::new(r"^/api/orders/(\d+)$").unwrap(),
		replacement: "/internal/orders/$1".to_string(),
	};
	assert!(t.should_apply(&view));
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert_eq!(view.address().path(), "/internal/orders/42");
}

#[tokio::test]
async fn add_query_param_skips_when_key_present() {
	let mut c = ctx("/api/orders?page=2");
	let view = BufferedView::new(&mut c);
	let t = AddQueryParam {
		key: "page".into(),
		value: "1".into(),
	};
	assert!(!t.should_apply(&view));
}

#[tokio::test]
async fn remove_query_param_drops_only_named_key() {
	let mut c = ctx("/api/orders?page=2&limit=10");
	let mut view = BufferedView::new(&mut c);
	let t = RemoveQueryParam { key: "page".into() };
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	let pairs = view.address().query_pairs();
	assert_eq!(pairs, vec![("limit".to_string(), "10".to_string())]);
}

#[tokio::test]
async fn host_rewrite_sets_host_and_optional_port() {
	let mut c = ctx("/api/orders");
	let mut view = BufferedView::new(&mut c);
	let t = HostRewrite {
		host: "orders.internal".into(),
		port: Some(8080),
	};
	assert!(t.should_apply(&view));
	t.apply(&mut view, CancellationToken::new()).await.unwrap();
	assert_eq!(view.address().host(), Some("orders.internal"));
	assert_eq!(view.address().port(), Some(8080));
}
