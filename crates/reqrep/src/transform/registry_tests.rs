use super::*;
use crate::transform::ParamBag;

#[test]
fn builtin_registers_every_catalog_key() {
	let registry = Registry::builtin();
	for key in [
		"add-header",
		"remove-header",
		"rename-header",
		"append-header",
		"correlation-id",
		"request-id",
		"strip-authorization",
		"remove-internal-response-headers",
		"gateway-response-tag",
		"path-prefix-rewrite",
		"path-regex-rewrite",
		"add-query-param",
		"remove-query-param",
		"host-rewrite",
		"method-override",
		"set-json-field",
		"remove-json-field",
		"rename-json-field",
		"gateway-metadata",
		"jwt-passthrough",
		"jwt-claim-extraction",
		"streaming-add-header",
		"streaming-host-rewrite",
	] {
		assert!(registry.contains(key), "missing builtin key {key}");
	}
}

#[test]
fn build_unknown_key_is_an_error() {
	let registry = Registry::builtin();
	assert!(registry.build("does-not-exist", &ParamBag::default()).is_err());
}

#[test]
fn build_missing_required_param_is_an_error() {
	let registry = Registry::builtin();
	let err = registry.build("add-header", &ParamBag::default()).unwrap_err();
	assert!(err.to_string().contains("name"));
}

#[test]
fn build_produces_the_right_transform_family() {
	let registry = Registry::builtin();
	let params = ParamBag::parse(Some(r#"{"name":"x","value":"y"}"#));
	match registry.build("add-header", &params).unwrap() {
		AnyTransform::Buffered(t) => assert_eq!(t.name(), "add-header"),
		AnyTransform::Streaming(_) => panic!("expected buffered"),
	}

	let params = ParamBag::parse(Some(r#"{"name":"x","value":"y"}"#));
	match registry.build("streaming-add-header", &params).unwrap() {
		AnyTransform::Streaming(t) => assert_eq!(t.name(), "streaming-add-header"),
		AnyTransform::Buffered(_) => panic!("expected streaming"),
	}
}
