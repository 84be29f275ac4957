//! Maps a persisted transformer-key (§4.D, e.g. `"add-header"`) to a
//! factory that turns a [`ParamBag`] into a configured [`AnyTransform`].
//! [`Registry::builtin`] wires up the entire enumerated catalog (§4.C);
//! a host embedding this crate may still register its own keys on top.

use std::collections::HashMap;
use std::sync::Arc;

use crate::transform::{address, headers, json, jwt, method, streaming, AnyTransform, ParamBag};

type Factory = Arc<dyn Fn(&ParamBag) -> anyhow::Result<AnyTransform> + Send + Sync>;

pub struct Registry {
	factories: HashMap<String, Factory>,
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
		keys.sort_unstable();
		f.debug_struct("Registry").field("keys", &keys).finish()
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	pub fn new() -> Self {
		Self {
			factories: HashMap::new(),
		}
	}

	pub fn register_buffered<F, T>(&mut self, key: &str, ctor: F)
	where
		F: Fn(&ParamBag) -> anyhow::Result<T> + Send + Sync + 'static,
		T: crate::transform::BufferedTransform + 'static,
	{
		self.factories.insert(
			key.to_string(),
			Arc::new(move |params| Ok(AnyTransform::Buffered(Arc::new(ctor(params)?)))),
		);
	}

	pub fn register_streaming<F, T>(&mut self, key: &str, ctor: F)
	where
		F: Fn(&ParamBag) -> anyhow::Result<T> + Send + Sync + 'static,
		T: crate::transform::StreamingTransform + 'static,
	{
		self.factories.insert(
			key.to_string(),
			Arc::new(move |params| Ok(AnyTransform::Streaming(Arc::new(ctor(params)?)))),
		);
	}

	pub fn contains(&self, key: &str) -> bool {
		self.factories.contains_key(key)
	}

	pub fn build(&self, key: &str, params: &ParamBag) -> anyhow::Result<AnyTransform> {
		let factory = self
			.factories
			.get(key)
			.ok_or_else(|| anyhow::anyhow!("unknown transformer key {key:?}"))?;
		factory(params)
	}

	/// Registers every transform enumerated in the catalog (§4.C).
	pub fn builtin() -> Self {
		let mut r = Self::new();

		r.register_buffered("add-header", |p| Ok(headers::AddHeader::configure(p)?));
		r.register_buffered("remove-header", |p| Ok(headers::RemoveHeader::configure(p)?));
		r.register_buffered("rename-header", |p| Ok(headers::RenameHeader::configure(p)?));
		r.register_buffered("append-header", |p| Ok(headers::AppendHeader::configure(p)?));
		r.register_buffered("correlation-id", |p| Ok(headers::CorrelationId::configure(p)?));
		r.register_buffered("request-id", |p| Ok(headers::RequestId::configure(p)?));
		r.register_buffered("strip-authorization", |_| Ok(headers::StripAuthorization));
		r.register_buffered("remove-internal-response-headers", |p| {
			Ok(headers::RemoveInternalResponseHeaders::configure(p)?)
		});
		r.register_buffered("gateway-response-tag", |p| Ok(headers::GatewayResponseTag::configure(p)?));

		r.register_buffered("path-prefix-rewrite", |p| Ok(address::PathPrefixRewrite::configure(p)?));
		r.register_buffered("path-regex-rewrite", address::PathRegexRewrite::configure);
		r.register_buffered("add-query-param", |p| Ok(address::AddQueryParam::configure(p)?));
		r.register_buffered("remove-query-param", |p| Ok(address::RemoveQueryParam::configure(p)?));
		r.register_buffered("host-rewrite", |p| Ok(address::HostRewrite::configure(p)?));

		r.register_buffered("method-override", method::MethodOverride::configure);

		r.register_buffered("set-json-field", |p| Ok(json::SetJsonField::configure(p)?));
		r.register_buffered("remove-json-field", |p| Ok(json::RemoveJsonField::configure(p)?));
		r.register_buffered("rename-json-field", |p| Ok(json::RenameJsonField::configure(p)?));
		r.register_buffered("gateway-metadata", |p| Ok(json::GatewayMetadata::configure(p)?));

		r.register_buffered("jwt-passthrough", |_| Ok(jwt::JwtPassthrough));
		r.register_buffered("jwt-claim-extraction", |p| Ok(jwt::JwtClaimExtraction::configure(p)?));

		r.register_streaming("streaming-add-header", |p| Ok(streaming::StreamingAddHeader::configure(p)?));
		r.register_streaming("streaming-host-rewrite", |p| Ok(streaming::StreamingHostRewrite::configure(p)?));

		r
	}
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
