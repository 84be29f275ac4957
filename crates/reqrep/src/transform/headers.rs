//! Header-editing members of the buffered catalog (§4.C): add/remove/
//! rename/append, correlation-id injection, request-id propagation,
//! Authorization strip, the default internal-response-header scrub, and
//! the gateway response tag.

use http::{HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::TransformError;
use crate::message::BufferedView;
use crate::transform::{BufferedTransform, ParamBag};

fn header_name(s: &str) -> Result<HeaderName, TransformError> {
	HeaderName::try_from(s).map_err(|e| TransformError::other(format!("invalid header name {s:?}: {e}")))
}

fn header_value(s: &str) -> Result<HeaderValue, TransformError> {
	HeaderValue::from_str(s).map_err(|e| TransformError::other(format!("invalid header value {s:?}: {e}")))
}

/// 32 lowercase hex characters, no dashes — the id format used by
/// correlation-id/request-id/gateway-metadata (§3, §4.C).
pub fn hex32_id() -> String {
	Uuid::new_v4().simple().to_string()
}

#[derive(Debug)]
pub struct AddHeader {
	name: String,
	value: String,
}

impl AddHeader {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			name: params.required_string("name")?,
			value: params.required_string("value")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for AddHeader {
	fn name(&self) -> &str {
		"add-header"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		!ctx.headers().contains_key(self.name.as_str())
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx
			.headers_mut()
			.insert(header_name(&self.name)?, header_value(&self.value)?);
		Ok(())
	}
}

#[derive(Debug)]
pub struct RemoveHeader {
	name: String,
}

impl RemoveHeader {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			name: params.required_string("name")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RemoveHeader {
	fn name(&self) -> &str {
		"remove-header"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.headers().contains_key(self.name.as_str())
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx.headers_mut().remove(self.name.as_str());
		Ok(())
	}
}

#[derive(Debug)]
pub struct RenameHeader {
	from: String,
	to: String,
}

impl RenameHeader {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			from: params.required_string("from")?,
			to: params.required_string("to")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RenameHeader {
	fn name(&self) -> &str {
		"rename-header"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.headers().contains_key(self.from.as_str())
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let to = header_name(&self.to)?;
		let values: Vec<HeaderValue> = ctx.headers_mut().remove(self.from.as_str()).into_iter().collect();
		for v in values {
			ctx.headers_mut().append(to.clone(), v);
		}
		Ok(())
	}
}

#[derive(Debug)]
pub struct AppendHeader {
	name: String,
	value: String,
}

impl AppendHeader {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			name: params.required_string("name")?,
			value: params.required_string("value")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for AppendHeader {
	fn name(&self) -> &str {
		"append-header"
	}

	fn should_apply(&self, _ctx: &BufferedView<'_>) -> bool {
		true
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx
			.headers_mut()
			.append(header_name(&self.name)?, header_value(&self.value)?);
		Ok(())
	}
}

/// Injects a fresh 32-hex correlation id unless one is already present.
#[derive(Debug, Default)]
pub struct CorrelationId {
	header: String,
}

impl CorrelationId {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			header: params.string("header").unwrap_or_else(|| "X-Correlation-Id".to_string()),
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for CorrelationId {
	fn name(&self) -> &str {
		"correlation-id"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		!ctx.headers().contains_key(self.header.as_str())
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let id = hex32_id();
		ctx
			.headers_mut()
			.insert(header_name(&self.header)?, header_value(&id)?);
		Ok(())
	}
}

/// Propagates an inbound request id, minting one if absent.
#[derive(Debug, Default)]
pub struct RequestId {
	header: String,
}

impl RequestId {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			header: params.string("header").unwrap_or_else(|| "X-Request-Id".to_string()),
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RequestId {
	fn name(&self) -> &str {
		"request-id"
	}

	fn should_apply(&self, _ctx: &BufferedView<'_>) -> bool {
		true
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let name = header_name(&self.header)?;
		if !ctx.headers().contains_key(name.as_str()) {
			let id = hex32_id();
			ctx.headers_mut().insert(name, header_value(&id)?);
		}
		Ok(())
	}
}

/// Removes `Authorization` unconditionally — used ahead of internal
/// forwarding so the backend never sees the caller's bearer token.
#[derive(Debug, Default)]
pub struct StripAuthorization;

#[async_trait::async_trait]
impl BufferedTransform for StripAuthorization {
	fn name(&self) -> &str {
		"strip-authorization"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.headers().contains_key(http::header::AUTHORIZATION)
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx.headers_mut().remove(http::header::AUTHORIZATION);
		Ok(())
	}
}

pub const DEFAULT_INTERNAL_RESPONSE_HEADERS: &[&str] = &[
	"X-Internal-Token",
	"X-Backend-Version",
	"X-Upstream-Address",
	"Server",
	"X-Powered-By",
	"X-AspNet-Version",
	"X-AspNetMvc-Version",
];

/// Scrubs the default set of internal response headers before the
/// response reaches the caller (§4.C).
#[derive(Debug)]
pub struct RemoveInternalResponseHeaders {
	names: Vec<String>,
}

impl Default for RemoveInternalResponseHeaders {
	fn default() -> Self {
		Self {
			names: DEFAULT_INTERNAL_RESPONSE_HEADERS
				.iter()
				.map(|s| s.to_string())
				.collect(),
		}
	}
}

impl RemoveInternalResponseHeaders {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		let names = params.string_list("names");
		Ok(if names.is_empty() {
			Self::default()
		} else {
			Self { names }
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RemoveInternalResponseHeaders {
	fn name(&self) -> &str {
		"remove-internal-response-headers"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		self.names.iter().any(|n| ctx.headers().contains_key(n.as_str()))
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		for name in &self.names {
			ctx.headers_mut().remove(name.as_str());
		}
		Ok(())
	}
}

/// Tags the response with the gateway's own version and processor id.
#[derive(Debug)]
pub struct GatewayResponseTag {
	version: String,
}

impl GatewayResponseTag {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			version: params
				.string("version")
				.unwrap_or_else(|| reqrep_core::version::BuildInfo::new().version.to_string()),
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for GatewayResponseTag {
	fn name(&self) -> &str {
		"gateway-response-tag"
	}

	fn should_apply(&self, _ctx: &BufferedView<'_>) -> bool {
		true
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx
			.headers_mut()
			.insert(header_name("X-Gateway-Version")?, header_value(&self.version)?);
		ctx
			.headers_mut()
			.insert(header_name("X-Processed-By")?, header_value("reqrep")?);
		Ok(())
	}
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
