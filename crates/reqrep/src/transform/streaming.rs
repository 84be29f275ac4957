//! Streaming-family members of the catalog (§4.C): the body passes
//! through a `StreamingView`'s pipe reader untouched; these transforms
//! only ever touch headers and the address, never the payload.

use http::{HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;

use crate::error::TransformError;
use crate::message::StreamingView;
use crate::transform::{ParamBag, StreamingTransform};

fn header_name(s: &str) -> Result<HeaderName, TransformError> {
	HeaderName::try_from(s).map_err(|e| TransformError::other(format!("invalid header name {s:?}: {e}")))
}

fn header_value(s: &str) -> Result<HeaderValue, TransformError> {
	HeaderValue::from_str(s).map_err(|e| TransformError::other(format!("invalid header value {s:?}: {e}")))
}

/// Adds a header on a streaming message without ever touching the body
/// (unlike `transform::headers::AddHeader`, which operates on buffered
/// messages and could in principle be asked to look at the body).
#[derive(Debug)]
pub struct StreamingAddHeader {
	name: String,
	value: String,
}

impl StreamingAddHeader {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			name: params.required_string("name")?,
			value: params.required_string("value")?,
		})
	}
}

#[async_trait::async_trait]
impl StreamingTransform for StreamingAddHeader {
	fn name(&self) -> &str {
		"streaming-add-header"
	}

	fn should_apply(&self, ctx: &StreamingView<'_>) -> bool {
		!ctx.headers().contains_key(self.name.as_str())
	}

	async fn apply(&self, ctx: &mut StreamingView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx
			.headers_mut()
			.insert(header_name(&self.name)?, header_value(&self.value)?);
		Ok(())
	}
}

/// Rewrites the upstream host for a streaming message (large uploads,
/// media proxying) without ever buffering the body to inspect it.
#[derive(Debug)]
pub struct StreamingHostRewrite {
	host: String,
}

impl StreamingHostRewrite {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			host: params.required_string("host")?,
		})
	}
}

#[async_trait::async_trait]
impl StreamingTransform for StreamingHostRewrite {
	fn name(&self) -> &str {
		"streaming-host-rewrite"
	}

	fn should_apply(&self, ctx: &StreamingView<'_>) -> bool {
		ctx.address().host() != Some(self.host.as_str())
	}

	async fn apply(&self, ctx: &mut StreamingView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let mut address = ctx.address().clone();
		address.set_host(&self.host);
		ctx.set_address(address);
		Ok(())
	}
}

#[cfg(test)]
#[path = "streaming_tests.rs"]
mod tests;
