//! Method-override member of the buffered catalog (§4.C). Request-side
//! only; `BufferedView::set_method` is already a no-op on the response
//! side so `should_apply` only needs to guard the "already set" case.

use std::str::FromStr;

use tokio_util::sync::CancellationToken;

use crate::error::TransformError;
use crate::message::BufferedView;
use crate::plan::Side;
use crate::transform::{BufferedTransform, ParamBag};

/// Overrides the outbound method, optionally conditioned on the current
/// one (`when` param) so one config row can't stomp a method it wasn't
/// meant to touch.
#[derive(Debug)]
pub struct MethodOverride {
	to: http::Method,
	when: Option<http::Method>,
}

impl MethodOverride {
	pub fn configure(params: &ParamBag) -> anyhow::Result<Self> {
		let to = http::Method::from_str(&params.required_string("to")?)?;
		let when = params
			.string("when")
			.map(|m| http::Method::from_str(&m))
			.transpose()?;
		Ok(Self { to, when })
	}
}

#[async_trait::async_trait]
impl BufferedTransform for MethodOverride {
	fn name(&self) -> &str {
		"method-override"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		if ctx.side() != Side::Request {
			return false;
		}
		if ctx.method() == &self.to {
			return false;
		}
		match &self.when {
			Some(expected) => ctx.method() == expected,
			None => true,
		}
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		ctx.set_method(self.to.clone());
		Ok(())
	}
}

#[cfg(test)]
#[path = "method_tests.rs"]
mod tests;
