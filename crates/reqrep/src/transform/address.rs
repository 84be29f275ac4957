//! Address-rewriting members of the buffered catalog (§4.C): path prefix
//! rewrite, path regex rewrite, query param add/remove, host rewrite.

use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::error::TransformError;
use crate::message::BufferedView;
use crate::transform::{BufferedTransform, ParamBag};

/// Regex matching is bounded so a pathological pattern authored into a
/// route's config can't stall a request indefinitely — independent of,
/// and tighter than, the transform's own pipeline-level timeout (§4.C).
const REGEX_MATCH_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct PathPrefixRewrite {
	from: String,
	to: String,
}

impl PathPrefixRewrite {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			from: params.required_string("from")?,
			to: params.required_string("to")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for PathPrefixRewrite {
	fn name(&self) -> &str {
		"path-prefix-rewrite"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.address().path().starts_with(&self.from)
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let mut address = ctx.address().clone();
		let rest = &address.path()[self.from.len()..];
		let rewritten = format!("{}{}", self.to, rest);
		address.set_path(&rewritten);
		ctx.set_address(address);
		Ok(())
	}
}

/// Rewrites the path against a regex compiled once at `configure` time, not
/// per-request (§4.C "compiled once"). `$1`-style capture references in
/// `replacement` are expanded by `regex::Regex::replace`.
#[derive(Debug)]
pub struct PathRegexRewrite {
	pattern: Regex,
	replacement: String,
}

impl PathRegexRewrite {
	pub fn configure(params: &ParamBag) -> anyhow::Result<Self> {
		let pattern = params.required_string("pattern")?;
		let replacement = params.required_string("replacement")?;
		let pattern = Regex::new(&pattern)?;
		Ok(Self { pattern, replacement })
	}
}

#[async_trait::async_trait]
impl BufferedTransform for PathRegexRewrite {
	fn name(&self) -> &str {
		"path-regex-rewrite"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		self.pattern.is_match(ctx.address().path())
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let pattern = self.pattern.clone();
		let replacement = self.replacement.clone();
		let path = ctx.address().path().to_string();

		let rewritten = tokio::time::timeout(
			REGEX_MATCH_TIMEOUT,
			tokio::task::spawn_blocking(move || pattern.replace(&path, replacement.as_str()).into_owned()),
		)
		.await
		.map_err(|_| {
			TransformError::other(format!(
				"path regex match exceeded {REGEX_MATCH_TIMEOUT:?}"
			))
		})?
		.map_err(|e| TransformError::other(format!("regex worker panicked: {e}")))?;

		let mut address = ctx.address().clone();
		address.set_path(&rewritten);
		ctx.set_address(address);
		Ok(())
	}
}

#[derive(Debug)]
pub struct AddQueryParam {
	key: String,
	value: String,
}

impl AddQueryParam {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			key: params.required_string("key")?,
			value: params.required_string("value")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for AddQueryParam {
	fn name(&self) -> &str {
		"add-query-param"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		!ctx.address().query_pairs().iter().any(|(k, _)| k == &self.key)
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let mut address = ctx.address().clone();
		let mut pairs = address.query_pairs();
		pairs.push((self.key.clone(), self.value.clone()));
		address.set_query_pairs(pairs);
		ctx.set_address(address);
		Ok(())
	}
}

#[derive(Debug)]
pub struct RemoveQueryParam {
	key: String,
}

impl RemoveQueryParam {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			key: params.required_string("key")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RemoveQueryParam {
	fn name(&self) -> &str {
		"remove-query-param"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.address().query_pairs().iter().any(|(k, _)| k == &self.key)
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let mut address = ctx.address().clone();
		let pairs: Vec<_> = address
			.query_pairs()
			.into_iter()
			.filter(|(k, _)| k != &self.key)
			.collect();
		address.set_query_pairs(pairs);
		ctx.set_address(address);
		Ok(())
	}
}

#[derive(Debug)]
pub struct HostRewrite {
	host: String,
	port: Option<u16>,
}

impl HostRewrite {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			host: params.required_string("host")?,
			port: params.int("port").map(|p| p as u16),
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for HostRewrite {
	fn name(&self) -> &str {
		"host-rewrite"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.address().host() != Some(self.host.as_str())
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let mut address = ctx.address().clone();
		address.set_host(&self.host);
		if let Some(port) = self.port {
			address.set_port(Some(port));
		}
		ctx.set_address(address);
		Ok(())
	}
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
