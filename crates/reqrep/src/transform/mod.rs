//! Transform Catalog (§4.C): the three-method contract (name, configure,
//! should-apply + apply) split into two disjoint families, plus the
//! parameter bag transforms are configured from and the registry that maps
//! a persisted transformer-key to a factory.

pub mod address;
pub mod headers;
pub mod jwt;
pub mod json;
pub mod method;
pub mod param_bag;
pub mod registry;
pub mod streaming;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TransformError;
use crate::message::{BufferedView, StreamingView};

pub use param_bag::ParamBag;
pub use registry::Registry;

/// A buffered transform: may touch headers, address, method, and the
/// buffered body (bytes or JSON) of one message side (§4.C).
#[async_trait::async_trait]
pub trait BufferedTransform: Send + Sync + std::fmt::Debug {
	fn name(&self) -> &str;

	/// Synchronous and allocation-free by contract (§5) — callers may rely
	/// on it never suspending.
	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool;

	async fn apply(
		&self,
		ctx: &mut BufferedView<'_>,
		cancel: CancellationToken,
	) -> Result<(), TransformError>;
}

/// A streaming transform: may touch headers and address only; the body
/// flows through untouched via the pipe reader (§4.C).
#[async_trait::async_trait]
pub trait StreamingTransform: Send + Sync + std::fmt::Debug {
	fn name(&self) -> &str;

	fn should_apply(&self, ctx: &StreamingView<'_>) -> bool;

	async fn apply(
		&self,
		ctx: &mut StreamingView<'_>,
		cancel: CancellationToken,
	) -> Result<(), TransformError>;
}

/// One configured transform instance, tagged with its family so the
/// executor knows which view to construct (§4.F step 4).
#[derive(Clone, Debug)]
pub enum AnyTransform {
	Buffered(Arc<dyn BufferedTransform>),
	Streaming(Arc<dyn StreamingTransform>),
}

impl AnyTransform {
	pub fn name(&self) -> &str {
		match self {
			AnyTransform::Buffered(t) => t.name(),
			AnyTransform::Streaming(t) => t.name(),
		}
	}
}
