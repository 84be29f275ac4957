//! The type-erased HTTP body the host hands the pipeline, mirroring the
//! gateway's own `Body` alias (see `http/peekbody.rs` in the teacher repo).

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, Limited};

pub type BodyError = anyhow::Error;
pub type Body = BoxBody<Bytes, BodyError>;

pub fn empty() -> Body {
	Full::new(Bytes::new())
		.map_err(|never: std::convert::Infallible| match never {})
		.boxed()
}

pub fn from_bytes(b: Bytes) -> Body {
	Full::new(b)
		.map_err(|never: std::convert::Infallible| match never {})
		.boxed()
}

/// Drains `body` fully, failing if more than `limit` bytes arrive. Used by
/// the payload's buffered face the first time it needs the wire bytes.
pub async fn read_body_with_limit(body: Body, limit: usize) -> anyhow::Result<Bytes> {
	let collected = Limited::new(body, limit)
		.collect()
		.await
		.map_err(|e| anyhow::anyhow!("failed to read body: {e}"))?;
	Ok(collected.to_bytes())
}
