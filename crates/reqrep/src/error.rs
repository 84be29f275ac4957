//! Error kinds named in the design (§7): `PayloadAccessViolation`,
//! `MissingParam`, `TimeoutError`, `TransformationFailure`. All four are
//! typed with `thiserror` so the executor and builder can match on them
//! instead of stringly-typed `anyhow` errors; `anyhow` remains for
//! configuration/provider glue that has no caller expecting a specific
//! variant.

use std::time::Duration;

use crate::plan::Side;

/// A transform misused the payload (e.g. `get_json` on a non-JSON body).
/// Compile-time discipline between buffered and streaming views makes this
/// belt-and-braces rather than the primary defense (§4.B).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadAccessViolation {
	#[error("get_json called on a non-JSON payload (content-type {content_type:?})")]
	NotJson { content_type: Option<String> },
	#[error("get_buffer called on a streaming payload")]
	StreamingBody,
	#[error("get_pipe_reader called on a buffered payload with no reader")]
	NoReader,
}

/// A transform's `Configure` step could not find a required parameter.
/// Surfaced only at configure time; the builder logs it and drops the row
/// rather than failing the whole plan (§4.E).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required parameter {key:?}")]
pub struct MissingParam {
	pub key: String,
}

/// Synthesized by the executor when a transform's effective per-transform
/// deadline fires before the transform completes (§4.F step 6).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("transform timed out after {elapsed:?} (limit {limit:?})")]
pub struct TimeoutError {
	pub elapsed: Duration,
	pub limit: Duration,
}

/// Raised to the host when the effective failure mode is `StopPipeline`.
/// Carries enough to let the host build the 502 gateway-error body (§6).
#[derive(thiserror::Error, Debug, Clone)]
#[error("{side} transformation failed in '{transform_name}'")]
pub struct TransformationFailure {
	pub transform_name: String,
	pub side: Side,
	#[source]
	pub source: TransformError,
}

/// Whatever actually went wrong inside a single transform's `Apply`.
#[derive(thiserror::Error, Debug, Clone)]
pub enum TransformError {
	#[error(transparent)]
	Access(#[from] PayloadAccessViolation),
	#[error(transparent)]
	Timeout(#[from] TimeoutError),
	#[error("{0}")]
	Other(String),
}

impl TransformError {
	pub fn other(msg: impl Into<String>) -> Self {
		Self::Other(msg.into())
	}
}
