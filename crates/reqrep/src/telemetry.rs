//! Observability contract (§4.F, §6): span/event names, transform result
//! counters, and the 1000-1599 log event-id partition.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;
use reqrep_core::metrics::register_counter;

pub fn pipeline_span_name(side: crate::plan::Side) -> &'static str {
	match side {
		crate::plan::Side::Request => "reqrep.pipeline.request",
		crate::plan::Side::Response => "reqrep.pipeline.response",
	}
}

pub const TRANSFORM_SPAN_PREFIX: &str = "reqrep.transform.";

/// Log event ids, partitioned per §4.F: pipeline lifecycle (1000s),
/// per-transform lifecycle (1100s-1200s), failures (1300s), pipeline
/// abort (1400s). Gaps are deliberate headroom, not reserved meaning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum LogEvent {
	PipelineStart = 1000,
	PipelineStop = 1001,
	TransformExecuting = 1100,
	TransformCompleted = 1101,
	TransformSkipped = 1200,
	TransformFailed = 1300,
	TransformTimedOut = 1301,
	PipelineAborted = 1400,
}

impl LogEvent {
	pub fn id(self) -> u16 {
		self as u16
	}
}

/// Counters named exactly per §6: `reqrep.transform.{executed,skipped,
/// failed}`. Registered once at startup and threaded down, rather than
/// kept as global statics (§3).
#[derive(Clone, Debug)]
pub struct Metrics {
	pub transform_executed: Counter<u64>,
	pub transform_skipped: Counter<u64>,
	pub transform_failed: Counter<u64>,
}

impl Metrics {
	pub fn register(registry: &mut Registry) -> Self {
		Self {
			transform_executed: register_counter(registry, "reqrep_transform_executed", "transforms applied"),
			transform_skipped: register_counter(registry, "reqrep_transform_skipped", "transforms skipped by ShouldApply"),
			transform_failed: register_counter(registry, "reqrep_transform_failed", "transforms that errored or timed out"),
		}
	}
}
