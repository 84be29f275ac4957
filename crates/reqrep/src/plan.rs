//! The resolved, per-route plan (§4.D `TransformationDetail`): an ordered
//! request/response transform list plus timeout and failure policy.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::transform::AnyTransform;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Side {
	Request,
	Response,
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Request => write!(f, "request"),
			Side::Response => write!(f, "response"),
		}
	}
}

/// Policy for what happens when a transform's `Apply` fails or times out
/// (§4.F "Failure handling"). The enum's `Default` happens to be
/// `StopPipeline` for historical reasons (it was the first variant added);
/// callers must never rely on that default directly — see
/// [`FailureModeSetting`] for why.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum FailureMode {
	#[default]
	StopPipeline,
	Continue,
	LogAndSkip,
}

/// Wraps a [`FailureMode`] together with the "was this ever explicitly
/// set" bit. A plan built without an explicit failure mode must fall back
/// to the global default, never to `FailureMode::default()` — conflating
/// the two would silently escalate unconfigured plans to `StopPipeline`
/// (§3, §4.F, §9).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FailureModeSetting {
	mode: FailureMode,
	explicit: bool,
}

impl FailureModeSetting {
	pub fn explicit(mode: FailureMode) -> Self {
		Self {
			mode,
			explicit: true,
		}
	}

	pub fn unset() -> Self {
		Self {
			mode: FailureMode::default(),
			explicit: false,
		}
	}

	pub fn is_explicit(&self) -> bool {
		self.explicit
	}

	/// Resolves against `global_default`, per §4.F "Effective config
	/// resolution": the explicit flag wins, never the raw enum value.
	pub fn effective(&self, global_default: FailureMode) -> FailureMode {
		if self.explicit {
			self.mode
		} else {
			global_default
		}
	}
}

impl Default for FailureModeSetting {
	fn default() -> Self {
		Self::unset()
	}
}

/// One (order, transform) slot on one side of a plan.
#[derive(Clone)]
pub struct PlanEntry {
	pub order: i64,
	pub transform: Arc<AnyTransform>,
}

impl fmt::Debug for PlanEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PlanEntry")
			.field("order", &self.order)
			.field("transform", &self.transform.name())
			.finish()
	}
}

/// The resolved, cacheable plan for one route. `Plan::empty()` is the
/// "pass through; use global defaults everywhere" singleton the provider
/// falls back to when no rows match.
#[derive(Clone, Debug, Default)]
pub struct Plan {
	request: Vec<PlanEntry>,
	response: Vec<PlanEntry>,
	/// Zero means "use the global default timeout" (§4.F).
	pub timeout: Duration,
	pub failure_mode: FailureModeSetting,
	pub allow_parallel_non_dependent: bool,
}

impl Plan {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.request.is_empty() && self.response.is_empty()
	}

	pub fn new(
		mut request: Vec<PlanEntry>,
		mut response: Vec<PlanEntry>,
		timeout: Duration,
		failure_mode: FailureModeSetting,
		allow_parallel_non_dependent: bool,
	) -> Self {
		sort_stable_by_order(&mut request);
		sort_stable_by_order(&mut response);
		Self {
			request,
			response,
			timeout,
			failure_mode,
			allow_parallel_non_dependent,
		}
	}

	pub fn entries(&self, side: Side) -> &[PlanEntry] {
		match side {
			Side::Request => &self.request,
			Side::Response => &self.response,
		}
	}

	pub fn effective_timeout(&self, global_default: Duration) -> Duration {
		if self.timeout.is_zero() {
			global_default
		} else {
			self.timeout
		}
	}
}

/// Stable ascending sort by `order`; ties preserve insertion order, which
/// `Vec::sort_by_key`'s documented stability already guarantees — called
/// out explicitly because it's a tested invariant (§8), not an accident.
fn sort_stable_by_order(entries: &mut [PlanEntry]) {
	entries.sort_by_key(|e| e.order);
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
