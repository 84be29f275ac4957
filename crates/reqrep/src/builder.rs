//! Detail Builder (§4.E): resolves a row list into configured transform
//! instances via the [`Registry`], partitions by side, and produces a
//! [`Plan`]. Unknown transformer-keys and `Configure` failures (including
//! `MissingParam`) are logged and the row dropped — never fail the whole
//! plan.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::plan::{FailureModeSetting, Plan, PlanEntry};
use crate::route::RouteEntry;
use crate::transform::{ParamBag, Registry};

#[derive(Clone)]
pub struct DetailBuilder {
	registry: Arc<Registry>,
	timeout: Duration,
	failure_mode: FailureModeSetting,
	allow_parallel_non_dependent: bool,
}

impl DetailBuilder {
	pub fn new(
		registry: Arc<Registry>,
		timeout: Duration,
		failure_mode: FailureModeSetting,
		allow_parallel_non_dependent: bool,
	) -> Self {
		Self {
			registry,
			timeout,
			failure_mode,
			allow_parallel_non_dependent,
		}
	}

	/// Consumes `rows`, drops anything that doesn't resolve/configure, and
	/// returns the resulting plan — never an error (§4.E "the plan
	/// continues with all other rows").
	pub fn build(&self, rows: impl IntoIterator<Item = RouteEntry>) -> Plan {
		let mut request = Vec::new();
		let mut response = Vec::new();

		for row in rows {
			let params = ParamBag::parse(row.params_json.as_deref());
			match self.registry.build(&row.transformer_key, &params) {
				Ok(transform) => {
					let entry = PlanEntry {
						order: row.order,
						transform: Arc::new(transform),
					};
					match row.side {
						crate::plan::Side::Request => request.push(entry),
						crate::plan::Side::Response => response.push(entry),
					}
				},
				Err(err) => {
					warn!(
						transformer_key = %row.transformer_key,
						side = %row.side,
						order = row.order,
						error = %err,
						"dropping route row: transform could not be configured"
					);
				},
			}
		}

		Plan::new(
			request,
			response,
			self.timeout,
			self.failure_mode,
			self.allow_parallel_non_dependent,
		)
	}
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
