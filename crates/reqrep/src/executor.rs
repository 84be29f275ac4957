//! Pipeline Executor (§4.F): `run_request`/`run_response` entry points
//! delegating to one core loop, effective-config resolution, stable
//! sort-and-dispatch (sorting itself lives in [`Plan::new`]), per-
//! transform timeout/cancellation racing, and failure handling.
//!
//! Span *names* carrying the literal transform name (`reqrep.transform.
//! <name>`, per §6) aren't reachable here: `tracing` spans require a
//! `&'static str` callsite name, so a name that varies per configured
//! transform instance can't be the span name itself. We use the fixed
//! literal `reqrep.transform` and carry the real name as the
//! `transform.name` field instead — the same information, attached the
//! only way the static-callsite model allows.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info_span, warn, Instrument};

use crate::error::{TimeoutError, TransformError, TransformationFailure};
use crate::message::{BufferedView, MessageContext, StreamingView};
use crate::options::GlobalOptions;
use crate::plan::{FailureMode, Plan, PlanEntry, Side};
use crate::telemetry::{LogEvent, Metrics};
use crate::transform::AnyTransform;

#[derive(Debug)]
pub enum ExecutorError {
	/// Effective failure mode was `StopPipeline` (§4.F "Failure handling").
	StopPipeline(TransformationFailure),
	/// The exchange's own abort signal fired; not a transform failure and
	/// not subject to failure-mode handling (§5 "Cancellation", §7).
	Aborted,
}

impl std::fmt::Display for ExecutorError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ExecutorError::StopPipeline(e) => write!(f, "{e}"),
			ExecutorError::Aborted => write!(f, "pipeline aborted by client cancellation"),
		}
	}
}

impl std::error::Error for ExecutorError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ExecutorError::StopPipeline(e) => Some(e),
			ExecutorError::Aborted => None,
		}
	}
}

enum StepOutcome {
	Ok,
	Aborted,
	TimedOut(Duration),
	Failed(TransformError),
}

pub struct Executor {
	options: Arc<GlobalOptions>,
	metrics: Metrics,
}

impl Executor {
	pub fn new(options: Arc<GlobalOptions>, metrics: Metrics) -> Self {
		Self { options, metrics }
	}

	pub async fn run_request(&self, ctx: &mut MessageContext, plan: &Plan) -> Result<(), ExecutorError> {
		self.run(ctx, plan, Side::Request).await
	}

	pub async fn run_response(&self, ctx: &mut MessageContext, plan: &Plan) -> Result<(), ExecutorError> {
		self.run(ctx, plan, Side::Response).await
	}

	async fn run(&self, ctx: &mut MessageContext, plan: &Plan, side: Side) -> Result<(), ExecutorError> {
		let span = match side {
			Side::Request => info_span!("reqrep.pipeline.request", pipeline.side = %side),
			Side::Response => info_span!("reqrep.pipeline.response", pipeline.side = %side),
		};
		async {
			debug!(event_id = LogEvent::PipelineStart.id(), "pipeline start");

			let timeout = plan.effective_timeout(self.options.default_timeout);
			let failure_mode = plan.failure_mode.effective(self.options.default_failure_mode);
			let entries = plan.entries(side).to_vec();

			let result = if plan.allow_parallel_non_dependent {
				self.run_parallel(ctx, &entries, side, timeout, failure_mode).await
			} else {
				self.run_sequential(ctx, &entries, side, timeout, failure_mode).await
			};

			if result.is_err() {
				warn!(event_id = LogEvent::PipelineAborted.id(), "pipeline aborted");
			}
			debug!(event_id = LogEvent::PipelineStop.id(), "pipeline stop");
			result
		}
		.instrument(span)
		.await
	}

	async fn run_sequential(
		&self,
		ctx: &mut MessageContext,
		entries: &[PlanEntry],
		side: Side,
		timeout: Duration,
		failure_mode: FailureMode,
	) -> Result<(), ExecutorError> {
		for entry in entries {
			self.step(ctx, entry, side, timeout, failure_mode).await?;
		}
		Ok(())
	}

	/// Cooperative fan-out, not multi-threaded parallelism: every entry
	/// only ever touches `ctx` while holding the shared async lock, so no
	/// two entries ever hold `&mut MessageContext` at the same instant —
	/// this crate has no way to honor "truly concurrent mutation of one
	/// context" and still uphold Rust's aliasing rules. Entries that
	/// suspend (e.g. on `get_json`'s first-parse drain) let other entries
	/// make progress in the meantime, which is the only kind of
	/// "concurrency" §5 actually needs for non-dependent header/address
	/// transforms. The JSON-mutation hazard this mode doesn't protect
	/// against is documented, not enforced (§9 open question).
	async fn run_parallel(
		&self,
		ctx: &mut MessageContext,
		entries: &[PlanEntry],
		side: Side,
		timeout: Duration,
		failure_mode: FailureMode,
	) -> Result<(), ExecutorError> {
		let lock = tokio::sync::Mutex::new(ctx);
		let results = futures::future::join_all(entries.iter().map(|entry| {
			let lock = &lock;
			async move {
				let mut guard = lock.lock().await;
				self.step(&mut **guard, entry, side, timeout, failure_mode).await
			}
		}))
		.await;
		for result in results {
			result?;
		}
		Ok(())
	}

	async fn apply(transform: &AnyTransform, ctx: &mut MessageContext, cancel: tokio_util::sync::CancellationToken) -> Result<(), TransformError> {
		match transform {
			AnyTransform::Buffered(t) => t.apply(&mut BufferedView::new(ctx), cancel).await,
			AnyTransform::Streaming(t) => t.apply(&mut StreamingView::new(ctx), cancel).await,
		}
	}

	/// The six steps of §4.F "Per-transform step".
	async fn step(
		&self,
		ctx: &mut MessageContext,
		entry: &PlanEntry,
		side: Side,
		timeout: Duration,
		failure_mode: FailureMode,
	) -> Result<(), ExecutorError> {
		let transform = entry.transform.as_ref();

		let should_apply = match transform {
			AnyTransform::Buffered(t) => t.should_apply(&BufferedView::new(ctx)),
			AnyTransform::Streaming(t) => t.should_apply(&StreamingView::new(ctx)),
		};
		if !should_apply {
			self.metrics.transform_skipped.inc();
			debug!(
				event_id = LogEvent::TransformSkipped.id(),
				transform.name = transform.name(),
				"should_apply returned false"
			);
			return Ok(());
		}

		let content_type = ctx.payload().content_type().map(str::to_string).unwrap_or_default();
		let span = info_span!(
			"reqrep.transform",
			transform.name = transform.name(),
			transform.side = %side,
			transform.order = entry.order,
			payload.content_type = %content_type,
		);

		async {
			debug!(event_id = LogEvent::TransformExecuting.id(), "transform executing");
			let start = Instant::now();
			let ambient = ctx.cancellation().clone();

			let outcome = tokio::select! {
				biased;
				_ = ambient.cancelled() => StepOutcome::Aborted,
				res = tokio::time::timeout(timeout, Self::apply(transform, ctx, ambient.child_token())) => match res {
					Ok(Ok(())) => StepOutcome::Ok,
					Ok(Err(err)) => StepOutcome::Failed(err),
					Err(_) => StepOutcome::TimedOut(start.elapsed()),
				},
			};

			match outcome {
				StepOutcome::Ok => {
					self.metrics.transform_executed.inc();
					debug!(event_id = LogEvent::TransformCompleted.id(), "transform completed");
					Ok(())
				},
				StepOutcome::Aborted => Err(ExecutorError::Aborted),
				StepOutcome::TimedOut(elapsed) => {
					self.metrics.transform_failed.inc();
					warn!(event_id = LogEvent::TransformTimedOut.id(), ?elapsed, ?timeout, "transform timed out");
					self.handle_failure(
						transform.name(),
						side,
						failure_mode,
						TransformError::Timeout(TimeoutError { elapsed, limit: timeout }),
					)
				},
				StepOutcome::Failed(err) => {
					self.metrics.transform_failed.inc();
					error!(event_id = LogEvent::TransformFailed.id(), error = %err, "transform failed");
					self.handle_failure(transform.name(), side, failure_mode, err)
				},
			}
		}
		.instrument(span)
		.await
	}

	fn handle_failure(
		&self,
		transform_name: &str,
		side: Side,
		failure_mode: FailureMode,
		source: TransformError,
	) -> Result<(), ExecutorError> {
		match failure_mode {
			FailureMode::Continue | FailureMode::LogAndSkip => Ok(()),
			FailureMode::StopPipeline => Err(ExecutorError::StopPipeline(TransformationFailure {
				transform_name: transform_name.to_string(),
				side,
				source,
			})),
		}
	}
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
