use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::error::TransformError;
use crate::message::BufferedView;
use crate::transform::{AnyTransform, BufferedTransform};

#[derive(Debug)]
struct Noop(&'static str);

#[async_trait::async_trait]
impl BufferedTransform for Noop {
	fn name(&self) -> &str {
		self.0
	}

	fn should_apply(&self, _ctx: &BufferedView<'_>) -> bool {
		true
	}

	async fn apply(&self, _ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		Ok(())
	}
}

fn entry(order: i64, name: &'static str) -> PlanEntry {
	PlanEntry {
		order,
		transform: Arc::new(AnyTransform::Buffered(Arc::new(Noop(name)))),
	}
}

#[test]
fn entries_sort_ascending_by_order() {
	let plan = Plan::new(
		vec![entry(3, "c"), entry(1, "a"), entry(2, "b")],
		vec![],
		Duration::ZERO,
		FailureModeSetting::unset(),
		false,
	);
	let names: Vec<&str> = plan.entries(Side::Request).iter().map(|e| e.transform.name()).collect();
	assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn ties_preserve_insertion_order() {
	let plan = Plan::new(
		vec![entry(1, "first"), entry(1, "second"), entry(1, "third")],
		vec![],
		Duration::ZERO,
		FailureModeSetting::unset(),
		false,
	);
	let names: Vec<&str> = plan.entries(Side::Request).iter().map(|e| e.transform.name()).collect();
	assert_eq!(names, vec!["first", "second", "third"]);
}

#[test]
fn unset_failure_mode_falls_back_to_global_default_not_enum_default() {
	let setting = FailureModeSetting::unset();
	assert!(!setting.is_explicit());
	assert_eq!(setting.effective(FailureMode::Continue), FailureMode::Continue);
	assert_eq!(setting.effective(FailureMode::LogAndSkip), FailureMode::LogAndSkip);
}

#[test]
fn explicit_failure_mode_always_wins() {
	let setting = FailureModeSetting::explicit(FailureMode::LogAndSkip);
	assert!(setting.is_explicit());
	assert_eq!(setting.effective(FailureMode::StopPipeline), FailureMode::LogAndSkip);
}

#[test]
fn zero_timeout_falls_back_to_global_default() {
	let plan = Plan::new(vec![], vec![], Duration::ZERO, FailureModeSetting::unset(), false);
	assert_eq!(plan.effective_timeout(Duration::from_secs(5)), Duration::from_secs(5));
}

#[test]
fn explicit_timeout_overrides_global_default() {
	let plan = Plan::new(
		vec![],
		vec![],
		Duration::from_secs(2),
		FailureModeSetting::unset(),
		false,
	);
	assert_eq!(plan.effective_timeout(Duration::from_secs(5)), Duration::from_secs(2));
}

#[test]
fn empty_plan_has_no_entries_either_side() {
	let plan = Plan::empty();
	assert!(plan.is_empty());
	assert!(plan.entries(Side::Request).is_empty());
	assert!(plan.entries(Side::Response).is_empty());
}
