//! Process-wide defaults (§6 "Configuration keys"): default timeout,
//! default failure mode, and the redacted header/query key sets. Built
//! once at startup and shared by reference thereafter — the executor
//! never mutates it (§5 "the executor is stateless across exchanges
//! aside from the immutable global options object").

use std::time::Duration;

use crate::plan::FailureMode;
use crate::redact::RedactionPolicy;

#[derive(Clone, Debug)]
pub struct GlobalOptions {
	pub default_timeout: Duration,
	pub default_failure_mode: FailureMode,
	pub redaction: RedactionPolicy,
}

impl Default for GlobalOptions {
	fn default() -> Self {
		Self {
			default_timeout: Duration::from_secs(5),
			default_failure_mode: FailureMode::LogAndSkip,
			redaction: RedactionPolicy::default(),
		}
	}
}
