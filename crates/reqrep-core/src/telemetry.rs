//! Tracing/logging bootstrap, matching the gateway's use of
//! `tracing-subscriber` with an `EnvFilter` driven by `RUST_LOG`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global tracing subscriber. Safe to call once at process
/// startup; calling it twice returns an error that callers should log and
/// ignore (tests may call it from multiple test binaries).
pub fn init(default_filter: &str) -> anyhow::Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
	let fmt = tracing_subscriber::fmt::layer()
		.with_target(true)
		.with_span_events(FmtSpan::CLOSE);
	tracing_subscriber::registry()
		.with(filter)
		.with(fmt)
		.try_init()
		.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
