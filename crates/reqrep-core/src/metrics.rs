use std::fmt::Error;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;

/// A fresh, empty `prometheus_client::Registry` with the process's crate
/// name as its namespace. Callers register their own counters/collectors
/// into it and pass it to whatever scrape endpoint the host exposes.
pub fn new_registry(namespace: &str) -> Registry {
	Registry::with_prefix(namespace)
}

/// A single monotonic counter registered under `name`/`help`. Thin wrapper
/// so call sites don't repeat the `Counter::default()` + `register` pair.
pub fn register_counter(registry: &mut Registry, name: &str, help: &str) -> Counter<u64> {
	let counter = Counter::default();
	registry.register(name, help, counter.clone());
	counter
}

#[derive(Debug)]
pub struct TokioCollector {
	metrics: tokio::runtime::RuntimeMetrics,
}

impl TokioCollector {
	pub fn register(registry: &mut Registry, handle: &tokio::runtime::Handle) {
		let me = TokioCollector {
			metrics: handle.metrics(),
		};
		registry.register_collector(Box::new(me));
	}
}

macro_rules! encode {
	($self:expr, $encoder:expr, $metric_type:ident, $name:tt, $help:expr) => {{
		let metric = $metric_type::new($self.metrics.$name() as u64);
		let metric_encoder = $encoder.encode_descriptor(
			concat!("tokio_", stringify!($name)),
			$help,
			None,
			metric.metric_type(),
		)?;
		metric.encode(metric_encoder)?;
	}};
}

impl Collector for TokioCollector {
	fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), Error> {
		encode!(
			self,
			&mut encoder,
			ConstGauge,
			global_queue_depth,
			"number of tasks currently scheduled in the runtime’s global queue"
		);
		encode!(
			self,
			&mut encoder,
			ConstGauge,
			num_alive_tasks,
			"number of currently alive tasks in the runtime"
		);
		encode!(
			self,
			&mut encoder,
			ConstGauge,
			num_workers,
			"number of worker threads used by the runtime"
		);
		Ok(())
	}
}
