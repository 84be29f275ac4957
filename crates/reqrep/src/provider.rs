//! Detail Provider (§4.E): maps an incoming context to a [`Plan`],
//! caching on `(method, normalized path)`. [`InMemoryDetailProvider`] is
//! the supplemental, test/sample-app-grade persistence stand-in (§6
//! "Non-goals": the real persistence layer is out of scope).

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::builder::DetailBuilder;
use crate::plan::Plan;
use crate::route::RouteEntry;

/// Replaces any path segment parseable as an integer or a UUID with the
/// literal `{id}` (§4.E, §6 "Plan cache key").
pub fn normalize_path(path: &str) -> String {
	path
		.split('/')
		.map(|segment| {
			if segment.is_empty() {
				segment.to_string()
			} else if segment.parse::<i64>().is_ok() || Uuid::parse_str(segment).is_ok() {
				"{id}".to_string()
			} else {
				segment.to_string()
			}
		})
		.collect::<Vec<_>>()
		.join("/")
}

pub fn cache_key(method: &str, normalized_path: &str) -> String {
	format!("{}:{}", method.to_ascii_uppercase(), normalized_path)
}

#[async_trait::async_trait]
pub trait DetailProvider: Send + Sync {
	async fn resolve(&self, method: &str, path: &str) -> anyhow::Result<Plan>;
}

/// Picks the row set applicable to `(method, path)`: longest path-prefix
/// wins; among equal-length prefixes, an exact method match beats the
/// `"*"` wildcard (§4.E, §6).
fn select_rows<'a>(rows: &'a [RouteEntry], method: &str, path: &str) -> Vec<&'a RouteEntry> {
	let mut candidates: Vec<&RouteEntry> = rows
		.iter()
		.filter(|r| path.starts_with(r.path.as_str()))
		.filter(|r| r.method.eq_ignore_ascii_case(method) || r.is_wildcard_method())
		.collect();

	let Some(best_len) = candidates.iter().map(|r| r.path.len()).max() else {
		return Vec::new();
	};
	candidates.retain(|r| r.path.len() == best_len);

	let exact_exists = candidates.iter().any(|r| r.method.eq_ignore_ascii_case(method));
	if exact_exists {
		candidates.retain(|r| r.method.eq_ignore_ascii_case(method));
	}
	candidates
}

pub struct InMemoryDetailProvider {
	rows: Vec<RouteEntry>,
	builder: DetailBuilder,
	cache: RwLock<HashMap<String, Plan>>,
}

impl InMemoryDetailProvider {
	pub fn new(rows: Vec<RouteEntry>, builder: DetailBuilder) -> Self {
		Self {
			rows,
			builder,
			cache: RwLock::new(HashMap::new()),
		}
	}
}

#[async_trait::async_trait]
impl DetailProvider for InMemoryDetailProvider {
	async fn resolve(&self, method: &str, path: &str) -> anyhow::Result<Plan> {
		let normalized = normalize_path(path);
		let key = cache_key(method, &normalized);

		if let Some(plan) = self.cache.read().get(&key) {
			return Ok(plan.clone());
		}

		let rows = select_rows(&self.rows, method, path);
		let plan = if rows.is_empty() {
			Plan::empty()
		} else {
			self.builder.build(rows.into_iter().cloned())
		};

		self.cache.write().insert(key, plan.clone());
		Ok(plan)
	}
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
