//! JSON-body members of the buffered catalog (§4.C): field add/remove/
//! rename, nested-path set, and the gateway-metadata envelope.

use chrono::Utc;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::TransformError;
use crate::message::BufferedView;
use crate::transform::headers::hex32_id;
use crate::transform::{BufferedTransform, ParamBag};

/// Walks a dot-delimited path (`"meta.gateway.version"`), creating
/// intermediate objects as needed, and sets the leaf to `value`. A path
/// segment that already names a non-object value is overwritten rather
/// than traversed into.
fn set_nested(root: &mut Value, path: &str, value: Value) {
	let mut segments = path.split('.').peekable();
	let mut current = root;
	while let Some(segment) = segments.next() {
		if !current.is_object() {
			*current = Value::Object(Map::new());
		}
		let map = current.as_object_mut().expect("just coerced to object");
		if segments.peek().is_none() {
			map.insert(segment.to_string(), value);
			return;
		}
		current = map.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
	}
}

fn remove_nested(root: &mut Value, path: &str) {
	let mut segments: Vec<&str> = path.split('.').collect();
	let Some(leaf) = segments.pop() else { return };
	let mut current = root;
	for segment in segments {
		let Some(next) = current.get_mut(segment) else { return };
		current = next;
	}
	if let Some(map) = current.as_object_mut() {
		map.remove(leaf);
	}
}

async fn with_json<F>(ctx: &BufferedView<'_>, f: F) -> Result<(), TransformError>
where
	F: FnOnce(&mut Value),
{
	let cell = ctx.get_json().await?;
	let mut guard = cell.lock();
	let tree = guard.get_or_insert_with(|| Value::Object(Map::new()));
	f(tree);
	Ok(())
}

#[derive(Debug)]
pub struct SetJsonField {
	path: String,
	value: Value,
}

impl SetJsonField {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		let path = params.required_string("path")?;
		let value = params.string("value").map(Value::String).unwrap_or(Value::Null);
		Ok(Self { path, value })
	}
}

#[async_trait::async_trait]
impl BufferedTransform for SetJsonField {
	fn name(&self) -> &str {
		"set-json-field"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.is_json()
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let value = self.value.clone();
		with_json(ctx, |tree| set_nested(tree, &self.path, value)).await
	}
}

#[derive(Debug)]
pub struct RemoveJsonField {
	path: String,
}

impl RemoveJsonField {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			path: params.required_string("path")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RemoveJsonField {
	fn name(&self) -> &str {
		"remove-json-field"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.is_json()
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		with_json(ctx, |tree| remove_nested(tree, &self.path)).await
	}
}

#[derive(Debug)]
pub struct RenameJsonField {
	from: String,
	to: String,
}

impl RenameJsonField {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			from: params.required_string("from")?,
			to: params.required_string("to")?,
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for RenameJsonField {
	fn name(&self) -> &str {
		"rename-json-field"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.is_json()
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let from = self.from.clone();
		let to = self.to.clone();
		with_json(ctx, move |tree| {
			let mut segments: Vec<&str> = from.split('.').collect();
			let Some(leaf) = segments.pop() else { return };
			let mut current = &mut *tree;
			for segment in segments {
				let Some(next) = current.get_mut(segment) else { return };
				current = next;
			}
			let Some(map) = current.as_object_mut() else { return };
			if let Some(value) = map.remove(leaf) {
				set_nested(tree, &to, value);
			}
		})
		.await
	}
}

/// Stamps the gateway's processed-by metadata onto the body: `version`
/// (the gateway build), `processedAt` (ISO-8601 UTC), and `requestId`
/// (32 lowercase hex, no dashes) — all nested under `meta.gateway` (§3,
/// §4.C).
#[derive(Debug)]
pub struct GatewayMetadata {
	version: String,
	path: String,
}

impl GatewayMetadata {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		Ok(Self {
			version: params
				.string("version")
				.unwrap_or_else(|| reqrep_core::version::BuildInfo::new().version.to_string()),
			path: params.string("path").unwrap_or_else(|| "meta.gateway".to_string()),
		})
	}
}

#[async_trait::async_trait]
impl BufferedTransform for GatewayMetadata {
	fn name(&self) -> &str {
		"gateway-metadata"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		ctx.is_json()
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let envelope = serde_json::json!({
			"version": self.version,
			"processedAt": Utc::now().to_rfc3339(),
			"requestId": hex32_id(),
		});
		let path = self.path.clone();
		with_json(ctx, move |tree| set_nested(tree, &path, envelope)).await
	}
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
