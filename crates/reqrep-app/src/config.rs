//! Configuration loading (§3, §6 "Configuration keys"): a `RawOptions`
//! struct mirroring the on-disk YAML shape 1:1, converted into the
//! immutable runtime [`reqrep::GlobalOptions`] — the same raw/cooked
//! split the teacher uses for its own `RawConfig`/`Config`.

use std::collections::HashSet;
use std::path::Path;

use reqrep::plan::FailureMode;
use reqrep::redact::RedactionPolicy;
use reqrep::GlobalOptions;
use reqrep_core::duration;

#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
	#[serde(default, with = "duration::option")]
	default_timeout: Option<std::time::Duration>,
	#[serde(default)]
	default_failure_mode: Option<FailureMode>,
	#[serde(default)]
	redacted_header_keys: Vec<String>,
	#[serde(default)]
	redacted_query_keys: Vec<String>,
}

#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
	#[serde(rename = "reqRepTransformation", default)]
	req_rep_transformation: RawOptions,
}

/// Reads `path` as YAML under the top-level `reqRepTransformation` key
/// (§6); a missing file or missing key falls back to all defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<GlobalOptions> {
	let raw = match path {
		Some(path) => {
			let text = std::fs::read_to_string(path)?;
			serde_yaml::from_str::<RawDocument>(&text)?.req_rep_transformation
		},
		None => RawOptions::default(),
	};

	let defaults = GlobalOptions::default();
	let header_keys: HashSet<String> = if raw.redacted_header_keys.is_empty() {
		reqrep::redact::default_redacted_header_keys()
	} else {
		raw.redacted_header_keys.into_iter().map(|s| s.to_ascii_lowercase()).collect()
	};
	let query_keys: HashSet<String> = if raw.redacted_query_keys.is_empty() {
		reqrep::redact::default_redacted_query_keys()
	} else {
		raw.redacted_query_keys.into_iter().collect()
	};

	Ok(GlobalOptions {
		default_timeout: raw.default_timeout.unwrap_or(defaults.default_timeout),
		default_failure_mode: raw.default_failure_mode.unwrap_or(defaults.default_failure_mode),
		redaction: RedactionPolicy::new(header_keys, query_keys),
	})
}
