//! The parameter bag transforms are configured from (§4.C): an opaque JSON
//! object string with typed accessors. Absent required keys fail fast;
//! invalid JSON yields an empty, non-fatal bag.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::MissingParam;

#[derive(Clone, Debug, Default)]
pub struct ParamBag(Map<String, Value>);

impl ParamBag {
	/// `None`/empty/invalid JSON all yield an empty bag — only a
	/// `MissingParam` at `required_string` time is fatal (§4.E).
	pub fn parse(raw: Option<&str>) -> Self {
		let Some(raw) = raw else {
			return Self::default();
		};
		if raw.trim().is_empty() {
			return Self::default();
		}
		match serde_json::from_str::<Value>(raw) {
			Ok(Value::Object(map)) => Self(map),
			_ => Self::default(),
		}
	}

	pub fn string(&self, key: &str) -> Option<String> {
		self.0.get(key)?.as_str().map(str::to_string)
	}

	pub fn required_string(&self, key: &str) -> Result<String, MissingParam> {
		self.string(key).ok_or_else(|| MissingParam {
			key: key.to_string(),
		})
	}

	/// Accepts a JSON boolean, or falls back to parsing `"true"`/`"false"`
	/// string values (the enumerated catalog's config rows are stored as
	/// JSON but often authored by hand as all-string key/value pairs).
	pub fn bool(&self, key: &str, default: bool) -> bool {
		match self.0.get(key) {
			Some(Value::Bool(b)) => *b,
			Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
			Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
			_ => default,
		}
	}

	pub fn int(&self, key: &str) -> Option<i64> {
		match self.0.get(key) {
			Some(Value::Number(n)) => n.as_i64(),
			Some(Value::String(s)) => s.parse().ok(),
			_ => None,
		}
	}

	/// Splits a pipe-delimited string value (`"a|b|c"`) into a list.
	pub fn string_list(&self, key: &str) -> Vec<String> {
		self
			.string(key)
			.map(|s| s.split('|').map(str::to_string).filter(|s| !s.is_empty()).collect())
			.unwrap_or_default()
	}

	/// Splits a pipe-delimited `"k=v|k=v"` value into ordered pairs.
	pub fn pair_map(&self, key: &str) -> Vec<(String, String)> {
		self
			.string(key)
			.map(|s| {
				s.split('|')
					.filter_map(|kv| {
						let (k, v) = kv.split_once('=')?;
						Some((k.to_string(), v.to_string()))
					})
					.collect()
			})
			.unwrap_or_default()
	}

	pub fn deserialize<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
		Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
	}
}
