//! Go-style duration strings ("5s", "250ms", "2m30s") for config fields,
//! matching the `serde_dur` / `serde_dur_option` convention referenced
//! throughout the gateway's raw config types.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&durationfmt::to_string(*d))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
	let s = String::deserialize(deserializer)?;
	parse(&s).map_err(serde::de::Error::custom)
}

pub fn parse(s: &str) -> anyhow::Result<Duration> {
	let nanos = go_parse_duration::parse_duration(s)
		.map_err(|e| anyhow::anyhow!("invalid duration {s:?}: {e:?}"))?;
	if nanos < 0 {
		anyhow::bail!("duration {s:?} must not be negative");
	}
	Ok(Duration::from_nanos(nanos as u64))
}

pub mod option {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(d: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
		match d {
			Some(d) => serializer.serialize_some(&durationfmt::to_string(*d)),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<Duration>, D::Error> {
		let s = Option::<String>::deserialize(deserializer)?;
		s.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
			.transpose()
	}
}
