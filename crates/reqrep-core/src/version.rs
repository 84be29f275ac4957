//! Build metadata surfaced in the `_gateway.version` field the
//! gateway-metadata transform writes into request bodies.

#[derive(Clone, Debug, serde::Serialize)]
pub struct BuildInfo {
	pub version: &'static str,
	pub rust_version: &'static str,
}

impl BuildInfo {
	pub fn new() -> Self {
		Self {
			version: env!("CARGO_PKG_VERSION"),
			rust_version: "unknown",
		}
	}
}

impl Default for BuildInfo {
	fn default() -> Self {
		Self::new()
	}
}
