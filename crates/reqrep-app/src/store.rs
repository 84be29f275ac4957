//! A file-backed route source (§6 "Persistence row format"): reads the
//! six-column row list from a YAML file into `Vec<RouteEntry>`. The real
//! persistence layer is explicitly out of scope; this is the supplemental
//! stand-in needed to exercise the engine outside of tests.

use std::path::Path;

use reqrep::RouteEntry;

pub fn load_routes(path: &Path) -> anyhow::Result<Vec<RouteEntry>> {
	let text = std::fs::read_to_string(path)?;
	let rows: Vec<RouteEntry> = serde_yaml::from_str(&text)?;
	Ok(rows)
}

#[cfg(test)]
mod tests {
	use reqrep::Side;

	use super::*;

	#[test]
	fn loads_rows_from_yaml() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("routes.yaml");
		std::fs::write(
			&path,
			r#"
- method: POST
  path: /api/orders
  transformer_key: correlation-id
  side: Request
  order: 10
  params_json: null
"#,
		)
		.unwrap();
		let rows = load_routes(&path).unwrap();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].method, "POST");
		assert_eq!(rows[0].side, Side::Request);
	}
}
