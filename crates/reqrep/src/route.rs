//! The persistence row shape (§6 "Persistence row format"): six columns,
//! method/path/transformer-key/side/order/params-json. The design assumes
//! this shape; any concrete store just needs to produce rows of it.

use crate::plan::Side;

/// `method` is either an exact HTTP method or the wildcard `"*"`. `path` is
/// a prefix, matched longest-prefix-wins with exact method preferred over
/// wildcard (§4.E, §6). `params_json` of `None`/empty means "no params".
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RouteEntry {
	pub method: String,
	pub path: String,
	pub transformer_key: String,
	pub side: Side,
	pub order: i64,
	pub params_json: Option<String>,
}

impl RouteEntry {
	pub fn is_wildcard_method(&self) -> bool {
		self.method == "*"
	}
}
