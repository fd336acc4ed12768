//! Full-table and single-row server responses.
//!
//! Rows are parsed one at a time: a row that fails to deserialize is logged and dropped instead of failing the whole payload.

use crate::{
	compat::TableMeta,
	model::{RowData, RowKey},
};
use hashbrown::HashMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, instrument, trace};

/// Key of the sort mode used when the table is first shown and nothing else is requested.
pub const SORT_MODE_PATH_HEADER: &str = "ph";
const SORT_MODE_CODE_CALENDAR: &str = "codecal";
const SORT_MODE_METAZONE: &str = "metazon";

#[derive(Debug, Error)]
pub enum PayloadError {
	/// The response is not JSON of the expected shape.
	#[error("malformed payload: {0}")]
	Json(#[from] serde_json::Error),
	/// The server answered with an explicit error message instead of rows.
	#[error("server reported an error: {0}")]
	Server(String),
}

/// One partition boundary as sent by the server: rows `start..limit` of the sort order belong to `name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartitionSpec {
	#[serde(default)]
	pub name: String,
	pub start: usize,
	pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrder {
	#[serde(default)]
	pub partitions: Vec<PartitionSpec>,
	#[serde(alias = "rows")]
	pub row_key_order: Vec<RowKey>,
}

/// A row that was present in a payload but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
	pub row_key: RowKey,
	pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullTablePayload {
	pub page_id: Option<String>,
	pub locale: Option<String>,
	pub can_modify: bool,
	/// Whether the payload describes a section of data at all (as opposed to being empty).
	pub has_section: bool,
	pub rows: HashMap<RowKey, RowData>,
	pub sort_orders: BTreeMap<String, SortOrder>,
	pub default_sort_mode: Option<String>,
	pub rejected_rows: Vec<RejectedRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
	#[serde(default)]
	page_id: Option<String>,
	#[serde(default, alias = "loc", alias = "_")]
	locale: Option<String>,
	#[serde(default)]
	can_modify: bool,
	#[serde(default)]
	rows: Option<BTreeMap<RowKey, Value>>,
	#[serde(default)]
	page: Option<RawSection>,
	#[serde(default)]
	section: Option<RawSection>,
	#[serde(default, alias = "displaySets")]
	sort_orders: BTreeMap<String, Value>,
	#[serde(default)]
	default_sort_mode: Option<String>,
	#[serde(default)]
	err: Option<String>,
	#[serde(default)]
	issues: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawSection {
	#[serde(default)]
	rows: Option<BTreeMap<RowKey, Value>>,
}

impl RawTable {
	fn check_err(&self) -> Result<(), PayloadError> {
		match self.err.as_deref() {
			Some(err) if !err.is_empty() => Err(PayloadError::Server(err.to_owned())),
			_ => Ok(()),
		}
	}

	/// Rows sit under `page` in REST responses, at the top level in flat ones and under `section` in legacy ones.
	///
	/// A `page` without `rows` still counts as a section of data, with no rows in it.
	fn take_rows(&mut self) -> Option<BTreeMap<RowKey, Value>> {
		if let Some(page) = self.page.take() {
			return Some(page.rows.unwrap_or_default());
		}
		self.rows.take().or_else(|| self.section.take().and_then(|section| section.rows))
	}
}

fn parse_rows(raw: BTreeMap<RowKey, Value>) -> (HashMap<RowKey, RowData>, Vec<RejectedRow>) {
	let mut rows = HashMap::with_capacity(raw.len());
	let mut rejected = Vec::new();
	for (row_key, value) in raw {
		match serde_json::from_value::<RowData>(value) {
			Ok(row) => {
				rows.insert(row_key, row);
			}
			Err(error) => {
				error!("Dropping row {:?} that failed to parse: {}", row_key, error);
				rejected.push(RejectedRow { row_key, reason: error.to_string() });
			}
		}
	}
	(rows, rejected)
}

impl FullTablePayload {
	/// # Errors
	///
	/// Iff `json` isn't a JSON object of the right shape or carries a server error message.
	#[instrument(skip(json))]
	pub fn from_json(json: &str) -> Result<Self, PayloadError> {
		Self::from_value(serde_json::from_str(json)?)
	}

	/// # Errors
	///
	/// Iff `value` isn't an object of the right shape or carries a server error message.
	pub fn from_value(value: Value) -> Result<Self, PayloadError> {
		let mut raw: RawTable = serde_json::from_value(value)?;
		raw.check_err()?;

		let raw_rows = raw.take_rows();
		let has_section = raw_rows.is_some();
		let (rows, rejected_rows) = parse_rows(raw_rows.unwrap_or_default());

		let mut default_sort_mode = raw.default_sort_mode;
		let mut sort_orders = BTreeMap::new();
		for (mode, value) in raw.sort_orders {
			match value {
				// Legacy `displaySets` name the default mode under the key `default`.
				Value::String(name) if mode == "default" => {
					default_sort_mode.get_or_insert(name);
				}
				value => match serde_json::from_value::<SortOrder>(value) {
					Ok(order) => {
						sort_orders.insert(mode, order);
					}
					Err(error) => error!("Ignoring sort mode {:?} that failed to parse: {}", mode, error),
				},
			}
		}

		trace!(rows = rows.len(), sort_modes = sort_orders.len(), "Parsed table payload.");
		Ok(Self {
			page_id: raw.page_id,
			locale: raw.locale,
			can_modify: raw.can_modify,
			has_section,
			rows,
			sort_orders,
			default_sort_mode,
			rejected_rows,
		})
	}

	#[must_use]
	pub fn meta(&self) -> TableMeta {
		TableMeta {
			has_section: self.has_section,
			page_id: self.page_id.clone(),
			locale: self.locale.clone(),
			can_modify: self.can_modify,
			row_count: self.rows.len(),
		}
	}

	/// Picks the sort mode to display: the `preferred` one if the payload has it, else the first of
	/// `codecal`, `metazon`, the payload's default and `ph` that exists, else the alphabetically first one.
	#[must_use]
	pub fn resolve_sort_mode(&self, preferred: Option<&str>) -> Option<String> {
		let candidates = preferred
			.into_iter()
			.chain([SORT_MODE_CODE_CALENDAR, SORT_MODE_METAZONE].iter().copied())
			.chain(self.default_sort_mode.as_deref())
			.chain(Some(SORT_MODE_PATH_HEADER));
		for mode in candidates {
			if self.sort_orders.contains_key(mode) {
				return Some(mode.to_owned());
			}
			debug!("Sort mode {:?} not present in payload.", mode);
		}
		self.sort_orders.keys().next().cloned()
	}
}

/// The response to a single-row fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleRowPayload {
	pub rows: HashMap<RowKey, RowData>,
	/// Notification categories currently raised on the row, if the server reported them.
	pub issues: Option<Vec<String>>,
	pub rejected_rows: Vec<RejectedRow>,
}

impl SingleRowPayload {
	/// # Errors
	///
	/// Iff `json` isn't a JSON object of the right shape or carries a server error message.
	#[instrument(skip(json))]
	pub fn from_json(json: &str) -> Result<Self, PayloadError> {
		Self::from_value(serde_json::from_str(json)?)
	}

	/// # Errors
	///
	/// Iff `value` isn't an object of the right shape or carries a server error message.
	pub fn from_value(value: Value) -> Result<Self, PayloadError> {
		let mut raw: RawTable = serde_json::from_value(value)?;
		raw.check_err()?;
		let (rows, rejected_rows) = parse_rows(raw.take_rows().unwrap_or_default());
		Ok(Self { rows, issues: raw.issues, rejected_rows })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn bad_rows_are_dropped() {
		let payload = FullTablePayload::from_value(json!({
			"pageId": "Languages",
			"locale": "de",
			"canModify": true,
			"rows": {
				"good": { "pathHash": "g", "pathId": 1 },
				"bad": { "pathId": "not a number" },
			},
			"sortOrders": { "ph": { "rowKeyOrder": ["good", "bad"] } },
		}))
		.unwrap();
		assert_eq!(payload.rows.len(), 1);
		assert_eq!(payload.rejected_rows.len(), 1);
		assert_eq!(payload.rejected_rows[0].row_key, "bad");
		assert_eq!(payload.meta().row_count, 1);
		assert!(payload.meta().has_section);
	}

	#[test]
	fn legacy_envelope() {
		let payload = FullTablePayload::from_value(json!({
			"pageId": "Languages",
			"loc": "de",
			"section": { "rows": { "k": { "xpstrid": "h" } } },
			"displaySets": {
				"default": "codecal",
				"codecal": { "partitions": [{ "name": "A", "start": 0, "limit": 1 }], "rows": ["k"] },
			},
		}))
		.unwrap();
		assert_eq!(payload.locale.as_deref(), Some("de"));
		assert_eq!(payload.default_sort_mode.as_deref(), Some("codecal"));
		assert_eq!(payload.sort_orders["codecal"].row_key_order, ["k"]);
		assert_eq!(payload.resolve_sort_mode(None).as_deref(), Some("codecal"));
	}

	#[test]
	fn rest_page_envelope() {
		let payload = FullTablePayload::from_value(json!({
			"pageId": "Languages",
			"loc": "de",
			"canModify": true,
			"page": { "nocontent": false, "rows": { "_x1": { "xpstrid": "h1", "xpathId": 1 } } },
			"displaySets": { "ph": { "partitions": [], "rows": ["_x1"] } },
		}))
		.unwrap();
		assert!(payload.has_section);
		assert_eq!(payload.rows["_x1"].path_hash, "h1");
		assert_eq!(payload.meta().row_count, 1);

		let empty = FullTablePayload::from_value(json!({ "pageId": "Languages", "page": { "nocontent": true } })).unwrap();
		assert!(empty.has_section);
		assert!(empty.rows.is_empty());

		let single = SingleRowPayload::from_value(json!({ "page": { "rows": { "_x1": { "xpstrid": "h1" } } }, "issues": [] })).unwrap();
		assert_eq!(single.rows["_x1"].path_hash, "h1");
	}

	#[test]
	fn candidates_keep_server_order() {
		let payload = FullTablePayload::from_json(
			r#"{ "rows": { "k": { "pathHash": "p", "candidateItems": { "z": { "rawValue": "1" }, "m": { "rawValue": "2" }, "a": { "rawValue": "3" } } } } }"#,
		)
		.unwrap();
		let hashes: Vec<_> = payload.rows["k"].candidate_items.iter().map(|item| item.value_hash.as_str()).collect();
		assert_eq!(hashes, ["z", "m", "a"]);
	}

	#[test]
	fn sort_mode_fallback() {
		let payload = FullTablePayload::from_value(json!({
			"rows": {},
			"sortOrders": { "zzz": { "rowKeyOrder": [] }, "ph": { "rowKeyOrder": [] } },
		}))
		.unwrap();
		assert_eq!(payload.resolve_sort_mode(Some("zzz")).as_deref(), Some("zzz"));
		assert_eq!(payload.resolve_sort_mode(Some("missing")).as_deref(), Some("ph"));
	}

	#[test]
	fn server_errors_surface() {
		let error = FullTablePayload::from_value(json!({ "err": "Session expired" })).unwrap_err();
		assert!(matches!(error, PayloadError::Server(ref message) if message == "Session expired"));
		assert!(!FullTablePayload::from_value(json!({})).unwrap().has_section);
	}
}
