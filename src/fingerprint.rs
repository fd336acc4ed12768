//! Change detection for rows.
//!
//! A [`Fingerprint`] is a 32-bit rolling hash over a canonical JSON rendering of a [`RowData`].
//! Object keys are always written in sorted order, so two rows that differ only in key order hash identically.

use crate::model::RowData;
use serde_json::Value;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub i32);

/// Returns [`None`] if `row` can't be serialized, in which case the row must always be re-rendered.
#[must_use]
pub fn fingerprint(row: &RowData) -> Option<Fingerprint> {
	match serde_json::to_value(row) {
		Ok(value) => {
			let mut canonical = String::new();
			write_canonical(&value, &mut canonical);
			Some(Fingerprint(rolling_hash(&canonical)))
		}
		Err(error) => {
			error!("Could not fingerprint row {}: {}", row.path_hash, error);
			None
		}
	}
}

/// `h = h * 31 + unit` over the UTF-16 code units of `text`, wrapping at 32 bits.
#[must_use]
pub fn rolling_hash(text: &str) -> i32 {
	text.encode_utf16().fold(0_i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn write_canonical(value: &Value, out: &mut String) {
	match value {
		Value::Object(map) => {
			let mut entries: Vec<_> = map.iter().collect();
			entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
			out.push('{');
			for (i, (key, value)) in entries.into_iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_scalar(&Value::String(key.clone()), out);
				out.push(':');
				write_canonical(value, out);
			}
			out.push('}');
		}
		Value::Array(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_canonical(item, out);
			}
			out.push(']');
		}
		scalar => write_scalar(scalar, out),
	}
}

fn write_scalar(value: &Value, out: &mut String) {
	// `Value`'s `Display` is its compact JSON form.
	out.push_str(&value.to_string());
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::time::{Duration, Instant};

	#[test]
	fn hash_vectors() {
		assert_eq!(rolling_hash(""), 0);
		assert_eq!(rolling_hash("a"), 97);
		assert_eq!(rolling_hash("ab"), 3105);
		assert_eq!(rolling_hash("hello"), 99_162_322);
	}

	#[test]
	fn wraps_instead_of_overflowing() {
		let long = "z".repeat(1000);
		let _ = rolling_hash(&long);
	}

	#[test]
	fn key_order_is_irrelevant() {
		let mut a = String::new();
		write_canonical(&json!({ "b": 1, "a": [true, null, "x"] }), &mut a);
		assert_eq!(a, r#"{"a":[true,null,"x"],"b":1}"#);
	}

	#[test]
	fn rows_fingerprint_by_content() {
		let row: RowData = serde_json::from_value(json!({ "pathHash": "p", "code": "x" })).unwrap();
		let mut changed = row.clone();
		changed.code = "y".to_owned();
		assert_eq!(fingerprint(&row), fingerprint(&row.clone()));
		assert_ne!(fingerprint(&row), fingerprint(&changed));
	}

	#[test]
	fn thousand_rows_within_budget() {
		let rows: Vec<RowData> = (0..1000)
			.map(|i| {
				serde_json::from_value(json!({
					"pathId": i,
					"pathHash": format!("h{}", i),
					"code": format!("code-{}", i),
					"coverageLevel": 30,
					"candidateItems": {
						"w": { "rawValue": format!("value {}", i), "votes": { "7": { "org": "guest" } } },
						"o": { "rawValue": "other" },
					},
					"winningValueHash": "w",
					"statusAction": "ALLOW",
				}))
				.unwrap()
			})
			.collect();

		let start = Instant::now();
		let fingerprints: Vec<_> = rows.iter().map(fingerprint).collect();
		let elapsed = start.elapsed();
		assert!(fingerprints.iter().all(Option::is_some));
		assert!(elapsed < Duration::from_millis(100), "fingerprinting 1000 rows took {:?}", elapsed);
	}
}
