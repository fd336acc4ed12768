//! Whether a live table may be updated in place instead of rebuilt.

use tracing::trace;

/// The parts of a table payload that decide its shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMeta {
	pub has_section: bool,
	pub page_id: Option<String>,
	pub locale: Option<String>,
	pub can_modify: bool,
	pub row_count: usize,
}

/// Two tables are compatible iff both hold a section and agree on page, locale, modify permission and row count.
///
/// This relation is symmetric.
#[must_use]
pub fn is_compatible(a: &TableMeta, b: &TableMeta) -> bool {
	let compatible = a.has_section && b.has_section && a.page_id == b.page_id && a.locale == b.locale && a.can_modify == b.can_modify && a.row_count == b.row_count;
	trace!(compatible, ?a, ?b, "Checked table compatibility.");
	compatible
}

#[cfg(test)]
mod tests {
	use super::*;

	fn meta() -> TableMeta {
		TableMeta {
			has_section: true,
			page_id: Some("Languages".to_owned()),
			locale: Some("de".to_owned()),
			can_modify: true,
			row_count: 3,
		}
	}

	#[test]
	fn same_shape_is_compatible() {
		assert!(is_compatible(&meta(), &meta()));
	}

	#[test]
	fn each_field_matters() {
		let variants = [
			TableMeta { has_section: false, ..meta() },
			TableMeta { page_id: Some("Scripts".to_owned()), ..meta() },
			TableMeta { locale: None, ..meta() },
			TableMeta { can_modify: false, ..meta() },
			TableMeta { row_count: 4, ..meta() },
		];
		for variant in &variants {
			assert!(!is_compatible(&meta(), variant), "{:?}", variant);
			assert!(!is_compatible(variant, &meta()), "{:?}", variant);
		}
	}

	#[test]
	fn empty_tables_never_match() {
		let empty = TableMeta::default();
		assert!(!is_compatible(&empty, &empty));
	}
}
