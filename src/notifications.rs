//! Keeping a per-row notification index in step with single-row updates.

use crate::model::RowData;
use hashbrown::HashMap;
use std::{cell::RefCell, rc::Rc};
use tracing::trace;

/// The outcome of a single-row refresh, as reported to a [`VoteResultSink`].
#[derive(Debug, Clone, Copy)]
pub struct VoteResult<'a> {
	pub path_hash: &'a str,
	/// Notification categories now raised on the row. [`None`] if the server didn't say.
	pub issues: Option<&'a [String]>,
	pub row: &'a RowData,
}

pub trait VoteResultSink {
	fn row_updated(&mut self, result: &VoteResult<'_>);
}

impl<T: VoteResultSink + ?Sized> VoteResultSink for Rc<RefCell<T>> {
	fn row_updated(&mut self, result: &VoteResult<'_>) {
		self.borrow_mut().row_updated(result)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
	pub path_hash: String,
	pub category: String,
	pub code: String,
	pub winning_value: Option<String>,
}

/// At most one entry per path hash and category.
#[derive(Debug, Clone, Default)]
pub struct NotificationIndex {
	entries: HashMap<(String, String), NotificationEntry>,
}

impl NotificationIndex {
	pub fn insert(&mut self, entry: NotificationEntry) {
		self.entries.insert((entry.path_hash.clone(), entry.category.clone()), entry);
	}

	#[must_use]
	pub fn get(&self, path_hash: &str, category: &str) -> Option<&NotificationEntry> {
		self.entries.get(&(path_hash.to_owned(), category.to_owned()))
	}

	/// Categories raised on `path_hash`, sorted.
	#[must_use]
	pub fn categories(&self, path_hash: &str) -> Vec<&str> {
		let mut categories: Vec<_> = self.entries.values().filter(|entry| entry.path_hash == path_hash).map(|entry| entry.category.as_str()).collect();
		categories.sort_unstable();
		categories
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl VoteResultSink for NotificationIndex {
	fn row_updated(&mut self, result: &VoteResult<'_>) {
		let issues = match result.issues {
			Some(issues) => issues,
			None => return trace!("No issue list for row {}; leaving notifications as they are.", result.path_hash),
		};

		self.entries.retain(|(path_hash, category), _| path_hash != result.path_hash || issues.contains(category));
		for category in issues {
			self.insert(NotificationEntry {
				path_hash: result.path_hash.to_owned(),
				category: category.clone(),
				code: result.row.code.clone(),
				winning_value: result.row.winning_value().map(ToOwned::to_owned),
			});
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn disappeared_categories_are_removed() {
		let row: RowData = serde_json::from_value(json!({ "pathHash": "p", "code": "de" })).unwrap();
		let other: RowData = serde_json::from_value(json!({ "pathHash": "q", "code": "fr" })).unwrap();
		let mut index = NotificationIndex::default();

		let issues = vec!["error".to_owned(), "missingCoverage".to_owned()];
		index.row_updated(&VoteResult { path_hash: "p", issues: Some(issues.as_slice()), row: &row });
		index.row_updated(&VoteResult { path_hash: "q", issues: Some(&issues[..1]), row: &other });
		assert_eq!(index.categories("p"), ["error", "missingCoverage"]);

		let issues = vec!["missingCoverage".to_owned()];
		index.row_updated(&VoteResult { path_hash: "p", issues: Some(issues.as_slice()), row: &row });
		assert_eq!(index.categories("p"), ["missingCoverage"]);
		assert_eq!(index.categories("q"), ["error"]);

		index.row_updated(&VoteResult { path_hash: "p", issues: None, row: &row });
		assert_eq!(index.len(), 2);
	}
}
