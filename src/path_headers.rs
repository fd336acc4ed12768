//! Lookup of each row's section, page and header, for breadcrumbs and the info panel.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathHeaderEntry {
	pub path_id: Option<u64>,
	pub path_hash: String,
	pub path: Option<String>,
	pub section: String,
	pub page: String,
	pub header_name: String,
	pub code: String,
}

impl PathHeaderEntry {
	/// `section | page | header | code`
	#[must_use]
	pub fn formatted(&self) -> String {
		[&self.section, &self.page, &self.header_name, &self.code].iter().map(|part| part.as_str()).collect::<Vec<_>>().join(" | ")
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
	Inserted,
	/// The path hash is already known. The first entry wins.
	Duplicate,
	/// The entry lacks a path id or path hash.
	Incomplete,
}

#[derive(Debug, Clone, Default)]
pub struct PathHeaderIndex {
	by_hash: HashMap<String, PathHeaderEntry>,
	by_id: HashMap<u64, String>,
	by_path: HashMap<String, String>,
}

impl PathHeaderIndex {
	pub fn insert(&mut self, entry: PathHeaderEntry) -> InsertOutcome {
		let path_id = match entry.path_id {
			Some(path_id) if !entry.path_hash.is_empty() => path_id,
			_ => {
				debug!("Not indexing incomplete path header entry {:?}.", entry.path_hash);
				return InsertOutcome::Incomplete;
			}
		};
		if self.by_hash.contains_key(&entry.path_hash) {
			debug!("Path hash {} already indexed; keeping the first entry.", entry.path_hash);
			return InsertOutcome::Duplicate;
		}

		self.by_id.insert(path_id, entry.path_hash.clone());
		if let Some(path) = &entry.path {
			self.by_path.insert(path.clone(), entry.path_hash.clone());
		}
		self.by_hash.insert(entry.path_hash.clone(), entry);
		InsertOutcome::Inserted
	}

	#[must_use]
	pub fn get(&self, path_hash: &str) -> Option<&PathHeaderEntry> {
		self.by_hash.get(path_hash)
	}

	#[must_use]
	pub fn get_by_id(&self, path_id: u64) -> Option<&PathHeaderEntry> {
		self.by_id.get(&path_id).and_then(|path_hash| self.get(path_hash))
	}

	#[must_use]
	pub fn get_by_path(&self, path: &str) -> Option<&PathHeaderEntry> {
		self.by_path.get(path).and_then(|path_hash| self.get(path_hash))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.by_hash.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.by_hash.is_empty()
	}
}
