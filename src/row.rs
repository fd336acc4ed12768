//! The DOM side of one table row and its voting state.

use crate::{
	dom::Dom,
	fingerprint::Fingerprint,
	model::RowKey,
};

/// Identifies one built table. A rebuild gets a fresh id, so late responses for rows of the old table can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VotingState {
	Idle,
	/// A vote was sent, no response yet.
	Checking1,
	/// The vote was accepted, the refreshed row is being fetched.
	Checking2,
	Error,
}

impl Default for VotingState {
	fn default() -> Self {
		Self::Idle
	}
}

impl VotingState {
	/// Rows in a checking state belong to the single-row updater; bulk passes must leave them alone.
	#[must_use]
	pub fn is_checking(self) -> bool {
		matches!(self, Self::Checking1 | Self::Checking2)
	}
}

/// The seven cells of a row, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
	Code,
	Comparison,
	Abstain,
	Status,
	Proposed,
	Add,
	Others,
}

impl Column {
	pub const ALL: [Self; 7] = [Self::Code, Self::Comparison, Self::Abstain, Self::Status, Self::Proposed, Self::Add, Self::Others];

	/// Base classes of the cell. Some renderers extend them.
	#[must_use]
	pub fn class_name(self) -> &'static str {
		match self {
			Self::Code => "d-code codecell",
			Self::Comparison => "d-disp comparisoncell",
			Self::Abstain => "d-no nocell",
			Self::Status => "d-dr-status statuscell",
			Self::Proposed => "d-win proposedcell",
			Self::Add => "d-addcell addcell",
			Self::Others => "d-other othercell",
		}
	}

	/// Localizer key of the column heading.
	#[must_use]
	pub fn title_key(self) -> &'static str {
		match self {
			Self::Code => "code",
			Self::Comparison => "comparison",
			Self::Abstain => "abstain",
			Self::Status => "status",
			Self::Proposed => "proposed",
			Self::Add => "add",
			Self::Others => "others",
		}
	}
}

#[derive(Debug, Clone)]
pub struct RowCells<N> {
	pub code: N,
	pub comparison: N,
	pub abstain: N,
	pub status: N,
	pub proposed: N,
	pub add: N,
	pub others: N,
}

impl<N> RowCells<N> {
	#[must_use]
	pub fn get(&self, column: Column) -> &N {
		match column {
			Column::Code => &self.code,
			Column::Comparison => &self.comparison,
			Column::Abstain => &self.abstain,
			Column::Status => &self.status,
			Column::Proposed => &self.proposed,
			Column::Add => &self.add,
			Column::Others => &self.others,
		}
	}
}

/// Which once-only cell setup has happened since the cells were (re)created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CellSetup {
	pub(crate) status: bool,
	pub(crate) abstain: bool,
	pub(crate) code: bool,
	pub(crate) comparison: bool,
	pub(crate) proposed: bool,
	pub(crate) others: bool,
}

#[derive(Debug)]
pub struct RenderedRow<N> {
	pub(crate) row_key: RowKey,
	pub(crate) path_hash: String,
	pub(crate) node: N,
	pub(crate) table: TableId,
	pub(crate) cells: Option<RowCells<N>>,
	pub(crate) forum_div: Option<N>,
	pub(crate) setup: CellSetup,
	pub(crate) fingerprint: Option<Fingerprint>,
	pub(crate) voting_state: VotingState,
	pub(crate) coverage: i32,
}

/// DOM id of the `<tr>` for the row with `path_hash`.
#[must_use]
pub fn row_dom_id(path_hash: &str) -> String {
	format!("r@{}", path_hash)
}

impl<N: Clone> RenderedRow<N> {
	/// Creates a detached `<tr>` with empty cells.
	pub fn create<D: Dom<Node = N>>(dom: &mut D, table: TableId, row_key: RowKey, path_hash: &str) -> Self {
		let node = dom.create_element("tr");
		dom.set_attribute(&node, "id", &row_dom_id(path_hash));
		let mut row = Self {
			row_key,
			path_hash: path_hash.to_owned(),
			node,
			table,
			cells: None,
			forum_div: None,
			setup: CellSetup::default(),
			fingerprint: None,
			voting_state: VotingState::Idle,
			coverage: 0,
		};
		row.ensure_cells(dom);
		row
	}

	/// Returns the cells, recreating them if an error display replaced them.
	pub(crate) fn ensure_cells<D: Dom<Node = N>>(&mut self, dom: &mut D) -> RowCells<N> {
		if let Some(cells) = &self.cells {
			return cells.clone();
		}
		dom.clear_children(&self.node);
		let mut cell = |column: Column| dom.append_element(&self.node, "td", column.class_name());
		let cells = RowCells {
			code: cell(Column::Code),
			comparison: cell(Column::Comparison),
			abstain: cell(Column::Abstain),
			status: cell(Column::Status),
			proposed: cell(Column::Proposed),
			add: cell(Column::Add),
			others: cell(Column::Others),
		};
		self.cells = Some(cells.clone());
		self.setup = CellSetup::default();
		self.forum_div = None;
		cells
	}

	/// Replaces the row's content with a single error cell.
	pub(crate) fn show_error<D: Dom<Node = N>>(&mut self, dom: &mut D, message: &str) {
		dom.clear_children(&self.node);
		let td = dom.append_element(&self.node, "td", "");
		dom.set_attribute(&td, "colspan", "7");
		let i = dom.append_element(&td, "i", "");
		dom.append_text(&i, message);
		self.cells = None;
		self.forum_div = None;
		self.setup = CellSetup::default();
	}

	/// Moves to `state` and updates the row's class to match.
	///
	/// Entering [`VotingState::Error`] forgets the fingerprint, so the next render can't be skipped.
	pub(crate) fn set_state<D: Dom<Node = N>>(&mut self, dom: &mut D, state: VotingState) {
		self.voting_state = state;
		let class_name = match state {
			VotingState::Idle => self.idle_class(),
			VotingState::Checking1 => "tr_checking1".to_owned(),
			VotingState::Checking2 => "tr_checking2".to_owned(),
			VotingState::Error => {
				self.fingerprint = None;
				"ferrbox".to_owned()
			}
		};
		dom.set_class_name(&self.node, &class_name);
	}

	pub(crate) fn idle_class(&self) -> String {
		format!("vother cov{}", self.coverage)
	}
}

impl<N> RenderedRow<N> {
	#[must_use]
	pub fn row_key(&self) -> &str {
		&self.row_key
	}

	#[must_use]
	pub fn path_hash(&self) -> &str {
		&self.path_hash
	}

	#[must_use]
	pub fn node(&self) -> &N {
		&self.node
	}

	#[must_use]
	pub fn table(&self) -> TableId {
		self.table
	}

	/// [`None`] while an error display replaces the cells.
	#[must_use]
	pub fn cells(&self) -> Option<&RowCells<N>> {
		self.cells.as_ref()
	}

	#[must_use]
	pub fn fingerprint(&self) -> Option<Fingerprint> {
		self.fingerprint
	}

	#[must_use]
	pub fn voting_state(&self) -> VotingState {
		self.voting_state
	}

	/// Coverage level of the row as last rendered.
	#[must_use]
	pub fn coverage(&self) -> i32 {
		self.coverage
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDom;

	#[test]
	fn create_builds_seven_cells() {
		let mut dom = MemoryDom::new();
		let row = RenderedRow::create(&mut dom, TableId(1), "k".to_owned(), "abc");
		assert_eq!(dom.attribute(row.node, "id"), Some("r@abc"));
		assert_eq!(dom.children(row.node).len(), 7);
		assert_eq!(dom.class_name(row.cells().unwrap().status), "d-dr-status statuscell");
	}

	#[test]
	fn error_state_forgets_fingerprint() {
		let mut dom = MemoryDom::new();
		let mut row = RenderedRow::create(&mut dom, TableId(1), "k".to_owned(), "abc");
		row.fingerprint = Some(Fingerprint(5));
		row.set_state(&mut dom, VotingState::Checking1);
		assert_eq!(dom.class_name(row.node), "tr_checking1");
		assert!(row.voting_state().is_checking());
		row.set_state(&mut dom, VotingState::Error);
		assert_eq!(row.fingerprint(), None);
		assert_eq!(dom.class_name(row.node), "ferrbox");
	}

	#[test]
	fn error_display_drops_cells() {
		let mut dom = MemoryDom::new();
		let mut row = RenderedRow::create(&mut dom, TableId(1), "k".to_owned(), "abc");
		row.show_error(&mut dom, "broken");
		assert!(row.cells().is_none());
		assert_eq!(dom.text_content(row.node), "broken");
		let cells = row.ensure_cells(&mut dom);
		assert_eq!(dom.children(row.node).len(), 7);
		assert_eq!(dom.parent(cells.others), Some(row.node));
	}
}
