//! Full-table passes: rebuilding the table or updating a compatible one in place.

use crate::{
	compat::TableMeta,
	dom::Dom,
	model::{RowData, RowKey},
	partition::PartitionIndex,
	path_headers::{PathHeaderEntry, PathHeaderIndex},
	payload::{FullTablePayload, SortOrder},
	render::{render_row, RenderContext, RenderOutcome},
	row::{Column, RenderedRow, TableId},
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

pub const TABLE_DOM_ID: &str = "vetting-table";
const TABLE_CLASS: &str = "data vetting-page";
const HEADING_CLASS: &str = "partition-heading";

/// Counts of what one full-table pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	/// Whether the previous table was updated in place.
	pub reused: bool,
	pub created: usize,
	pub rendered: usize,
	pub unchanged: usize,
	/// Rows left alone because a vote on them is in flight.
	pub skipped_checking: usize,
	/// Row keys in the sort order that the payload has no data for.
	pub missing: usize,
	/// Rows of a reused table that the new payload no longer contains.
	pub removed: usize,
}

/// A built table and what is known about each of its rows.
#[derive(Debug)]
pub struct TableSnapshot<N> {
	id: TableId,
	meta: TableMeta,
	sort_mode: String,
	row_order: Vec<RowKey>,
	partitions: PartitionIndex,
	headings: Vec<Option<N>>,
	rows: HashMap<String, RenderedRow<N>>,
	data: HashMap<RowKey, RowData>,
	table_node: N,
	tbody: N,
	report: ReconcileReport,
}

impl<N> TableSnapshot<N> {
	#[must_use]
	pub fn id(&self) -> TableId {
		self.id
	}

	#[must_use]
	pub fn meta(&self) -> &TableMeta {
		&self.meta
	}

	#[must_use]
	pub fn sort_mode(&self) -> &str {
		&self.sort_mode
	}

	#[must_use]
	pub fn row_order(&self) -> &[RowKey] {
		&self.row_order
	}

	#[must_use]
	pub fn partitions(&self) -> &PartitionIndex {
		&self.partitions
	}

	/// The heading row of partition `partition`, if one was emitted.
	#[must_use]
	pub fn heading(&self, partition: usize) -> Option<&N> {
		self.headings.get(partition).and_then(Option::as_ref)
	}

	#[must_use]
	pub fn row(&self, path_hash: &str) -> Option<&RenderedRow<N>> {
		self.rows.get(path_hash)
	}

	pub(crate) fn row_mut(&mut self, path_hash: &str) -> Option<&mut RenderedRow<N>> {
		self.rows.get_mut(path_hash)
	}

	#[must_use]
	pub fn row_count(&self) -> usize {
		self.rows.len()
	}

	/// Rows in display order.
	pub fn rows_in_order(&self) -> impl Iterator<Item = &RenderedRow<N>> + '_ {
		self.row_order.iter().filter_map(move |key| self.data.get(key)).filter_map(move |data| self.rows.get(&data.path_hash))
	}

	/// The data the row with `row_key` was last rendered from.
	#[must_use]
	pub fn row_data(&self, row_key: &str) -> Option<&RowData> {
		self.data.get(row_key)
	}

	pub(crate) fn set_row_data(&mut self, row_key: RowKey, data: RowData) {
		self.data.insert(row_key, data);
	}

	#[must_use]
	pub fn table_node(&self) -> &N {
		&self.table_node
	}

	#[must_use]
	pub fn tbody(&self) -> &N {
		&self.tbody
	}

	/// What the pass that produced this snapshot did.
	#[must_use]
	pub fn report(&self) -> &ReconcileReport {
		&self.report
	}
}

pub struct Reconciler<'a, D: Dom> {
	pub cx: RenderContext<'a, D>,
	pub path_headers: &'a mut PathHeaderIndex,
	pub container: &'a D::Node,
	/// Id for the table if this pass builds a new one.
	pub fresh_id: TableId,
}

impl<'a, D: Dom> Reconciler<'a, D> {
	/// Brings the DOM in line with `payload`, ordered by `sort_mode`.
	///
	/// With `reuse`, `table` is updated in place: existing row nodes are found by path hash, partition headings are kept
	/// and rows with a vote in flight are skipped. Otherwise `table` (if any) is removed and a new one is built.
	#[allow(clippy::too_many_lines)]
	#[instrument(skip(self, table, payload))]
	pub fn reconcile(&mut self, table: Option<TableSnapshot<D::Node>>, payload: FullTablePayload, sort_mode: &str, reuse: bool) -> TableSnapshot<D::Node> {
		let order = match payload.sort_orders.get(sort_mode) {
			Some(order) => order.clone(),
			None => {
				error!("Sort mode {:?} is not in the payload; showing rows by key without headings.", sort_mode);
				let mut keys: Vec<_> = payload.rows.keys().cloned().collect();
				keys.sort();
				SortOrder { partitions: Vec::new(), row_key_order: keys }
			}
		};

		let (mut table, reuse) = match (table, reuse) {
			(Some(table), true) => (table, true),
			(table, reuse) => {
				if reuse {
					warn!("Asked to reuse a table, but none is live. Building a new one.");
				}
				if let Some(old) = table {
					self.cx.dom.remove(&old.table_node);
				}
				(self.build_shell(&payload, &order), false)
			}
		};

		let mut report = ReconcileReport { reused: reuse, ..ReconcileReport::default() };
		table.meta = payload.meta();
		table.sort_mode = sort_mode.to_owned();

		let mut seen = HashSet::with_capacity(order.row_key_order.len());
		let mut previous_partition = None;
		for (index, row_key) in order.row_key_order.iter().enumerate() {
			let data = match payload.rows.get(row_key) {
				Some(data) => data,
				None => {
					error!("Sort order names row {:?}, which the payload doesn't contain.", row_key);
					report.missing += 1;
					continue;
				}
			};
			let span = trace_span!("Reconciling row", index, row_key = %row_key, path_hash = %data.path_hash);
			let _enter = span.enter();

			if !seen.insert(data.path_hash.clone()) {
				error!("Path hash {} appears more than once; skipping row {:?}.", data.path_hash, row_key);
				continue;
			}

			let mut header_name = String::new();
			if !reuse {
				let partition = table.partitions.locate(index);
				if partition != previous_partition {
					if let Some(partition) = partition {
						self.emit_heading(&mut table, partition);
					}
					previous_partition = partition;
				}
				if let Some(partition) = partition {
					self.observe_coverage(&mut table, partition, data.coverage_level);
					if let Some(named) = table.partitions.get(partition) {
						header_name = named.name.clone();
					}
				}
			}

			let row = match table.rows.entry(data.path_hash.clone()) {
				Entry::Occupied(occupied) => occupied.into_mut(),
				Entry::Vacant(vacant) => {
					if reuse {
						warn!("No row node for {} in the reused table; creating one.", data.path_hash);
					}
					let row = RenderedRow::create(self.cx.dom, table.id, row_key.clone(), &data.path_hash);
					self.cx.dom.append_child(&table.tbody, &row.node);
					report.created += 1;
					vacant.insert(row)
				}
			};
			row.row_key = row_key.clone();

			if !reuse {
				self.path_headers.insert(PathHeaderEntry {
					path_id: data.path_id,
					path_hash: data.path_hash.clone(),
					path: data.path.clone(),
					section: self.cx.page.section.clone(),
					page: self.cx.page.page.clone(),
					header_name,
					code: data.code.clone(),
				});
			}

			if row.voting_state.is_checking() {
				trace!("Vote in flight; leaving the row alone.");
				report.skipped_checking += 1;
				continue;
			}

			match render_row(&mut self.cx, row, data) {
				RenderOutcome::Unchanged => report.unchanged += 1,
				RenderOutcome::Rendered | RenderOutcome::MissingPathId => report.rendered += 1,
			}
		}

		if reuse {
			let stale: Vec<_> = table.rows.keys().filter(|path_hash| !seen.contains(*path_hash)).cloned().collect();
			for path_hash in stale {
				if let Some(row) = table.rows.remove(&path_hash) {
					warn!("Removing row {} that the new payload no longer contains.", path_hash);
					self.cx.dom.remove(&row.node);
					report.removed += 1;
				}
			}
		}

		if !reuse || !self.cx.dom.contains(self.container, &table.table_node) {
			self.cx.dom.append_child(self.container, &table.table_node);
		}

		table.row_order = order.row_key_order;
		table.data = payload.rows;
		if STATIC_MAX_LEVEL >= Level::WARN && report.missing > 0 {
			warn!("{} row key(s) of sort mode {:?} had no data.", report.missing, sort_mode);
		}
		table.report = report;
		table
	}

	/// Creates the detached `<table>` with its header row and an empty body.
	fn build_shell(&mut self, payload: &FullTablePayload, order: &SortOrder) -> TableSnapshot<D::Node> {
		let dom = &mut *self.cx.dom;
		let table_node = dom.create_element("table");
		dom.set_class_name(&table_node, TABLE_CLASS);
		dom.set_attribute(&table_node, "id", TABLE_DOM_ID);

		let thead = dom.append_element(&table_node, "thead", "");
		let header_row = dom.append_element(&thead, "tr", "headingRow");
		for column in Column::ALL.iter().copied() {
			let th = dom.append_element(&header_row, "th", column.class_name());
			dom.append_text(&th, &self.cx.strings.get(column.title_key()));
			if column == Column::Abstain && !payload.can_modify {
				dom.set_displayed(&th, false);
			}
		}
		let tbody = dom.append_element(&table_node, "tbody", "");

		let partitions = PartitionIndex::new(&order.partitions);
		TableSnapshot {
			id: self.fresh_id,
			meta: payload.meta(),
			sort_mode: String::new(),
			row_order: Vec::new(),
			headings: vec![None; partitions.len()],
			partitions,
			rows: HashMap::with_capacity(payload.rows.len()),
			data: HashMap::new(),
			table_node,
			tbody,
			report: ReconcileReport::default(),
		}
	}

	/// Emits the heading row for a named partition the first time it is entered.
	fn emit_heading(&mut self, table: &mut TableSnapshot<D::Node>, partition: usize) {
		let name = match table.partitions.get(partition) {
			Some(found) if found.is_named() => found.name.clone(),
			_ => return,
		};
		if table.headings.get(partition).map_or(true, Option::is_some) {
			return;
		}

		let dom = &mut *self.cx.dom;
		let heading = dom.append_element(&table.tbody, "tr", HEADING_CLASS);
		let td = dom.append_element(&heading, "td", "");
		dom.set_attribute(&td, "colspan", &Column::ALL.len().to_string());
		let h = dom.append_element(&td, "a", "");
		dom.set_attribute(&h, "id", &name);
		dom.set_attribute(&h, "name", &name);
		dom.append_text(&h, &name);
		trace!(partition = %name, "Emitted heading.");
		table.headings[partition] = Some(heading);
	}

	fn observe_coverage(&mut self, table: &mut TableSnapshot<D::Node>, partition: usize, coverage: i32) {
		if !table.partitions.observe(partition, coverage) {
			return;
		}
		if let (Some(heading), Some(class)) = (table.headings.get(partition).and_then(Option::as_ref), table.partitions.get(partition).and_then(|p| p.coverage_class())) {
			self.cx.dom.set_class_name(heading, &format!("{} {}", HEADING_CLASS, class));
		}
	}
}
