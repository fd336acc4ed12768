//! The live table of one page, its configuration and its collaborators.

use crate::{
	compat::is_compatible,
	dom::Dom,
	model::RowData,
	notifications::{VoteResult, VoteResultSink},
	path_headers::PathHeaderIndex,
	payload::{FullTablePayload, SingleRowPayload},
	reconcile::{ReconcileReport, Reconciler, TableSnapshot},
	refresh::RefreshError,
	render::{render_row, RenderContext},
	row::{RenderedRow, TableId, VotingState},
	strings::{EnglishStrings, Localizer},
	transport::{RowRequest, TransportError, VoteAck, VoteRequest},
};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_TICKET_URL: &str = "https://cldr.unicode.org/index/bug-reports";

/// Where the "add a new value" button goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddPlacement {
	/// After the other candidates, as on the dashboard.
	OthersCell,
	AddCell,
}

impl Default for AddPlacement {
	fn default() -> Self {
		Self::OthersCell
	}
}

/// Rendering switches. Deserializable so an embedding page can pass them as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
	/// Always rebuild the table from scratch instead of updating it in place.
	pub never_reuse_table: bool,
	/// Empty the container before every full-table pass.
	pub always_remove_all_child_nodes: bool,
	pub add_placement: AddPlacement,
	pub ticket_url: String,
	/// Show path-id anchors and coverage levels in the code cell.
	pub debug_anchors: bool,
}

impl Default for TableOptions {
	fn default() -> Self {
		Self {
			never_reuse_table: false,
			always_remove_all_child_nodes: false,
			add_placement: AddPlacement::default(),
			ticket_url: DEFAULT_TICKET_URL.to_owned(),
			debug_anchors: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurveyUser {
	pub id: u64,
	#[serde(default)]
	pub name: Option<String>,
}

/// What page is shown, to whom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContext {
	pub section: String,
	pub page: String,
	pub locale: Option<String>,
	pub user: Option<SurveyUser>,
	pub session_id: Option<String>,
	pub cldr_version: Option<String>,
	/// Not the production instance.
	pub unofficial: bool,
	/// The dashboard is open, so single-row refreshes should ask for dashboard data too.
	pub dashboard_visible: bool,
}

/// A candidate choice for [`crate::refresh::submit_vote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteChoice {
	Abstain,
	Candidate { value_hash: String },
	NewValue { value: String },
}

pub(crate) enum AckStep {
	Refresh(RowRequest),
	NotSubmitted(VoteAck),
}

/// Owns the DOM, the live table and everything needed to reconcile new data into it.
pub struct TableSession<D: Dom> {
	dom: D,
	container: D::Node,
	page: PageContext,
	options: TableOptions,
	strings: Box<dyn Localizer>,
	path_headers: PathHeaderIndex,
	live: Option<TableSnapshot<D::Node>>,
	preferred_sort_mode: Option<String>,
	next_table_id: u64,
	vote_sink: Option<Box<dyn VoteResultSink>>,
}

impl<D: Dom> TableSession<D> {
	#[must_use]
	pub fn new(dom: D, container: D::Node, page: PageContext, options: TableOptions) -> Self {
		Self {
			dom,
			container,
			page,
			options,
			strings: Box::new(EnglishStrings),
			path_headers: PathHeaderIndex::default(),
			live: None,
			preferred_sort_mode: None,
			next_table_id: 0,
			vote_sink: None,
		}
	}

	#[must_use]
	pub fn with_strings(mut self, strings: impl 'static + Localizer) -> Self {
		self.strings = Box::new(strings);
		self
	}

	#[must_use]
	pub fn with_vote_sink(mut self, vote_sink: impl 'static + VoteResultSink) -> Self {
		self.vote_sink = Some(Box::new(vote_sink));
		self
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	/// Direct DOM access, e.g. to detach the container.
	pub fn dom_mut(&mut self) -> &mut D {
		&mut self.dom
	}

	#[must_use]
	pub fn container(&self) -> &D::Node {
		&self.container
	}

	#[must_use]
	pub fn page(&self) -> &PageContext {
		&self.page
	}

	#[must_use]
	pub fn options(&self) -> &TableOptions {
		&self.options
	}

	#[must_use]
	pub fn path_headers(&self) -> &PathHeaderIndex {
		&self.path_headers
	}

	#[must_use]
	pub fn live(&self) -> Option<&TableSnapshot<D::Node>> {
		self.live.as_ref()
	}

	/// Sort mode to prefer on the next rebuild, if the payload offers it.
	pub fn set_sort_mode(&mut self, sort_mode: impl Into<String>) {
		self.preferred_sort_mode = Some(sort_mode.into());
	}

	/// Coverage level of the row with `path_hash` as last rendered.
	#[must_use]
	pub fn coverage_of(&self, path_hash: &str) -> Option<i32> {
		self.live.as_ref()?.row(path_hash).map(RenderedRow::coverage)
	}

	/// Coverage levels of all rows in display order.
	pub fn coverage_levels(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
		self.live.iter().flat_map(|live| live.rows_in_order()).map(|row| (row.path_hash(), row.coverage()))
	}

	/// Reconciles a full-table payload into the container.
	///
	/// Returns [`None`] without touching anything if the container is no longer attached to the document.
	#[instrument(skip(self, payload), fields(page_id = ?payload.page_id, rows = payload.rows.len()))]
	pub fn insert_rows(&mut self, payload: FullTablePayload) -> Option<ReconcileReport> {
		if !self.dom.is_connected(&self.container) {
			warn!("Table container is detached; discarding payload.");
			return None;
		}

		if self.options.always_remove_all_child_nodes {
			self.dom.clear_children(&self.container);
		}

		let meta = payload.meta();
		let reuse = !self.options.never_reuse_table && self.live.as_ref().map_or(false, |live| is_compatible(live.meta(), &meta));

		let preferred = if reuse { self.live.as_ref().map(|live| live.sort_mode().to_owned()) } else { self.preferred_sort_mode.clone() };
		let sort_mode = payload.resolve_sort_mode(preferred.as_deref()).unwrap_or_default();

		let fresh_id = TableId(self.next_table_id);
		self.next_table_id += 1;

		let live = self.live.take();
		let snapshot = {
			let mut reconciler = Reconciler {
				cx: RenderContext {
					dom: &mut self.dom,
					strings: &*self.strings,
					page: &self.page,
					options: &self.options,
					can_modify: payload.can_modify,
				},
				path_headers: &mut self.path_headers,
				container: &self.container,
				fresh_id,
			};
			reconciler.reconcile(live, payload, &sort_mode, reuse)
		};
		let report = *snapshot.report();
		info!(
			reused = report.reused,
			created = report.created,
			rendered = report.rendered,
			unchanged = report.unchanged,
			skipped_checking = report.skipped_checking,
			removed = report.removed,
			"Reconciled table."
		);
		self.live = Some(snapshot);
		Some(report)
	}

	/// The row with `path_hash` in table `table`, if that table is still live and the row still attached.
	fn live_row<'s>(live: &'s mut Option<TableSnapshot<D::Node>>, dom: &D, table: TableId, path_hash: &str) -> Result<&'s mut RenderedRow<D::Node>, RefreshError> {
		let row = live
			.as_mut()
			.filter(|live| live.id() == table)
			.and_then(|live| live.row_mut(path_hash))
			.ok_or_else(|| RefreshError::Superseded(path_hash.to_owned()))?;
		if dom.is_connected(&row.node) {
			Ok(row)
		} else {
			debug!("Row {} is no longer attached.", path_hash);
			Err(RefreshError::Superseded(path_hash.to_owned()))
		}
	}

	fn row_request(&self, row_key: &str, path_hash: &str) -> RowRequest {
		let path_id = self.live.as_ref().and_then(|live| live.row_data(row_key)).and_then(|data| data.path_id);
		RowRequest {
			locale: self.page.locale.clone().unwrap_or_default(),
			row_key: row_key.to_owned(),
			path_hash: path_hash.to_owned(),
			path_id,
			dashboard: self.page.dashboard_visible,
			session_id: self.page.session_id.clone(),
		}
	}

	/// Marks the row [`VotingState::Checking1`] and returns the request to refresh it with.
	pub(crate) fn begin_refresh(&mut self, path_hash: &str) -> Result<(TableId, RowRequest), RefreshError> {
		let table = self.live.as_ref().map(TableSnapshot::id).ok_or_else(|| RefreshError::UnknownRow(path_hash.to_owned()))?;
		let row = match self.live.as_mut().and_then(|live| live.row_mut(path_hash)) {
			Some(row) => row,
			None => return Err(RefreshError::UnknownRow(path_hash.to_owned())),
		};
		row.set_state(&mut self.dom, VotingState::Checking1);
		let row_key = row.row_key.clone();
		Ok((table, self.row_request(&row_key, path_hash)))
	}

	/// Marks the row [`VotingState::Checking1`] and returns the vote to submit.
	pub(crate) fn begin_vote(&mut self, path_hash: &str, choice: VoteChoice) -> Result<(TableId, VoteRequest), RefreshError> {
		let (table, request) = self.begin_refresh(path_hash)?;
		let (value_hash, value) = match choice {
			VoteChoice::Abstain => (None, None),
			VoteChoice::Candidate { value_hash } => {
				let value = self.live.as_ref().and_then(|live| live.row_data(&request.row_key)).and_then(|data| data.candidate_items.get(&value_hash)).map(|item| item.value().to_owned());
				(Some(value_hash), value)
			}
			VoteChoice::NewValue { value } => (None, Some(value)),
		};
		Ok((table, VoteRequest { row: request, value_hash, value }))
	}

	/// Handles the vote acknowledgement. On acceptance the row moves to [`VotingState::Checking2`].
	pub(crate) fn acknowledge_vote(&mut self, table: TableId, path_hash: &str, ack: Result<VoteAck, TransportError>) -> Result<AckStep, RefreshError> {
		Self::live_row(&mut self.live, &self.dom, table, path_hash)?;
		let ack = match ack {
			Ok(ack) => ack,
			Err(transport_error) => {
				error!("Vote on row {} failed: {}", path_hash, transport_error);
				let message = self.strings.sub("loadError", &[transport_error.to_string().as_str()]);
				self.show_row_error(table, path_hash, &message);
				return Err(RefreshError::Transport(transport_error));
			}
		};

		if let Some(err) = ack.err.clone().filter(|err| !err.is_empty()) {
			error!("Server rejected vote on row {}: {}", path_hash, err);
			let message = self.strings.sub("voteError", &[err.as_str()]);
			self.show_row_error(table, path_hash, &message);
			Err(RefreshError::Server(err))
		} else if ack.submitted {
			let row = Self::live_row(&mut self.live, &self.dom, table, path_hash)?;
			row.set_state(&mut self.dom, VotingState::Checking2);
			let row_key = row.row_key.clone();
			Ok(AckStep::Refresh(self.row_request(&row_key, path_hash)))
		} else {
			let row = Self::live_row(&mut self.live, &self.dom, table, path_hash)?;
			row.set_state(&mut self.dom, VotingState::Idle);
			Ok(AckStep::NotSubmitted(ack))
		}
	}

	fn show_row_error(&mut self, table: TableId, path_hash: &str, message: &str) {
		let dom = &mut self.dom;
		if let Some(row) = self.live.as_mut().filter(|live| live.id() == table).and_then(|live| live.row_mut(path_hash)) {
			row.show_error(dom, message);
			row.set_state(dom, VotingState::Error);
		}
	}

	/// Applies a single-row response, or turns the row into an error display.
	pub(crate) fn finish_refresh(&mut self, table: TableId, path_hash: &str, response: Result<SingleRowPayload, TransportError>) -> Result<RowData, RefreshError> {
		let row_key = Self::live_row(&mut self.live, &self.dom, table, path_hash)?.row_key.clone();
		let mut payload = match response {
			Ok(payload) => payload,
			Err(transport_error) => {
				error!("Refreshing row {} failed: {}", path_hash, transport_error);
				let message = self.strings.sub("loadError", &[transport_error.to_string().as_str()]);
				self.show_row_error(table, path_hash, &message);
				return Err(RefreshError::Transport(transport_error));
			}
		};

		let data = match payload.rows.remove(&row_key) {
			Some(data) => data,
			None => {
				let path_id = self.live.as_ref().and_then(|live| live.row_data(&row_key)).and_then(|data| data.path_id);
				error!("Server response lacks row {} (path id {:?}).", row_key, path_id);
				let message = self.strings.get("missingRow");
				self.show_row_error(table, path_hash, &message);
				return Err(RefreshError::RowMissing {
					row_key,
					path_id,
					locale: self.page.locale.clone().unwrap_or_default(),
				});
			}
		};

		let Self { dom, page, options, strings, live, vote_sink, .. } = self;
		let live = match live.as_mut().filter(|live| live.id() == table) {
			Some(live) => live,
			None => return Err(RefreshError::Superseded(path_hash.to_owned())),
		};
		let can_modify = live.meta().can_modify;
		if let Some(row) = live.row_mut(path_hash) {
			let mut cx = RenderContext {
				dom: &mut *dom,
				strings: &**strings,
				page: &*page,
				options: &*options,
				can_modify,
			};
			render_row(&mut cx, row, &data);
			row.set_state(dom, VotingState::Idle);
		}
		live.set_row_data(row_key, data.clone());

		if let Some(vote_sink) = vote_sink {
			vote_sink.row_updated(&VoteResult {
				path_hash,
				issues: payload.issues.as_deref(),
				row: &data,
			});
		}
		Ok(data)
	}
}
