//! Rendering one [`RowData`] into the cells of its [`RenderedRow`].
//!
//! Rendering is idempotent: rendering the same data twice leaves the same DOM, and the second time is skipped
//! entirely if the row's [`Fingerprint`](`crate::fingerprint::Fingerprint`) didn't change.

use crate::{
	dom::{Dom, RowAction},
	fingerprint::fingerprint,
	loggable,
	model::{CandidateItem, RowCapabilities, RowData, Severity},
	row::{Column, RenderedRow, RowCells, VotingState},
	session::{AddPlacement, PageContext, TableOptions},
	strings::Localizer,
};
use tracing::{debug, error, instrument, trace};

const LRM: char = '\u{200E}';
const RLM: char = '\u{200F}';
const TRANSLATION_HINT: &str = "[translation hint";

/// Everything a row render needs besides the row itself.
pub struct RenderContext<'a, D: Dom> {
	pub dom: &'a mut D,
	pub strings: &'a dyn Localizer,
	pub page: &'a PageContext,
	pub options: &'a TableOptions,
	/// Whether the table as a whole is modifiable by the current user.
	pub can_modify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
	/// The fingerprint matched the last render, so nothing was touched.
	Unchanged,
	Rendered,
	/// The row has no path id and now shows an error cell instead of its content.
	MissingPathId,
}

/// Brings `row`'s DOM up to date with `data`.
#[instrument(skip(cx, row, data), fields(path_hash = %data.path_hash))]
pub fn render_row<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, data: &RowData) -> RenderOutcome {
	let fingerprint = fingerprint(data);
	if fingerprint.is_some() && fingerprint == row.fingerprint {
		trace!("Fingerprint unchanged; skipping row.");
		return RenderOutcome::Unchanged;
	}
	row.fingerprint = fingerprint;
	row.coverage = data.coverage_level;

	for inconsistency in data.check_consistency() {
		if inconsistency.is_error() {
			error!("Inconsistent row {}: {}", data.path_hash, inconsistency);
		} else {
			debug!("Inconsistent row {}: {}", data.path_hash, inconsistency);
		}
	}

	if data.path_id.is_none() {
		error!("Row {} has no path id; showing an error cell instead.", data.path_hash);
		row.show_error(cx.dom, &cx.strings.get("missingRow"));
		cx.dom.set_class_name(&row.node, &row.idle_class());
		return RenderOutcome::MissingPathId;
	}

	let cells = row.ensure_cells(cx.dom);
	let capabilities = data.status_action.capabilities().for_table(cx.can_modify);
	trace!(?capabilities, status_action = ?data.status_action);

	update_status_cell(cx, row, &cells.status, data);
	update_vote_state(cx, &cells.abstain, data);
	update_code_cell(cx, row, &cells.code, data);
	update_comparison_cell(cx, row, &cells.comparison, data);
	update_proposed_cell(cx, row, &cells.proposed, data, capabilities);
	update_others_cell(cx, row, &cells.others, data, capabilities);
	update_add_cell(cx, &row.path_hash, &cells.add, capabilities);
	update_abstain_cell(cx, row, &cells, data, capabilities);

	cx.dom.set_class_name(&row.node, &row.idle_class());
	if row.voting_state == VotingState::Error {
		row.voting_state = VotingState::Idle;
	}
	RenderOutcome::Rendered
}

fn show_info(path_hash: &str, value_hash: Option<&str>) -> RowAction {
	RowAction::ShowInfo {
		path_hash: path_hash.to_owned(),
		value_hash: value_hash.map(ToOwned::to_owned),
	}
}

fn update_status_cell<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, cell: &D::Node, data: &RowData) {
	let status = data.approval_status();
	cx.dom.set_class_name(cell, &format!("d-dr-{} {}", status, Column::Status.class_name()));
	let title = cx.strings.sub("draftStatus", &[cx.strings.get(status).as_str()]);
	cx.dom.set_attribute(cell, "title", &title);
	if !row.setup.status {
		cx.dom.listen(cell, show_info(&row.path_hash, None));
		row.setup.status = true;
	}
}

/// Marks whether the user has voted on the row at all.
fn update_vote_state<D: Dom>(cx: &mut RenderContext<'_, D>, cell: &D::Node, data: &RowData) {
	let voted = data.has_user_voted;
	cx.dom.set_class_name(cell, &format!("d-no-vo-{} {}", voted, Column::Abstain.class_name()));
	cx.dom.set_attribute(cell, "title", &cx.strings.get(if voted { "voTrue" } else { "voFalse" }));
}

fn update_code_cell<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, cell: &D::Node, data: &RowData) {
	cx.dom.clear_children(cell);
	if data.is_optional() {
		cx.dom.append_text(cell, &format!("{} ({})", data.code, cx.strings.get("optional")));
	} else {
		cx.dom.append_text(cell, &data.code);
	}

	if cx.page.user.is_some() {
		let forum_div = match &row.forum_div {
			Some(forum_div) => forum_div.clone(),
			None => {
				let forum_div = cx.dom.create_element("div");
				cx.dom.set_class_name(&forum_div, "forumDiv");
				let button = cx.dom.append_element(&forum_div, "button", "forumNewPostButton btn btn-default btn-sm");
				cx.dom.set_attribute(&button, "title", &cx.strings.get("forumNewPostButton_desc"));
				cx.dom.append_text(&button, &cx.strings.get("forumNewPostButton"));
				cx.dom.listen(&button, RowAction::OpenForum { path_hash: row.path_hash.clone() });
				row.forum_div = Some(forum_div.clone());
				forum_div
			}
		};
		cx.dom.append_child(cell, &forum_div);
	}

	for (name, value) in &data.extra_attributes {
		let span = cx.dom.append_element(cell, "span", "extraAttribute");
		cx.dom.append_text(&span, &format!("{}={}", name, value));
	}

	if cx.options.debug_anchors {
		let anchor = cx.dom.append_element(cell, "i", "anch");
		if let Some(path_id) = data.path_id {
			cx.dom.set_attribute(&anchor, "id", &path_id.to_string());
		}
		cx.dom.append_text(&anchor, "#");
		cx.dom.append_text(cell, &format!(" c={}", data.coverage_level));
	}

	if !row.setup.code {
		cx.dom.listen(cell, show_info(&row.path_hash, None));
		row.setup.code = true;
	}
}

/// The English cell never changes within a table, so it is filled in only once.
fn update_comparison_cell<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, cell: &D::Node, data: &RowData) {
	if row.setup.comparison {
		return;
	}
	row.setup.comparison = true;

	let (name, hint) = match data.display_name.as_deref() {
		Some(name) => split_translation_hint(name),
		None => ("", None),
	};
	if name.is_empty() {
		cx.dom.append_text(cell, "");
	} else {
		let span = cx.dom.append_element(cell, "span", "subSpan");
		cx.dom.append_text(&span, name);
		cx.dom.set_attribute(cell, "lang", "en_ZZ");
	}

	let example = data.display_example.as_deref().filter(|example| !example.is_empty());
	if example.is_some() || hint.is_some() {
		let div = cx.dom.append_element(cell, "div", "d-example well well-sm");
		if let Some(example) = example {
			cx.dom.set_inner_html(&div, example);
		}
		if let Some(hint) = hint {
			let hint_div = cx.dom.append_element(&div, "div", "help-comment");
			cx.dom.append_text(&hint_div, hint);
		}

		let infos = cx.dom.append_element(cell, "div", "infos-code");
		if hint.is_some() {
			cx.dom.append_element(&infos, "span", "i-hint");
		}
		if example.is_some() {
			cx.dom.append_element(&infos, "span", "i-example");
		}
	}

	cx.dom.listen(cell, show_info(&row.path_hash, None));
}

fn split_translation_hint(display_name: &str) -> (&str, Option<&str>) {
	match display_name.find(TRANSLATION_HINT) {
		Some(at) => (display_name[..at].trim_end(), Some(&display_name[at..])),
		None => (display_name, None),
	}
}

fn set_value_language<D: Dom>(cx: &mut RenderContext<'_, D>, cell: &D::Node, data: &RowData) {
	if let Some(locale) = cx.page.locale.as_deref() {
		cx.dom.set_attribute(cell, "lang", locale);
	}
	if let Some(dir) = data.dir.as_deref() {
		cx.dom.set_attribute(cell, "dir", dir);
	}
}

fn update_proposed_cell<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, cell: &D::Node, data: &RowData, capabilities: RowCapabilities) {
	cx.dom.clear_children(cell);
	cx.dom.set_class_name(cell, Column::Proposed.class_name());
	set_value_language(cx, cell, data);

	if data.flags.row_flagged {
		let flag = cx.dom.append_element(cell, "span", "s-flag");
		cx.dom.set_attribute(&flag, "title", &cx.strings.get("flag_desc"));
	} else if data.flags.can_flag_on_losing {
		let flag = cx.dom.append_element(cell, "span", "s-flag-d");
		cx.dom.set_attribute(&flag, "title", &cx.strings.get("flag_d_desc"));
	}

	match data.valid_winning_item() {
		Some(item) => add_candidate(cx, &row.path_hash, cell, data, item, true, capabilities.can_modify),
		None => trace!("No valid winning value."),
	}

	if !row.setup.proposed {
		cx.dom.listen(cell, show_info(&row.path_hash, None));
		row.setup.proposed = true;
	}
}

fn update_others_cell<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, cell: &D::Node, data: &RowData, capabilities: RowCapabilities) {
	cx.dom.clear_children(cell);
	set_value_language(cx, cell, data);

	let winning_hash = data.winning_value_hash.as_deref();
	for item in data.candidate_items.iter().filter(|item| Some(item.value_hash.as_str()) != winning_hash) {
		add_candidate(cx, &row.path_hash, cell, data, item, false, capabilities.can_modify);
		cx.dom.append_element(cell, "hr", "");
	}

	if capabilities.can_change && cx.options.add_placement == AddPlacement::OthersCell {
		add_affordance(cx, &row.path_hash, cell);
	}

	if !row.setup.others {
		cx.dom.listen(cell, show_info(&row.path_hash, None));
		row.setup.others = true;
	}
}

fn update_add_cell<D: Dom>(cx: &mut RenderContext<'_, D>, path_hash: &str, cell: &D::Node, capabilities: RowCapabilities) {
	cx.dom.clear_children(cell);
	if capabilities.can_change && cx.options.add_placement == AddPlacement::AddCell {
		add_affordance(cx, path_hash, cell);
	}
}

fn add_affordance<D: Dom>(cx: &mut RenderContext<'_, D>, path_hash: &str, parent: &D::Node) {
	let form = cx.dom.append_element(parent, "form", "form-inline");
	let group = cx.dom.append_element(&form, "div", "button-add form-group");
	let button = cx.dom.append_element(&group, "button", "btn btn-primary");
	cx.dom.set_attribute(&button, "title", &cx.strings.get("addValue"));
	cx.dom.set_attribute(&button, "type", "button");
	cx.dom.append_element(&button, "span", "glyphicon glyphicon-plus");
	cx.dom.listen(&button, RowAction::AddValue { path_hash: path_hash.to_owned() });
}

/// Abstain button or ticket link. Runs after the proposed cell, since the ticket-only case annotates it.
fn update_abstain_cell<D: Dom>(cx: &mut RenderContext<'_, D>, row: &mut RenderedRow<D::Node>, cells: &RowCells<D::Node>, data: &RowData, capabilities: RowCapabilities) {
	let cell = &cells.abstain;
	cx.dom.clear_children(cell);
	if capabilities.can_modify {
		cx.dom.set_displayed(cell, true);
		let abstained = data.user_vote_value_hash.is_none();
		let button = cx.dom.append_element(cell, "button", if abstained { "ichoice-x btn btn-default" } else { "ichoice-o btn btn-default" });
		cx.dom.set_attribute(&button, "title", &cx.strings.get("abstain"));
		cx.dom.set_attribute(&button, "type", "button");
		cx.dom.listen(&button, RowAction::Vote { path_hash: row.path_hash.clone(), value_hash: None });
	} else if capabilities.ticket_only {
		let proposed = &cells.proposed;
		cx.dom.set_class_name(proposed, &format!("{} d-change-confirmonly", Column::Proposed.class_name()));
		let notice = cx.dom.append_element(proposed, "i", "fnotebox");
		cx.dom.append_text(&notice, &cx.strings.get("file_ticket_notice"));

		let alert = cx.dom.append_element(cell, "div", "alert alert-info fix-popover-help");
		let url = ticket_url(cx, data);
		let link = cx.dom.append_element(&alert, "a", "");
		cx.dom.set_attribute(&link, "href", &url);
		cx.dom.set_attribute(&link, "target", "cldr-target-trac");
		cx.dom.append_text(&link, &cx.strings.get("file_a_ticket"));
		if cx.page.unofficial {
			let note = cx.dom.append_element(&alert, "p", "");
			cx.dom.append_text(&note, &cx.strings.get("file_ticket_unofficial"));
		}
	} else if !cx.can_modify {
		cx.dom.set_displayed(cell, false);
	}

	if !row.setup.abstain {
		cx.dom.listen(cell, show_info(&row.path_hash, None));
		row.setup.abstain = true;
	}
}

fn ticket_url<D: Dom>(cx: &RenderContext<'_, D>, data: &RowData) -> String {
	let locale = cx.page.locale.as_deref().unwrap_or_default();
	let path = data.path.as_deref().unwrap_or(&data.path_hash);
	let mut url = format!(
		"{}?component=data&summary={}&locale={}&xpath={}&version={}",
		cx.options.ticket_url,
		urlencoding::encode(&format!("{}:{}", locale, path)),
		urlencoding::encode(locale),
		urlencoding::encode(&data.path_hash),
		urlencoding::encode(cx.page.cldr_version.as_deref().unwrap_or_default()),
	);
	if cx.page.unofficial {
		url.push_str("&description=NOT+PRODUCTION+SURVEYTOOL!");
	}
	url
}

/// Appends one candidate (value, vote button and annotations) to `td`.
#[allow(clippy::too_many_arguments)]
fn add_candidate<D: Dom>(cx: &mut RenderContext<'_, D>, path_hash: &str, td: &D::Node, data: &RowData, item: &CandidateItem, winner: bool, votable: bool) {
	let shown = match item.display_value(data) {
		Some(shown) => shown,
		None => {
			debug!("Candidate {} of row {} has nothing to display.", item.value_hash, path_hash);
			return;
		}
	};
	trace!(value_hash = %item.value_hash, value = loggable(shown), "Adding candidate.");

	let div = cx.dom.append_element(td, "div", Severity::item_class(item.test_kind()));
	let choice = cx.dom.append_element(&div, "div", "choice-field");
	let voted = data.user_vote_value_hash.as_deref() == Some(item.value_hash.as_str());

	if votable {
		let button = cx.dom.append_element(&choice, "button", if voted { "ichoice-x btn btn-default" } else { "ichoice-o btn btn-default" });
		cx.dom.set_attribute(&button, "title", &cx.strings.get(if voted { "voTrue" } else { "voFalse" }));
		cx.dom.set_attribute(&button, "type", "button");
		cx.dom.listen(
			&button,
			RowAction::Vote {
				path_hash: path_hash.to_owned(),
				value_hash: Some(item.value_hash.clone()),
			},
		);
	}

	let sub_span = cx.dom.append_element(&choice, "span", "subSpan");
	let value_span = cx.dom.append_element(&sub_span, "span", item.display_class.as_str());
	append_with_visible_marks(cx.dom, &value_span, shown);

	if item.is_baseline_value {
		let star = cx.dom.append_element(&choice, "span", "i-star");
		cx.dom.set_attribute(&star, "title", &cx.strings.get("voteInfo_baseline_desc"));
	}

	if !winner && voted && data.flags.can_flag_on_losing && !data.flags.row_flagged {
		cx.dom.append_element(&choice, "span", "i-stop");
	}

	if votable && voted {
		let override_votes = cx.page.user.as_ref().and_then(|user| item.votes_by_user_id.get(&user.id.to_string())).and_then(|vote| vote.override_votes);
		if let Some(override_votes) = override_votes {
			let tag = cx.dom.append_element(&choice, "span", "i-override");
			let count = override_votes.to_string();
			cx.dom.set_attribute(&tag, "title", &cx.strings.sub("voteInfo_override_desc", &[count.as_str()]));
			cx.dom.append_text(&tag, &count);
		}
	}

	cx.dom.listen(&div, show_info(path_hash, Some(&item.value_hash)));

	if let Some(example) = item.example.as_deref().filter(|example| !example.is_empty()) {
		let example_div = cx.dom.append_element(&div, "div", "d-example well well-sm");
		cx.dom.set_inner_html(&example_div, example);
	}
}

/// Writes `text`, making invisible direction marks visible.
fn append_with_visible_marks<D: Dom>(dom: &mut D, parent: &D::Node, text: &str) {
	if !text.contains(|c: char| c == LRM || c == RLM) {
		return dom.append_text(parent, text);
	}

	let mut run_start = 0;
	for (at, mark) in text.char_indices().filter(|&(_, c)| c == LRM || c == RLM) {
		if run_start < at {
			dom.append_text(parent, &text[run_start..at]);
		}
		let visible = dom.append_element(parent, "span", "visible-mark");
		dom.append_text(&visible, if mark == LRM { "<LRM>" } else { "<RLM>" });
		run_start = at + mark.len_utf8();
	}
	if run_start < text.len() {
		dom.append_text(parent, &text[run_start..]);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		memory::MemoryDom,
		row::TableId,
		session::SurveyUser,
		strings::EnglishStrings,
	};
	use serde_json::json;

	struct Fixture {
		dom: MemoryDom,
		page: PageContext,
		options: TableOptions,
	}

	impl Fixture {
		fn new() -> Self {
			Self {
				dom: MemoryDom::new(),
				page: PageContext {
					locale: Some("de".to_owned()),
					user: Some(SurveyUser { id: 7, name: None }),
					..PageContext::default()
				},
				options: TableOptions::default(),
			}
		}

		fn row(&mut self) -> RenderedRow<crate::memory::NodeId> {
			let row = RenderedRow::create(&mut self.dom, TableId(1), "k".to_owned(), "abc");
			let body = self.dom.body();
			self.dom.append_child(&body, &row.node);
			row
		}

		fn render(&mut self, row: &mut RenderedRow<crate::memory::NodeId>, data: &RowData) -> RenderOutcome {
			let mut cx = RenderContext {
				dom: &mut self.dom,
				strings: &EnglishStrings,
				page: &self.page,
				options: &self.options,
				can_modify: true,
			};
			render_row(&mut cx, row, data)
		}
	}

	fn data(extra: serde_json::Value) -> RowData {
		let mut value = json!({
			"pathId": 1,
			"pathHash": "abc",
			"code": "de_CH",
			"coverageLevel": 30,
			"displayName": "Swiss German [translation hint: careful]",
			"candidateItems": {
				"w": { "rawValue": "Schweizerdeutsch", "displayClass": "winner", "isBaselineValue": true },
				"o": { "rawValue": "Alemannisch", "votesByUserId": { "7": { "overrideVotes": 4 } } },
			},
			"winningValueHash": "w",
			"statusAction": "ALLOW",
			"confirmStatus": "approved",
		});
		if let (Some(target), serde_json::Value::Object(extra)) = (value.as_object_mut(), extra) {
			target.extend(extra);
		}
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn renders_all_cells() {
		let mut f = Fixture::new();
		let mut row = f.row();
		let data = data(json!({ "userVoteValueHash": "o", "hasUserVoted": true }));
		assert_eq!(f.render(&mut row, &data), RenderOutcome::Rendered);

		let cells = row.cells().unwrap().clone();
		assert_eq!(f.dom.class_name(row.node), "vother cov30");
		assert_eq!(f.dom.class_name(cells.status), "d-dr-approved d-dr-status statuscell");
		assert_eq!(f.dom.attribute(cells.status, "title"), Some("Status: Approved"));
		assert!(f.dom.text_content(cells.code).starts_with("de_CH"));
		assert_eq!(f.dom.query_class(cells.code, "forumDiv").len(), 1);
		assert_eq!(f.dom.text_content(cells.comparison), "Swiss German[translation hint: careful]");
		assert_eq!(f.dom.query_class(cells.proposed, "i-star").len(), 1);
		assert!(f.dom.text_content(cells.proposed).contains("Schweizerdeutsch"));
		assert!(f.dom.text_content(cells.others).contains("Alemannisch"));
		assert_eq!(f.dom.query_class(cells.others, "i-override").len(), 1);
		assert_eq!(f.dom.query_class(cells.others, "button-add").len(), 1);
		assert_eq!(f.dom.query_class(cells.abstain, "ichoice-o").len(), 1);
		assert_eq!(f.dom.class_name(cells.abstain), "d-no-vo-true d-no nocell");
	}

	#[test]
	fn identical_data_is_skipped() {
		let mut f = Fixture::new();
		let mut row = f.row();
		let data = data(json!({}));
		f.render(&mut row, &data);
		let mark = f.dom.mark();
		assert_eq!(f.render(&mut row, &data), RenderOutcome::Unchanged);
		assert!(!f.dom.touched_since(mark, row.node));
	}

	#[test]
	fn rerender_is_idempotent_and_listens_once() {
		let mut f = Fixture::new();
		let mut row = f.row();
		f.render(&mut row, &data(json!({})));
		let first = f.dom.outer_html(row.node);
		row.fingerprint = None;
		f.render(&mut row, &data(json!({})));
		assert_eq!(f.dom.outer_html(row.node), first);
		let status = row.cells().unwrap().status;
		assert_eq!(f.dom.listeners(status).len(), 1);
	}

	#[test]
	fn missing_path_id_shows_error() {
		let mut f = Fixture::new();
		let mut row = f.row();
		let data = data(json!({ "pathId": null }));
		assert_eq!(f.render(&mut row, &data), RenderOutcome::MissingPathId);
		assert!(row.cells().is_none());
		assert_eq!(f.dom.text_content(row.node), "ERROR: missing row");
	}

	#[test]
	fn ticket_only_rows() {
		let mut f = Fixture::new();
		let mut row = f.row();
		let data = data(json!({ "statusAction": "ALLOW_TICKET_ONLY" }));
		f.render(&mut row, &data);
		let cells = row.cells().unwrap().clone();
		assert_eq!(f.dom.class_name(cells.proposed), "d-win proposedcell d-change-confirmonly");
		assert_eq!(f.dom.query_class(cells.proposed, "fnotebox").len(), 1);
		let link = f.dom.query_class(cells.abstain, "alert")[0];
		let anchor = f.dom.children(link)[0];
		assert!(f.dom.attribute(anchor, "href").unwrap().contains("xpath=abc"));
		assert!(f.dom.query_class(cells.others, "button-add").is_empty());
		assert!(f.dom.query_class(cells.proposed, "ichoice-o").is_empty());
	}

	#[test]
	fn add_cell_placement() {
		let mut f = Fixture::new();
		f.options.add_placement = AddPlacement::AddCell;
		let mut row = f.row();
		f.render(&mut row, &data(json!({})));
		let cells = row.cells().unwrap().clone();
		assert!(f.dom.query_class(cells.others, "button-add").is_empty());
		assert_eq!(f.dom.query_class(cells.add, "button-add").len(), 1);
	}

	#[test]
	fn inheritance_marker_displays_inherited_value() {
		let mut f = Fixture::new();
		let mut row = f.row();
		let data = data(json!({
			"candidateItems": { "i": { "rawValue": "↑↑↑" } },
			"winningValueHash": "i",
			"inheritedValue": "Deutsch",
			"inheritedLocale": "root",
			"confirmStatus": "unconfirmed",
		}));
		f.render(&mut row, &data);
		let cells = row.cells().unwrap().clone();
		assert!(f.dom.text_content(cells.proposed).contains("Deutsch"));
		assert_eq!(f.dom.class_name(cells.status), "d-dr-inherited-unconfirmed d-dr-status statuscell");
	}

	#[test]
	fn direction_marks_become_visible() {
		let mut dom = MemoryDom::new();
		let body = dom.body();
		append_with_visible_marks(&mut dom, &body, "a\u{200E}b");
		assert_eq!(dom.text_content(body), "a<LRM>b");
	}
}
