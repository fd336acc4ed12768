use serde_json::{json, Value};
use vetting_dom::{
	dom::Dom,
	memory::{MemoryDom, NodeId},
	reconcile::TABLE_DOM_ID,
	row::row_dom_id,
	session::SurveyUser,
	FullTablePayload, PageContext, TableOptions, TableSession,
};

fn init_logging() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn row(path_id: u64, path_hash: &str, value: &str, coverage: i32) -> Value {
	json!({
		"pathId": path_id,
		"pathHash": path_hash,
		"code": format!("code-{}", path_hash),
		"coverageLevel": coverage,
		"candidateItems": { "w": { "rawValue": value } },
		"winningValueHash": "w",
		"statusAction": "ALLOW",
		"confirmStatus": "approved",
	})
}

fn payload(page_id: &str, rows: Vec<(&str, Value)>, partitions: Value) -> FullTablePayload {
	let order: Vec<_> = rows.iter().map(|(key, _)| key.to_string()).collect();
	let rows: serde_json::Map<_, _> = rows.into_iter().map(|(key, row)| (key.to_owned(), row)).collect();
	FullTablePayload::from_value(json!({
		"pageId": page_id,
		"locale": "de",
		"canModify": true,
		"rows": rows,
		"sortOrders": { "ph": { "partitions": partitions, "rowKeyOrder": order } },
	}))
	.unwrap()
}

fn three_rows(second_value: &str) -> FullTablePayload {
	payload(
		"Languages",
		vec![("k1", row(1, "h1", "eins", 30)), ("k2", row(2, "h2", second_value, 20)), ("k3", row(3, "h3", "drei", 40))],
		json!([{ "name": "A", "start": 0, "limit": 2 }, { "name": "B", "start": 2, "limit": 3 }]),
	)
}

fn page() -> PageContext {
	PageContext {
		section: "Locale Display Names".to_owned(),
		page: "Languages".to_owned(),
		locale: Some("de".to_owned()),
		user: Some(SurveyUser { id: 7, name: None }),
		..PageContext::default()
	}
}

fn session(options: TableOptions) -> TableSession<MemoryDom> {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	TableSession::new(dom, body, page(), options)
}

fn row_node(session: &TableSession<MemoryDom>, path_hash: &str) -> NodeId {
	*session.live().unwrap().row(path_hash).unwrap().node()
}

#[test]
fn first_pass_builds_table_with_headings() {
	let mut session = session(TableOptions::default());
	let report = session.insert_rows(three_rows("zwei")).unwrap();
	assert!(!report.reused);
	assert_eq!(report.created, 3);
	assert_eq!(report.rendered, 3);

	let dom = session.dom();
	let table = dom.find_by_id(TABLE_DOM_ID).unwrap();
	assert_eq!(dom.query_class(table, "partition-heading").len(), 2);

	let live = session.live().unwrap();
	assert_eq!(dom.class_name(*live.heading(0).unwrap()), "partition-heading cov20");
	assert_eq!(dom.class_name(*live.heading(1).unwrap()), "partition-heading cov40");
	assert_eq!(dom.text_content(*live.heading(0).unwrap()), "A");

	let order: Vec<_> = live.rows_in_order().map(|row| row.path_hash().to_owned()).collect();
	assert_eq!(order, ["h1", "h2", "h3"]);

	// Heading, two rows, heading, one row.
	let tbody = *live.tbody();
	let children = dom.children(tbody);
	assert_eq!(children.len(), 5);
	assert_eq!(children[1], dom.find_by_id(&row_dom_id("h1")).unwrap());
	assert_eq!(children[4], dom.find_by_id(&row_dom_id("h3")).unwrap());

	assert_eq!(session.coverage_of("h2"), Some(20));
	assert_eq!(session.coverage_levels().collect::<Vec<_>>(), [("h1", 30), ("h2", 20), ("h3", 40)]);
}

#[test]
fn identical_payload_reuses_table_without_touching_it() {
	let mut session = session(TableOptions::default());
	session.insert_rows(three_rows("zwei")).unwrap();
	let table = *session.live().unwrap().table_node();
	let mark = session.dom().mark();

	let report = session.insert_rows(three_rows("zwei")).unwrap();
	assert!(report.reused);
	assert_eq!(report.unchanged, 3);
	assert_eq!(report.created, 0);
	assert!(!session.dom().touched_since(mark, table));
	assert_eq!(*session.live().unwrap().table_node(), table);
}

#[test]
fn changed_row_is_rerendered_in_place() {
	let mut session = session(TableOptions::default());
	session.insert_rows(three_rows("zwei")).unwrap();
	let h1 = row_node(&session, "h1");
	let h2 = row_node(&session, "h2");
	let mark = session.dom().mark();

	let report = session.insert_rows(three_rows("ZWEI")).unwrap();
	assert!(report.reused);
	assert_eq!(report.rendered, 1);
	assert_eq!(report.unchanged, 2);
	assert_eq!(row_node(&session, "h2"), h2);
	assert!(session.dom().touched_since(mark, h2));
	assert!(!session.dom().touched_since(mark, h1));
	assert!(session.dom().text_content(h2).contains("ZWEI"));
	assert_eq!(session.live().unwrap().row_data("k2").unwrap().winning_value(), Some("ZWEI"));
}

#[test]
fn stale_rows_are_removed_from_reused_table() {
	let mut session = session(TableOptions::default());
	session.insert_rows(three_rows("zwei")).unwrap();
	let h3 = row_node(&session, "h3");

	let replaced = payload(
		"Languages",
		vec![("k1", row(1, "h1", "eins", 30)), ("k2", row(2, "h2", "zwei", 20)), ("k4", row(4, "h4", "vier", 40))],
		json!([{ "name": "A", "start": 0, "limit": 2 }, { "name": "B", "start": 2, "limit": 3 }]),
	);
	let report = session.insert_rows(replaced).unwrap();
	assert!(report.reused);
	assert_eq!(report.removed, 1);
	assert_eq!(report.created, 1);
	assert!(!session.dom().is_connected(&h3));
	assert!(session.live().unwrap().row("h3").is_none());
	assert!(session.dom().find_by_id(&row_dom_id("h4")).is_some());
}

#[test]
fn incompatible_payload_rebuilds() {
	let mut session = session(TableOptions::default());
	session.insert_rows(three_rows("zwei")).unwrap();
	let old_table = *session.live().unwrap().table_node();
	let old_id = session.live().unwrap().id();

	let other_page = payload("Scripts", vec![("s1", row(10, "s1", "Latein", 30))], json!([]));
	let report = session.insert_rows(other_page).unwrap();
	assert!(!report.reused);
	assert_ne!(session.live().unwrap().id(), old_id);
	assert!(!session.dom().is_connected(&old_table));
	let body = session.dom().body();
	assert_eq!(session.dom().query_class(body, "vetting-page").len(), 1);
	assert!(session.live().unwrap().heading(0).is_none());
}

#[test]
fn never_reuse_rebuilds_every_time() {
	let mut session = session(TableOptions { never_reuse_table: true, ..TableOptions::default() });
	session.insert_rows(three_rows("zwei")).unwrap();
	let report = session.insert_rows(three_rows("zwei")).unwrap();
	assert!(!report.reused);
	assert_eq!(report.created, 3);
	let body = session.dom().body();
	assert_eq!(session.dom().query_class(body, "vetting-page").len(), 1);
}

#[test]
fn clearing_container_keeps_only_the_table() {
	init_logging();
	let mut dom = MemoryDom::new();
	let body = dom.body();
	let container = dom.append_element(&body, "div", "");
	dom.append_text(&container, "Loading…");
	let mut session = TableSession::new(dom, container, page(), TableOptions { always_remove_all_child_nodes: true, ..TableOptions::default() });

	session.insert_rows(three_rows("zwei")).unwrap();
	let report = session.insert_rows(three_rows("zwei")).unwrap();
	assert!(report.reused);
	let table = *session.live().unwrap().table_node();
	assert_eq!(session.dom().children(container), [table]);
}

#[test]
fn detached_container_discards_payload() {
	init_logging();
	let mut dom = MemoryDom::new();
	let body = dom.body();
	let container = dom.append_element(&body, "div", "");
	let mut session = TableSession::new(dom, container, page(), TableOptions::default());
	session.insert_rows(three_rows("zwei")).unwrap();

	session.dom_mut().remove(&container);
	let mark = session.dom().mark();
	assert_eq!(session.insert_rows(three_rows("ZWEI")), None);
	assert_eq!(session.dom().mutation_count(), mark);
	assert_eq!(session.live().unwrap().row_data("k2").unwrap().winning_value(), Some("zwei"));
}

#[test]
fn path_headers_are_registered_with_partition_names() {
	let mut session = session(TableOptions::default());
	session.insert_rows(three_rows("zwei")).unwrap();
	let entry = session.path_headers().get("h3").unwrap();
	assert_eq!(entry.header_name, "B");
	assert_eq!(entry.formatted(), "Locale Display Names | Languages | B | code-h3");
	assert_eq!(session.path_headers().get_by_id(1).unwrap().path_hash, "h1");
}

#[test]
fn rows_missing_from_payload_are_counted() {
	let mut session = session(TableOptions::default());
	let mut payload = three_rows("zwei");
	payload.sort_orders.get_mut("ph").unwrap().row_key_order.push("ghost".to_owned());
	let report = session.insert_rows(payload).unwrap();
	assert_eq!(report.missing, 1);
	assert_eq!(report.created, 3);
}

#[test]
fn preferred_sort_mode_is_used_when_offered() {
	let mut session = session(TableOptions::default());
	session.set_sort_mode("codecal");
	let mut payload = three_rows("zwei");
	let mut reversed = payload.sort_orders["ph"].clone();
	reversed.row_key_order.reverse();
	reversed.partitions.clear();
	payload.sort_orders.insert("codecal".to_owned(), reversed);

	session.insert_rows(payload).unwrap();
	let live = session.live().unwrap();
	assert_eq!(live.sort_mode(), "codecal");
	let order: Vec<_> = live.rows_in_order().map(|row| row.path_hash().to_owned()).collect();
	assert_eq!(order, ["h3", "h2", "h1"]);
}

#[test]
fn no_winning_value_leaves_proposed_cell_empty() {
	let mut session = session(TableOptions::default());
	let mut sentinel = row(1, "h1", "x", 30);
	sentinel["winningValueHash"] = json!(vetting_dom::model::NO_WINNING_VALUE);
	sentinel["candidateItems"] = json!({ "o": { "rawValue": "x" } });
	let report = session.insert_rows(payload("Languages", vec![("k1", sentinel)], json!([]))).unwrap();
	assert_eq!(report.created, 1);

	let dom = session.dom();
	let cells = session.live().unwrap().row("h1").unwrap().cells().unwrap();
	assert_eq!(dom.text_content(cells.proposed), "");
	assert!(dom.text_content(cells.others).contains('x'));
	assert!(dom.text_content(cells.code).contains("code-h1"));
	assert_eq!(dom.class_name(row_node(&session, "h1")), "vother cov30");
}

#[test]
fn unnamed_partitions_emit_no_headings() {
	let mut session = session(TableOptions::default());
	let report = session
		.insert_rows(payload(
			"Languages",
			vec![("k1", row(1, "h1", "eins", 30)), ("k2", row(2, "h2", "zwei", 20))],
			json!([{ "name": "", "start": 0, "limit": 1 }, { "name": "", "start": 1, "limit": 2 }]),
		))
		.unwrap();
	assert_eq!(report.created, 2);

	let dom = session.dom();
	let live = session.live().unwrap();
	assert!(live.heading(0).is_none());
	assert!(live.heading(1).is_none());
	let table = dom.find_by_id(TABLE_DOM_ID).unwrap();
	assert!(dom.query_class(table, "partition-heading").is_empty());
	assert_eq!(dom.children(*live.tbody()).len(), 2);
}

#[test]
fn rest_page_envelope_builds_rows() {
	let mut session = session(TableOptions::default());
	let payload = FullTablePayload::from_value(json!({
		"pageId": "Languages",
		"loc": "de",
		"canModify": true,
		"page": { "nocontent": false, "rows": { "_x1": row(1, "h1", "eins", 30), "_x2": row(2, "h2", "zwei", 20) } },
		"displaySets": { "ph": { "partitions": [{ "name": "A", "start": 0, "limit": 2 }], "rows": ["_x1", "_x2"] } },
	}))
	.unwrap();
	assert!(payload.meta().has_section);

	let report = session.insert_rows(payload).unwrap();
	assert_eq!(report.created, 2);
	assert_eq!(report.missing, 0);
	assert!(session.dom().text_content(row_node(&session, "h2")).contains("zwei"));
}
