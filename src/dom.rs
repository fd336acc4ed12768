//! The DOM operations the table needs, abstracted so the reconciler runs both in a browser ([`crate::web::WebDom`])
//! and natively ([`crate::memory::MemoryDom`]).

use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// What a click on a wired-up node asks the application to do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RowAction {
	/// Show the info panel for a row, optionally focused on one candidate.
	ShowInfo { path_hash: String, value_hash: Option<String> },
	/// Vote for a candidate, or abstain if `value_hash` is [`None`].
	Vote { path_hash: String, value_hash: Option<String> },
	/// Open the "add a new value" input.
	AddValue { path_hash: String },
	/// Open a forum post about the row.
	OpenForum { path_hash: String },
}

pub trait Dom {
	type Node: Clone + Debug;

	fn create_element(&mut self, tag: &str) -> Self::Node;
	fn create_text(&mut self, text: &str) -> Self::Node;

	/// Moves `child` to the end of `parent`'s children, detaching it from any previous parent first.
	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);
	fn clear_children(&mut self, node: &Self::Node);
	/// Detaches `node` from its parent, if any.
	fn remove(&mut self, node: &Self::Node);

	fn set_class_name(&mut self, node: &Self::Node, class_name: &str);
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
	/// Replaces all children of `node` with parsed `html`. Only used for server-provided example markup.
	fn set_inner_html(&mut self, node: &Self::Node, html: &str);
	fn set_displayed(&mut self, node: &Self::Node, displayed: bool);

	/// Adds a click listener to `node` that reports `action`.
	fn listen(&mut self, node: &Self::Node, action: RowAction);

	fn is_connected(&self, node: &Self::Node) -> bool;
	/// Whether `node` is `ancestor` or one of its descendants.
	fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

	fn append_element(&mut self, parent: &Self::Node, tag: &str, class_name: &str) -> Self::Node {
		let element = self.create_element(tag);
		if !class_name.is_empty() {
			self.set_class_name(&element, class_name);
		}
		self.append_child(parent, &element);
		element
	}

	fn append_text(&mut self, parent: &Self::Node, text: &str) {
		let text = self.create_text(text);
		self.append_child(parent, &text);
	}
}
