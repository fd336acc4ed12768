//! An arena-backed [`Dom`] for running the table logic outside a browser.
//!
//! Every mutation of an existing node is logged, so tests can assert that a pass left a subtree untouched.

use crate::dom::{Dom, RowAction};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
	Element(String),
	Text(String),
	/// Markup set through [`Dom::set_inner_html`], kept verbatim.
	Raw(String),
}

#[derive(Debug, Clone)]
struct NodeData {
	kind: NodeKind,
	class_name: String,
	attributes: BTreeMap<String, String>,
	children: Vec<NodeId>,
	parent: Option<NodeId>,
	displayed: bool,
	listeners: Vec<RowAction>,
}

impl NodeData {
	fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			class_name: String::new(),
			attributes: BTreeMap::new(),
			children: Vec::new(),
			parent: None,
			displayed: true,
			listeners: Vec::new(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct MemoryDom {
	nodes: Vec<NodeData>,
	log: Vec<NodeId>,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	/// Creates a document with an empty `<body>`, which counts as connected.
	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes: vec![NodeData::new(NodeKind::Element("body".to_owned()))],
			log: Vec::new(),
		}
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		NodeId(0)
	}

	fn touch(&mut self, node: NodeId) {
		self.log.push(node);
	}

	/// Opaque position in the mutation log, for [`MemoryDom::touched_since`].
	#[must_use]
	pub fn mark(&self) -> usize {
		self.log.len()
	}

	#[must_use]
	pub fn mutation_count(&self) -> usize {
		self.log.len()
	}

	/// Whether any node within `root` (as currently attached) was mutated after `mark`.
	#[must_use]
	pub fn touched_since(&self, mark: usize, root: NodeId) -> bool {
		self.log[mark.min(self.log.len())..].iter().any(|&node| self.contains(&root, &node))
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes[node.0].parent
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.nodes[node.0].children
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Element(tag) => Some(tag),
			NodeKind::Text(_) | NodeKind::Raw(_) => None,
		}
	}

	#[must_use]
	pub fn class_name(&self, node: NodeId) -> &str {
		&self.nodes[node.0].class_name
	}

	#[must_use]
	pub fn has_class(&self, node: NodeId, class: &str) -> bool {
		self.class_name(node).split_whitespace().any(|c| c == class)
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.nodes[node.0].attributes.get(name).map(String::as_str)
	}

	#[must_use]
	pub fn is_displayed(&self, node: NodeId) -> bool {
		self.nodes[node.0].displayed
	}

	#[must_use]
	pub fn listeners(&self, node: NodeId) -> &[RowAction] {
		&self.nodes[node.0].listeners
	}

	/// Concatenated text of `node` and its descendants. Raw markup is included verbatim.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		let mut text = String::new();
		self.collect_text(node, &mut text);
		text
	}

	fn collect_text(&self, node: NodeId, out: &mut String) {
		let data = &self.nodes[node.0];
		match &data.kind {
			NodeKind::Text(text) | NodeKind::Raw(text) => out.push_str(text),
			NodeKind::Element(_) => {
				for &child in &data.children {
					self.collect_text(child, out)
				}
			}
		}
	}

	/// Connected element with the given `id` attribute.
	#[must_use]
	pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
		self.descendants(self.body()).into_iter().find(|&node| self.attribute(node, "id") == Some(id))
	}

	/// Descendants of `root` (excluding `root`) carrying `class`, in document order.
	#[must_use]
	pub fn query_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
		self.descendants(root).into_iter().skip(1).filter(|&node| self.has_class(node, class)).collect()
	}

	/// `root` and its descendants in document order.
	fn descendants(&self, root: NodeId) -> Vec<NodeId> {
		let mut found = Vec::new();
		let mut stack = vec![root];
		while let Some(node) = stack.pop() {
			found.push(node);
			stack.extend(self.nodes[node.0].children.iter().rev().copied());
		}
		found
	}

	/// Serializes `node` as HTML with deterministic attribute order.
	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, out: &mut String) {
		let data = &self.nodes[node.0];
		match &data.kind {
			NodeKind::Text(text) => out.push_str(&escape(text)),
			NodeKind::Raw(html) => out.push_str(html),
			NodeKind::Element(tag) => {
				out.push('<');
				out.push_str(tag);
				if !data.class_name.is_empty() {
					let _ = write!(out, " class=\"{}\"", escape(&data.class_name));
				}
				for (name, value) in &data.attributes {
					let _ = write!(out, " {}=\"{}\"", name, escape(value));
				}
				if !data.displayed {
					out.push_str(" hidden");
				}
				out.push('>');
				for &child in &data.children {
					self.write_html(child, out);
				}
				let _ = write!(out, "</{}>", tag);
			}
		}
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node.0].parent.take() {
			self.nodes[parent.0].children.retain(|&child| child != node);
			self.touch(parent);
		}
	}

	fn push(&mut self, data: NodeData) -> NodeId {
		self.nodes.push(data);
		NodeId(self.nodes.len() - 1)
	}
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn create_element(&mut self, tag: &str) -> NodeId {
		self.push(NodeData::new(NodeKind::Element(tag.to_owned())))
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		self.push(NodeData::new(NodeKind::Text(text.to_owned())))
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
		self.detach(*child);
		self.nodes[child.0].parent = Some(*parent);
		self.nodes[parent.0].children.push(*child);
		self.touch(*parent);
	}

	fn clear_children(&mut self, node: &NodeId) {
		for child in std::mem::take(&mut self.nodes[node.0].children) {
			self.nodes[child.0].parent = None;
		}
		self.touch(*node);
	}

	fn remove(&mut self, node: &NodeId) {
		self.detach(*node);
	}

	fn set_class_name(&mut self, node: &NodeId, class_name: &str) {
		class_name.clone_into(&mut self.nodes[node.0].class_name);
		self.touch(*node);
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		self.nodes[node.0].attributes.insert(name.to_owned(), value.to_owned());
		self.touch(*node);
	}

	fn set_inner_html(&mut self, node: &NodeId, html: &str) {
		self.clear_children(node);
		let raw = self.push(NodeData::new(NodeKind::Raw(html.to_owned())));
		self.append_child(node, &raw);
	}

	fn set_displayed(&mut self, node: &NodeId, displayed: bool) {
		self.nodes[node.0].displayed = displayed;
		self.touch(*node);
	}

	fn listen(&mut self, node: &NodeId, action: RowAction) {
		self.nodes[node.0].listeners.push(action);
		self.touch(*node);
	}

	fn is_connected(&self, node: &NodeId) -> bool {
		self.contains(&self.body(), node)
	}

	fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
		let mut current = Some(*node);
		while let Some(candidate) = current {
			if candidate == *ancestor {
				return true;
			}
			current = self.nodes[candidate.0].parent;
		}
		false
	}
}
