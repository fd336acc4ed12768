//! [`Dom`] on top of the browser's DOM.

use crate::dom::{Dom, RowAction};
use hashbrown::{hash_map::Entry, HashMap};
use js_sys::Function;
use tracing::{error, instrument, trace, trace_span};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};

/// Builds the table in a real document and reports clicks on wired-up nodes as [`RowAction`]s.
///
/// # Safety
///
/// All listeners share one handler, bound once per distinct [`RowAction`].
/// Listeners added through an instance start throwing errors into JavaScript once that instance is dropped,
/// so keep it alive as long as the table it built is shown.
#[derive(Debug)]
pub struct WebDom {
	document: web_sys::Document,
	common_handler: Closure<dyn Fn(JsValue, web_sys::Event)>,
	bound_handlers: HashMap<String, Function>,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document, on_action: impl 'static + Fn(RowAction)) -> Self {
		Self {
			document,
			common_handler: Closure::wrap(Box::new(move |action: JsValue, event: web_sys::Event| {
				let span = trace_span!("common_handler", action = ?&action, event = ?&event);
				let _enter = span.enter();

				let action = match action.as_string().map(|action| serde_json::from_str::<RowAction>(&action)) {
					Some(Ok(action)) => action,
					Some(Err(error)) => return error!("Undecodable row action bound to listener: {}", error),
					None => return error!("Listener bound to a non-string row action."),
				};
				on_action(action);
			})),
			bound_handlers: HashMap::new(),
		}
	}

	/// An instance for the current window's document, if there is one.
	#[must_use]
	pub fn for_window(on_action: impl 'static + Fn(RowAction)) -> Option<Self> {
		let document = web_sys::window()?.document()?;
		Some(Self::new(document, on_action))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// How many distinct actions have a bound listener function.
	#[must_use]
	pub fn bound_handler_count(&self) -> usize {
		self.bound_handlers.len()
	}

	fn element<'a>(node: &'a web_sys::Node, operation: &str) -> Option<&'a web_sys::Element> {
		let element = node.dyn_ref::<web_sys::Element>();
		if element.is_none() {
			error!("Can't {} on non-element node {:?}.", operation, node);
		}
		element
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;

	fn create_element(&mut self, tag: &str) -> Self::Node {
		self.document.create_element(tag).expect_throw("vetting-dom: Failed to create element.").into()
	}

	fn create_text(&mut self, text: &str) -> Self::Node {
		self.document.create_text_node(text).into()
	}

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append {:?} to {:?}: {:?}", child, parent, error);
		}
	}

	fn clear_children(&mut self, node: &Self::Node) {
		node.set_text_content(None);
	}

	fn remove(&mut self, node: &Self::Node) {
		if let Some(parent) = node.parent_node() {
			if let Err(error) = parent.remove_child(node) {
				error!("Failed to remove {:?}: {:?}", node, error);
			}
		}
	}

	fn set_class_name(&mut self, node: &Self::Node, class_name: &str) {
		if let Some(element) = Self::element(node, "set class name") {
			element.set_class_name(class_name);
		}
	}

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) {
		if let Some(element) = Self::element(node, "set attribute") {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn set_inner_html(&mut self, node: &Self::Node, html: &str) {
		if let Some(element) = Self::element(node, "set inner HTML") {
			element.set_inner_html(html);
		}
	}

	fn set_displayed(&mut self, node: &Self::Node, displayed: bool) {
		if let Some(element) = Self::element(node, "toggle visibility") {
			let result = if displayed { element.remove_attribute("hidden") } else { element.set_attribute("hidden", "") };
			if let Err(error) = result {
				error!("Failed to toggle visibility of {:?}: {:?}", node, error);
			}
		}
	}

	#[instrument(skip(self))]
	fn listen(&mut self, node: &Self::Node, action: RowAction) {
		let key = match serde_json::to_string(&action) {
			Ok(key) => key,
			Err(error) => return error!("Failed to encode row action: {}", error),
		};

		let common_handler = &self.common_handler;
		let function = match self.bound_handlers.entry(key) {
			Entry::Occupied(occupied) => occupied.into_mut(),
			Entry::Vacant(vacant) => {
				trace!("Binding new listener function.");
				let bound = common_handler.as_ref().unchecked_ref::<Function>().bind1(&JsValue::UNDEFINED, &JsValue::from_str(vacant.key())).unchecked_into::<Function>();
				vacant.insert(bound)
			}
		};

		if let Err(error) = node.add_event_listener_with_callback("click", function) {
			error!("Failed to add click listener: {:?}", error);
		}
	}

	fn is_connected(&self, node: &Self::Node) -> bool {
		node.is_connected()
	}

	fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
		ancestor.contains(Some(node))
	}
}
