//! In-memory reference platform.
//!
//! [`MemoryDom`] implements the full platform boundary — node factory,
//! node tree, and deferred-callback host — without any real UI toolkit
//! behind it. It exists for tests and for embedding the runtime in native
//! programs that bring their own presentation layer.
//!
//! The task queues are pumped explicitly ([`MemoryDom::run_microtasks`],
//! [`MemoryDom::run_frame`]) so tests control exactly where the batching
//! boundaries fall.

use crate::{
	Dispatcher, EventHandler, NativeDocument, NativeNode, NodeHandle, NodeId, NodeKind, Task,
	TaskHandle,
};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::{Rc, Weak};

/// In-memory platform: document, node tree, and task queues in one handle.
///
/// Cloning is cheap and refers to the same tree.
#[derive(Clone)]
pub struct MemoryDom {
	inner: Rc<DomInner>,
}

struct DomInner {
	next_id: Cell<NodeId>,
	/// Every node ever created, by id. The reference platform keeps nodes
	/// alive for the document's lifetime; child/parent links are id-based.
	nodes: RefCell<HashMap<NodeId, Rc<MemoryNode>>>,
	root_id: Cell<NodeId>,
	microtasks: RefCell<VecDeque<(TaskHandle, Task)>>,
	frame_tasks: RefCell<VecDeque<(TaskHandle, Task)>>,
}

impl MemoryDom {
	/// Creates an empty document with a connected root container.
	pub fn new() -> Self {
		let dom = Self {
			inner: Rc::new(DomInner {
				next_id: Cell::new(1),
				nodes: RefCell::new(HashMap::new()),
				root_id: Cell::new(0),
				microtasks: RefCell::new(VecDeque::new()),
				frame_tasks: RefCell::new(VecDeque::new()),
			}),
		};
		let root = dom.new_node(NodeKind::Element, "ROOT");
		dom.inner.root_id.set(root.id);
		dom
	}

	/// The connected root container node.
	pub fn root(&self) -> NodeHandle {
		let id = self.inner.root_id.get();
		self.node(id).expect("root node exists for document lifetime")
	}

	/// Looks up a node by id.
	pub fn node(&self, id: NodeId) -> Option<NodeHandle> {
		self.inner
			.nodes
			.borrow()
			.get(&id)
			.map(|n| n.clone() as NodeHandle)
	}

	/// Runs queued microtasks until the queue is empty.
	///
	/// Tasks queued by running tasks are drained in the same call — the
	/// "current synchronous turn plus same microtask queue" boundary.
	pub fn run_microtasks(&self) {
		loop {
			let next = self.inner.microtasks.borrow_mut().pop_front();
			match next {
				Some((handle, task)) => {
					if !handle.is_cancelled() {
						task();
					}
				}
				None => break,
			}
		}
	}

	/// Runs one display-refresh batch.
	///
	/// Only tasks already queued when the frame starts run; tasks requested
	/// while running land in the next frame.
	pub fn run_frame(&self) {
		let batch: Vec<_> = self.inner.frame_tasks.borrow_mut().drain(..).collect();
		for (handle, task) in batch {
			if !handle.is_cancelled() {
				task();
			}
		}
	}

	/// Number of microtasks currently queued (cancelled ones included).
	pub fn pending_microtasks(&self) -> usize {
		self.inner.microtasks.borrow().len()
	}

	/// Number of frame callbacks currently queued (cancelled ones included).
	pub fn pending_frames(&self) -> usize {
		self.inner.frame_tasks.borrow().len()
	}

	fn new_node(&self, kind: NodeKind, tag: &str) -> Rc<MemoryNode> {
		let id = self.inner.next_id.get();
		self.inner.next_id.set(id + 1);
		let node = Rc::new(MemoryNode {
			dom: Rc::downgrade(&self.inner),
			id,
			kind,
			tag: tag.to_string(),
			text: RefCell::new(String::new()),
			attrs: RefCell::new(BTreeMap::new()),
			styles: RefCell::new(Vec::new()),
			handlers: RefCell::new(HashMap::new()),
			children: RefCell::new(Vec::new()),
			parent: Cell::new(None),
		});
		self.inner.nodes.borrow_mut().insert(id, node.clone());
		node
	}
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl NativeDocument for MemoryDom {
	fn create_element(&self, tag: &str) -> NodeHandle {
		self.new_node(NodeKind::Element, &tag.to_ascii_uppercase())
	}

	fn create_text(&self, text: &str) -> NodeHandle {
		let node = self.new_node(NodeKind::Text, "#text");
		*node.text.borrow_mut() = text.to_string();
		node
	}
}

impl Dispatcher for MemoryDom {
	fn queue_microtask(&self, task: Task) -> TaskHandle {
		let handle = TaskHandle::new();
		self.inner
			.microtasks
			.borrow_mut()
			.push_back((handle.clone(), task));
		handle
	}

	fn request_frame(&self, task: Task) -> TaskHandle {
		let handle = TaskHandle::new();
		self.inner
			.frame_tasks
			.borrow_mut()
			.push_back((handle.clone(), task));
		handle
	}
}

/// A node of the in-memory platform.
pub struct MemoryNode {
	dom: Weak<DomInner>,
	id: NodeId,
	kind: NodeKind,
	tag: String,
	text: RefCell<String>,
	attrs: RefCell<BTreeMap<String, String>>,
	styles: RefCell<Vec<(String, String)>>,
	handlers: RefCell<HashMap<String, EventHandler>>,
	children: RefCell<Vec<NodeId>>,
	parent: Cell<Option<NodeId>>,
}

impl MemoryNode {
	/// Invokes the handler installed in `slot`, if any. Test helper.
	pub fn dispatch(&self, slot: &str) -> bool {
		let handler = self.handlers.borrow().get(&slot.to_ascii_lowercase()).cloned();
		match handler {
			Some(h) => {
				h();
				true
			}
			None => false,
		}
	}

	/// Inline style properties in application order. Test helper.
	pub fn styles(&self) -> Vec<(String, String)> {
		self.styles.borrow().clone()
	}

	fn resolve(&self, id: NodeId) -> Option<Rc<MemoryNode>> {
		self.dom.upgrade()?.nodes.borrow().get(&id).cloned()
	}

	fn detach(&self, child: &NodeHandle) {
		if let Some(parent) = child.parent() {
			parent.remove_child(child);
		}
	}
}

impl NativeNode for MemoryNode {
	fn id(&self) -> NodeId {
		self.id
	}

	fn kind(&self) -> NodeKind {
		self.kind
	}

	fn tag_name(&self) -> String {
		self.tag.clone()
	}

	fn text(&self) -> Option<String> {
		match self.kind {
			NodeKind::Text => Some(self.text.borrow().clone()),
			NodeKind::Element => None,
		}
	}

	fn set_text(&self, text: &str) {
		if self.kind == NodeKind::Text {
			*self.text.borrow_mut() = text.to_string();
		}
	}

	fn get_attribute(&self, name: &str) -> Option<String> {
		self.attrs.borrow().get(name).cloned()
	}

	fn has_attribute(&self, name: &str) -> bool {
		self.attrs.borrow().contains_key(name)
	}

	fn set_attribute(&self, name: &str, value: &str) {
		self.attrs
			.borrow_mut()
			.insert(name.to_string(), value.to_string());
	}

	fn clear_attribute(&self, name: &str) {
		// The reference platform's default for every attribute is "absent".
		self.attrs.borrow_mut().remove(name);
	}

	fn remove_attribute(&self, name: &str) {
		self.attrs.borrow_mut().remove(name);
	}

	fn set_style_property(&self, name: &str, value: &str) {
		let mut styles = self.styles.borrow_mut();
		if let Some(index) = styles.iter().position(|(n, _)| n == name) {
			styles[index].1 = value.to_string();
		} else {
			styles.push((name.to_string(), value.to_string()));
		}
	}

	fn style_property(&self, name: &str) -> Option<String> {
		self.styles
			.borrow()
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.clone())
	}

	fn clear_inline_styles(&self) {
		self.styles.borrow_mut().clear();
	}

	fn set_handler(&self, slot: &str, handler: Option<EventHandler>) {
		let slot = slot.to_ascii_lowercase();
		match handler {
			Some(h) => {
				self.handlers.borrow_mut().insert(slot, h);
			}
			None => {
				self.handlers.borrow_mut().remove(&slot);
			}
		}
	}

	fn has_handler(&self, slot: &str) -> bool {
		self.handlers
			.borrow()
			.contains_key(&slot.to_ascii_lowercase())
	}

	fn child_count(&self) -> usize {
		self.children.borrow().len()
	}

	fn child_at(&self, index: usize) -> Option<NodeHandle> {
		let id = *self.children.borrow().get(index)?;
		self.resolve(id).map(|n| n as NodeHandle)
	}

	fn parent(&self) -> Option<NodeHandle> {
		let id = self.parent.get()?;
		self.resolve(id).map(|n| n as NodeHandle)
	}

	fn append_child(&self, child: &NodeHandle) {
		self.detach(child);
		self.children.borrow_mut().push(child.id());
		if let Some(node) = self.resolve(child.id()) {
			node.parent.set(Some(self.id));
		}
	}

	fn replace_child(&self, new: &NodeHandle, old: &NodeHandle) {
		if new.id() == old.id() {
			return;
		}
		// Detach first: if `new` is an earlier sibling the target index
		// shifts, so the position of `old` is found afterwards.
		self.detach(new);
		let index = {
			let children = self.children.borrow();
			children.iter().position(|id| *id == old.id())
		};
		let Some(index) = index else { return };
		self.children.borrow_mut()[index] = new.id();
		if let Some(node) = self.resolve(old.id()) {
			node.parent.set(None);
		}
		if let Some(node) = self.resolve(new.id()) {
			node.parent.set(Some(self.id));
		}
	}

	fn remove_child(&self, child: &NodeHandle) {
		let mut children = self.children.borrow_mut();
		if let Some(index) = children.iter().position(|id| *id == child.id()) {
			children.remove(index);
			drop(children);
			if let Some(node) = self.resolve(child.id()) {
				node.parent.set(None);
			}
		}
	}

	fn truncate_children(&self, len: usize) -> Vec<NodeHandle> {
		let removed: Vec<NodeId> = {
			let mut children = self.children.borrow_mut();
			if children.len() <= len {
				return Vec::new();
			}
			children.split_off(len)
		};
		let mut handles = Vec::with_capacity(removed.len());
		for id in removed {
			if let Some(node) = self.resolve(id) {
				node.parent.set(None);
				handles.push(node as NodeHandle);
			}
		}
		handles
	}

	fn is_connected(&self) -> bool {
		let Some(dom) = self.dom.upgrade() else {
			return false;
		};
		let root = dom.root_id.get();
		let mut current = self.id;
		loop {
			if current == root {
				return true;
			}
			let parent = match dom.nodes.borrow().get(&current) {
				Some(node) => node.parent.get(),
				None => None,
			};
			match parent {
				Some(id) => current = id,
				None => return false,
			}
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl std::fmt::Debug for MemoryNode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryNode")
			.field("id", &self.id)
			.field("tag", &self.tag)
			.field("children", &self.children.borrow().len())
			.finish()
	}
}
