//! Platform boundary for the Trellis component runtime.
//!
//! The runtime keeps a live tree of *native nodes* synchronized with
//! component render output, but it does not implement that tree itself.
//! This crate defines the narrow interface the engine drives — node
//! identity, attribute and style access, handler slots, child-list
//! mutation, connectivity — plus the deferred-callback host used by the
//! batching scheduler, and an in-memory reference platform
//! ([`memory::MemoryDom`]) for tests and native embedding.
//!
//! Real platforms (a browser DOM, a retained-mode toolkit) implement
//! [`NativeNode`], [`NativeDocument`] and [`Dispatcher`]; the engine never
//! assumes anything beyond these traits.

pub mod memory;

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Stable identity for a native node, assigned by the platform.
///
/// The engine keys all of its side-tables (attribute history, lifecycle
/// hooks) by `NodeId`, so the association stays out-of-band and survives
/// any representation the platform chooses for the nodes themselves.
pub type NodeId = u64;

/// The two node shapes a platform tree is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	/// A tagged element that can carry attributes, styles and children.
	Element,
	/// A leaf text node.
	Text,
}

/// Callback installed into a node's event handler slot.
pub type EventHandler = Rc<dyn Fn()>;

/// Shared handle to a platform node.
pub type NodeHandle = Rc<dyn NativeNode>;

/// Returns whether two handles refer to the same platform node.
pub fn same_node(a: &NodeHandle, b: &NodeHandle) -> bool {
	a.id() == b.id()
}

impl fmt::Debug for dyn NativeNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NativeNode")
			.field("id", &self.id())
			.field("kind", &self.kind())
			.field("tag", &self.tag_name())
			.finish()
	}
}

/// A node in the platform UI tree.
///
/// All mutation goes through `&self`; implementations are expected to use
/// interior mutability, matching the single-threaded cooperative model of
/// the runtime. Child operations are identity-based and must re-parent a
/// node that is already attached elsewhere (DOM `appendChild` semantics).
pub trait NativeNode {
	/// Platform-assigned stable identity.
	fn id(&self) -> NodeId;

	/// Element or text.
	fn kind(&self) -> NodeKind;

	/// Canonical tag name, upper-cased for elements (`DIV`), `#text` for
	/// text nodes.
	fn tag_name(&self) -> String;

	/// Text content of a text node; `None` for elements.
	fn text(&self) -> Option<String>;

	/// Replaces the text content of a text node. No-op on elements.
	fn set_text(&self, text: &str);

	/// Current value of an attribute, if set.
	fn get_attribute(&self, name: &str) -> Option<String>;

	/// Whether the attribute is currently present.
	fn has_attribute(&self, name: &str) -> bool;

	/// Sets an attribute value.
	fn set_attribute(&self, name: &str, value: &str);

	/// Resets an attribute to the platform's default value.
	///
	/// For platforms where the default is simply "absent" this is the same
	/// as [`NativeNode::remove_attribute`]; DOM-like platforms reset the
	/// backing property instead.
	fn clear_attribute(&self, name: &str);

	/// Removes an attribute outright (the `data-*` namespaced case).
	fn remove_attribute(&self, name: &str);

	/// Sets one inline style property.
	fn set_style_property(&self, name: &str, value: &str);

	/// Current value of one inline style property.
	fn style_property(&self, name: &str) -> Option<String>;

	/// Clears every inline style property.
	fn clear_inline_styles(&self);

	/// Installs or removes the callback for a handler slot.
	///
	/// Slot names are lower-case (`onclick`); callers are responsible for
	/// case-normalization.
	fn set_handler(&self, slot: &str, handler: Option<EventHandler>);

	/// Whether a handler is currently installed in the slot.
	fn has_handler(&self, slot: &str) -> bool;

	/// Number of children currently attached.
	fn child_count(&self) -> usize;

	/// Child at `index`, if any.
	fn child_at(&self, index: usize) -> Option<NodeHandle>;

	/// Current parent node, if attached.
	fn parent(&self) -> Option<NodeHandle>;

	/// Appends `child`, detaching it from any previous parent first.
	fn append_child(&self, child: &NodeHandle);

	/// Replaces `old` (a current child) with `new`, detaching `new` from
	/// any previous parent first. No-op if `old` is not a child.
	fn replace_child(&self, new: &NodeHandle, old: &NodeHandle);

	/// Detaches `child` if it is currently a child of this node.
	fn remove_child(&self, child: &NodeHandle);

	/// Removes every child past `len`, returning the removed nodes in
	/// tree order.
	fn truncate_children(&self, len: usize) -> Vec<NodeHandle>;

	/// Whether the node is attached to the live tree.
	fn is_connected(&self) -> bool;

	/// Escape hatch for platform-specific access (test dispatch etc.).
	fn as_any(&self) -> &dyn Any;
}

/// Factory for platform nodes.
pub trait NativeDocument {
	/// Creates a detached element with the given tag.
	fn create_element(&self, tag: &str) -> NodeHandle;

	/// Creates a detached text node.
	fn create_text(&self, text: &str) -> NodeHandle;
}

/// A unit of deferred work handed to the platform.
pub type Task = Box<dyn FnOnce()>;

/// Cancellation handle for a scheduled [`Task`].
///
/// Cancelling does not unschedule the callback; it flips a shared flag the
/// host checks before running, so an already-fired callback is a no-op.
#[derive(Clone)]
pub struct TaskHandle {
	cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
	/// Creates a live (non-cancelled) handle.
	pub fn new() -> Self {
		Self {
			cancelled: Rc::new(Cell::new(false)),
		}
	}

	/// Marks the task as cancelled.
	pub fn cancel(&self) {
		self.cancelled.set(true);
	}

	/// Whether the task has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled.get()
	}
}

impl Default for TaskHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for TaskHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TaskHandle")
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}

/// Deferred-callback host.
///
/// The runtime batches re-renders behind one of two boundaries: the end of
/// the current microtask turn, or the next display refresh. The platform
/// owns both queues; the engine only ever schedules and cancels.
pub trait Dispatcher {
	/// Runs `task` after the current synchronous turn, before yielding to
	/// the event loop.
	fn queue_microtask(&self, task: Task) -> TaskHandle;

	/// Runs `task` on the next display refresh.
	fn request_frame(&self, task: Task) -> TaskHandle;
}
