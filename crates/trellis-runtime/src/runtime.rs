//! The runtime handle: platform access, configuration, scheduler, and the
//! node side-table.

use crate::children::{apply_children, resolve_children, Child};
use crate::error::Result;
use crate::instance::DynInstance;
use crate::props::Props;
use crate::scheduler::Scheduler;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::error;
use trellis_dom::{Dispatcher, NativeDocument, NodeHandle, NodeId, Task};

/// How dirty components are batched into a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
	/// Coalesce all dirtying within the current synchronous turn plus the
	/// same microtask queue.
	#[default]
	Microtask,
	/// Coalesce until the next display refresh callback.
	Frame,
}

/// Process-wide runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
	/// Enables the fatal reconciliation checks (root replacement, keyed
	/// tag/type mismatches). Disabling skips the validation for
	/// performance; reuse then proceeds unchecked.
	pub debug_checks: bool,
	/// Scheduling mode for the batched re-render pass.
	pub batching: BatchMode,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			debug_checks: true,
			batching: BatchMode::default(),
		}
	}
}

/// Lifecycle hook bound to a component instance.
pub(crate) type HookFn = Rc<dyn Fn()>;

/// Out-of-band record the engine keeps per native node.
#[derive(Default)]
pub(crate) struct NodeMeta {
	/// Attribute map applied by the previous render pass.
	pub(crate) last_attrs: Option<Props>,
	pub(crate) on_mount: Option<HookFn>,
	pub(crate) on_unmount: Option<HookFn>,
	/// Whether the node has received a mount notification without a
	/// matching unmount yet.
	pub(crate) mounted: bool,
}

/// Handle to one runtime: the document it drives, its scheduler, its
/// configuration, and the node side-table.
///
/// Constructed once per process — or once per test; nothing in the engine
/// is globally shared, so runtimes are fully isolated from each other.
/// Cloning is cheap and refers to the same runtime.
#[derive(Clone)]
pub struct Runtime {
	pub(crate) inner: Rc<RuntimeInner>,
}

pub(crate) struct RuntimeInner {
	pub(crate) document: Rc<dyn NativeDocument>,
	pub(crate) dispatcher: Rc<dyn Dispatcher>,
	pub(crate) config: RuntimeConfig,
	pub(crate) scheduler: Scheduler,
	pub(crate) registry: RefCell<HashMap<NodeId, NodeMeta>>,
	next_instance_id: Cell<u64>,
}

impl Runtime {
	/// Creates a runtime with the default configuration.
	pub fn new(document: Rc<dyn NativeDocument>, dispatcher: Rc<dyn Dispatcher>) -> Self {
		Self::with_config(document, dispatcher, RuntimeConfig::default())
	}

	/// Creates a runtime with an explicit configuration.
	pub fn with_config(
		document: Rc<dyn NativeDocument>,
		dispatcher: Rc<dyn Dispatcher>,
		config: RuntimeConfig,
	) -> Self {
		Self {
			inner: Rc::new(RuntimeInner {
				document,
				dispatcher,
				config,
				scheduler: Scheduler::new(),
				registry: RefCell::new(HashMap::new()),
				next_instance_id: Cell::new(1),
			}),
		}
	}

	/// The active configuration.
	pub fn config(&self) -> &RuntimeConfig {
		&self.inner.config
	}

	/// The platform node factory.
	pub fn document(&self) -> &Rc<dyn NativeDocument> {
		&self.inner.document
	}

	/// Forces immediate processing of all pending dirty components.
	///
	/// Runs the batch routine now and cancels any still-pending deferred
	/// callback so it becomes a no-op when it eventually fires. The first
	/// render error aborts the pass; the dirty set is cleared either way
	/// and the error is re-raised.
	pub fn digest(&self) -> Result<()> {
		self.inner.scheduler.digest()
	}

	/// Applies `children` as the desired child list of `parent`.
	///
	/// Public entry point to the child-list mutator for code managing a
	/// node's children outside a reconciliation context. The walk is a
	/// single left-to-right pass: reordering unchanged children without
	/// keys degrades into a chain of replacements.
	pub fn update_children(
		&self,
		parent: &NodeHandle,
		children: impl IntoIterator<Item = Child>,
	) -> Result<()> {
		let resolved = resolve_children(self, children)?;
		apply_children(self, parent, &resolved);
		Ok(())
	}

	/// Registers a freshly dirtied component and schedules the deferred
	/// batch callback if none is pending.
	pub(crate) fn schedule(&self, instance: DynInstance) {
		if !self.inner.scheduler.enqueue(instance) {
			return;
		}
		let weak = Rc::downgrade(&self.inner);
		let task: Task = Box::new(move || {
			if let Some(inner) = weak.upgrade() {
				let runtime = Runtime { inner };
				if let Err(err) = runtime.digest() {
					// The deferred callback has no caller to re-raise to;
					// this is the ambient unhandled-error channel.
					error!(error = %err, "deferred digest failed");
				}
			}
		});
		let handle = match self.inner.config.batching {
			BatchMode::Microtask => self.inner.dispatcher.queue_microtask(task),
			BatchMode::Frame => self.inner.dispatcher.request_frame(task),
		};
		self.inner.scheduler.set_pending(handle);
	}

	pub(crate) fn next_instance_id(&self) -> u64 {
		let id = self.inner.next_instance_id.get();
		self.inner.next_instance_id.set(id + 1);
		id
	}

	/// Takes the attribute map recorded for `node` by the previous pass.
	pub(crate) fn take_recorded_attrs(&self, node: NodeId) -> Option<Props> {
		self.inner
			.registry
			.borrow_mut()
			.get_mut(&node)
			.and_then(|meta| meta.last_attrs.take())
	}

	/// Records the attribute map just applied to `node`.
	pub(crate) fn record_attrs(&self, node: NodeId, attrs: Props) {
		self.inner
			.registry
			.borrow_mut()
			.entry(node)
			.or_default()
			.last_attrs = Some(attrs);
	}

	/// Binds mount/unmount hooks to `node`. Called once per component root.
	pub(crate) fn attach_hooks(&self, node: NodeId, on_mount: HookFn, on_unmount: HookFn) {
		let mut registry = self.inner.registry.borrow_mut();
		let meta = registry.entry(node).or_default();
		meta.on_mount = Some(on_mount);
		meta.on_unmount = Some(on_unmount);
	}

	/// Marks `node` as having received its mount notification and returns
	/// the hook to fire, if this is an actual not-mounted → mounted
	/// transition.
	pub(crate) fn begin_mount(&self, node: NodeId) -> Option<HookFn> {
		let mut registry = self.inner.registry.borrow_mut();
		let meta = registry.get_mut(&node)?;
		if meta.mounted {
			return None;
		}
		meta.mounted = true;
		meta.on_mount.clone()
	}

	/// Counterpart of [`Runtime::begin_mount`] for the unmount direction.
	pub(crate) fn begin_unmount(&self, node: NodeId) -> Option<HookFn> {
		let mut registry = self.inner.registry.borrow_mut();
		let meta = registry.get_mut(&node)?;
		if !meta.mounted {
			return None;
		}
		meta.mounted = false;
		meta.on_unmount.clone()
	}

	/// Drops the side-record of a node the engine no longer references.
	pub(crate) fn purge_meta(&self, node: NodeId) {
		self.inner.registry.borrow_mut().remove(&node);
	}
}

impl std::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runtime")
			.field("config", &self.inner.config)
			.field("tracked_nodes", &self.inner.registry.borrow().len())
			.finish()
	}
}
