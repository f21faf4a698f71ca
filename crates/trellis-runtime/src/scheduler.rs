//! The dirty-set scheduler.
//!
//! Components register here when they become dirty; a single deferred
//! callback (microtask- or frame-batched, see
//! [`RuntimeConfig`](crate::RuntimeConfig)) later renders everything that
//! accumulated. The set is append-ordered: entries added while a digest is
//! running are still processed in the same pass, so "everything dirty as of
//! now" always renders together.

use crate::error::Result;
use crate::instance::{AnyInstance, DynInstance};
use std::cell::RefCell;
use tracing::{debug, trace};
use trellis_dom::TaskHandle;

pub(crate) struct Scheduler {
	/// Dirty components in the order they (first) became dirty.
	queue: RefCell<Vec<DynInstance>>,
	/// The deferred batch callback, if one is scheduled.
	pending: RefCell<Option<TaskHandle>>,
}

impl Scheduler {
	pub(crate) fn new() -> Self {
		Self {
			queue: RefCell::new(Vec::new()),
			pending: RefCell::new(None),
		}
	}

	/// Appends a dirtied component. Returns whether the caller must
	/// schedule the deferred batch callback (no callback pending yet).
	pub(crate) fn enqueue(&self, instance: DynInstance) -> bool {
		trace!(component = instance.type_name(), "component dirtied");
		self.queue.borrow_mut().push(instance);
		self.pending.borrow().is_none()
	}

	/// Records the deferred callback scheduled for the current batch.
	pub(crate) fn set_pending(&self, handle: TaskHandle) {
		*self.pending.borrow_mut() = Some(handle);
	}

	/// Removes a component from the dirty set so a failed render is not
	/// retried.
	pub(crate) fn forget(&self, instance_id: u64) {
		self.queue
			.borrow_mut()
			.retain(|c| c.instance_id() != instance_id);
	}

	/// Runs the batch routine now.
	///
	/// Cancels any pending deferred callback first, then walks the queue in
	/// insertion order pulling each component's element (a no-op for
	/// components some earlier render already cleaned). Components dirtied
	/// mid-pass were appended and are reached by the same walk. The queue
	/// is cleared at pass end even when an error unwinds; the error is then
	/// re-raised to the caller.
	pub(crate) fn digest(&self) -> Result<()> {
		if let Some(handle) = self.pending.borrow_mut().take() {
			handle.cancel();
		}
		debug!(dirty = self.queue.borrow().len(), "digest");

		let mut index = 0;
		let outcome = loop {
			// Re-borrow per step: renders may append to the queue.
			let next = self.queue.borrow().get(index).cloned();
			let Some(component) = next else {
				break Ok(());
			};
			index += 1;
			if let Err(err) = component.render_element() {
				break Err(err);
			}
		};

		self.queue.borrow_mut().clear();
		outcome
	}
}
