//! Component instances: the per-entity lifecycle and dirty-state machine.

use crate::component::{Component, InputPolicy, MountState};
use crate::children::{notify_mounted, notify_unmounted};
use crate::error::{Result, RuntimeError};
use crate::props::{json_type_name, shallow_fields_eq};
use crate::render::{Renderer, RenderScope};
use crate::runtime::Runtime;
use serde_json::Value;
use std::any::TypeId;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;
use trellis_dom::{same_node, NativeNode, NodeHandle};

/// Type-erased instance surface used by the scheduler and the
/// reconciliation context.
pub(crate) trait AnyInstance {
	fn instance_id(&self) -> u64;
	fn component_type(&self) -> TypeId;
	fn type_name(&self) -> &'static str;
	fn render_element(&self) -> Result<NodeHandle>;
	fn assign_input(&self, input: Value) -> Result<()>;
	fn assign_key(&self, key: Option<String>);
	fn rendered_root(&self) -> Option<NodeHandle>;
}

pub(crate) type DynInstance = Rc<dyn AnyInstance>;

/// A live component: one long-lived piece of UI state.
///
/// The handle is cheap to clone; all clones refer to the same instance.
/// Dropping the last reference destroys the instance — there is no
/// explicit destructor.
///
/// Rendering is lazy and pull-based: nothing renders until something asks
/// for [`Instance::element`], directly or through a mount or digest.
pub struct Instance<C: Component> {
	state: Rc<RefCell<InstanceState<C>>>,
}

impl<C: Component> Clone for Instance<C> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
		}
	}
}

struct InstanceState<C: Component> {
	runtime: Runtime,
	id: u64,
	component: C,
	/// Current input; `Null` doubles as "unset".
	input: Value,
	dirty: bool,
	mount_state: MountState,
	/// The root native node, owned for the instance's whole lifetime once
	/// the first render produces it.
	root: Option<NodeHandle>,
	/// Present once the render function has used the reconciliation
	/// context.
	renderer: Option<Renderer>,
	/// Set only when this instance is a child of a reconciliation context.
	key: Option<String>,
	hooks_attached: bool,
}

impl<C: Component + Default> Instance<C> {
	/// Constructs an instance with unset input, dirty and unmounted.
	pub fn new(runtime: &Runtime) -> Self {
		Self::with(runtime, C::default())
	}
}

impl<C: Component> Instance<C> {
	/// Constructs an instance around an explicit component value.
	pub fn with(runtime: &Runtime, component: C) -> Self {
		Self {
			state: Rc::new(RefCell::new(InstanceState {
				runtime: runtime.clone(),
				id: runtime.next_instance_id(),
				component,
				input: Value::Null,
				dirty: true,
				mount_state: MountState::NotMounted,
				root: None,
				renderer: None,
				key: None,
				hooks_attached: false,
			})),
		}
	}

	/// Replaces the component's input.
	///
	/// Unless the previous and new values are both empty, fires
	/// [`Component::input_changed`] with `(previous, new)` before storing,
	/// then unconditionally marks the component dirty. Under
	/// [`InputPolicy::ShallowFields`] an object-shaped input whose fields
	/// all match the previous input is a complete no-op, and a non-object
	/// input is a usage error.
	pub fn set_input(&self, input: Value) -> Result<()> {
		{
			let mut state = self.state.borrow_mut();
			match C::input_policy() {
				InputPolicy::ShallowFields => {
					if !input.is_object() {
						return Err(RuntimeError::NonObjectInput {
							component: C::name(),
							found: json_type_name(&input),
						});
					}
					if state.input.is_object() && shallow_fields_eq(&state.input, &input) {
						return Ok(());
					}
				}
				InputPolicy::AlwaysDirty => {}
			}
			let both_empty = state.input.is_null() && input.is_null();
			if !both_empty {
				let InstanceState {
					component,
					input: current,
					..
				} = &mut *state;
				component.input_changed(current, &input);
			}
			state.input = input;
		}
		self.set_dirty();
		Ok(())
	}

	/// Flags the component's output as stale and registers it with the
	/// scheduler. Idempotent: a no-op while already dirty.
	pub fn set_dirty(&self) {
		let runtime = {
			let mut state = self.state.borrow_mut();
			if state.dirty {
				return;
			}
			state.dirty = true;
			state.runtime.clone()
		};
		runtime.schedule(Rc::new(self.clone()));
	}

	/// The root native node, rendering first if the instance is dirty.
	///
	/// This is the sole trigger for rendering. When the render fails the
	/// instance is removed from the dirty set (it will not be retried),
	/// stays dirty, and the error propagates to the caller.
	pub fn element(&self) -> Result<NodeHandle> {
		{
			let state = self.state.borrow();
			if !state.dirty {
				return state
					.root
					.clone()
					.ok_or(RuntimeError::MissingRoot { component: C::name() });
			}
		}
		match self.render_now() {
			Ok(root) => Ok(root),
			Err(err) => {
				let (runtime, id) = {
					let state = self.state.borrow();
					(state.runtime.clone(), state.id)
				};
				runtime.inner.scheduler.forget(id);
				Err(err)
			}
		}
	}

	/// Attaches the component under `parent` and fires mount notifications
	/// through the newly attached subtree.
	///
	/// Pairs with exactly one [`Instance::unmount`]. Mounting an already
	/// mounted component is a usage error.
	pub fn mount_under(&self, parent: &NodeHandle) -> Result<()> {
		{
			let state = self.state.borrow();
			if state.mount_state != MountState::NotMounted {
				return Err(RuntimeError::AlreadyMounted {
					component: C::name(),
				});
			}
		}
		let root = self.element()?;
		parent.append_child(&root);
		let runtime = self.runtime();
		notify_mounted(&runtime, &root);
		self.state.borrow_mut().mount_state = MountState::MountedDirectly;
		Ok(())
	}

	/// Detaches the component from the live tree and fires unmount
	/// notifications through the detached subtree.
	pub fn unmount(&self) -> Result<()> {
		let root = {
			let state = self.state.borrow();
			if state.mount_state != MountState::MountedDirectly {
				return Err(RuntimeError::NotMountedDirectly {
					component: C::name(),
				});
			}
			state
				.root
				.clone()
				.ok_or(RuntimeError::MissingRoot { component: C::name() })?
		};
		if let Some(parent) = root.parent() {
			parent.remove_child(&root);
		}
		let runtime = self.runtime();
		notify_unmounted(&runtime, &root);
		self.state.borrow_mut().mount_state = MountState::NotMounted;
		Ok(())
	}

	/// Looks up a node or child component of the most recent render pass
	/// by key (for reading layout state after mount, for example).
	pub fn element_by_key(&self, key: &str) -> Option<NodeHandle> {
		let state = self.state.borrow();
		let renderer = state.renderer.as_ref()?;
		renderer.element_by_key(key)
	}

	/// Where the instance currently sits relative to the live tree.
	pub fn mount_state(&self) -> MountState {
		self.state.borrow().mount_state
	}

	/// Whether the instance's output is stale.
	pub fn is_dirty(&self) -> bool {
		self.state.borrow().dirty
	}

	/// The key assigned by a parent reconciliation context, if any.
	pub fn key(&self) -> Option<String> {
		self.state.borrow().key.clone()
	}

	/// Read access to the component value, for tests and diagnostics.
	pub fn with_ref<R>(&self, f: impl FnOnce(&C) -> R) -> R {
		f(&self.state.borrow().component)
	}

	/// Mutable access to the component value, for tests and diagnostics.
	/// Does not dirty the instance.
	pub fn with_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
		f(&mut self.state.borrow_mut().component)
	}

	fn runtime(&self) -> Runtime {
		self.state.borrow().runtime.clone()
	}

	fn render_now(&self) -> Result<NodeHandle> {
		let mut state = self.state.borrow_mut();
		trace!(component = C::name(), "render");
		let runtime = state.runtime.clone();
		let debug_checks = runtime.config().debug_checks;

		let (output, pass_started) = {
			let InstanceState {
				component,
				input,
				renderer,
				..
			} = &mut *state;
			let mut scope = RenderScope::new(runtime.clone(), input, renderer);
			let output = component.render(&mut scope)?;
			(output, scope.pass_started())
		};

		let root = match output {
			Some(node) => match state.root.as_ref() {
				Some(existing) if !same_node(existing, &node) => {
					if debug_checks {
						return Err(RuntimeError::RootReplaced {
							component: C::name(),
							previous: existing.tag_name(),
							requested: node.tag_name(),
						});
					}
					existing.clone()
				}
				_ => node,
			},
			// The render manages its root itself; leave the existing one
			// untouched.
			None => match state.root.as_ref() {
				Some(existing) => existing.clone(),
				None => {
					return Err(RuntimeError::MissingRoot {
						component: C::name(),
					})
				}
			},
		};

		if pass_started {
			if let Some(renderer) = state.renderer.as_mut() {
				renderer.finalize(&runtime);
			}
		}

		if state.root.is_none() {
			state.root = Some(root.clone());
		}
		if !state.hooks_attached {
			let on_mount = {
				let weak = Rc::downgrade(&self.state);
				Rc::new(move || {
					if let Some(state) = weak.upgrade() {
						handle_mounted::<C>(&state);
					}
				}) as Rc<dyn Fn()>
			};
			let on_unmount = {
				let weak = Rc::downgrade(&self.state);
				Rc::new(move || {
					if let Some(state) = weak.upgrade() {
						handle_unmounted::<C>(&state);
					}
				}) as Rc<dyn Fn()>
			};
			runtime.attach_hooks(root.id(), on_mount, on_unmount);
			state.hooks_attached = true;
		}
		state.dirty = false;
		Ok(root)
	}
}

impl<C: Component> AnyInstance for Instance<C> {
	fn instance_id(&self) -> u64 {
		self.state.borrow().id
	}

	fn component_type(&self) -> TypeId {
		TypeId::of::<C>()
	}

	fn type_name(&self) -> &'static str {
		C::name()
	}

	fn render_element(&self) -> Result<NodeHandle> {
		self.element()
	}

	fn assign_input(&self, input: Value) -> Result<()> {
		self.set_input(input)
	}

	fn assign_key(&self, key: Option<String>) {
		self.state.borrow_mut().key = key;
	}

	fn rendered_root(&self) -> Option<NodeHandle> {
		self.state.borrow().root.clone()
	}
}

impl<C: Component> std::fmt::Debug for Instance<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("Instance")
			.field("component", &C::name())
			.field("dirty", &state.dirty)
			.field("mount_state", &state.mount_state)
			.field("key", &state.key)
			.finish()
	}
}

fn handle_mounted<C: Component>(state: &Rc<RefCell<InstanceState<C>>>) {
	let mut state = state.borrow_mut();
	if state.mount_state == MountState::NotMounted {
		state.mount_state = MountState::MountedUnderComponent;
	}
	state.component.was_mounted();
}

fn handle_unmounted<C: Component>(state: &Rc<RefCell<InstanceState<C>>>) {
	let mut state = state.borrow_mut();
	state.mount_state = MountState::NotMounted;
	state.component.was_unmounted();
}

impl<C: Component> Drop for InstanceState<C> {
	fn drop(&mut self) {
		// Release this instance's side-records; child instances drop with
		// the renderer and purge their own subtrees the same way.
		if let Some(renderer) = self.renderer.take() {
			renderer.purge(&self.runtime);
		}
		if let Some(root) = self.root.take() {
			self.runtime.purge_meta(root.id());
		}
	}
}
