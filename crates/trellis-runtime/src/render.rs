//! The reconciliation context.
//!
//! Each render pass of a component runs against a [`Renderer`]: the nodes
//! and child components the pass creates are matched against the previous
//! pass's set — by key first, then by type — so native nodes and component
//! state survive across renders. Whatever the previous pass produced that
//! the new pass does not claim is dropped; the child-list mutator removes
//! the corresponding nodes from the tree at their former parent.

use crate::attrs::apply_attributes;
use crate::children::{apply_children, resolve_children, Child};
use crate::component::Component;
use crate::error::{Result, RuntimeError};
use crate::instance::{AnyInstance, DynInstance, Instance};
use crate::props::{input_key, Props};
use crate::runtime::Runtime;
use serde_json::Value;
use std::any::TypeId;
use std::rc::Rc;
use tracing::trace;
use trellis_dom::{NativeDocument, NativeNode, NodeHandle};

pub(crate) struct NodeSlot {
	pub(crate) key: Option<String>,
	pub(crate) node: NodeHandle,
}

pub(crate) struct ChildSlot {
	pub(crate) key: Option<String>,
	pub(crate) type_id: TypeId,
	pub(crate) type_name: &'static str,
	pub(crate) instance: DynInstance,
}

/// Per-component matcher state, kept across passes.
#[derive(Default)]
pub(crate) struct Renderer {
	/// Nodes created or reused during the current pass.
	pub(crate) nodes: Vec<NodeSlot>,
	/// Child components created or reused during the current pass.
	pub(crate) children: Vec<ChildSlot>,
	/// The previous pass's sets, consumed as matches are found.
	previous_nodes: Vec<NodeSlot>,
	previous_children: Vec<ChildSlot>,
}

impl Renderer {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Rotates the current-pass sets into the previous-pass position.
	/// Called once per render before the render function runs.
	pub(crate) fn setup_for_new_pass(&mut self) {
		self.previous_nodes = std::mem::take(&mut self.nodes);
		self.previous_children = std::mem::take(&mut self.children);
	}

	/// Drops whatever the pass did not claim. Unmatched nodes lose their
	/// side-records; unmatched component instances are released (their own
	/// teardown purges their subtrees).
	pub(crate) fn finalize(&mut self, runtime: &Runtime) {
		if !self.previous_nodes.is_empty() || !self.previous_children.is_empty() {
			trace!(
				nodes = self.previous_nodes.len(),
				components = self.previous_children.len(),
				"dropping unmatched previous-pass entries"
			);
		}
		for slot in self.previous_nodes.drain(..) {
			runtime.purge_meta(slot.node.id());
		}
		self.previous_children.clear();
	}

	/// Releases every side-record this renderer still references. Called
	/// when the owning component goes away.
	pub(crate) fn purge(&self, runtime: &Runtime) {
		for slot in self.nodes.iter().chain(self.previous_nodes.iter()) {
			runtime.purge_meta(slot.node.id());
		}
	}

	fn take_node(
		&mut self,
		key: Option<&str>,
		tag: &str,
		debug_checks: bool,
	) -> Result<Option<NodeHandle>> {
		if let Some(key) = key {
			if let Some(position) = self
				.previous_nodes
				.iter()
				.position(|slot| slot.key.as_deref() == Some(key))
			{
				let slot = self.previous_nodes.remove(position);
				let previous_tag = slot.node.tag_name();
				if debug_checks && previous_tag != tag {
					return Err(RuntimeError::KeyedTagMismatch {
						key: key.to_string(),
						previous: previous_tag,
						requested: tag.to_string(),
					});
				}
				return Ok(Some(slot.node));
			}
		}
		if let Some(position) = self
			.previous_nodes
			.iter()
			.position(|slot| slot.key.is_none() && slot.node.tag_name() == tag)
		{
			return Ok(Some(self.previous_nodes.remove(position).node));
		}
		Ok(None)
	}

	fn take_component(
		&mut self,
		key: Option<&str>,
		type_id: TypeId,
		type_name: &'static str,
		debug_checks: bool,
	) -> Result<Option<DynInstance>> {
		if let Some(key) = key {
			if let Some(position) = self
				.previous_children
				.iter()
				.position(|slot| slot.key.as_deref() == Some(key))
			{
				let slot = self.previous_children.remove(position);
				if debug_checks && slot.type_id != type_id {
					return Err(RuntimeError::KeyedComponentMismatch {
						key: key.to_string(),
						previous: slot.type_name,
						requested: type_name,
					});
				}
				return Ok(Some(slot.instance));
			}
		}
		if let Some(position) = self
			.previous_children
			.iter()
			.position(|slot| slot.key.is_none() && slot.type_id == type_id)
		{
			return Ok(Some(self.previous_children.remove(position).instance));
		}
		Ok(None)
	}

	pub(crate) fn element_by_key(&self, key: &str) -> Option<NodeHandle> {
		if let Some(slot) = self
			.nodes
			.iter()
			.find(|slot| slot.key.as_deref() == Some(key))
		{
			return Some(slot.node.clone());
		}
		self.children
			.iter()
			.find(|slot| slot.key.as_deref() == Some(key))
			.and_then(|slot| slot.instance.rendered_root())
	}
}

/// The node-creation interface handed to a component's render function.
///
/// This is the sole target of the (external) template-compilation step:
/// compiled templates and hand-written render code alike declare output
/// through [`RenderScope::element`] and [`RenderScope::component`].
pub struct RenderScope<'a> {
	runtime: Runtime,
	input: &'a Value,
	renderer: &'a mut Option<Renderer>,
	pass_started: bool,
}

impl<'a> RenderScope<'a> {
	pub(crate) fn new(
		runtime: Runtime,
		input: &'a Value,
		renderer: &'a mut Option<Renderer>,
	) -> Self {
		Self {
			runtime,
			input,
			renderer,
			pass_started: false,
		}
	}

	/// The rendering component's current input.
	pub fn input(&self) -> &Value {
		self.input
	}

	/// The runtime this render belongs to.
	pub fn runtime(&self) -> &Runtime {
		&self.runtime
	}

	/// Declares a native element.
	///
	/// Reuses the previous pass's node for the same key, or the first
	/// keyless node with the same tag, creating a fresh one otherwise;
	/// applies the minimal attribute diff and reconciles `children`
	/// against the node's actual child list. Reusing a key across two
	/// different tags is fatal — resolving it silently would corrupt the
	/// reused node's attribute state.
	pub fn element(
		&mut self,
		tag: &str,
		props: Props,
		children: impl IntoIterator<Item = Child>,
	) -> Result<NodeHandle> {
		let tag_upper = tag.to_ascii_uppercase();
		let key = props.resolve_key();
		let debug_checks = self.runtime.config().debug_checks;

		let reused = self
			.renderer_mut()
			.take_node(key.as_deref(), &tag_upper, debug_checks)?;
		let node = match reused {
			Some(node) => node,
			None => {
				trace!(tag = %tag_upper, key = key.as_deref(), "creating element");
				self.runtime.document().create_element(tag)
			}
		};

		apply_attributes(&self.runtime, &node, &props);
		let resolved = resolve_children(&self.runtime, children)?;
		apply_children(&self.runtime, &node, &resolved);

		self.renderer_mut().nodes.push(NodeSlot {
			key,
			node: node.clone(),
		});
		Ok(node)
	}

	/// Declares a nested component and returns its rendered root.
	///
	/// Reuses the previous pass's instance for the same key, or the first
	/// keyless instance of the exact same type, constructing a fresh one
	/// otherwise. Sets the resolved input (which may no-op under the
	/// component's input policy), records the key, and renders the child —
	/// recursively, if it is dirty. Reusing a key across two different
	/// component types is fatal.
	pub fn component<C: Component + Default>(&mut self, input: Value) -> Result<NodeHandle> {
		let key = input_key(&input);
		let debug_checks = self.runtime.config().debug_checks;

		let reused = self.renderer_mut().take_component(
			key.as_deref(),
			TypeId::of::<C>(),
			C::name(),
			debug_checks,
		)?;
		let instance: DynInstance = match reused {
			Some(instance) => instance,
			None => {
				trace!(component = C::name(), key = key.as_deref(), "creating component");
				Rc::new(Instance::<C>::new(&self.runtime))
			}
		};

		instance.assign_input(input)?;
		instance.assign_key(key.clone());
		self.renderer_mut().children.push(ChildSlot {
			key,
			type_id: instance.component_type(),
			type_name: instance.type_name(),
			instance: instance.clone(),
		});
		instance.render_element()
	}

	/// Looks up a node or component created earlier in this pass by key.
	pub fn element_by_key(&self, key: &str) -> Option<NodeHandle> {
		self.renderer.as_ref()?.element_by_key(key)
	}

	pub(crate) fn pass_started(&self) -> bool {
		self.pass_started
	}

	/// Lazily creates the renderer and rotates its pass state exactly once
	/// per render, on first use of the declaration interface.
	fn renderer_mut(&mut self) -> &mut Renderer {
		let renderer = self.renderer.get_or_insert_with(Renderer::new);
		if !self.pass_started {
			renderer.setup_for_new_pass();
			self.pass_started = true;
		}
		renderer
	}
}
