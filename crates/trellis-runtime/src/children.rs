//! Child values and the child-list tree mutator.
//!
//! [`Child`] is the legal vocabulary for declared children — native nodes,
//! nested components, text, nested lists (flattened) and nothing. The
//! mutator applies an ordered, resolved child sequence to a node's actual
//! child list in a single left-to-right pass, firing mount/unmount
//! notifications for subtrees entering or leaving the live tree.
//!
//! The pass is deliberately not a minimum-edit-distance diff: reordering
//! unchanged children without keys degrades into a chain of replacements.
//! Keyed reuse in the reconciliation context is the intended mitigation for
//! reorder-heavy lists.

use crate::component::Component;
use crate::error::Result;
use crate::instance::{AnyInstance, DynInstance, Instance};
use crate::runtime::Runtime;
use std::rc::Rc;
use tracing::trace;
use trellis_dom::{same_node, NativeDocument, NativeNode, NodeHandle};

/// A declared child of a native element.
#[derive(Clone)]
pub enum Child {
	/// An already-created native node.
	Node(NodeHandle),
	/// A nested component; resolved to its rendered root.
	Component(ComponentChild),
	/// A text value, materialized as a platform text node.
	Text(String),
	/// A nested list, flattened in place.
	Many(Vec<Child>),
	/// Nothing; filtered out.
	Empty,
}

/// Opaque type-erased component reference used as a child value.
#[derive(Clone)]
pub struct ComponentChild {
	pub(crate) instance: DynInstance,
}

impl From<NodeHandle> for Child {
	fn from(node: NodeHandle) -> Self {
		Self::Node(node)
	}
}

impl From<&NodeHandle> for Child {
	fn from(node: &NodeHandle) -> Self {
		Self::Node(node.clone())
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<i64> for Child {
	fn from(value: i64) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<f64> for Child {
	fn from(value: f64) -> Self {
		Self::Text(value.to_string())
	}
}

impl<C: Component> From<Instance<C>> for Child {
	fn from(instance: Instance<C>) -> Self {
		Self::Component(ComponentChild {
			instance: Rc::new(instance),
		})
	}
}

impl<C: Component> From<&Instance<C>> for Child {
	fn from(instance: &Instance<C>) -> Self {
		instance.clone().into()
	}
}

impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(value: Option<T>) -> Self {
		match value {
			Some(child) => child.into(),
			None => Self::Empty,
		}
	}
}

impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Self::Many(children.into_iter().map(Into::into).collect())
	}
}

/// Flattens, null-filters and materializes a declared child sequence into
/// native nodes. Component children are rendered here, which may recurse
/// into their own render passes.
pub(crate) fn resolve_children(
	runtime: &Runtime,
	children: impl IntoIterator<Item = Child>,
) -> Result<Vec<NodeHandle>> {
	let mut resolved = Vec::new();
	for child in children {
		resolve_into(runtime, child, &mut resolved)?;
	}
	Ok(resolved)
}

fn resolve_into(runtime: &Runtime, child: Child, out: &mut Vec<NodeHandle>) -> Result<()> {
	match child {
		Child::Node(node) => out.push(node),
		Child::Component(child) => out.push(child.instance.render_element()?),
		Child::Text(text) => out.push(runtime.document().create_text(&text)),
		Child::Many(children) => {
			for child in children {
				resolve_into(runtime, child, out)?;
			}
		}
		Child::Empty => {}
	}
	Ok(())
}

/// Applies `desired` as the child list of `parent` in one left-to-right
/// pass.
///
/// Walks both lists in lock-step by index: missing actual slots are filled
/// by appends, identical slots are skipped (preserving node identity and
/// state), differing slots are replaced, and trailing excess is removed.
/// Mount/unmount notifications fire only while `parent` is attached to the
/// live tree; a replaced node is unmounted only if it appears nowhere else
/// in the desired sequence (it may be about to occupy a later slot).
pub(crate) fn apply_children(runtime: &Runtime, parent: &NodeHandle, desired: &[NodeHandle]) {
	let live = parent.is_connected();

	for (index, want) in desired.iter().enumerate() {
		match parent.child_at(index) {
			None => {
				parent.append_child(want);
				if live {
					notify_mounted(runtime, want);
				}
			}
			Some(have) if same_node(&have, want) => {}
			Some(have) => {
				trace!(
					parent = %parent.tag_name(),
					index,
					"replacing child <{}> with <{}>",
					have.tag_name(),
					want.tag_name()
				);
				parent.replace_child(want, &have);
				if live {
					let reused_later = desired.iter().any(|d| same_node(d, &have));
					if !reused_later {
						notify_unmounted(runtime, &have);
					}
					notify_mounted(runtime, want);
				}
			}
		}
	}

	let removed = parent.truncate_children(desired.len());
	if live {
		for node in &removed {
			notify_unmounted(runtime, node);
		}
	}
}

/// Walks `node` and its descendants firing mount notifications for every
/// node that exposes one and has not received one yet.
///
/// The walk is bounded by the subtree being attached; the per-node mounted
/// flag guarantees exactly-once delivery even when a node re-enters the
/// tree through several structural moves in one pass.
pub(crate) fn notify_mounted(runtime: &Runtime, node: &NodeHandle) {
	if let Some(hook) = runtime.begin_mount(node.id()) {
		hook();
	}
	for index in 0..node.child_count() {
		if let Some(child) = node.child_at(index) {
			notify_mounted(runtime, &child);
		}
	}
}

/// Counterpart of [`notify_mounted`] for subtrees leaving the live tree.
pub(crate) fn notify_unmounted(runtime: &Runtime, node: &NodeHandle) {
	if let Some(hook) = runtime.begin_unmount(node.id()) {
		hook();
	}
	for index in 0..node.child_count() {
		if let Some(child) = node.child_at(index) {
			notify_unmounted(runtime, &child);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::rc::Rc;
	use trellis_dom::memory::MemoryDom;
	use trellis_dom::NativeDocument;

	fn setup() -> (Runtime, Rc<MemoryDom>) {
		let dom = Rc::new(MemoryDom::new());
		let runtime = Runtime::new(dom.clone(), dom.clone());
		(runtime, dom)
	}

	#[test]
	fn test_lock_step_append_and_truncate() {
		let (runtime, dom) = setup();
		let parent = dom.create_element("div");
		let a = dom.create_element("p");
		let b = dom.create_element("p");

		apply_children(&runtime, &parent, &[a.clone(), b.clone()]);
		assert_eq!(parent.child_count(), 2);

		apply_children(&runtime, &parent, &[a.clone()]);
		assert_eq!(parent.child_count(), 1);
		assert_eq!(parent.child_at(0).unwrap().id(), a.id());
	}

	#[test]
	fn test_identical_slots_preserve_identity() {
		let (runtime, dom) = setup();
		let parent = dom.create_element("div");
		let child = dom.create_element("span");
		child.set_attribute("data-state", "kept");

		apply_children(&runtime, &parent, &[child.clone()]);
		apply_children(&runtime, &parent, &[child.clone()]);

		assert_eq!(parent.child_count(), 1);
		assert_eq!(
			parent.child_at(0).unwrap().get_attribute("data-state").as_deref(),
			Some("kept")
		);
	}

	#[test]
	fn test_unkeyed_reorder_degrades_to_replacement() {
		let (runtime, dom) = setup();
		let parent = dom.create_element("ul");
		let a = dom.create_element("li");
		let b = dom.create_element("li");

		apply_children(&runtime, &parent, &[a.clone(), b.clone()]);
		apply_children(&runtime, &parent, &[b.clone(), a.clone()]);

		assert_eq!(parent.child_count(), 2);
		assert_eq!(parent.child_at(0).unwrap().id(), b.id());
		assert_eq!(parent.child_at(1).unwrap().id(), a.id());
	}

	#[test]
	fn test_text_children_materialize_as_text_nodes() {
		let (runtime, dom) = setup();
		let parent = dom.create_element("div");
		let resolved = resolve_children(
			&runtime,
			[Child::from("hello"), Child::from(42i64), Child::Empty],
		)
		.unwrap();
		apply_children(&runtime, &parent, &resolved);

		assert_eq!(parent.child_count(), 2);
		assert_eq!(parent.child_at(0).unwrap().text().as_deref(), Some("hello"));
		assert_eq!(parent.child_at(1).unwrap().text().as_deref(), Some("42"));
	}

	#[test]
	fn test_nested_lists_flatten_in_order() {
		let (runtime, _dom) = setup();
		let resolved = resolve_children(
			&runtime,
			[
				Child::from("a"),
				Child::Many(vec![Child::from("b"), Child::Many(vec![Child::from("c")])]),
				Child::from(None::<String>),
				Child::from("d"),
			],
		)
		.unwrap();
		let texts: Vec<_> = resolved.iter().filter_map(|n| n.text()).collect();
		assert_eq!(texts, vec!["a", "b", "c", "d"]);
	}
}
