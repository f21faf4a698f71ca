//! Component definition trait and lifecycle vocabulary.

use crate::error::Result;
use crate::render::RenderScope;
use serde_json::Value;
use trellis_dom::NodeHandle;

/// Behavior of one component kind.
///
/// A component declares a render function producing a tree of native nodes
/// and nested components; the runtime owns the lifecycle around it (input,
/// dirtiness, mounting, the cached root node). Implementations are plain
/// structs holding whatever internal state the component needs; the runtime
/// constructs child instances through `Default`.
///
/// # Example
///
/// ```
/// use trellis_runtime::{Component, Props, RenderScope, Result};
/// use trellis_dom::NodeHandle;
///
/// #[derive(Default)]
/// struct Greeting;
///
/// impl Component for Greeting {
/// 	fn name() -> &'static str {
/// 		"Greeting"
/// 	}
///
/// 	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>> {
/// 		let who = ctx
/// 			.input()
/// 			.get("who")
/// 			.and_then(|v| v.as_str())
/// 			.unwrap_or("world")
/// 			.to_string();
/// 		let root = ctx.element("div", Props::new().attr("class", "greeting"), [who.into()])?;
/// 		Ok(Some(root))
/// 	}
/// }
/// ```
pub trait Component: 'static {
	/// The component's name, used in diagnostics and fatal errors.
	fn name() -> &'static str
	where
		Self: Sized;

	/// Equality strategy applied by `set_input` before dirtying.
	///
	/// The default re-renders on every input change. `ShallowFields` is the
	/// "pure" variant: object-shaped inputs whose fields are all unchanged
	/// produce no update, no notification and no re-render.
	fn input_policy() -> InputPolicy
	where
		Self: Sized,
	{
		InputPolicy::AlwaysDirty
	}

	/// Produces the component's output for the current input.
	///
	/// Returning `Some(root)` declares the root native node; it must be the
	/// same node on every render for the component's lifetime. Returning
	/// `None` leaves the existing root untouched (for components that manage
	/// their root node themselves).
	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>>;

	/// Notification fired by `set_input` with the previous and incoming
	/// value, before the new input is stored. Never fired when both values
	/// are empty.
	fn input_changed(&mut self, previous: &Value, current: &Value) {
		let _ = (previous, current);
	}

	/// Notification fired when the component's subtree enters the live
	/// tree. At most once per actual mount transition.
	fn was_mounted(&mut self) {}

	/// Notification fired when the component's subtree leaves the live
	/// tree. At most once per actual unmount transition.
	fn was_unmounted(&mut self) {}
}

/// Input equality strategy, selected per component definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPolicy {
	/// Every `set_input` call dirties the component.
	#[default]
	AlwaysDirty,
	/// Object-shaped inputs are compared field by field; an unchanged input
	/// is a no-op. Non-object inputs are a usage error.
	ShallowFields,
}

/// Where a component currently sits relative to the live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountState {
	/// Not attached anywhere.
	#[default]
	NotMounted,
	/// Attached because a parent component's render adopted its subtree.
	MountedUnderComponent,
	/// Attached by an explicit `mount_under` call.
	MountedDirectly,
}
