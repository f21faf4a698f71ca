//! # Trellis runtime
//!
//! A minimal UI component runtime: components declare a render function
//! producing a tree of native nodes and nested components, and the runtime
//! keeps a live tree synchronized with each component's latest declared
//! output.
//!
//! The engine is the reconciliation and scheduling core:
//!
//! - [`Instance`]: the per-component lifecycle and dirty-state machine
//! - the dirty-set scheduler batching re-renders behind a microtask or
//!   frame boundary ([`RuntimeConfig`])
//! - [`RenderScope`]: the per-pass reconciliation context matching newly
//!   declared nodes and components against the previous pass, by key then
//!   by type
//! - the attribute differ applying minimal mutations to reused nodes
//! - the child-list mutator applying ordered child sequences with
//!   mount/unmount notifications
//!
//! Rendering is lazy and pull-based: [`Instance::element`] is the sole
//! trigger, reached directly, through [`Instance::mount_under`], or through
//! a scheduled digest.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use trellis_dom::memory::MemoryDom;
//! use trellis_dom::{NativeNode, NodeHandle};
//! use trellis_runtime::{json, Component, Instance, Props, RenderScope, Result, Runtime};
//!
//! #[derive(Default)]
//! struct Counter;
//!
//! impl Component for Counter {
//! 	fn name() -> &'static str {
//! 		"Counter"
//! 	}
//!
//! 	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>> {
//! 		let count = ctx.input().get("count").and_then(|v| v.as_i64()).unwrap_or(0);
//! 		let root = ctx.element("div", Props::new(), [format!("count: {count}").into()])?;
//! 		Ok(Some(root))
//! 	}
//! }
//!
//! fn main() -> Result<()> {
//! 	let dom = Rc::new(MemoryDom::new());
//! 	let runtime = Runtime::new(dom.clone(), dom.clone());
//!
//! 	let counter = Instance::<Counter>::new(&runtime);
//! 	counter.set_input(json!({ "count": 1 }))?;
//! 	counter.mount_under(&dom.root())?;
//!
//! 	counter.set_input(json!({ "count": 2 }))?;
//! 	runtime.digest()?;
//!
//! 	let root = dom.root().child_at(0).expect("mounted root");
//! 	let text = root.child_at(0).expect("text child");
//! 	assert_eq!(text.text().as_deref(), Some("count: 2"));
//! 	Ok(())
//! }
//! ```
//!
//! The runtime drives its native tree through the interfaces in
//! [`trellis_dom`]; nothing here assumes a browser, a terminal, or any
//! particular toolkit.

#![warn(missing_docs)]

mod attrs;
mod children;
mod component;
mod error;
mod instance;
mod props;
mod render;
mod runtime;
mod scheduler;

pub use children::{Child, ComponentChild};
pub use component::{Component, InputPolicy, MountState};
pub use error::{Result, RuntimeError};
pub use instance::Instance;
pub use props::{PropValue, Props, CHILDREN_PROP, KEY_PROP};
pub use render::RenderScope;
pub use runtime::{BatchMode, Runtime, RuntimeConfig};

// The dynamic value currency of inputs and attribute data.
pub use serde_json::{json, Value};

/// Convenience re-exports for application code.
pub mod prelude {
	pub use crate::{
		json, BatchMode, Child, Component, InputPolicy, Instance, MountState, PropValue, Props,
		RenderScope, Result, Runtime, RuntimeConfig, RuntimeError, Value,
	};
	pub use trellis_dom::{NativeDocument, NativeNode, NodeHandle};
}
