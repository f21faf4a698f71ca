//! # Trellis
//!
//! A minimal UI component runtime. Components declare a render function
//! that produces a tree of native nodes and nested components; the runtime
//! keeps a live tree synchronized with each component's latest declared
//! output, reusing state and native nodes across renders.
//!
//! This facade crate re-exports the workspace members:
//!
//! - [`runtime`] — the reconciliation and scheduling engine: the component
//!   lifecycle state machine, the batched dirty-set scheduler, the keyed
//!   reconciliation context, the attribute differ and the child-list
//!   mutator.
//! - [`dom`] — the platform boundary: the native-tree interface the engine
//!   drives, plus an in-memory reference platform for tests and native
//!   embedding.
//!
//! ## Quick start
//!
//! ```
//! use std::rc::Rc;
//! use trellis::dom::memory::MemoryDom;
//! use trellis::dom::{NativeNode, NodeHandle};
//! use trellis::{json, Component, Instance, Props, RenderScope, Result, Runtime};
//!
//! #[derive(Default)]
//! struct Hello;
//!
//! impl Component for Hello {
//! 	fn name() -> &'static str {
//! 		"Hello"
//! 	}
//!
//! 	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>> {
//! 		let who = ctx
//! 			.input()
//! 			.get("who")
//! 			.and_then(|v| v.as_str())
//! 			.unwrap_or("world")
//! 			.to_string();
//! 		Ok(Some(ctx.element("div", Props::new(), [format!("hello, {who}").into()])?))
//! 	}
//! }
//!
//! fn main() -> Result<()> {
//! 	let dom = Rc::new(MemoryDom::new());
//! 	let runtime = Runtime::new(dom.clone(), dom.clone());
//!
//! 	let hello = Instance::<Hello>::new(&runtime);
//! 	hello.set_input(json!({ "who": "trellis" }))?;
//! 	hello.mount_under(&dom.root())?;
//!
//! 	let text = dom.root().child_at(0).and_then(|root| root.child_at(0));
//! 	assert_eq!(text.unwrap().text().as_deref(), Some("hello, trellis"));
//! 	Ok(())
//! }
//! ```

pub use trellis_dom as dom;
pub use trellis_runtime as runtime;

pub use trellis_runtime::{
	json, BatchMode, Child, Component, InputPolicy, Instance, MountState, PropValue, Props,
	RenderScope, Result, Runtime, RuntimeConfig, RuntimeError, Value,
};
