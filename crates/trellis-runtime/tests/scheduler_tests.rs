//! Integration tests for the dirty-set scheduler: batching boundaries,
//! forced digests with cancellation, mid-pass dirtying, and error
//! propagation out of a digest.

use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;
use trellis_dom::memory::MemoryDom;
use trellis_dom::{NativeNode, NodeHandle};
use trellis_runtime::{
	BatchMode, Component, Instance, Props, RenderScope, Result, Runtime, RuntimeConfig,
	RuntimeError,
};

fn setup() -> (Runtime, Rc<MemoryDom>) {
	let dom = Rc::new(MemoryDom::new());
	let runtime = Runtime::new(dom.clone(), dom.clone());
	(runtime, dom)
}

#[derive(Default)]
struct Label {
	renders: Rc<Cell<usize>>,
}

impl Component for Label {
	fn name() -> &'static str {
		"Label"
	}

	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>> {
		self.renders.set(self.renders.get() + 1);
		let text = ctx
			.input()
			.get("text")
			.and_then(Value::as_str)
			.unwrap_or("")
			.to_string();
		Ok(Some(ctx.element("span", Props::new(), [text.into()])?))
	}
}

fn mounted_label(runtime: &Runtime, dom: &MemoryDom) -> (Instance<Label>, Rc<Cell<usize>>) {
	let renders = Rc::new(Cell::new(0));
	let label = Instance::with(
		runtime,
		Label {
			renders: renders.clone(),
		},
	);
	label.mount_under(&dom.root()).unwrap();
	(label, renders)
}

#[test]
fn test_microtask_batching_coalesces_within_one_turn() {
	let (runtime, dom) = setup();
	let (label, renders) = mounted_label(&runtime, &dom);
	assert_eq!(renders.get(), 1);

	label.set_input(json!({ "text": "one" })).unwrap();
	label.set_input(json!({ "text": "two" })).unwrap();
	assert_eq!(dom.pending_microtasks(), 1);
	assert_eq!(renders.get(), 1);

	dom.run_microtasks();

	// Both input changes collapsed into a single re-render.
	assert_eq!(renders.get(), 2);
	let root = dom.root().child_at(0).unwrap();
	assert_eq!(root.child_at(0).unwrap().text().as_deref(), Some("two"));
}

#[test]
fn test_forced_digest_cancels_pending_callback() {
	let (runtime, dom) = setup();
	let (label, renders) = mounted_label(&runtime, &dom);

	label.set_input(json!({ "text": "now" })).unwrap();
	assert_eq!(dom.pending_microtasks(), 1);

	runtime.digest().unwrap();
	assert_eq!(renders.get(), 2);

	// The still-queued callback was cancelled; it must not digest again.
	dom.run_microtasks();
	assert_eq!(renders.get(), 2);
}

#[test]
fn test_frame_batching_waits_for_the_next_frame() {
	let dom = Rc::new(MemoryDom::new());
	let runtime = Runtime::with_config(
		dom.clone(),
		dom.clone(),
		RuntimeConfig {
			batching: BatchMode::Frame,
			..RuntimeConfig::default()
		},
	);
	let (label, renders) = mounted_label(&runtime, &dom);

	label.set_input(json!({ "text": "framed" })).unwrap();
	assert_eq!(dom.pending_frames(), 1);
	assert_eq!(dom.pending_microtasks(), 0);
	assert_eq!(renders.get(), 1);

	dom.run_frame();
	assert_eq!(renders.get(), 2);
}

/// Dirties another component from inside its own render.
#[derive(Default)]
struct Chain {
	target: Option<Instance<Label>>,
}

impl Component for Chain {
	fn name() -> &'static str {
		"Chain"
	}

	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>> {
		if let Some(target) = &self.target {
			target.set_input(json!({ "text": "from-chain" }))?;
		}
		Ok(Some(ctx.element("div", Props::new(), [])?))
	}
}

#[test]
fn test_component_dirtied_mid_pass_renders_in_the_same_pass() {
	let (runtime, dom) = setup();
	let (label, renders) = mounted_label(&runtime, &dom);

	let chain = Instance::with(
		&runtime,
		Chain {
			target: Some(label.clone()),
		},
	);
	// The chain's first render dirties the label; settle everything.
	chain.mount_under(&dom.root()).unwrap();
	runtime.digest().unwrap();
	assert_eq!(renders.get(), 2);
	assert!(!label.is_dirty());

	chain.set_dirty();
	runtime.digest().unwrap();

	// The label became dirty during the chain's render and was still
	// processed before the digest returned.
	assert_eq!(renders.get(), 3);
	assert!(!label.is_dirty());
	let label_root = dom.root().child_at(0).unwrap();
	assert_eq!(
		label_root.child_at(0).unwrap().text().as_deref(),
		Some("from-chain")
	);
}

/// Fails on demand: an input of `"break"` makes the render return an error.
#[derive(Default)]
struct Flaky {
	renders: Rc<Cell<usize>>,
}

impl Component for Flaky {
	fn name() -> &'static str {
		"Flaky"
	}

	fn render(&mut self, ctx: &mut RenderScope<'_>) -> Result<Option<NodeHandle>> {
		self.renders.set(self.renders.get() + 1);
		if ctx.input().as_str() == Some("break") {
			return Err(RuntimeError::MissingRoot { component: "Flaky" });
		}
		Ok(Some(ctx.element("div", Props::new(), [])?))
	}
}

#[test]
fn test_render_error_aborts_digest_and_is_not_retried() {
	let (runtime, dom) = setup();
	let renders = Rc::new(Cell::new(0));
	let flaky = Instance::with(
		&runtime,
		Flaky {
			renders: renders.clone(),
		},
	);
	flaky.mount_under(&dom.root()).unwrap();
	assert_eq!(renders.get(), 1);

	flaky.set_input(json!("break")).unwrap();
	let err = runtime.digest().unwrap_err();
	assert!(matches!(err, RuntimeError::MissingRoot { .. }));
	assert_eq!(renders.get(), 2);
	assert!(flaky.is_dirty());

	// The dirty set was cleared: nothing renders until someone pulls again.
	dom.run_microtasks();
	assert_eq!(renders.get(), 2);

	// A later pull retries and succeeds once the input is sane again.
	flaky.set_input(json!("ok")).unwrap();
	flaky.element().unwrap();
	assert_eq!(renders.get(), 3);
	assert!(!flaky.is_dirty());
}

#[test]
fn test_deferred_digest_surfaces_errors_to_the_ambient_channel() {
	let (runtime, dom) = setup();
	let flaky = Instance::<Flaky>::new(&runtime);
	flaky.mount_under(&dom.root()).unwrap();

	flaky.set_input(json!("break")).unwrap();
	// The scheduled callback runs the digest, which fails; the error is
	// logged, not thrown into the task queue.
	dom.run_microtasks();
	assert!(flaky.is_dirty());

	// The failed pass does not poison later batches of other components.
	let (other, other_renders) = mounted_label(&runtime, &dom);
	other.set_input(json!({ "text": "later" })).unwrap();
	dom.run_microtasks();
	assert_eq!(other_renders.get(), 2);
	assert!(!other.is_dirty());
}

#[test]
fn test_detached_dirty_component_still_renders_in_digest() {
	let (runtime, dom) = setup();
	let renders = Rc::new(Cell::new(0));
	let label = Instance::with(
		&runtime,
		Label {
			renders: renders.clone(),
		},
	);

	// Render once without mounting anywhere.
	label.element().unwrap();
	assert_eq!(renders.get(), 1);

	// A detached component is still rendered and cleaned by the digest;
	// its output is simply not attached to anything.
	label.set_input(json!({ "text": "offscreen" })).unwrap();
	dom.run_microtasks();
	assert_eq!(renders.get(), 2);
	assert!(!label.is_dirty());
	assert_eq!(dom.root().child_count(), 0);
}

#[test]
fn test_digest_with_empty_dirty_set_is_a_no_op() {
	let (runtime, dom) = setup();
	runtime.digest().unwrap();

	let (_label, renders) = mounted_label(&runtime, &dom);
	runtime.digest().unwrap();
	assert_eq!(renders.get(), 1);
}
