//! The attribute differ.
//!
//! Computes and applies the minimal set of attribute/property mutations on
//! a reused or freshly created node: entries gone from the new map are
//! cleared, changed entries are re-applied, unchanged entries are left
//! alone. The map applied by the previous pass lives in the node's
//! side-record ([`NodeMeta`](crate::runtime::NodeMeta)), so the differ works
//! against history the platform itself knows nothing about.

use crate::props::{PropValue, Props, CHILDREN_PROP, KEY_PROP};
use crate::runtime::Runtime;
use serde_json::Value;
use trellis_dom::{NativeNode, NodeHandle};

/// Diffs `next` against the node's recorded attribute map and applies the
/// difference, then records `next` as the new history.
pub(crate) fn apply_attributes(runtime: &Runtime, node: &NodeHandle, next: &Props) {
	let previous = runtime.take_recorded_attrs(node.id());

	if let Some(previous) = &previous {
		for (name, value) in previous.entries() {
			if is_reserved(name) || is_present(next, name) {
				continue;
			}
			clear_one(node, name, value);
		}
	}

	for (name, value) in next.entries() {
		if is_reserved(name) || is_omitted(value) {
			continue;
		}
		if let Some(prev) = previous.as_ref().and_then(|p| p.get(name)) {
			if prev == value {
				continue;
			}
			// A property that switched shape (handler <-> data <-> style)
			// must release its old slot before the new one is applied.
			if std::mem::discriminant(prev) != std::mem::discriminant(value) {
				clear_one(node, name, prev);
			}
		}
		apply_one(node, name, value);
	}

	runtime.record_attrs(node.id(), next.clone());
}

/// `key` and `children` are resolved structurally, never applied.
fn is_reserved(name: &str) -> bool {
	name == KEY_PROP || name == CHILDREN_PROP
}

/// A `Null` data value is equivalent to omission: it clears rather than
/// sets.
fn is_omitted(value: &PropValue) -> bool {
	matches!(value, PropValue::Data(Value::Null))
}

fn is_present(props: &Props, name: &str) -> bool {
	props.get(name).is_some_and(|value| !is_omitted(value))
}

fn clear_one(node: &NodeHandle, name: &str, previous: &PropValue) {
	match previous {
		PropValue::Handler(_) => node.set_handler(&name.to_ascii_lowercase(), None),
		PropValue::Style(_) => node.clear_inline_styles(),
		PropValue::Data(_) => {
			if name.starts_with("data-") {
				// Namespaced data attributes have no platform default; they
				// are removed outright.
				node.remove_attribute(name);
			} else {
				node.clear_attribute(name);
			}
		}
	}
}

fn apply_one(node: &NodeHandle, name: &str, value: &PropValue) {
	match value {
		// Handler-shaped names are matched case-insensitively against the
		// native handler slots (`onClick` -> `onclick`).
		PropValue::Handler(handler) => {
			node.set_handler(&name.to_ascii_lowercase(), Some(handler.clone()));
		}
		PropValue::Style(entries) => {
			node.clear_inline_styles();
			for (property, style_value) in entries {
				node.set_style_property(property, style_value);
			}
		}
		PropValue::Data(data) => {
			node.set_attribute(name, &data_to_string(data));
		}
	}
}

fn data_to_string(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::rc::Rc;
	use trellis_dom::memory::MemoryDom;
	use trellis_dom::NativeDocument;

	fn runtime_and_node() -> (Runtime, NodeHandle) {
		let dom = Rc::new(MemoryDom::new());
		let runtime = Runtime::new(dom.clone(), dom.clone());
		let node = dom.create_element("div");
		(runtime, node)
	}

	#[test]
	fn test_initial_application_sets_everything() {
		let (runtime, node) = runtime_and_node();
		let props = Props::new()
			.attr("class", "box")
			.attr("data-count", 3i64)
			.style_prop("width", "10px");
		apply_attributes(&runtime, &node, &props);

		assert_eq!(node.get_attribute("class").as_deref(), Some("box"));
		assert_eq!(node.get_attribute("data-count").as_deref(), Some("3"));
		assert_eq!(node.style_property("width").as_deref(), Some("10px"));
	}

	#[test]
	fn test_removed_attribute_is_cleared() {
		let (runtime, node) = runtime_and_node();
		apply_attributes(&runtime, &node, &Props::new().attr("data-foo", "bar"));
		assert!(node.has_attribute("data-foo"));

		apply_attributes(&runtime, &node, &Props::new());
		assert!(!node.has_attribute("data-foo"));
	}

	#[test]
	fn test_null_value_clears_like_omission() {
		let (runtime, node) = runtime_and_node();
		apply_attributes(&runtime, &node, &Props::new().attr("title", "t"));
		apply_attributes(&runtime, &node, &Props::new().attr("title", json!(null)));
		assert!(!node.has_attribute("title"));
	}

	#[test]
	fn test_key_is_never_applied() {
		let (runtime, node) = runtime_and_node();
		apply_attributes(&runtime, &node, &Props::new().key("k").attr("id", "x"));
		assert!(!node.has_attribute("key"));
		assert!(node.has_attribute("id"));
	}

	#[test]
	fn test_style_map_replacement_clears_stale_properties() {
		let (runtime, node) = runtime_and_node();
		apply_attributes(
			&runtime,
			&node,
			&Props::new().style_prop("color", "red").style_prop("width", "1px"),
		);
		apply_attributes(&runtime, &node, &Props::new().style_prop("color", "blue"));

		assert_eq!(node.style_property("color").as_deref(), Some("blue"));
		assert!(node.style_property("width").is_none());
	}

	#[test]
	fn test_handlers_install_case_insensitively() {
		let (runtime, node) = runtime_and_node();
		let handler: trellis_dom::EventHandler = Rc::new(|| {});
		let mut props = Props::new();
		props.set("onClick".to_string(), PropValue::Handler(handler));
		apply_attributes(&runtime, &node, &props);
		assert!(node.has_handler("onclick"));

		apply_attributes(&runtime, &node, &Props::new());
		assert!(!node.has_handler("onclick"));
	}

	#[test]
	fn test_unchanged_values_are_not_reapplied() {
		let (runtime, node) = runtime_and_node();
		apply_attributes(&runtime, &node, &Props::new().attr("class", "a"));
		// Mutate behind the differ's back; an unchanged diff must not
		// touch the attribute again.
		node.set_attribute("class", "externally-changed");
		apply_attributes(&runtime, &node, &Props::new().attr("class", "a"));
		assert_eq!(
			node.get_attribute("class").as_deref(),
			Some("externally-changed")
		);
	}
}
