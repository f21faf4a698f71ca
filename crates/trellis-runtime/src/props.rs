//! Dynamic property maps for elements and component inputs.
//!
//! Attribute values and component inputs are dynamic data
//! ([`serde_json::Value`]); event handlers and structured style maps, which
//! have no JSON representation, ride alongside in [`PropValue`]. `Props`
//! preserves declaration order so attribute application stays deterministic.

use serde_json::Value;
use std::rc::Rc;
use trellis_dom::EventHandler;

/// Reserved property resolved by the renderer, never applied as an
/// attribute.
pub const KEY_PROP: &str = "key";

/// Reserved property name; children are passed structurally, never as an
/// attribute.
pub const CHILDREN_PROP: &str = "children";

/// One property value.
#[derive(Clone)]
pub enum PropValue {
	/// Plain data: strings, numbers, booleans, `Null` (≡ omitted).
	Data(Value),
	/// A structured inline-style map, applied property by property.
	Style(Vec<(String, String)>),
	/// An event handler for a native handler slot.
	Handler(EventHandler),
}

impl PartialEq for PropValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Data(a), Self::Data(b)) => a == b,
			(Self::Style(a), Self::Style(b)) => a == b,
			// Handlers compare by identity: a stable callback is "the same
			// value" across renders, a fresh closure is not.
			(Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl std::fmt::Debug for PropValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
			Self::Style(entries) => f.debug_tuple("Style").field(entries).finish(),
			Self::Handler(_) => f.write_str("Handler(..)"),
		}
	}
}

impl From<Value> for PropValue {
	fn from(value: Value) -> Self {
		Self::Data(value)
	}
}

impl From<&str> for PropValue {
	fn from(value: &str) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<String> for PropValue {
	fn from(value: String) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<i64> for PropValue {
	fn from(value: i64) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<f64> for PropValue {
	fn from(value: f64) -> Self {
		Self::Data(Value::from(value))
	}
}

/// Ordered property map for a native element.
///
/// Built in the declaration style of the compiled-template boundary:
///
/// ```
/// use trellis_runtime::Props;
///
/// let props = Props::new()
/// 	.key("row-3")
/// 	.attr("class", "row")
/// 	.style_prop("width", "40px")
/// 	.on("click", || {});
/// assert_eq!(props.resolve_key().as_deref(), Some("row-3"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
	entries: Vec<(String, PropValue)>,
}

impl Props {
	/// Creates an empty property map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a data-valued attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		self.set(name.into(), value.into());
		self
	}

	/// Sets the reserved reconciliation key.
	pub fn key(self, key: impl Into<String>) -> Self {
		self.attr(KEY_PROP, key.into())
	}

	/// Adds one property to the structured `style` map.
	pub fn style_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let (name, value) = (name.into(), value.into());
		if let Some(PropValue::Style(entries)) = self.entry_mut("style") {
			entries.push((name, value));
			return self;
		}
		self.set("style".to_string(), PropValue::Style(vec![(name, value)]));
		self
	}

	/// Installs an event handler under its `on`-prefixed slot name.
	pub fn on(mut self, event: impl Into<String>, handler: impl Fn() + 'static) -> Self {
		let name = format!("on{}", event.into());
		self.set(name, PropValue::Handler(Rc::new(handler)));
		self
	}

	/// Installs an already-shared event handler.
	pub fn handler(mut self, event: impl Into<String>, handler: EventHandler) -> Self {
		let name = format!("on{}", event.into());
		self.set(name, PropValue::Handler(handler));
		self
	}

	/// Sets or replaces an entry, preserving first-declaration order.
	pub fn set(&mut self, name: String, value: PropValue) {
		if let Some(existing) = self.entry_mut(&name) {
			*existing = value;
			return;
		}
		self.entries.push((name, value));
	}

	/// Looks up an entry by name.
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.entries
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v)
	}

	/// Iterates entries in declaration order.
	pub fn entries(&self) -> impl Iterator<Item = &(String, PropValue)> {
		self.entries.iter()
	}

	/// Whether the map has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Resolves the reserved `key` entry, if present and string-valued.
	pub fn resolve_key(&self) -> Option<String> {
		match self.get(KEY_PROP)? {
			PropValue::Data(Value::String(key)) => Some(key.clone()),
			_ => None,
		}
	}

	fn entry_mut(&mut self, name: &str) -> Option<&mut PropValue> {
		self.entries
			.iter_mut()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v)
	}
}

/// Resolves the reserved `key` field of an object-shaped component input.
pub(crate) fn input_key(input: &Value) -> Option<String> {
	input
		.as_object()?
		.get(KEY_PROP)
		.and_then(Value::as_str)
		.map(str::to_string)
}

/// Shallow field comparison over two object-shaped inputs: same field set,
/// each field equal by value.
pub(crate) fn shallow_fields_eq(previous: &Value, next: &Value) -> bool {
	match (previous.as_object(), next.as_object()) {
		(Some(previous), Some(next)) => {
			previous.len() == next.len()
				&& next
					.iter()
					.all(|(name, value)| previous.get(name) == Some(value))
		}
		_ => false,
	}
}

/// JSON type name, for diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
