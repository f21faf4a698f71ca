//! Error types for the Trellis runtime.

use thiserror::Error;

/// Fatal runtime errors.
///
/// Usage errors and reconciliation invariant violations both propagate
/// synchronously out of the triggering call; the runtime never catches or
/// retries them. A component whose render failed stays dirty and will not
/// self-heal — it must be dirtied again to retry.
#[derive(Debug, Error)]
pub enum RuntimeError {
	/// `mount_under` was called on a component that is already mounted.
	#[error("component `{component}` is already mounted")]
	AlreadyMounted {
		/// Name of the offending component.
		component: &'static str,
	},

	/// `unmount` was called on a component that is not directly mounted.
	#[error("component `{component}` is not mounted directly; unmount() pairs with mount_under()")]
	NotMountedDirectly {
		/// Name of the offending component.
		component: &'static str,
	},

	/// A render returned a root node different from the one the component
	/// already owns. A component's root keeps its type for the component's
	/// whole lifetime.
	#[error(
		"component `{component}` changed its root from <{previous}> to <{requested}>; \
		 a root node must keep its type across renders — assign a key if the shape must change"
	)]
	RootReplaced {
		/// Name of the offending component.
		component: &'static str,
		/// Tag of the root rendered previously.
		previous: String,
		/// Tag of the root the render just returned.
		requested: String,
	},

	/// A key previously recorded for one element tag was requested with a
	/// different tag. Reusing the node would corrupt its attribute state.
	#[error("key `{key}` maps to a <{previous}> element but the render now requests <{requested}>")]
	KeyedTagMismatch {
		/// The reused key.
		key: String,
		/// Tag recorded for the key in the previous pass.
		previous: String,
		/// Tag requested in the current pass.
		requested: String,
	},

	/// A key previously recorded for one component type was requested with
	/// a different concrete type.
	#[error("key `{key}` maps to a `{previous}` component but the render now requests `{requested}`")]
	KeyedComponentMismatch {
		/// The reused key.
		key: String,
		/// Component type recorded for the key in the previous pass.
		previous: &'static str,
		/// Component type requested in the current pass.
		requested: &'static str,
	},

	/// A component with shallow-field input comparison received a
	/// non-object input.
	#[error(
		"component `{component}` compares input fields shallowly and requires an \
		 object-shaped input, got {found}"
	)]
	NonObjectInput {
		/// Name of the offending component.
		component: &'static str,
		/// JSON type of the rejected input.
		found: &'static str,
	},

	/// A render produced no root node and none exists from an earlier pass.
	#[error("component `{component}` produced no root node")]
	MissingRoot {
		/// Name of the offending component.
		component: &'static str,
	},
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
