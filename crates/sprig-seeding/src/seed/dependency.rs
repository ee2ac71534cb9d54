//! Seed identities.

use std::fmt;

use serde_json::Value;

use crate::model::ModelIdentity;

/// A `(model, sprig_id)` pair identifying one entry of a run.
///
/// Used as the node key of the planting graph and as the key of the
/// [`RecordStore`](super::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
	model: String,
	sprig_id: String,
}

impl Dependency {
	/// Creates an identity from a model and a symbolic id.
	///
	/// The model may be given by name or by backend. Surrounding whitespace
	/// and a leading `::` are stripped so that `::Author` and `Author` agree.
	///
	/// # Examples
	///
	/// ```
	/// use sprig_seeding::seed::Dependency;
	///
	/// let dependency = Dependency::new("::Author", 42);
	/// assert_eq!(dependency.model(), "Author");
	/// assert_eq!(dependency.sprig_id(), "42");
	/// assert_eq!(dependency.to_string(), "Author(42)");
	/// ```
	pub fn new<M: ModelIdentity + ?Sized>(model: &M, sprig_id: impl ToString) -> Self {
		let model = model.identity().trim();
		Self {
			model: model.strip_prefix("::").unwrap_or(model).to_string(),
			sprig_id: sprig_id.to_string(),
		}
	}

	/// Creates an identity from a raw id value, such as a `sprig_id` field.
	pub fn from_value<M: ModelIdentity + ?Sized>(model: &M, sprig_id: &Value) -> Self {
		Self::new(model, canonical_id(sprig_id))
	}

	/// Returns the model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Returns the symbolic id.
	pub fn sprig_id(&self) -> &str {
		&self.sprig_id
	}
}

impl fmt::Display for Dependency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", self.model, self.sprig_id)
	}
}

/// Canonical string form of a symbolic id.
///
/// Strings are taken as-is, so `"7"` and `7` name the same entry.
pub fn canonical_id(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
