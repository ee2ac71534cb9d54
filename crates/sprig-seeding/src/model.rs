//! Model records and the persistence capability seeds are planted through.
//!
//! The engine never talks to a database directly. Each seedable model is
//! represented by a [`ModelBackend`] that can look up, delete and save
//! [`SeedRecord`]s. Backends are registered by model name in a
//! [`ModelRegistry`] once, at configuration time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SeedingError, SeedingResult};

/// Field name that addresses a record's primary key.
pub const PRIMARY_KEY: &str = "id";

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
	/// Creates an empty error set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a message for a field.
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.0.entry(field.into()).or_default().push(message.into());
	}

	/// Returns the messages recorded for a field.
	pub fn get(&self, field: &str) -> Option<&[String]> {
		self.0.get(field).map(Vec::as_slice)
	}

	/// Returns true if no messages were recorded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the number of fields with messages.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Removes all messages.
	pub fn clear(&mut self) {
		self.0.clear();
	}

	/// Iterates over `(field, messages)` pairs in field order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0
			.iter()
			.map(|(field, messages)| (field.as_str(), messages.as_slice()))
	}
}

impl fmt::Display for FieldErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let lines: Vec<String> = self
			.iter()
			.map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
			.collect();
		write!(f, "{}", lines.join("\n"))
	}
}

/// A model instance, either in memory or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
	/// Model name (e.g., "Author").
	pub model: String,

	/// Primary key, assigned by the backend on save.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pk: Option<Value>,

	/// Field values.
	pub fields: Map<String, Value>,

	/// Validation messages from the last save attempt.
	#[serde(skip)]
	pub errors: FieldErrors,
}

impl SeedRecord {
	/// Creates a new, unsaved record.
	pub fn new(model: impl Into<String>, fields: Map<String, Value>) -> Self {
		Self {
			model: model.into(),
			pk: None,
			fields,
			errors: FieldErrors::new(),
		}
	}

	/// Creates a record that already has a primary key.
	pub fn with_pk(model: impl Into<String>, pk: Value, fields: Map<String, Value>) -> Self {
		Self {
			pk: Some(pk),
			..Self::new(model, fields)
		}
	}

	/// Returns the primary key, if the record has been persisted.
	pub fn id(&self) -> Option<&Value> {
		self.pk.as_ref()
	}

	/// Returns true once the backend has assigned a primary key.
	pub fn is_persisted(&self) -> bool {
		self.pk.is_some()
	}

	/// Reads a field. `id` resolves to the primary key when one is set.
	pub fn get(&self, name: &str) -> Option<&Value> {
		match (name, &self.pk) {
			(PRIMARY_KEY, Some(pk)) => Some(pk),
			_ => self.fields.get(name),
		}
	}

	/// Assigns a single field.
	pub fn assign(&mut self, name: impl Into<String>, value: Value) {
		self.fields.insert(name.into(), value);
	}

	/// Assigns every field of `attributes`, overwriting existing values.
	pub fn assign_all(&mut self, attributes: &Map<String, Value>) {
		for (name, value) in attributes {
			self.assign(name.clone(), value.clone());
		}
	}

	/// Returns true if every condition equals the record's field value.
	pub fn matches(&self, conditions: &Map<String, Value>) -> bool {
		conditions
			.iter()
			.all(|(name, expected)| self.get(name) == Some(expected))
	}
}

/// Persistence capability for one model.
///
/// Implement this for each model that should be seedable. The engine only
/// needs lookup, conditional delete and save; field assignment happens on
/// [`SeedRecord`] itself.
#[async_trait]
pub trait ModelBackend: Send + Sync {
	/// Returns the model name (e.g., "Author").
	fn model_name(&self) -> &str;

	/// Builds a new in-memory record from resolved attributes.
	fn build(&self, attributes: &Map<String, Value>) -> SeedRecord {
		SeedRecord::new(self.model_name(), attributes.clone())
	}

	/// Returns the first existing row matching all conditions.
	async fn find_by(&self, conditions: &Map<String, Value>) -> SeedingResult<Option<SeedRecord>>;

	/// Deletes every existing row matching all conditions.
	///
	/// Returns the number of deleted rows.
	async fn delete_by(&self, conditions: &Map<String, Value>) -> SeedingResult<u64>;

	/// Inserts or updates a record.
	///
	/// Returns `Ok(false)` when the record is rejected by validation, with
	/// the reasons left in [`SeedRecord::errors`]. `Err` is reserved for
	/// backend failures.
	async fn save(&self, record: &mut SeedRecord) -> SeedingResult<bool>;
}

/// Anything that names a model: a model token or a backend itself.
pub trait ModelIdentity {
	/// Returns the model name this value refers to.
	fn identity(&self) -> &str;
}

impl ModelIdentity for str {
	fn identity(&self) -> &str {
		self
	}
}

impl ModelIdentity for String {
	fn identity(&self) -> &str {
		self
	}
}

impl ModelIdentity for dyn ModelBackend {
	fn identity(&self) -> &str {
		self.model_name()
	}
}

impl ModelIdentity for Arc<dyn ModelBackend> {
	fn identity(&self) -> &str {
		self.model_name()
	}
}

impl<T: ModelIdentity + ?Sized> ModelIdentity for &T {
	fn identity(&self) -> &str {
		(**self).identity()
	}
}

/// Registry mapping model names to their backends.
///
/// Model tokens found in directives and computed expressions are resolved
/// through this registry, so every model must be registered before a run.
#[derive(Default)]
pub struct ModelRegistry {
	backends: RwLock<HashMap<String, Arc<dyn ModelBackend>>>,
}

impl ModelRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a backend under its model name, replacing any previous one.
	///
	/// # Example
	///
	/// ```
	/// # use sprig_seeding::model::ModelRegistry;
	/// # use sprig_seeding::memory::InMemoryBackend;
	/// let registry = ModelRegistry::new();
	/// registry.register(InMemoryBackend::new("Author"));
	/// assert!(registry.has_backend("Author"));
	/// ```
	pub fn register<B: ModelBackend + 'static>(&self, backend: B) -> Arc<dyn ModelBackend> {
		let backend: Arc<dyn ModelBackend> = Arc::new(backend);
		self.register_arc(Arc::clone(&backend));
		backend
	}

	/// Registers an already shared backend.
	pub fn register_arc(&self, backend: Arc<dyn ModelBackend>) {
		let model_name = backend.model_name().to_string();
		self.backends.write().insert(model_name, backend);
	}

	/// Gets the backend for a model.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::ModelNotFound`] if nothing is registered.
	pub fn get<M: ModelIdentity + ?Sized>(&self, model: &M) -> SeedingResult<Arc<dyn ModelBackend>> {
		let name = model.identity();
		self.backends
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| SeedingError::ModelNotFound(name.to_string()))
	}

	/// Checks if a backend is registered for the model.
	pub fn has_backend(&self, model_name: &str) -> bool {
		self.backends.read().contains_key(model_name)
	}

	/// Returns all registered model names, sorted.
	pub fn model_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.backends.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Returns the number of registered backends.
	pub fn len(&self) -> usize {
		self.backends.read().len()
	}

	/// Returns true if no backends are registered.
	pub fn is_empty(&self) -> bool {
		self.backends.read().is_empty()
	}

	/// Removes all registered backends.
	pub fn clear(&self) {
		self.backends.write().clear();
	}
}

impl fmt::Debug for ModelRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelRegistry")
			.field("models", &self.model_names())
			.finish()
	}
}
