//! Entries: one record to be planted.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::dependency::canonical_id;
use super::{Dependency, EntryFactory, RawRecord, RecordStore, SeedOptions};
use crate::error::{SeedingError, SeedingResult};
use crate::expression::{self, EvalContext};
use crate::model::{FieldErrors, ModelBackend, SeedRecord};

/// Field holding an entry's symbolic id in raw records.
pub const SPRIG_ID: &str = "sprig_id";

/// One record to be created or updated.
///
/// Dependencies and resolved attributes are computed on first use and
/// memoized. The backing record is built (or fetched, with
/// `find_existing_by`) on first use as well.
pub struct Entry {
	factory: Arc<EntryFactory>,
	sprig_id: String,
	attributes: RawRecord,
	dependencies: OnceCell<IndexSet<Dependency>>,
	resolved: OnceCell<RawRecord>,
	record: Option<SeedRecord>,
}

impl Entry {
	/// Creates an entry, taking the `sprig_id` field out of `attributes`.
	///
	/// Records without a `sprig_id` get a random UUID.
	pub fn new(factory: Arc<EntryFactory>, mut attributes: RawRecord) -> Self {
		let sprig_id = match attributes.remove(SPRIG_ID) {
			Some(id) => canonical_id(&id),
			None => Uuid::new_v4().to_string(),
		};
		Self {
			factory,
			sprig_id,
			attributes,
			dependencies: OnceCell::new(),
			resolved: OnceCell::new(),
			record: None,
		}
	}

	/// Returns the factory that created this entry.
	pub fn factory(&self) -> &Arc<EntryFactory> {
		&self.factory
	}

	/// Returns the target model backend.
	pub fn model(&self) -> &Arc<dyn ModelBackend> {
		self.factory.model()
	}

	/// Returns the target model name.
	pub fn model_name(&self) -> &str {
		self.factory.model().model_name()
	}

	/// Returns the merged options of the entry's factory.
	pub fn options(&self) -> &SeedOptions {
		self.factory.options()
	}

	/// Returns the symbolic id.
	pub fn sprig_id(&self) -> &str {
		&self.sprig_id
	}

	/// Returns the raw attributes, without `sprig_id`.
	pub fn attributes(&self) -> &RawRecord {
		&self.attributes
	}

	/// Returns the entry's own identity.
	pub fn dependency_id(&self) -> Dependency {
		Dependency::new(self.model_name(), &self.sprig_id)
	}

	/// Returns the identities referenced by the entry's computed values.
	pub fn dependencies(&self) -> &IndexSet<Dependency> {
		self.dependencies.get_or_init(|| {
			let mut found = IndexSet::new();
			for value in self.attributes.values() {
				expression::collect_dependencies(value, &mut found);
			}
			found
		})
	}

	/// Returns the attributes with every computed value evaluated.
	///
	/// # Errors
	///
	/// Fails if an expression is malformed or names a record missing from
	/// `store`. A failed resolution is retried on the next call.
	pub fn resolved_attributes(&self, store: &RecordStore) -> SeedingResult<&RawRecord> {
		self.resolved.get_or_try_init(|| {
			let ctx = EvalContext::new(store, self.factory.datasource().settings());
			self.attributes
				.iter()
				.map(|(name, value)| {
					expression::resolve_computed(value, &ctx).map(|value| (name.clone(), value))
				})
				.collect()
		})
	}

	/// Returns the resolved values of `keys`.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::MissingAttribute`] naming every absent key.
	pub fn conditions(&self, store: &RecordStore, keys: &IndexSet<String>) -> SeedingResult<Map<String, Value>> {
		let resolved = self.resolved_attributes(store)?;
		let mut conditions = Map::new();
		let mut missing = Vec::new();
		for key in keys {
			match resolved.get(key) {
				Some(value) => {
					conditions.insert(key.clone(), value.clone());
				}
				None => missing.push(key.clone()),
			}
		}

		if !missing.is_empty() {
			return Err(SeedingError::MissingAttribute {
				model: self.model_name().to_string(),
				missing,
			});
		}
		Ok(conditions)
	}

	/// Deletes existing rows matching `delete_existing_by`, if set.
	pub async fn before_save(&self, store: &RecordStore) -> SeedingResult<()> {
		if let Some(keys) = &self.options().delete_existing_by {
			let conditions = self.conditions(store, keys)?;
			let deleted = self.model().delete_by(&conditions).await?;
			tracing::debug!(
				"Deleted {} existing {} rows before saving sprig_id {}",
				deleted,
				self.model_name(),
				self.sprig_id
			);
		}
		Ok(())
	}

	/// Returns the backing record, building it on first use.
	///
	/// With `find_existing_by`, a matching existing row is updated with the
	/// resolved attributes; otherwise a new record is built.
	pub async fn record(&mut self, store: &RecordStore) -> SeedingResult<&mut SeedRecord> {
		let record = match self.record.take() {
			Some(record) => record,
			None => self.new_or_existing_record(store).await?,
		};
		Ok(self.record.insert(record))
	}

	async fn new_or_existing_record(&self, store: &RecordStore) -> SeedingResult<SeedRecord> {
		if let Some(keys) = &self.options().find_existing_by {
			let conditions = self.conditions(store, keys)?;
			if let Some(mut existing) = self.model().find_by(&conditions).await? {
				existing.assign_all(self.resolved_attributes(store)?);
				return Ok(existing);
			}
		}
		Ok(self.model().build(self.resolved_attributes(store)?))
	}

	/// Persists the backing record. Returns false if validation failed.
	pub async fn save_record(&mut self, store: &RecordStore) -> SeedingResult<bool> {
		let model = Arc::clone(self.model());
		let record = self.record(store).await?;
		model.save(record).await
	}

	/// Registers the saved record under this entry's identity.
	pub fn save_to_store(&self, store: &RecordStore) -> SeedingResult<Arc<SeedRecord>> {
		let record = self.record.clone().ok_or_else(|| SeedingError::RecordNotFound {
			model: self.model_name().to_string(),
			sprig_id: self.sprig_id.clone(),
		})?;
		store.save(self.dependency_id(), record)
	}

	/// Returns the validation messages of the last save.
	pub fn errors(&self) -> FieldErrors {
		self.record
			.as_ref()
			.map(|record| record.errors.clone())
			.unwrap_or_default()
	}

	/// Text logged after a successful save.
	pub fn success_log_text(&self) -> String {
		format!(
			"{} with sprig_id {} successfully saved.",
			self.model_name(),
			self.sprig_id
		)
	}

	/// Text logged after a failed save.
	pub fn error_log_text(&self) -> String {
		format!(
			"There was an error saving {} with sprig_id {}.\nErrors:\n{}",
			self.model_name(),
			self.sprig_id,
			self.errors()
		)
	}
}

impl fmt::Debug for Entry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Entry")
			.field("model", &self.model_name())
			.field("sprig_id", &self.sprig_id)
			.field("attributes", &self.attributes)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::InMemoryBackend;
	use crate::source::Datasource;
	use rstest::rstest;
	use serde_json::json;

	fn factory(backend: Arc<InMemoryBackend>, options: SeedOptions) -> Arc<EntryFactory> {
		Arc::new(EntryFactory::new(
			backend,
			Datasource::from_records(Vec::new(), SeedOptions::new()),
			&options,
		))
	}

	fn entry(backend: &Arc<InMemoryBackend>, options: SeedOptions, attributes: Value) -> Entry {
		let attributes = serde_json::from_value(attributes).unwrap();
		Entry::new(factory(Arc::clone(backend), options), attributes)
	}

	fn row(value: Value) -> Map<String, Value> {
		serde_json::from_value(value).unwrap()
	}

	#[rstest]
	fn test_sprig_id_is_taken_from_attributes() {
		let backend = Arc::new(InMemoryBackend::new("Post"));

		let entry = entry(&backend, SeedOptions::new(), json!({"sprig_id": "x", "title": "t"}));

		assert_eq!(entry.dependency_id(), Dependency::new("Post", "x"));
		assert!(!entry.attributes().contains_key(SPRIG_ID));
	}

	#[rstest]
	fn test_numeric_sprig_id_is_stringified() {
		let backend = Arc::new(InMemoryBackend::new("Post"));
		let entry = entry(&backend, SeedOptions::new(), json!({"sprig_id": 12}));
		assert_eq!(entry.sprig_id(), "12");
	}

	#[rstest]
	fn test_generated_sprig_ids_are_distinct() {
		let backend = Arc::new(InMemoryBackend::new("Post"));
		let a = entry(&backend, SeedOptions::new(), json!({"title": "same"}));
		let b = entry(&backend, SeedOptions::new(), json!({"title": "same"}));

		assert_ne!(a.sprig_id(), b.sprig_id());
		assert!(Uuid::parse_str(a.sprig_id()).is_ok());
	}

	#[rstest]
	fn test_dependencies_are_memoized() {
		let backend = Arc::new(InMemoryBackend::new("Post"));
		let entry = entry(
			&backend,
			SeedOptions::new(),
			json!({
				"author_id": "<%= sprig_record(Author, 1).id %>",
				"editor_id": "<%= sprig_record(Author, '1').id %>",
				"title": "no deps here"
			}),
		);

		let first = entry.dependencies().clone();
		let second = entry.dependencies();

		assert_eq!(&first, second);
		assert_eq!(first.len(), 1);
		assert!(std::ptr::eq(entry.dependencies(), second));
	}

	#[rstest]
	fn test_conditions_reports_missing_keys() {
		// Arrange
		let backend = Arc::new(InMemoryBackend::new("Post"));
		let store = RecordStore::new();
		let entry = entry(&backend, SeedOptions::new(), json!({"title": "t"}));
		let keys: IndexSet<String> = ["title", "slug", "lang"].into_iter().map(String::from).collect();

		// Act
		let result = entry.conditions(&store, &keys);

		// Assert
		match result {
			Err(SeedingError::MissingAttribute { model, missing }) => {
				assert_eq!(model, "Post");
				assert_eq!(missing, vec!["slug".to_string(), "lang".to_string()]);
			}
			other => panic!("expected MissingAttribute, got {:?}", other),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_record_creates_new_record() {
		let backend = Arc::new(InMemoryBackend::new("Post"));
		let store = RecordStore::new();
		let mut entry = entry(&backend, SeedOptions::new(), json!({"title": "t"}));

		let saved = entry.save_record(&store).await.unwrap();
		entry.save_to_store(&store).unwrap();

		assert!(saved);
		assert_eq!(backend.count(), 1);
		assert_eq!(
			store.get(&entry.dependency_id()).unwrap().get("title"),
			Some(&json!("t"))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_record_updates_existing_with_find_existing_by() {
		// Arrange
		let backend = Arc::new(InMemoryBackend::new("User"));
		let existing = backend.insert(row(json!({"email": "a@example.com", "name": "old"})));
		let store = RecordStore::new();
		let mut entry = entry(
			&backend,
			SeedOptions::new().with_find_existing_by(["email"]),
			json!({"email": "a@example.com", "name": "new"}),
		);

		// Act
		let saved = entry.save_record(&store).await.unwrap();

		// Assert
		assert!(saved);
		let rows = backend.rows();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].pk, existing.pk);
		assert_eq!(rows[0].get("name"), Some(&json!("new")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_before_save_deletes_matching_rows() {
		let backend = Arc::new(InMemoryBackend::new("Post"));
		backend.insert(row(json!({"slug": "hello", "title": "old"})));
		backend.insert(row(json!({"slug": "other", "title": "keep"})));
		let store = RecordStore::new();
		let entry = entry(
			&backend,
			SeedOptions::new().with_delete_existing_by(["slug"]),
			json!({"slug": "hello", "title": "new"}),
		);

		entry.before_save(&store).await.unwrap();

		let rows = backend.rows();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].get("slug"), Some(&json!("other")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_save_exposes_errors() {
		let backend = Arc::new(InMemoryBackend::new("Post").with_required(&["title"]));
		let store = RecordStore::new();
		let mut entry = entry(&backend, SeedOptions::new(), json!({"sprig_id": 3, "body": "b"}));

		let saved = entry.save_record(&store).await.unwrap();

		assert!(!saved);
		assert_eq!(entry.errors().get("title"), Some(&["can't be blank".to_string()][..]));
		assert_eq!(
			entry.error_log_text(),
			"There was an error saving Post with sprig_id 3.\nErrors:\ntitle: can't be blank"
		);
	}

	#[rstest]
	fn test_success_log_text() {
		let backend = Arc::new(InMemoryBackend::new("Post"));
		let entry = entry(&backend, SeedOptions::new(), json!({"sprig_id": "p1"}));
		assert_eq!(entry.success_log_text(), "Post with sprig_id p1 successfully saved.");
	}
}
