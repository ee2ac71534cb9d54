//! In-process model backend.
//!
//! [`InMemoryBackend`] keeps rows in a vector guarded by a mutex and assigns
//! auto-increment integer primary keys. It supports presence and uniqueness
//! validation so that planting behaves like it would against a real table.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::SeedingResult;
use crate::model::{ModelBackend, SeedRecord};

/// A [`ModelBackend`] storing rows in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
	model_name: String,
	rows: Mutex<Vec<SeedRecord>>,
	next_id: AtomicI64,
	required: Vec<String>,
	unique: Vec<String>,
}

impl InMemoryBackend {
	/// Creates an empty table for a model.
	pub fn new(model_name: impl Into<String>) -> Self {
		Self {
			model_name: model_name.into(),
			rows: Mutex::new(Vec::new()),
			next_id: AtomicI64::new(1),
			required: Vec::new(),
			unique: Vec::new(),
		}
	}

	/// Rejects saves where any of these fields is missing, null or blank.
	pub fn with_required(mut self, fields: &[&str]) -> Self {
		self.required = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	/// Rejects saves that would duplicate another row's value for these fields.
	pub fn with_unique(mut self, fields: &[&str]) -> Self {
		self.unique = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	/// Inserts a row directly, bypassing validation. Useful for pre-existing data.
	pub fn insert(&self, fields: Map<String, Value>) -> SeedRecord {
		let pk = Value::from(self.next_id.fetch_add(1, Ordering::SeqCst));
		let record = SeedRecord::with_pk(self.model_name.clone(), pk, fields);
		self.rows.lock().push(record.clone());
		record
	}

	/// Returns a snapshot of all rows in insertion order.
	pub fn rows(&self) -> Vec<SeedRecord> {
		self.rows.lock().clone()
	}

	/// Returns the number of rows.
	pub fn count(&self) -> usize {
		self.rows.lock().len()
	}

	fn validate(&self, record: &mut SeedRecord, rows: &[SeedRecord]) -> bool {
		record.errors.clear();

		for field in &self.required {
			let blank = match record.fields.get(field) {
				None | Some(Value::Null) => true,
				Some(Value::String(s)) => s.trim().is_empty(),
				Some(_) => false,
			};
			if blank {
				record.errors.add(field.clone(), "can't be blank");
			}
		}

		for field in &self.unique {
			let Some(value) = record.fields.get(field) else {
				continue;
			};
			let taken = rows
				.iter()
				.filter(|row| record.pk.is_none() || row.pk != record.pk)
				.any(|row| row.fields.get(field) == Some(value));
			if taken {
				record.errors.add(field.clone(), "has already been taken");
			}
		}

		record.errors.is_empty()
	}
}

#[async_trait]
impl ModelBackend for InMemoryBackend {
	fn model_name(&self) -> &str {
		&self.model_name
	}

	async fn find_by(&self, conditions: &Map<String, Value>) -> SeedingResult<Option<SeedRecord>> {
		Ok(self
			.rows
			.lock()
			.iter()
			.find(|row| row.matches(conditions))
			.cloned())
	}

	async fn delete_by(&self, conditions: &Map<String, Value>) -> SeedingResult<u64> {
		let mut rows = self.rows.lock();
		let before = rows.len();
		rows.retain(|row| !row.matches(conditions));
		Ok((before - rows.len()) as u64)
	}

	async fn save(&self, record: &mut SeedRecord) -> SeedingResult<bool> {
		let mut rows = self.rows.lock();
		if !self.validate(record, &rows) {
			return Ok(false);
		}

		let existing = record
			.pk
			.as_ref()
			.and_then(|pk| rows.iter().position(|row| row.pk.as_ref() == Some(pk)));

		match existing {
			Some(index) => rows[index] = record.clone(),
			None => {
				if record.pk.is_none() {
					record.pk = Some(Value::from(self.next_id.fetch_add(1, Ordering::SeqCst)));
				}
				rows.push(record.clone());
			}
		}
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn fields(value: Value) -> Map<String, Value> {
		value.as_object().cloned().unwrap_or_default()
	}

	#[rstest]
	#[tokio::test]
	async fn test_save_assigns_incrementing_ids() {
		// Arrange
		let backend = InMemoryBackend::new("Author");
		let mut first = backend.build(&fields(json!({"name": "Ann"})));
		let mut second = backend.build(&fields(json!({"name": "Bob"})));

		// Act
		assert!(backend.save(&mut first).await.unwrap());
		assert!(backend.save(&mut second).await.unwrap());

		// Assert
		assert_eq!(first.pk, Some(json!(1)));
		assert_eq!(second.pk, Some(json!(2)));
		assert_eq!(backend.count(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_save_updates_existing_row() {
		// Arrange
		let backend = InMemoryBackend::new("User");
		let mut existing = backend.insert(fields(json!({"email": "a@example.com", "name": "old"})));

		// Act
		existing.assign("name", json!("new"));
		assert!(backend.save(&mut existing).await.unwrap());

		// Assert
		let rows = backend.rows();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].get("name"), Some(&json!("new")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_required_validation() {
		// Arrange
		let backend = InMemoryBackend::new("Post").with_required(&["title"]);
		let mut record = backend.build(&fields(json!({"title": "  "})));

		// Act
		let saved = backend.save(&mut record).await.unwrap();

		// Assert
		assert!(!saved);
		assert_eq!(record.errors.get("title"), Some(&["can't be blank".to_string()][..]));
		assert_eq!(backend.count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unique_validation_ignores_self() {
		// Arrange
		let backend = InMemoryBackend::new("User").with_unique(&["email"]);
		let mut existing = backend.insert(fields(json!({"email": "a@example.com"})));
		let mut duplicate = backend.build(&fields(json!({"email": "a@example.com"})));

		// Act & Assert
		assert!(backend.save(&mut existing).await.unwrap());
		assert!(!backend.save(&mut duplicate).await.unwrap());
		assert!(duplicate.errors.get("email").is_some());
	}

	#[rstest]
	#[tokio::test]
	async fn test_find_and_delete_by_conditions() {
		// Arrange
		let backend = InMemoryBackend::new("Post");
		backend.insert(fields(json!({"slug": "hello", "n": 1})));
		backend.insert(fields(json!({"slug": "hello", "n": 2})));
		backend.insert(fields(json!({"slug": "other", "n": 3})));
		let conditions = fields(json!({"slug": "hello"}));

		// Act
		let found = backend.find_by(&conditions).await.unwrap();
		let deleted = backend.delete_by(&conditions).await.unwrap();

		// Assert
		assert_eq!(found.unwrap().get("n"), Some(&json!(1)));
		assert_eq!(deleted, 2);
		assert_eq!(backend.count(), 1);
		assert!(backend.find_by(&conditions).await.unwrap().is_none());
	}
}
