//! Registry of planted records.
//!
//! Records are registered under their [`Dependency`] as they are planted, so
//! that later entries of the same run (and callers after the run) can look
//! them up by symbolic id.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::Dependency;
use crate::error::{SeedingError, SeedingResult};
use crate::model::{ModelIdentity, SeedRecord};

static GLOBAL_STORE: Lazy<Arc<RecordStore>> = Lazy::new(|| Arc::new(RecordStore::new()));

/// Map from `(model, sprig_id)` to the persisted record.
#[derive(Debug, Default)]
pub struct RecordStore {
	records: RwLock<HashMap<Dependency, Arc<SeedRecord>>>,
}

impl RecordStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the process-wide store.
	pub fn global() -> Arc<RecordStore> {
		Arc::clone(&GLOBAL_STORE)
	}

	/// Registers a planted record.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::DuplicateSymbolicId`] if the identity is taken.
	pub fn save(&self, identity: Dependency, record: SeedRecord) -> SeedingResult<Arc<SeedRecord>> {
		let mut records = self.records.write();
		if records.contains_key(&identity) {
			return Err(SeedingError::DuplicateSymbolicId {
				model: identity.model().to_string(),
				sprig_id: identity.sprig_id().to_string(),
			});
		}

		let record = Arc::new(record);
		records.insert(identity, Arc::clone(&record));
		Ok(record)
	}

	/// Looks up a planted record.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::RecordNotFound`] if nothing is registered.
	pub fn get(&self, identity: &Dependency) -> SeedingResult<Arc<SeedRecord>> {
		self.records
			.read()
			.get(identity)
			.cloned()
			.ok_or_else(|| SeedingError::RecordNotFound {
				model: identity.model().to_string(),
				sprig_id: identity.sprig_id().to_string(),
			})
	}

	/// Looks up a planted record by model and symbolic id.
	pub fn get_by<M: ModelIdentity + ?Sized>(
		&self,
		model: &M,
		sprig_id: impl ToString,
	) -> SeedingResult<Arc<SeedRecord>> {
		self.get(&Dependency::new(model, sprig_id))
	}

	/// Returns true if the identity is registered.
	pub fn contains(&self, identity: &Dependency) -> bool {
		self.records.read().contains_key(identity)
	}

	/// Returns the number of registered records.
	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}

	/// Returns every registered identity, sorted.
	pub fn identities(&self) -> Vec<Dependency> {
		let mut identities: Vec<_> = self.records.read().keys().cloned().collect();
		identities.sort();
		identities
	}

	/// Forgets every registered record.
	pub fn reset(&self) {
		self.records.write().clear();
	}
}
