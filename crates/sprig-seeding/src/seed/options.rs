//! Per-model seeding options.
//!
//! Options come from two places: the seed file's own `options` section and
//! the directive that binds the file to a model. Directive options override
//! file options key by key.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::error::{SeedingError, SeedingResult};

/// A raw record: field name to raw value.
pub type RawRecord = Map<String, Value>;

/// Transform applied to every raw record before it becomes an entry.
pub type DataMapper = Arc<dyn Fn(RawRecord) -> RawRecord + Send + Sync>;

/// Options controlling how the entries of one model are planted.
#[derive(Clone, Default)]
pub struct SeedOptions {
	/// Attributes used to look up an existing row to update instead of creating.
	pub find_existing_by: Option<IndexSet<String>>,

	/// Attributes used to delete existing rows before creating.
	pub delete_existing_by: Option<IndexSet<String>>,

	/// Transform applied to each raw record.
	pub data_mapper: Option<DataMapper>,
}

impl SeedOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the `find_existing_by` keys.
	pub fn with_find_existing_by<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.find_existing_by = Some(keys.into_iter().map(Into::into).collect());
		self
	}

	/// Sets the `delete_existing_by` keys.
	pub fn with_delete_existing_by<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.delete_existing_by = Some(keys.into_iter().map(Into::into).collect());
		self
	}

	/// Sets the record transform.
	pub fn with_data_mapper<F>(mut self, mapper: F) -> Self
	where
		F: Fn(RawRecord) -> RawRecord + Send + Sync + 'static,
	{
		self.data_mapper = Some(Arc::new(mapper));
		self
	}

	/// Returns these options overridden key by key with `overrides`.
	pub fn merge(&self, overrides: &SeedOptions) -> SeedOptions {
		SeedOptions {
			find_existing_by: overrides
				.find_existing_by
				.clone()
				.or_else(|| self.find_existing_by.clone()),
			delete_existing_by: overrides
				.delete_existing_by
				.clone()
				.or_else(|| self.delete_existing_by.clone()),
			data_mapper: overrides
				.data_mapper
				.clone()
				.or_else(|| self.data_mapper.clone()),
		}
	}

	/// Reads options from a seed file's `options` section.
	///
	/// Key lists may be given as a single name or a list of names. Unknown
	/// keys are ignored.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::InvalidSource`] if the section is not a
	/// mapping or a key list has the wrong shape.
	pub fn from_value(value: &Value) -> SeedingResult<Self> {
		let map = match value {
			Value::Null => return Ok(Self::default()),
			Value::Object(map) => map,
			other => {
				return Err(SeedingError::InvalidSource(format!(
					"options must be a mapping, got {}",
					other
				)));
			}
		};

		Ok(Self {
			find_existing_by: key_list(map, "find_existing_by")?,
			delete_existing_by: key_list(map, "delete_existing_by")?,
			data_mapper: None,
		})
	}
}

fn key_list(map: &Map<String, Value>, option: &str) -> SeedingResult<Option<IndexSet<String>>> {
	match map.get(option) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(key)) => Ok(Some(IndexSet::from([key.clone()]))),
		Some(Value::Array(keys)) => keys
			.iter()
			.map(|key| match key {
				Value::String(key) => Ok(key.clone()),
				other => Err(SeedingError::InvalidSource(format!(
					"{} entries must be attribute names, got {}",
					option, other
				))),
			})
			.collect::<SeedingResult<IndexSet<String>>>()
			.map(Some),
		Some(other) => Err(SeedingError::InvalidSource(format!(
			"{} must be a name or a list of names, got {}",
			option, other
		))),
	}
}

impl fmt::Debug for SeedOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SeedOptions")
			.field("find_existing_by", &self.find_existing_by)
			.field("delete_existing_by", &self.delete_existing_by)
			.field("data_mapper", &self.data_mapper.as_ref().map(|_| "<fn>"))
			.finish()
	}
}
