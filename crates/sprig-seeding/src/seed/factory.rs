//! Entry factories.

use std::fmt;
use std::sync::Arc;

use super::{Entry, SeedOptions};
use crate::model::ModelBackend;
use crate::source::Datasource;

/// Turns the records of one datasource into entries for one model.
pub struct EntryFactory {
	model: Arc<dyn ModelBackend>,
	datasource: Datasource,
	options: SeedOptions,
}

impl EntryFactory {
	/// Creates a factory. `overrides` take precedence over the datasource's
	/// own options, key by key.
	pub fn new(model: Arc<dyn ModelBackend>, datasource: Datasource, overrides: &SeedOptions) -> Self {
		let options = datasource.options().merge(overrides);
		Self {
			model,
			datasource,
			options,
		}
	}

	/// Returns the target model.
	pub fn model(&self) -> &Arc<dyn ModelBackend> {
		&self.model
	}

	/// Returns the datasource.
	pub fn datasource(&self) -> &Datasource {
		&self.datasource
	}

	/// Returns the merged options.
	pub fn options(&self) -> &SeedOptions {
		&self.options
	}

	/// Appends one entry per datasource record to `hopper`, in record order.
	///
	/// Records pass through the `data_mapper` option first, if one is set.
	pub fn add_seeds_to_hopper(self: &Arc<Self>, hopper: &mut Vec<Entry>) {
		let mapper = self.options.data_mapper.as_ref();
		let before = hopper.len();
		for record in self.datasource.records() {
			let record = match mapper {
				Some(mapper) => mapper(record.clone()),
				None => record.clone(),
			};
			hopper.push(Entry::new(Arc::clone(self), record));
		}
		tracing::debug!(
			"Added {} {} entries to the hopper",
			hopper.len() - before,
			self.model.model_name()
		);
	}
}

impl fmt::Debug for EntryFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntryFactory")
			.field("model", &self.model.model_name())
			.field("datasource", &self.datasource)
			.field("options", &self.options)
			.finish()
	}
}
