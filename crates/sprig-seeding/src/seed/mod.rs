//! Seeding: from directives to planted records.
//!
//! A run goes through these steps:
//!
//! 1. Each [`Directive`] becomes an [`EntryFactory`], which appends one
//!    [`Entry`] per record to the hopper.
//! 2. The [`Planter`] builds a [`SeedGraph`] from the entries' references
//!    and orders them topologically.
//! 3. Entries are saved in that order and registered in the
//!    [`RecordStore`], where later entries (and callers) find them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use sprig_seeding::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> SeedingResult<()> {
//! let authors = Arc::new(InMemoryBackend::new("Author"));
//! let books = Arc::new(InMemoryBackend::new("Book"));
//!
//! let records = |value: serde_json::Value| -> Vec<RawRecord> { serde_json::from_value(value).unwrap() };
//! let directives = vec![
//!     Directive::new(
//!         books.clone(),
//!         Datasource::from_records(
//!             records(json!([{"title": "Dune", "author_id": "<%= sprig_record(Author, 'fh').id %>"}])),
//!             SeedOptions::new(),
//!         ),
//!     ),
//!     Directive::new(
//!         authors.clone(),
//!         Datasource::from_records(records(json!([{"sprig_id": "fh", "name": "Frank"}])), SeedOptions::new()),
//!     ),
//! ];
//!
//! let store = Arc::new(RecordStore::new());
//! let report = Planter::new(DirectiveList::new(directives).into_hopper())
//!     .with_store(store.clone())
//!     .sprig()
//!     .await?;
//!
//! assert_eq!(report.planted.len(), 2);
//! assert_eq!(books.rows()[0].get("author_id"), store.get_by("Author", "fh")?.id());
//! # Ok(())
//! # }
//! ```

mod dependency;
mod directive;
mod entry;
mod factory;
mod graph;
mod options;
mod planter;
mod record_store;

use std::sync::Arc;

pub use dependency::{Dependency, canonical_id};
pub use directive::{Directive, DirectiveList, table_name};
pub use entry::{Entry, SPRIG_ID};
pub use factory::EntryFactory;
pub use graph::{SeedGraph, SeedNode};
pub use options::{DataMapper, RawRecord, SeedOptions};
pub use planter::{FailurePolicy, PlantReport, Planter};
pub use record_store::RecordStore;

use crate::error::SeedingResult;
use crate::model::{ModelIdentity, SeedRecord};

/// Plants `directives` into the global [`RecordStore`], aborting on the
/// first rejected entry.
///
/// # Errors
///
/// See [`Planter::sprig`].
pub async fn sprig(directives: impl Into<DirectiveList>) -> SeedingResult<PlantReport> {
	Planter::new(directives.into().into_hopper()).sprig().await
}

/// Returns a record planted into the global [`RecordStore`].
///
/// # Errors
///
/// Returns [`SeedingError::RecordNotFound`](crate::error::SeedingError::RecordNotFound)
/// if no such record was planted.
pub fn sprig_record<M: ModelIdentity + ?Sized>(
	model: &M,
	sprig_id: impl ToString,
) -> SeedingResult<Arc<SeedRecord>> {
	RecordStore::global().get_by(model, sprig_id)
}
