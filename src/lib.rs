//! # Sprig
//!
//! Relational seed data for Rust applications.
//!
//! Sprig reads one seed file per model from `db/seeds/<environment>/`,
//! works out which records reference which through
//! `<%= sprig_record(Model, id) %>` values, and saves them so that every
//! referenced record exists before the records pointing at it.
//!
//! ## Feature Flags
//!
//! - `json` - JSON seed files
//! - `yaml` - YAML seed files
//! - `csv` - CSV seed files
//! - `full` (default) - All formats
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sprig::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> SeedingResult<()> {
//! let registry = ModelRegistry::new();
//! registry.register(InMemoryBackend::new("Author"));
//! registry.register(InMemoryBackend::new("Book"));
//!
//! let settings = SeedSettings::new();
//! let directives: DirectiveList = ["Author", "Book"]
//!     .iter()
//!     .map(|model| Directive::from_registry(&registry, *model, &settings))
//!     .collect::<SeedingResult<_>>()?;
//!
//! let report = sprig(directives).await?;
//! println!("{}", report);
//!
//! let book = sprig_record("Book", "dune")?;
//! println!("{:?}", book.id());
//! # Ok(())
//! # }
//! ```

pub use sprig_seeding::{commands, conf, error, expression, memory, model, prelude, seed, source};

// Re-export commonly used types
pub use sprig_seeding::{
	Dependency, Directive, ModelBackend, ModelRegistry, Planter, RecordStore, SeedRecord,
	SeedingError, SeedingResult, sprig, sprig_record,
};
