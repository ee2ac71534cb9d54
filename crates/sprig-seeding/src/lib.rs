//! Dependency-ordered seed data for relational models.
//!
//! Seed files hold records for one model each. A record may reference a
//! record of another file through a computed value:
//!
//! ```yaml
//! # db/seeds/development/books.yml
//! records:
//!   - sprig_id: dune
//!     title: Dune
//!     author_id: "<%= sprig_record(Author, 'fh').id %>"
//! ```
//!
//! Planting scans every computed value for `sprig_record(Model, id)` calls,
//! orders the records so that referenced records are saved first, and
//! resolves the calls against the records planted so far.
//!
//! # Features
//!
//! - `json` - JSON seed files (always available)
//! - `yaml` - YAML seed files (enabled by default)
//! - `csv` - CSV seed files (enabled by default)
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sprig_seeding::prelude::*;
//!
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
//! let book = sprig_record("Book", "dune")?;
//! ```
//!
//! # Architecture
//!
//! - [`source`] - seed file lookup ([`SourceResolver`](source::SourceResolver)),
//!   parsing and [`Datasource`](source::Datasource)
//! - [`expression`] - computed values: recognition, dependency scanning and
//!   evaluation
//! - [`seed`] - entries, the dependency graph, the [`Planter`](seed::Planter)
//!   and the [`RecordStore`](seed::RecordStore)
//! - [`model`] - the [`ModelBackend`](model::ModelBackend) persistence seam
//! - [`commands`] - the `seed` management command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod commands;
pub mod conf;
pub mod error;
pub mod expression;
pub mod memory;
pub mod model;
pub mod prelude;
pub mod seed;
pub mod source;

// Re-export commonly used types at crate root
pub use error::{SeedingError, SeedingResult};
pub use model::{ModelBackend, ModelRegistry, SeedRecord};
pub use seed::{Dependency, Directive, Planter, RecordStore, sprig, sprig_record};
