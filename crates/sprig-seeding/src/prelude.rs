//! Convenience re-exports for common usage.
//!
//! ```
//! use sprig_seeding::prelude::*;
//!
//! let dependency = Dependency::new("Author", "a1");
//! assert_eq!(dependency.to_string(), "Author(a1)");
//! ```

// Error types
pub use crate::error::{SeedingError, SeedingResult};

// Configuration
pub use crate::conf::SeedSettings;

// Models
pub use crate::memory::InMemoryBackend;
pub use crate::model::{FieldErrors, ModelBackend, ModelIdentity, ModelRegistry, SeedRecord};

// Sources
pub use crate::source::{Datasource, SeedFormat, SourceArgs};

// Seeding
pub use crate::seed::{
	Dependency, Directive, DirectiveList, Entry, EntryFactory, FailurePolicy, PlantReport, Planter,
	RawRecord, RecordStore, SeedOptions, sprig, sprig_record,
};

// Command types
pub use crate::commands::{SeedArgs, SeedCommand, SeedCommandOptions};
