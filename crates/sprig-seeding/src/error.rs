//! Error types for the seeding engine.
//!
//! Every failure a planting run can hit maps to one [`SeedingError`] variant.
//! File, parse, cycle and duplicate-id errors abort the run; validation
//! failures are subject to the run's [`FailurePolicy`](crate::seed::FailurePolicy).

use std::path::PathBuf;

use thiserror::Error;

use crate::model::FieldErrors;
use crate::seed::Dependency;

/// Errors that can occur during seeding operations.
#[derive(Debug, Error)]
pub enum SeedingError {
	/// No seed file exists for a table in the seed directory.
	#[error(
		"No datasource file could be found for '{table}'. Try creating {} within {}, or define a custom datasource.",
		candidate_files(.table, .accepted),
		.directory.display()
	)]
	FileNotFound {
		/// Table or model name that was looked up.
		table: String,
		/// Directory that was scanned.
		directory: PathBuf,
		/// Extensions that would have been accepted.
		accepted: Vec<&'static str>,
	},

	/// No parser matches the file extension.
	#[error(
		"No parser was found for the file '{}'. Provide a custom parser, or use a supported data format ({}).",
		.path.display(),
		.formats.join(", ")
	)]
	UnparsableFile {
		/// Offending file.
		path: PathBuf,
		/// Names of the supported formats.
		formats: Vec<&'static str>,
	},

	/// Seed file content is malformed.
	#[error("{}: {message}", .path.display())]
	Parse {
		/// File that failed to parse.
		path: PathBuf,
		/// Parser message.
		message: String,
	},

	/// A lookup key named by `find_existing_by` or `delete_existing_by` is
	/// absent from the resolved attributes.
	#[error("Missing attributes for {model}: {}.", .missing.join(", "))]
	MissingAttribute {
		/// Model the entry targets.
		model: String,
		/// Keys that could not be found.
		missing: Vec<String>,
	},

	/// The dependency graph of a run contains a cycle.
	#[error(
		"Circular dependency detected between seeds: {}",
		join_identities(.identities)
	)]
	CycleDetected {
		/// Identities implicated in the cycle.
		identities: Vec<Dependency>,
	},

	/// The same (model, sprig_id) was registered twice.
	#[error("Duplicate sprig_id '{sprig_id}' for {model}")]
	DuplicateSymbolicId {
		/// Model name.
		model: String,
		/// Symbolic id.
		sprig_id: String,
	},

	/// No record is registered for (model, sprig_id).
	#[error("No record found for {model} with sprig_id '{sprig_id}'")]
	RecordNotFound {
		/// Model name.
		model: String,
		/// Symbolic id.
		sprig_id: String,
	},

	/// The persistence layer rejected a record.
	#[error("There was an error saving {model} with sprig_id {sprig_id}.\nErrors:\n{errors}")]
	ValidationFailure {
		/// Model name.
		model: String,
		/// Symbolic id.
		sprig_id: String,
		/// Field-level validation messages.
		errors: FieldErrors,
	},

	/// Model was not found in the registry.
	#[error("Model not found: {0}")]
	ModelNotFound(String),

	/// A computed expression could not be parsed or evaluated.
	#[error("Invalid expression `{expression}`: {message}")]
	Expression {
		/// Expression body.
		expression: String,
		/// What went wrong.
		message: String,
	},

	/// A datasource does not have the expected shape.
	#[error("Invalid datasource: {0}")]
	InvalidSource(String),

	/// A command was invoked with invalid arguments.
	#[error("Invalid argument '{field}': {message}")]
	InvalidArgument {
		/// Offending argument.
		field: String,
		/// What is wrong with it.
		message: String,
	},

	/// Persistence backend failed.
	#[error("Database error: {0}")]
	Database(String),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl SeedingError {
	/// Builds an [`SeedingError::Expression`] error.
	pub(crate) fn expression(expression: &str, message: impl Into<String>) -> Self {
		Self::Expression {
			expression: expression.trim().to_string(),
			message: message.into(),
		}
	}

	/// Returns true when the error aborts a run regardless of failure policy.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Self::ValidationFailure { .. })
	}
}

fn candidate_files(table: &str, accepted: &[&str]) -> String {
	accepted
		.iter()
		.map(|ext| format!("{}.{}", table, ext))
		.collect::<Vec<_>>()
		.join(", ")
}

fn join_identities(identities: &[Dependency]) -> String {
	identities
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}

/// Result type alias for seeding operations.
pub type SeedingResult<T> = Result<T, SeedingError>;
