//! Datasources: parsed records plus file-level options.

use std::path::{Path, PathBuf};

use super::{SeedFormat, SeedParser, SourceResolver};
use crate::conf::SeedSettings;
use crate::error::SeedingResult;
use crate::seed::{RawRecord, SeedOptions};

/// Per-datasource overrides of the default file lookup.
#[derive(Debug, Clone, Default)]
pub struct SourceArgs {
	/// Base directory override.
	pub base_directory: Option<PathBuf>,

	/// Environment override.
	pub environment: Option<String>,

	/// Explicit file, bypassing directory lookup.
	pub path: Option<PathBuf>,

	/// Explicit format, bypassing extension matching.
	pub format: Option<SeedFormat>,
}

impl SourceArgs {
	/// Creates empty overrides.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the base directory override.
	pub fn with_base_directory(mut self, base_directory: impl AsRef<Path>) -> Self {
		self.base_directory = Some(base_directory.as_ref().to_path_buf());
		self
	}

	/// Sets the environment override.
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	/// Reads from an explicit file.
	pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
		self.path = Some(path.as_ref().to_path_buf());
		self
	}

	/// Parses with an explicit format.
	pub fn with_format(mut self, format: SeedFormat) -> Self {
		self.format = Some(format);
		self
	}
}

/// An ordered sequence of raw records and the options declared with them.
#[derive(Debug, Clone)]
pub struct Datasource {
	records: Vec<RawRecord>,
	options: SeedOptions,
	settings: SeedSettings,
	path: Option<PathBuf>,
}

impl Datasource {
	/// Loads the seed file for `table_name` from the configured directory.
	///
	/// # Errors
	///
	/// Fails with `FileNotFound`, `UnparsableFile` or `Parse` errors.
	pub fn load(table_name: &str, settings: &SeedSettings) -> SeedingResult<Self> {
		Self::load_with(table_name, settings, SourceArgs::default())
	}

	/// Loads the seed file for `table_name`, applying overrides.
	pub fn load_with(
		table_name: &str,
		settings: &SeedSettings,
		args: SourceArgs,
	) -> SeedingResult<Self> {
		let mut settings = settings.clone();
		if let Some(base_directory) = args.base_directory {
			settings.base_directory = base_directory;
		}
		if let Some(environment) = args.environment {
			settings.environment = environment;
		}

		let path = match args.path {
			Some(path) => path,
			None => SourceResolver::new(settings.directory()).resolve(table_name)?,
		};
		let format = match args.format {
			Some(format) => format,
			None => SeedFormat::for_path(&path)?,
		};
		tracing::debug!("Parsing {} as {}", path.display(), format);

		let data = SeedParser::new().parse_file(&path, format)?;
		Ok(Self {
			records: data.records,
			options: data.options,
			settings,
			path: Some(path),
		})
	}

	/// Creates a datasource from in-memory records.
	pub fn from_records(records: Vec<RawRecord>, options: SeedOptions) -> Self {
		Self {
			records,
			options,
			settings: SeedSettings::default(),
			path: None,
		}
	}

	/// Sets the settings used to resolve relative seed paths.
	pub fn with_settings(mut self, settings: SeedSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Returns the raw records.
	pub fn records(&self) -> &[RawRecord] {
		&self.records
	}

	/// Returns the file-level options.
	pub fn options(&self) -> &SeedOptions {
		&self.options
	}

	/// Returns the file the records came from, if any.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Returns the settings the datasource was loaded with.
	pub fn settings(&self) -> &SeedSettings {
		&self.settings
	}

	/// Returns the seed directory (`base/environment`).
	pub fn directory(&self) -> PathBuf {
		self.settings.directory()
	}

	/// Returns the base seed directory.
	pub fn base_directory(&self) -> PathBuf {
		self.settings.seed_base()
	}

	/// Returns the environment name.
	pub fn environment(&self) -> &str {
		&self.settings.environment
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::SeedingError;
	use rstest::rstest;
	use serde_json::json;
	use std::fs;
	use tempfile::TempDir;

	fn settings_for(dir: &TempDir) -> SeedSettings {
		SeedSettings::new()
			.with_root(dir.path())
			.with_base_directory("db/seeds")
			.with_environment("test")
	}

	fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
		let path = dir.path().join(relative);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(&path, content).unwrap();
		path
	}

	#[rstest]
	fn test_load_from_environment_directory() {
		// Arrange
		let dir = TempDir::new().unwrap();
		write(
			&dir,
			"db/seeds/test/users.json",
			r#"{"options": {"find_existing_by": "email"}, "records": [{"email": "a@example.com"}]}"#,
		);

		// Act
		let datasource = Datasource::load("users", &settings_for(&dir)).unwrap();

		// Assert
		assert_eq!(datasource.records().len(), 1);
		assert!(datasource.options().find_existing_by.is_some());
		assert_eq!(datasource.directory(), dir.path().join("db/seeds/test"));
		assert_eq!(datasource.environment(), "test");
	}

	#[rstest]
	fn test_load_with_environment_override() {
		let dir = TempDir::new().unwrap();
		write(&dir, "db/seeds/staging/users.json", r#"[{"email": "s@example.com"}]"#);

		let datasource = Datasource::load_with(
			"users",
			&settings_for(&dir),
			SourceArgs::new().with_environment("staging"),
		)
		.unwrap();

		assert_eq!(datasource.records()[0].get("email"), Some(&json!("s@example.com")));
		assert_eq!(datasource.environment(), "staging");
	}

	#[rstest]
	fn test_load_with_explicit_path_and_format() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, "custom/people.data", r#"[{"name": "Ann"}]"#);

		let datasource = Datasource::load_with(
			"ignored",
			&settings_for(&dir),
			SourceArgs::new().with_path(&path).with_format(SeedFormat::Json),
		)
		.unwrap();

		assert_eq!(datasource.path(), Some(path.as_path()));
		assert_eq!(datasource.records().len(), 1);
	}

	#[rstest]
	fn test_unsupported_extension_fails_before_parsing() {
		let dir = TempDir::new().unwrap();
		write(&dir, "db/seeds/test/users.txt", "this is not parsed");

		let result = Datasource::load("users", &settings_for(&dir));

		assert!(matches!(result, Err(SeedingError::UnparsableFile { .. })));
	}

	#[rstest]
	fn test_missing_file() {
		let dir = TempDir::new().unwrap();
		let result = Datasource::load("users", &settings_for(&dir));
		assert!(matches!(result, Err(SeedingError::FileNotFound { .. })));
	}

	#[rstest]
	fn test_from_records() {
		let mut record = RawRecord::new();
		record.insert("name".to_string(), json!("Ann"));

		let datasource = Datasource::from_records(vec![record], SeedOptions::new());

		assert_eq!(datasource.records().len(), 1);
		assert!(datasource.path().is_none());
	}
}
