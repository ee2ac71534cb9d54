//! Seed directory settings.
//!
//! Seed files live under `<root>/<base_directory>/<environment>/`. The
//! environment defaults to the host application's runtime environment,
//! read from `SPRIG_ENV` and then `APP_ENV`.

use std::env;
use std::path::{Path, PathBuf};

/// Default base directory, relative to the project root.
pub const DEFAULT_BASE_DIRECTORY: &str = "db/seeds";

/// Environment used when no environment variable is set.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Environment variables consulted, in order, for the runtime environment.
pub const ENVIRONMENT_VARIABLES: [&str; 2] = ["SPRIG_ENV", "APP_ENV"];

/// Settings that locate seed files on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSettings {
	/// Project root the base directory is relative to.
	pub root: PathBuf,

	/// Base seed directory (default `db/seeds`).
	pub base_directory: PathBuf,

	/// Environment subdirectory (default: the runtime environment).
	pub environment: String,
}

impl SeedSettings {
	/// Creates settings from the process environment.
	pub fn new() -> Self {
		Self {
			root: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
			base_directory: PathBuf::from(DEFAULT_BASE_DIRECTORY),
			environment: runtime_environment(),
		}
	}

	/// Sets the project root.
	pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
		self.root = root.as_ref().to_path_buf();
		self
	}

	/// Sets the base seed directory.
	pub fn with_base_directory(mut self, base_directory: impl AsRef<Path>) -> Self {
		self.base_directory = base_directory.as_ref().to_path_buf();
		self
	}

	/// Sets the environment subdirectory.
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = environment.into();
		self
	}

	/// Returns the absolute base directory.
	pub fn seed_base(&self) -> PathBuf {
		self.root.join(&self.base_directory)
	}

	/// Returns the directory seed files are looked up in.
	///
	/// # Example
	///
	/// ```
	/// # use sprig_seeding::conf::SeedSettings;
	/// let settings = SeedSettings::new()
	///     .with_root("/app")
	///     .with_environment("staging");
	/// assert_eq!(settings.directory().to_str(), Some("/app/db/seeds/staging"));
	/// ```
	pub fn directory(&self) -> PathBuf {
		self.seed_base().join(&self.environment)
	}
}

impl Default for SeedSettings {
	fn default() -> Self {
		Self::new()
	}
}

/// Reads the runtime environment name from the process environment.
pub fn runtime_environment() -> String {
	ENVIRONMENT_VARIABLES
		.iter()
		.find_map(|key| env::var(key).ok().filter(|value| !value.trim().is_empty()))
		.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	fn test_directory_layout() {
		let settings = SeedSettings::new()
			.with_root("/srv/app")
			.with_base_directory("seeds")
			.with_environment("test");

		assert_eq!(settings.seed_base(), PathBuf::from("/srv/app/seeds"));
		assert_eq!(settings.directory(), PathBuf::from("/srv/app/seeds/test"));
	}

	#[rstest]
	#[serial]
	fn test_environment_from_sprig_env() {
		// SAFETY: Modifying environment variables is unsafe in multi-threaded programs.
		// This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::set_var("SPRIG_ENV", "staging");
			env::set_var("APP_ENV", "production");
		}

		assert_eq!(runtime_environment(), "staging");

		// SAFETY: Removing environment variables is unsafe in multi-threaded programs.
		// This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::remove_var("SPRIG_ENV");
			env::remove_var("APP_ENV");
		}
	}

	#[rstest]
	#[serial]
	fn test_environment_falls_back_to_app_env_then_default() {
		// SAFETY: Modifying environment variables is unsafe in multi-threaded programs.
		// This test uses #[serial] to ensure exclusive access to environment variables.
		unsafe {
			env::remove_var("SPRIG_ENV");
			env::set_var("APP_ENV", "production");
		}
		assert_eq!(runtime_environment(), "production");

		// SAFETY: see above.
		unsafe {
			env::remove_var("APP_ENV");
		}
		assert_eq!(runtime_environment(), DEFAULT_ENVIRONMENT);
		assert_eq!(SeedSettings::new().environment, DEFAULT_ENVIRONMENT);
	}
}
