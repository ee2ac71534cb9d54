//! Temporary seed directories.

use std::fs;
use std::path::PathBuf;

use sprig_seeding::conf::SeedSettings;
use tempfile::TempDir;

/// Environment used by the integration scenarios.
pub const TEST_ENVIRONMENT: &str = "test";

/// A project root in a temporary directory with a `db/seeds/test` tree.
pub struct SeedDir {
	root: TempDir,
}

impl SeedDir {
	/// Creates an empty project root.
	///
	/// # Panics
	///
	/// Panics if the temporary directory cannot be created.
	pub fn new() -> Self {
		Self {
			root: TempDir::new().expect("Failed to create temporary seed directory"),
		}
	}

	/// Returns settings pointing at this root.
	pub fn settings(&self) -> SeedSettings {
		SeedSettings::new()
			.with_root(self.root.path())
			.with_environment(TEST_ENVIRONMENT)
	}

	/// Writes a seed file into the test environment directory.
	///
	/// # Panics
	///
	/// Panics if the file cannot be written.
	pub fn write(&self, file_name: &str, content: &str) -> PathBuf {
		let directory = self.settings().directory();
		fs::create_dir_all(&directory).expect("Failed to create seed directory");
		let path = directory.join(file_name);
		fs::write(&path, content).unwrap_or_else(|_| panic!("Failed to write seed file: {:?}", path));
		path
	}
}
