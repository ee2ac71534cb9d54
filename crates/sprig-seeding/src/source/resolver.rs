//! Seed file lookup.

use std::fs;
use std::path::{Path, PathBuf};

use super::SeedFormat;
use crate::error::{SeedingError, SeedingResult};

/// Locates the seed file for a table inside a seed directory.
#[derive(Debug, Clone)]
pub struct SourceResolver {
	directory: PathBuf,
}

impl SourceResolver {
	/// Creates a resolver scanning `directory`.
	pub fn new<P: AsRef<Path>>(directory: P) -> Self {
		Self {
			directory: directory.as_ref().to_path_buf(),
		}
	}

	/// Returns the directory being scanned.
	pub fn directory(&self) -> &Path {
		&self.directory
	}

	/// Finds the first file named `<table_name>.<anything>`.
	///
	/// Directory entries are considered in file-name order, so the choice is
	/// stable across platforms.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::FileNotFound`] if the directory is missing or
	/// holds no matching file.
	pub fn resolve(&self, table_name: &str) -> SeedingResult<PathBuf> {
		let prefix = format!("{}.", table_name);
		let mut names: Vec<String> = match fs::read_dir(&self.directory) {
			Ok(entries) => entries
				.filter_map(|entry| entry.ok())
				.filter(|entry| entry.path().is_file())
				.filter_map(|entry| entry.file_name().to_str().map(str::to_string))
				.collect(),
			Err(e) => {
				tracing::debug!(
					"Seed directory {} could not be read: {}",
					self.directory.display(),
					e
				);
				Vec::new()
			}
		};
		names.sort();

		let file_name = names
			.into_iter()
			.find(|name| name.starts_with(&prefix))
			.ok_or_else(|| SeedingError::FileNotFound {
				table: table_name.to_string(),
				directory: self.directory.clone(),
				accepted: SeedFormat::ACCEPTED_EXTENSIONS.to_vec(),
			})?;

		let path = self.directory.join(file_name);
		tracing::debug!("Resolved seed file for {}: {}", table_name, path.display());
		Ok(path)
	}
}
