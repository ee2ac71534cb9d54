//! Seed file formats and extension matching.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{SeedingError, SeedingResult};

/// Supported seed file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedFormat {
	/// YAML (`.yml`, `.yaml`).
	Yaml,

	/// JSON (`.json`).
	Json,

	/// CSV with a header row (`.csv`).
	Csv,
}

// Ordered (extension pattern -> format) matchers. The first match wins.
static FORMAT_MATCHERS: LazyLock<Vec<(Regex, SeedFormat)>> = LazyLock::new(|| {
	vec![
		(
			Regex::new(r"(?i)^\.ya?ml$").expect("FORMAT_MATCHERS: invalid yaml pattern"),
			SeedFormat::Yaml,
		),
		(
			Regex::new(r"(?i)^\.json$").expect("FORMAT_MATCHERS: invalid json pattern"),
			SeedFormat::Json,
		),
		(
			Regex::new(r"(?i)^\.csv$").expect("FORMAT_MATCHERS: invalid csv pattern"),
			SeedFormat::Csv,
		),
	]
});

impl SeedFormat {
	/// All formats, in matching order.
	pub const ALL: [SeedFormat; 3] = [SeedFormat::Yaml, SeedFormat::Json, SeedFormat::Csv];

	/// File extensions a seed file may carry.
	pub const ACCEPTED_EXTENSIONS: [&'static str; 4] = ["yml", "yaml", "json", "csv"];

	/// Determines the format from a file extension, with or without the dot.
	///
	/// # Example
	///
	/// ```
	/// # use sprig_seeding::source::SeedFormat;
	/// assert_eq!(SeedFormat::from_extension("yml"), Some(SeedFormat::Yaml));
	/// assert_eq!(SeedFormat::from_extension(".JSON"), Some(SeedFormat::Json));
	/// assert_eq!(SeedFormat::from_extension("txt"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		let dotted = if ext.starts_with('.') {
			ext.to_string()
		} else {
			format!(".{}", ext)
		};
		FORMAT_MATCHERS
			.iter()
			.find(|(pattern, _)| pattern.is_match(&dotted))
			.map(|(_, format)| *format)
	}

	/// Selects the format for a file path.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::UnparsableFile`] if no matcher accepts the
	/// extension.
	pub fn for_path(path: &Path) -> SeedingResult<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
			.ok_or_else(|| SeedingError::UnparsableFile {
				path: path.to_path_buf(),
				formats: Self::ALL.iter().map(|format| format.name()).collect(),
			})
	}

	/// Returns the display name of this format.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Yaml => "YAML",
			Self::Json => "JSON",
			Self::Csv => "CSV",
		}
	}
}

impl fmt::Display for SeedFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}
