//! Seed file parsing.
//!
//! YAML and JSON seed files are either a mapping with `records` and an
//! optional `options` section, or a bare sequence of records. CSV files use
//! the header row as field names and carry no options.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use super::SeedFormat;
use crate::error::{SeedingError, SeedingResult};
use crate::seed::{RawRecord, SeedOptions};

/// Parsed content of one seed file.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
	/// Raw records in file order.
	pub records: Vec<RawRecord>,

	/// Options declared in the file.
	pub options: SeedOptions,
}

impl SeedData {
	/// Returns the number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns true if there are no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

/// Parser for seed files.
#[derive(Debug, Default)]
pub struct SeedParser;

impl SeedParser {
	/// Creates a new seed parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a seed file with the given format.
	///
	/// The file is closed before this returns, whether or not parsing
	/// succeeded.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::Io`] if the file cannot be read and
	/// [`SeedingError::Parse`], prefixed with the path, if its content is
	/// malformed.
	pub fn parse_file(&self, path: &Path, format: SeedFormat) -> SeedingResult<SeedData> {
		let content = {
			let mut file = File::open(path)?;
			let mut content = String::new();
			file.read_to_string(&mut content)?;
			content
		};

		self.parse_str(&content, format)
			.map_err(|message| SeedingError::Parse {
				path: path.to_path_buf(),
				message,
			})
	}

	/// Parses seed content from a string.
	///
	/// Errors are returned as plain messages so the caller can attach the
	/// source they came from.
	pub fn parse_str(&self, content: &str, format: SeedFormat) -> Result<SeedData, String> {
		match format {
			SeedFormat::Json => {
				let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
				self.parse_document(value)
			}
			SeedFormat::Yaml => self.parse_yaml(content),
			SeedFormat::Csv => self.parse_csv(content),
		}
	}

	#[cfg(feature = "yaml")]
	fn parse_yaml(&self, content: &str) -> Result<SeedData, String> {
		if content.trim().is_empty() {
			return Ok(SeedData::default());
		}
		let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
		self.parse_document(value)
	}

	/// Stub for YAML parsing when the feature is not enabled.
	#[cfg(not(feature = "yaml"))]
	fn parse_yaml(&self, _content: &str) -> Result<SeedData, String> {
		Err("YAML support requires the 'yaml' feature".to_string())
	}

	#[cfg(feature = "csv")]
	fn parse_csv(&self, content: &str) -> Result<SeedData, String> {
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(true)
			.trim(csv::Trim::Headers)
			.from_reader(content.as_bytes());

		let headers = reader
			.headers()
			.map_err(|e| format!("Failed to read CSV headers: {}", e))?
			.clone();

		let mut records = Vec::new();
		for (idx, row) in reader.records().enumerate() {
			let row = row.map_err(|e| format!("Row {}: {}", idx + 1, e))?;
			let record: RawRecord = headers
				.iter()
				.zip(row.iter())
				.map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
				.collect();
			records.push(record);
		}

		Ok(SeedData {
			records,
			options: SeedOptions::default(),
		})
	}

	/// Stub for CSV parsing when the feature is not enabled.
	#[cfg(not(feature = "csv"))]
	fn parse_csv(&self, _content: &str) -> Result<SeedData, String> {
		Err("CSV support requires the 'csv' feature".to_string())
	}

	/// Splits a parsed document into records and options.
	fn parse_document(&self, value: Value) -> Result<SeedData, String> {
		let (records, options) = match value {
			Value::Null => return Ok(SeedData::default()),
			Value::Array(records) => (records, SeedOptions::default()),
			Value::Object(mut document) => {
				let options = document
					.remove("options")
					.map(|options| SeedOptions::from_value(&options))
					.transpose()
					.map_err(|e| e.to_string())?
					.unwrap_or_default();
				let records = match document.remove("records") {
					None | Some(Value::Null) => Vec::new(),
					Some(Value::Array(records)) => records,
					Some(other) => return Err(format!("records must be a sequence, got {}", other)),
				};
				(records, options)
			}
			other => return Err(format!("Expected records or a sequence, got {}", other)),
		};

		let records = records
			.into_iter()
			.enumerate()
			.map(|(idx, record)| match record {
				Value::Object(fields) => Ok(fields),
				other => Err(format!("Invalid record at index {}: expected a mapping, got {}", idx, other)),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(SeedData { records, options })
	}
}
