//! Directives: "seed this model from this source".

use std::fmt;
use std::sync::Arc;

use super::{Entry, EntryFactory, SeedOptions};
use crate::conf::SeedSettings;
use crate::error::SeedingResult;
use crate::model::{ModelBackend, ModelIdentity, ModelRegistry};
use crate::source::{Datasource, SourceArgs};

/// Binds a model to a datasource and option overrides.
pub struct Directive {
	model: Arc<dyn ModelBackend>,
	datasource: Datasource,
	options: SeedOptions,
}

impl Directive {
	/// Creates a directive for an explicit datasource.
	pub fn new(model: Arc<dyn ModelBackend>, datasource: Datasource) -> Self {
		Self {
			model,
			datasource,
			options: SeedOptions::default(),
		}
	}

	/// Creates a directive reading `<table>.<ext>` from the seed directory,
	/// where `<table>` is the model's [table name](table_name).
	///
	/// # Errors
	///
	/// Fails if the seed file cannot be found or parsed.
	pub fn load(model: Arc<dyn ModelBackend>, settings: &SeedSettings) -> SeedingResult<Self> {
		Self::load_with(model, settings, SourceArgs::default())
	}

	/// Like [`Directive::load`], with per-source overrides.
	pub fn load_with(
		model: Arc<dyn ModelBackend>,
		settings: &SeedSettings,
		args: SourceArgs,
	) -> SeedingResult<Self> {
		let table = table_name(model.model_name());
		let datasource = Datasource::load_with(&table, settings, args)?;
		Ok(Self::new(model, datasource))
	}

	/// Creates a directive for a registered model, reading its default seed
	/// file.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::ModelNotFound`](crate::error::SeedingError::ModelNotFound)
	/// for unregistered models, and file errors as [`Directive::load`] does.
	pub fn from_registry<M: ModelIdentity + ?Sized>(
		registry: &ModelRegistry,
		model: &M,
		settings: &SeedSettings,
	) -> SeedingResult<Self> {
		Self::load(registry.get(model)?, settings)
	}

	/// Sets option overrides. They win over the datasource's own options.
	pub fn with_options(mut self, options: SeedOptions) -> Self {
		self.options = options;
		self
	}

	/// Returns the target model.
	pub fn model(&self) -> &Arc<dyn ModelBackend> {
		&self.model
	}

	/// Returns the datasource.
	pub fn datasource(&self) -> &Datasource {
		&self.datasource
	}

	/// Returns the option overrides.
	pub fn options(&self) -> &SeedOptions {
		&self.options
	}

	/// Turns the directive into an entry factory.
	pub fn into_factory(self) -> EntryFactory {
		EntryFactory::new(self.model, self.datasource, &self.options)
	}
}

impl fmt::Debug for Directive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Directive")
			.field("model", &self.model.model_name())
			.field("datasource", &self.datasource)
			.field("options", &self.options)
			.finish()
	}
}

/// The directives of one run, in declaration order.
#[derive(Debug, Default)]
pub struct DirectiveList {
	directives: Vec<Directive>,
}

impl DirectiveList {
	/// Creates a list from directives.
	pub fn new(directives: Vec<Directive>) -> Self {
		Self { directives }
	}

	/// Appends a directive.
	pub fn push(&mut self, directive: Directive) {
		self.directives.push(directive);
	}

	/// Returns the number of directives.
	pub fn len(&self) -> usize {
		self.directives.len()
	}

	/// Returns true if the list is empty.
	pub fn is_empty(&self) -> bool {
		self.directives.is_empty()
	}

	/// Appends every directive's entries to `hopper`, directive by directive.
	pub fn add_seeds_to_hopper(self, hopper: &mut Vec<Entry>) {
		for directive in self.directives {
			Arc::new(directive.into_factory()).add_seeds_to_hopper(hopper);
		}
	}

	/// Returns a fresh hopper holding every directive's entries.
	pub fn into_hopper(self) -> Vec<Entry> {
		let mut hopper = Vec::new();
		self.add_seeds_to_hopper(&mut hopper);
		hopper
	}
}

impl From<Vec<Directive>> for DirectiveList {
	fn from(directives: Vec<Directive>) -> Self {
		Self::new(directives)
	}
}

impl FromIterator<Directive> for DirectiveList {
	fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

/// Derives the seed file name of a model: snake case, pluralized.
///
/// Namespace separators become underscores.
///
/// # Examples
///
/// ```
/// use sprig_seeding::seed::table_name;
///
/// assert_eq!(table_name("Author"), "authors");
/// assert_eq!(table_name("BlogPost"), "blog_posts");
/// assert_eq!(table_name("Category"), "categories");
/// assert_eq!(table_name("Admin::User"), "admin_users");
/// ```
pub fn table_name(model: &str) -> String {
	let chars: Vec<char> = model.trim().chars().collect();
	let mut snake = String::with_capacity(chars.len() + 4);
	let mut prev_was_separator = true;

	for (i, &ch) in chars.iter().enumerate() {
		if matches!(ch, ':' | '_' | '-' | ' ' | '.') {
			if !prev_was_separator {
				snake.push('_');
			}
			prev_was_separator = true;
		} else if ch.is_ascii_uppercase() {
			if !prev_was_separator {
				let prev = chars[i - 1];
				let next = chars.get(i + 1);
				// Split camelCase boundaries and the end of acronyms (HTTPRequest)
				if prev.is_ascii_lowercase()
					|| prev.is_ascii_digit()
					|| (prev.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase()))
				{
					snake.push('_');
				}
			}
			snake.push(ch.to_ascii_lowercase());
			prev_was_separator = false;
		} else {
			snake.push(ch);
			prev_was_separator = false;
		}
	}

	pluralize(snake.trim_end_matches('_'))
}

fn pluralize(word: &str) -> String {
	if word.is_empty() {
		return String::new();
	}
	if let Some(stem) = word.strip_suffix('y')
		&& !stem.is_empty()
		&& !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
	{
		return format!("{}ies", stem);
	}
	if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
		return format!("{}es", word);
	}
	format!("{}s", word)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::SeedingError;
	use crate::memory::InMemoryBackend;
	use crate::seed::RawRecord;
	use rstest::rstest;
	use serde_json::json;
	use std::fs;
	use tempfile::TempDir;

	#[rstest]
	#[case("Author", "authors")]
	#[case("BlogPost", "blog_posts")]
	#[case("HTTPRequest", "http_requests")]
	#[case("Category", "categories")]
	#[case("Day", "days")]
	#[case("Box", "boxes")]
	#[case("Address", "addresses")]
	#[case("Branch", "branches")]
	#[case("Admin::User", "admin_users")]
	fn test_table_name(#[case] model: &str, #[case] expected: &str) {
		assert_eq!(table_name(model), expected);
	}

	#[rstest]
	fn test_from_registry_loads_table_file() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let settings = SeedSettings::new().with_root(dir.path()).with_environment("test");
		fs::create_dir_all(settings.directory()).unwrap();
		fs::write(
			settings.directory().join("blog_posts.json"),
			r#"[{"sprig_id": 1, "title": "Hi"}]"#,
		)
		.unwrap();
		let registry = ModelRegistry::new();
		registry.register(InMemoryBackend::new("BlogPost"));

		// Act
		let directive = Directive::from_registry(&registry, "BlogPost", &settings).unwrap();

		// Assert
		assert_eq!(directive.model().model_name(), "BlogPost");
		assert_eq!(directive.datasource().records().len(), 1);
	}

	#[rstest]
	fn test_from_registry_unknown_model() {
		let settings = SeedSettings::new();
		let registry = ModelRegistry::new();

		let result = Directive::from_registry(&registry, "Ghost", &settings);

		assert!(matches!(result, Err(SeedingError::ModelNotFound(_))));
	}

	#[rstest]
	fn test_directive_list_fills_hopper_in_order() {
		let records = |ids: &[&str]| -> Vec<RawRecord> {
			ids.iter()
				.map(|id| serde_json::from_value(json!({"sprig_id": id})).unwrap())
				.collect()
		};
		let list: DirectiveList = vec![
			Directive::new(
				Arc::new(InMemoryBackend::new("Author")),
				Datasource::from_records(records(&["a1", "a2"]), SeedOptions::new()),
			),
			Directive::new(
				Arc::new(InMemoryBackend::new("Book")),
				Datasource::from_records(records(&["b1"]), SeedOptions::new()),
			),
		]
		.into();

		let hopper = list.into_hopper();

		let identities: Vec<_> = hopper.iter().map(|entry| entry.dependency_id().to_string()).collect();
		assert_eq!(identities, vec!["Author(a1)", "Author(a2)", "Book(b1)"]);
	}
}
