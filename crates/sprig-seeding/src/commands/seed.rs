//! seed command implementation.
//!
//! This command plants the seed files of the named models.

use std::path::PathBuf;
use std::sync::Arc;

use crate::conf::SeedSettings;
use crate::error::{SeedingError, SeedingResult};
use crate::model::ModelRegistry;
use crate::seed::{Directive, DirectiveList, FailurePolicy, PlantReport, Planter, RecordStore};

/// Arguments for the seed command.
#[derive(Debug, Clone, Default)]
pub struct SeedArgs {
	/// Registered model names, in planting-declaration order.
	pub models: Vec<String>,
}

/// Options for the seed command.
#[derive(Debug, Clone, Default)]
pub struct SeedCommandOptions {
	/// Environment subdirectory override.
	pub environment: Option<String>,

	/// Base seed directory override.
	pub base_directory: Option<PathBuf>,

	/// Forget previously planted records before the run.
	pub reset_store: bool,

	/// Failure policy for rejected entries.
	pub policy: FailurePolicy,

	/// Verbosity level.
	pub verbosity: u8,
}

impl SeedCommandOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the environment override.
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	/// Sets the base directory override.
	pub fn with_base_directory(mut self, base_directory: impl Into<PathBuf>) -> Self {
		self.base_directory = Some(base_directory.into());
		self
	}

	/// Sets the reset-store flag.
	pub fn with_reset_store(mut self, reset: bool) -> Self {
		self.reset_store = reset;
		self
	}

	/// Sets the failure policy.
	pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Sets verbosity level.
	pub fn with_verbosity(mut self, level: u8) -> Self {
		self.verbosity = level;
		self
	}
}

/// The seed command for planting seed files.
///
/// # Example
///
/// ```ignore
/// let command = SeedCommand::new(registry, SeedSettings::new());
/// let args = SeedArgs {
///     models: vec!["Author".to_string(), "Book".to_string()],
/// };
/// let options = SeedCommandOptions::new().with_verbosity(1);
/// let report = command.execute(args, options).await?;
/// println!("Planted {} records", report.planted.len());
/// ```
#[derive(Debug)]
pub struct SeedCommand {
	registry: Arc<ModelRegistry>,
	settings: SeedSettings,
	store: Arc<RecordStore>,
}

impl SeedCommand {
	/// Creates a seed command planting into the global store.
	pub fn new(registry: Arc<ModelRegistry>, settings: SeedSettings) -> Self {
		Self {
			registry,
			settings,
			store: RecordStore::global(),
		}
	}

	/// Plants into `store` instead of the global store.
	pub fn with_store(mut self, store: Arc<RecordStore>) -> Self {
		self.store = store;
		self
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"seed"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Plants seed files for the named models in dependency order"
	}

	/// Returns the command help text.
	pub fn help(&self) -> &str {
		r#"
Usage: seed [options] model [model ...]

Plants the seed files of the named models in dependency order.

Arguments:
  model                 One or more registered model names

Options:
  --environment ENV     Seed environment (default: SPRIG_ENV, APP_ENV or development)
  --base-directory DIR  Base seed directory (default: db/seeds)
  --reset               Forget previously planted records first
  --continue            Keep planting after a record fails validation
  --verbosity LEVEL     Verbosity level (0=minimal, 1=normal, 2=verbose)
"#
	}

	/// Executes the seed command.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::InvalidArgument`] if no model is named, and
	/// any error of the run itself.
	pub async fn execute(
		&self,
		args: SeedArgs,
		options: SeedCommandOptions,
	) -> SeedingResult<PlantReport> {
		if args.models.is_empty() {
			return Err(SeedingError::InvalidArgument {
				field: "models".to_string(),
				message: "At least one model must be specified".to_string(),
			});
		}

		let mut settings = self.settings.clone();
		if let Some(environment) = options.environment {
			settings.environment = environment;
		}
		if let Some(base_directory) = options.base_directory {
			settings.base_directory = base_directory;
		}

		// Seed files are read synchronously
		let registry = Arc::clone(&self.registry);
		let directives = tokio::task::spawn_blocking(move || {
			args.models
				.iter()
				.map(|model| Directive::from_registry(&registry, model.as_str(), &settings))
				.collect::<SeedingResult<DirectiveList>>()
		})
		.await
		.map_err(|e| SeedingError::Io(std::io::Error::other(e)))??;

		if options.reset_store {
			self.store.reset();
		}

		let report = Planter::new(directives.into_hopper())
			.with_store(Arc::clone(&self.store))
			.with_policy(options.policy)
			.sprig()
			.await?;

		if options.verbosity > 0 {
			self.print_report(&report, options.verbosity);
		}

		Ok(report)
	}

	/// Prints the run summary.
	fn print_report(&self, report: &PlantReport, verbosity: u8) {
		println!("{}", report);

		if verbosity > 1 {
			for identity in &report.planted {
				println!("  planted {}", identity);
			}
		}

		if !report.skipped.is_empty() {
			println!("Skipped: {}", join(&report.skipped));
		}

		if !report.failed.is_empty() {
			eprintln!("Failures:");
			for (identity, errors) in &report.failed {
				eprintln!("  - {}: {}", identity, errors.to_string().replace('\n', "; "));
			}
		}
	}
}

fn join<T: ToString>(items: &[T]) -> String {
	items
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}
