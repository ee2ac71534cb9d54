//! The planter: persists a hopper in dependency order.

use std::fmt;
use std::sync::Arc;

use super::{Dependency, Entry, RecordStore, SeedGraph};
use crate::error::{SeedingError, SeedingResult};
use crate::model::FieldErrors;

/// What to do when the backend rejects an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
	/// Stop the run with [`SeedingError::ValidationFailure`].
	#[default]
	Abort,
	/// Record the failure and keep going. Entries that depend on a failed
	/// entry, directly or not, are skipped.
	Continue,
}

/// Outcome of a planting run.
#[derive(Debug, Clone, Default)]
pub struct PlantReport {
	/// Planted identities, in execution order.
	pub planted: Vec<Dependency>,
	/// Rejected identities and their validation messages.
	pub failed: Vec<(Dependency, FieldErrors)>,
	/// Identities not attempted because a dependency failed.
	pub skipped: Vec<Dependency>,
}

impl PlantReport {
	/// Returns true if every entry was planted.
	pub fn is_success(&self) -> bool {
		self.failed.is_empty() && self.skipped.is_empty()
	}

	/// Returns the number of entries the run covered.
	pub fn total(&self) -> usize {
		self.planted.len() + self.failed.len() + self.skipped.len()
	}
}

impl fmt::Display for PlantReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Planted {} seed(s), {} failed, {} skipped",
			self.planted.len(),
			self.failed.len(),
			self.skipped.len()
		)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
	Pending,
	Planted,
	Failed,
	Skipped,
}

/// Plants every entry of a hopper.
#[derive(Debug)]
pub struct Planter {
	hopper: Vec<Entry>,
	store: Arc<RecordStore>,
	policy: FailurePolicy,
}

impl Planter {
	/// Creates a planter writing to the global [`RecordStore`].
	pub fn new(hopper: Vec<Entry>) -> Self {
		Self {
			hopper,
			store: RecordStore::global(),
			policy: FailurePolicy::default(),
		}
	}

	/// Writes to `store` instead of the global store.
	pub fn with_store(mut self, store: Arc<RecordStore>) -> Self {
		self.store = store;
		self
	}

	/// Sets the failure policy.
	pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Returns the hopper.
	pub fn hopper(&self) -> &[Entry] {
		&self.hopper
	}

	/// Returns the store planted records are registered in.
	pub fn store(&self) -> &Arc<RecordStore> {
		&self.store
	}

	/// Returns the hopper positions in the order they would be planted.
	///
	/// # Errors
	///
	/// Fails with [`SeedingError::DuplicateSymbolicId`] or
	/// [`SeedingError::CycleDetected`].
	pub fn execution_order(&self) -> SeedingResult<Vec<usize>> {
		SeedGraph::from_hopper(&self.hopper)?.topological_sort()
	}

	/// Plants every entry.
	///
	/// Nothing is persisted if the graph is invalid. Under
	/// [`FailurePolicy::Abort`] the run stops at the first rejected entry;
	/// entries planted before it stay planted.
	///
	/// # Errors
	///
	/// Returns graph errors, [`SeedingError::ValidationFailure`] under the
	/// abort policy, and any error raised while resolving or saving an entry.
	pub async fn sprig(mut self) -> SeedingResult<PlantReport> {
		let graph = SeedGraph::from_hopper(&self.hopper)?;
		let order = graph.topological_sort()?;

		let mut outcomes = vec![Outcome::Pending; self.hopper.len()];
		let mut report = PlantReport::default();

		for node in order {
			let entry = &mut self.hopper[node];
			let blocked = graph.node(node).is_some_and(|seed| {
				seed.dependencies()
					.iter()
					.any(|dependency| matches!(outcomes[*dependency], Outcome::Failed | Outcome::Skipped))
			});
			if blocked {
				tracing::warn!(
					"Skipping {} with sprig_id {}: a dependency was not saved.",
					entry.model_name(),
					entry.sprig_id()
				);
				outcomes[node] = Outcome::Skipped;
				report.skipped.push(entry.dependency_id());
				continue;
			}

			entry.before_save(&self.store).await?;
			if entry.save_record(&self.store).await? {
				entry.save_to_store(&self.store)?;
				tracing::info!("{}", entry.success_log_text());
				outcomes[node] = Outcome::Planted;
				report.planted.push(entry.dependency_id());
				continue;
			}

			tracing::error!("{}", entry.error_log_text());
			match self.policy {
				FailurePolicy::Abort => {
					return Err(SeedingError::ValidationFailure {
						model: entry.model_name().to_string(),
						sprig_id: entry.sprig_id().to_string(),
						errors: entry.errors(),
					});
				}
				FailurePolicy::Continue => {
					outcomes[node] = Outcome::Failed;
					report.failed.push((entry.dependency_id(), entry.errors()));
				}
			}
		}

		tracing::info!("{}", report);
		Ok(report)
	}
}
