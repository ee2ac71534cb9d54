//! Dependency graph of a planting run.
//!
//! One node per hopper entry, keyed by the entry's [`Dependency`]. An edge
//! `a -> b` means entry `a` references entry `b` and must be planted after
//! it. References to identities outside the run add no edge; they are
//! expected to resolve from the [`RecordStore`](super::RecordStore).
//!
//! # Examples
//!
//! ```
//! use sprig_seeding::seed::{Dependency, SeedGraph};
//!
//! let mut graph = SeedGraph::new();
//! let book = graph.add_node(Dependency::new("Book", "b1")).unwrap();
//! let author = graph.add_node(Dependency::new("Author", "a1")).unwrap();
//! graph.add_dependency(book, &Dependency::new("Author", "a1"));
//!
//! assert_eq!(graph.topological_sort().unwrap(), vec![author, book]);
//! ```

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::{Dependency, Entry};
use crate::error::{SeedingError, SeedingResult};

/// A node of the seed graph.
#[derive(Debug, Clone)]
pub struct SeedNode {
	identity: Dependency,
	/// Nodes this node must be planted after.
	dependencies: Vec<usize>,
}

impl SeedNode {
	/// Returns the node's identity.
	pub fn identity(&self) -> &Dependency {
		&self.identity
	}

	/// Returns the indices of the nodes this node depends on.
	pub fn dependencies(&self) -> &[usize] {
		&self.dependencies
	}
}

/// Directed graph over the entries of one run.
///
/// Node indices are hopper positions.
#[derive(Debug, Clone, Default)]
pub struct SeedGraph {
	nodes: Vec<SeedNode>,
	index: HashMap<Dependency, usize>,
	/// Adjacency list: node -> nodes that depend on it
	dependents: Vec<Vec<usize>>,
}

impl SeedGraph {
	/// Creates an empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the graph for a hopper.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::DuplicateSymbolicId`] if two entries share an
	/// identity.
	pub fn from_hopper(hopper: &[Entry]) -> SeedingResult<Self> {
		let mut graph = Self::new();
		for entry in hopper {
			graph.add_node(entry.dependency_id())?;
		}

		let mut external = 0;
		for (node, entry) in hopper.iter().enumerate() {
			for dependency in entry.dependencies() {
				if !graph.add_dependency(node, dependency) {
					tracing::debug!(
						"{} references {} from outside this run",
						entry.dependency_id(),
						dependency
					);
					external += 1;
				}
			}
		}

		tracing::debug!(
			"Built seed graph with {} nodes, {} edges and {} external references",
			graph.node_count(),
			graph.edge_count(),
			external
		);
		Ok(graph)
	}

	/// Adds a node and returns its index.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::DuplicateSymbolicId`] if the identity is
	/// already present.
	pub fn add_node(&mut self, identity: Dependency) -> SeedingResult<usize> {
		if self.index.contains_key(&identity) {
			return Err(SeedingError::DuplicateSymbolicId {
				model: identity.model().to_string(),
				sprig_id: identity.sprig_id().to_string(),
			});
		}

		let node = self.nodes.len();
		self.index.insert(identity.clone(), node);
		self.nodes.push(SeedNode {
			identity,
			dependencies: Vec::new(),
		});
		self.dependents.push(Vec::new());
		Ok(node)
	}

	/// Records that `node` depends on `depends_on`.
	///
	/// Returns false, adding nothing, if `depends_on` is not a node of this
	/// graph.
	pub fn add_dependency(&mut self, node: usize, depends_on: &Dependency) -> bool {
		let Some(target) = self.position(depends_on) else {
			return false;
		};
		let Some(source) = self.nodes.get_mut(node) else {
			return false;
		};

		if !source.dependencies.contains(&target) {
			source.dependencies.push(target);
			self.dependents[target].push(node);
		}
		true
	}

	/// Returns the number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Returns the number of edges.
	pub fn edge_count(&self) -> usize {
		self.nodes.iter().map(|node| node.dependencies.len()).sum()
	}

	/// Returns a node by index.
	pub fn node(&self, node: usize) -> Option<&SeedNode> {
		self.nodes.get(node)
	}

	/// Returns the index of the node with the given identity.
	pub fn position(&self, identity: &Dependency) -> Option<usize> {
		self.index.get(identity).copied()
	}

	/// Returns the nodes that depend directly on `node`.
	pub fn dependents(&self, node: usize) -> &[usize] {
		self.dependents.get(node).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Orders the nodes so that every node follows its dependencies.
	///
	/// Kahn's algorithm with a min-heap in place of the queue: of the nodes
	/// that are ready, the one added first goes first. A graph without edges
	/// therefore sorts to insertion order.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::CycleDetected`] naming the nodes that sit on
	/// or between cycles.
	pub fn topological_sort(&self) -> SeedingResult<Vec<usize>> {
		let mut in_degree: Vec<usize> = self.nodes.iter().map(|node| node.dependencies.len()).collect();

		let mut ready: BinaryHeap<Reverse<usize>> = in_degree
			.iter()
			.enumerate()
			.filter(|(_, degree)| **degree == 0)
			.map(|(node, _)| Reverse(node))
			.collect();

		let mut sorted = Vec::with_capacity(self.nodes.len());
		while let Some(Reverse(node)) = ready.pop() {
			sorted.push(node);

			for &dependent in &self.dependents[node] {
				in_degree[dependent] -= 1;
				if in_degree[dependent] == 0 {
					ready.push(Reverse(dependent));
				}
			}
		}

		if sorted.len() != self.nodes.len() {
			return Err(SeedingError::CycleDetected {
				identities: self.cycle_members(&in_degree),
			});
		}

		Ok(sorted)
	}

	/// Narrows the nodes left over by Kahn's algorithm to those on a cycle.
	///
	/// Leftover nodes that merely depend on a cycle are peeled off in
	/// reverse: a leftover node with no leftover dependents cannot be on one.
	fn cycle_members(&self, in_degree: &[usize]) -> Vec<Dependency> {
		let mut remaining: Vec<bool> = in_degree.iter().map(|degree| *degree > 0).collect();

		let mut out_degree: Vec<usize> = (0..self.nodes.len())
			.map(|node| {
				self.dependents[node]
					.iter()
					.filter(|dependent| remaining[**dependent])
					.count()
			})
			.collect();

		let mut stack: Vec<usize> = (0..self.nodes.len())
			.filter(|node| remaining[*node] && out_degree[*node] == 0)
			.collect();

		while let Some(node) = stack.pop() {
			remaining[node] = false;
			for &dependency in &self.nodes[node].dependencies {
				if remaining[dependency] {
					out_degree[dependency] -= 1;
					if out_degree[dependency] == 0 {
						stack.push(dependency);
					}
				}
			}
		}

		self.nodes
			.iter()
			.enumerate()
			.filter(|(node, _)| remaining[*node])
			.map(|(_, node)| node.identity.clone())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn graph_of(identities: &[(&str, &str)]) -> SeedGraph {
		let mut graph = SeedGraph::new();
		for (model, id) in identities {
			graph.add_node(Dependency::new(*model, *id)).unwrap();
		}
		graph
	}

	fn cycle_identities(result: SeedingResult<Vec<usize>>) -> Vec<String> {
		match result {
			Err(SeedingError::CycleDetected { identities }) => {
				identities.iter().map(ToString::to_string).collect()
			}
			other => panic!("expected CycleDetected, got {:?}", other),
		}
	}

	#[rstest]
	fn test_no_edges_keeps_insertion_order() {
		// Arrange
		let graph = graph_of(&[("Post", "3"), ("Author", "1"), ("Post", "1")]);

		// Act
		let order = graph.topological_sort().unwrap();

		// Assert
		assert_eq!(order, vec![0, 1, 2]);
	}

	#[rstest]
	fn test_dependency_moves_ahead_and_ties_follow_insertion_order() {
		// Arrange
		let mut graph = graph_of(&[("Book", "b1"), ("Tag", "t1"), ("Author", "a1"), ("Book", "b2")]);
		graph.add_dependency(0, &Dependency::new("Author", "a1"));
		graph.add_dependency(3, &Dependency::new("Author", "a1"));

		// Act
		let order = graph.topological_sort().unwrap();

		// Assert
		assert_eq!(order, vec![1, 2, 0, 3]);
	}

	#[rstest]
	fn test_chain() {
		let mut graph = graph_of(&[("C", "1"), ("B", "1"), ("A", "1")]);
		graph.add_dependency(0, &Dependency::new("B", "1"));
		graph.add_dependency(1, &Dependency::new("A", "1"));

		assert_eq!(graph.topological_sort().unwrap(), vec![2, 1, 0]);
	}

	#[rstest]
	fn test_external_dependency_adds_no_edge() {
		let mut graph = graph_of(&[("Book", "b1")]);

		let added = graph.add_dependency(0, &Dependency::new("Author", "elsewhere"));

		assert!(!added);
		assert_eq!(graph.edge_count(), 0);
		assert_eq!(graph.topological_sort().unwrap(), vec![0]);
	}

	#[rstest]
	fn test_repeated_edge_is_counted_once() {
		let mut graph = graph_of(&[("Book", "b1"), ("Author", "a1")]);
		graph.add_dependency(0, &Dependency::new("Author", "a1"));
		graph.add_dependency(0, &Dependency::new("Author", "a1"));

		assert_eq!(graph.edge_count(), 1);
		assert_eq!(graph.dependents(1), &[0]);
	}

	#[rstest]
	fn test_duplicate_node_rejected() {
		let mut graph = graph_of(&[("Author", "a1")]);

		let result = graph.add_node(Dependency::new("Author", "a1"));

		assert!(matches!(result, Err(SeedingError::DuplicateSymbolicId { .. })));
	}

	#[rstest]
	fn test_two_node_cycle() {
		let mut graph = graph_of(&[("Post", "a"), ("Author", "b")]);
		graph.add_dependency(0, &Dependency::new("Author", "b"));
		graph.add_dependency(1, &Dependency::new("Post", "a"));

		assert_eq!(
			cycle_identities(graph.topological_sort()),
			vec!["Post(a)", "Author(b)"]
		);
	}

	#[rstest]
	fn test_self_reference_is_a_cycle() {
		let mut graph = graph_of(&[("Post", "a"), ("Post", "b")]);
		graph.add_dependency(0, &Dependency::new("Post", "a"));

		assert_eq!(cycle_identities(graph.topological_sort()), vec!["Post(a)"]);
	}

	#[rstest]
	fn test_cycle_report_excludes_downstream_nodes() {
		// Arrange: A <-> B, C depends on A, D is independent
		let mut graph = graph_of(&[("A", "1"), ("B", "1"), ("C", "1"), ("D", "1")]);
		graph.add_dependency(0, &Dependency::new("B", "1"));
		graph.add_dependency(1, &Dependency::new("A", "1"));
		graph.add_dependency(2, &Dependency::new("A", "1"));

		// Act
		let identities = cycle_identities(graph.topological_sort());

		// Assert
		assert_eq!(identities, vec!["A(1)", "B(1)"]);
	}
}
