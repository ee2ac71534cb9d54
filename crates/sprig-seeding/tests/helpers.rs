//! Test helpers for sprig-seeding integration tests.
//!
//! This module provides a temporary seed directory and the models the
//! scenarios plant into.

#[path = "helpers/seed_dir.rs"]
pub mod seed_dir;

pub use seed_dir::SeedDir;
