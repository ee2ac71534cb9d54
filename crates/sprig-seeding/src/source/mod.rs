//! Seed file discovery and parsing.
//!
//! - [`SourceResolver`] finds `<table>.<ext>` inside a seed directory
//! - [`SeedFormat`] picks a parser from the file extension
//! - [`SeedParser`] turns file content into records and options
//! - [`Datasource`] ties the three together

mod datasource;
mod format;
mod parser;
mod resolver;

pub use datasource::{Datasource, SourceArgs};
pub use format::SeedFormat;
pub use parser::{SeedData, SeedParser};
pub use resolver::SourceResolver;
