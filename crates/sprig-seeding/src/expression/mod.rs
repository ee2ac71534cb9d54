//! Computed attribute values.
//!
//! A string attribute is computed when it contains an ERB-style bracket,
//! `<%= body %>` or `<% body %>`. The whole value is replaced by the result of
//! evaluating `body` (see [`evaluate`]).
//!
//! Dependencies are found syntactically: every `sprig_record(Model, id)` call
//! inside a body yields a [`Dependency`], whether or not evaluation would
//! actually reach it.

mod eval;
mod parser;

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;

use crate::seed::Dependency;

pub use eval::{EvalContext, evaluate, resolve_computed};
pub use parser::{Expr, parse_expression};

static COMPUTED_VALUE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<%=?(.*)%>").expect("COMPUTED_VALUE: invalid regex pattern"));

static SPRIG_RECORD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"sprig_record\(\s*([A-Z][^,\s]*)\s*,\s*(?:([^"'\s)]+)|"([^"]*)"|'([^']*)')\s*\)"#,
	)
	.expect("SPRIG_RECORD: invalid regex pattern")
});

/// Returns the expression body if `value` is a computed value.
pub fn computed_body(value: &str) -> Option<&str> {
	COMPUTED_VALUE
		.captures(value)
		.and_then(|caps| caps.get(1))
		.map(|body| body.as_str())
}

/// Returns every `sprig_record` reference inside an expression body.
pub fn references(body: &str) -> Vec<Dependency> {
	SPRIG_RECORD
		.captures_iter(body)
		.filter_map(|caps| {
			let model = caps.get(1)?.as_str();
			let id = caps
				.get(2)
				.or_else(|| caps.get(3))
				.or_else(|| caps.get(4))?
				.as_str();
			Some(Dependency::new(model, id))
		})
		.collect()
}

/// Collects the dependencies of a raw value, descending into sequences and
/// mappings.
pub fn collect_dependencies(value: &Value, found: &mut IndexSet<Dependency>) {
	match value {
		Value::String(s) => {
			if let Some(body) = computed_body(s) {
				found.extend(references(body));
			}
		}
		Value::Array(items) => {
			for item in items {
				collect_dependencies(item, found);
			}
		}
		Value::Object(map) => {
			for item in map.values() {
				collect_dependencies(item, found);
			}
		}
		_ => {}
	}
}
