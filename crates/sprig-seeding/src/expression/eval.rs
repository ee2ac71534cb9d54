//! Evaluation of computed-expression bodies.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::computed_body;
use super::parser::{Expr, parse_expression};
use crate::conf::SeedSettings;
use crate::error::{SeedingError, SeedingResult};
use crate::model::SeedRecord;
use crate::seed::{Dependency, RecordStore};

/// What an expression can see while it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
	store: &'a RecordStore,
	settings: &'a SeedSettings,
}

impl<'a> EvalContext<'a> {
	/// Creates a context reading records from `store` and paths from `settings`.
	pub fn new(store: &'a RecordStore, settings: &'a SeedSettings) -> Self {
		Self { store, settings }
	}
}

/// Intermediate result of evaluating a sub-expression.
#[derive(Debug)]
enum Operand {
	Value(Value),
	/// An unbound name, such as a model token or an unquoted id.
	Token(String),
	Record(Arc<SeedRecord>),
}

struct Evaluator<'a, 'b> {
	ctx: &'b EvalContext<'a>,
	body: &'b str,
}

impl Evaluator<'_, '_> {
	fn error(&self, message: impl Into<String>) -> SeedingError {
		SeedingError::expression(self.body, message)
	}

	fn operand(&self, expr: &Expr) -> SeedingResult<Operand> {
		match expr {
			Expr::Literal(value) => Ok(Operand::Value(value.clone())),
			Expr::Bare(token) => Ok(Operand::Token(token.clone())),
			Expr::Ident(name) => Ok(self.ident(name)),
			Expr::Call { name, args } => self.call(name, args),
			Expr::Field { target, field } => {
				let target = self.operand(target)?;
				self.field(target, field)
			}
		}
	}

	fn ident(&self, name: &str) -> Operand {
		let settings = self.ctx.settings;
		match name {
			"seed_directory" => Operand::Value(path_value(&settings.directory())),
			"seed_base" => Operand::Value(path_value(&settings.seed_base())),
			"sprig_environment" => Operand::Value(Value::String(settings.environment.clone())),
			_ => Operand::Token(name.to_string()),
		}
	}

	fn call(&self, name: &str, args: &[Expr]) -> SeedingResult<Operand> {
		match (name, args) {
			("sprig_record", [model, id]) => {
				let model = match self.operand(model)? {
					Operand::Token(model) | Operand::Value(Value::String(model)) => model,
					other => return Err(self.error(format!("expected a model name, got {:?}", other))),
				};
				let dependency = match self.operand(id)? {
					Operand::Token(id) => Dependency::new(model.as_str(), id),
					Operand::Value(id) => Dependency::from_value(model.as_str(), &id),
					Operand::Record(_) => {
						return Err(self.error("a record cannot be used as a sprig_id"));
					}
				};
				Ok(Operand::Record(self.ctx.store.get(&dependency)?))
			}
			("sprig_file", [path]) => {
				let relative = match self.operand(path)? {
					Operand::Value(Value::String(path)) | Operand::Token(path) => path,
					other => return Err(self.error(format!("expected a file path, got {:?}", other))),
				};
				let path = self.ctx.settings.directory().join(&relative);
				if !path.is_file() {
					return Err(self.error(format!("file not found: {}", path.display())));
				}
				Ok(Operand::Value(path_value(&path)))
			}
			("sprig_record", _) | ("sprig_file", _) => Err(self.error(format!(
				"wrong number of arguments for {} ({})",
				name,
				args.len()
			))),
			_ => Err(self.error(format!("undefined function `{}`", name))),
		}
	}

	fn field(&self, target: Operand, field: &str) -> SeedingResult<Operand> {
		let value = match &target {
			Operand::Record(record) => record.get(field),
			Operand::Value(Value::Object(map)) => map.get(field),
			Operand::Value(other) => {
				return Err(self.error(format!("cannot read `{}` of {}", field, other)));
			}
			Operand::Token(name) => return Err(self.error(format!("undefined name `{}`", name))),
		};
		value
			.cloned()
			.map(Operand::Value)
			.ok_or_else(|| self.error(format!("undefined field `{}`", field)))
	}

	fn finish(&self, operand: Operand) -> SeedingResult<Value> {
		match operand {
			Operand::Value(value) => Ok(value),
			Operand::Record(record) => Ok(record.id().cloned().unwrap_or(Value::Null)),
			Operand::Token(name) => Err(self.error(format!("undefined name `{}`", name))),
		}
	}
}

fn path_value(path: &std::path::Path) -> Value {
	Value::String(path.display().to_string())
}

/// Evaluates one expression body.
///
/// # Errors
///
/// Returns [`SeedingError::Expression`] for malformed bodies and unknown
/// names, and [`SeedingError::RecordNotFound`] when `sprig_record` names a
/// record that has not been planted.
pub fn evaluate(body: &str, ctx: &EvalContext<'_>) -> SeedingResult<Value> {
	let evaluator = Evaluator { ctx, body };
	let expr = parse_expression(body).map_err(|message| evaluator.error(message))?;
	let operand = evaluator.operand(&expr)?;
	evaluator.finish(operand)
}

/// Replaces every computed string in `value` with its evaluated result.
pub fn resolve_computed(value: &Value, ctx: &EvalContext<'_>) -> SeedingResult<Value> {
	match value {
		Value::String(s) => match computed_body(s) {
			Some(body) => evaluate(body, ctx),
			None => Ok(value.clone()),
		},
		Value::Array(items) => items
			.iter()
			.map(|item| resolve_computed(item, ctx))
			.collect::<SeedingResult<Vec<_>>>()
			.map(Value::Array),
		Value::Object(map) => map
			.iter()
			.map(|(key, item)| resolve_computed(item, ctx).map(|item| (key.clone(), item)))
			.collect::<SeedingResult<Map<String, Value>>>()
			.map(Value::Object),
		_ => Ok(value.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::fs;
	use tempfile::TempDir;

	#[fixture]
	fn store() -> RecordStore {
		let store = RecordStore::new();
		let mut fields = Map::new();
		fields.insert("name".to_string(), json!("Ursula"));
		fields.insert("profile".to_string(), json!({"country": "US"}));
		store
			.save(
				Dependency::new("Author", "a1"),
				SeedRecord::with_pk("Author", json!(7), fields),
			)
			.unwrap();
		store
	}

	fn settings() -> SeedSettings {
		SeedSettings::new()
			.with_root("/srv/app")
			.with_base_directory("db/seeds")
			.with_environment("test")
	}

	#[rstest]
	#[case(r#"sprig_record(Author, "a1").id"#, json!(7))]
	#[case("sprig_record(Author, a1).name", json!("Ursula"))]
	#[case("sprig_record(Author, 'a1').profile.country", json!("US"))]
	#[case("sprig_record(Author, a1)", json!(7))]
	#[case("'literal'", json!("literal"))]
	#[case("12", json!(12))]
	#[case("nil", Value::Null)]
	#[case("sprig_environment", json!("test"))]
	#[case("seed_directory", json!("/srv/app/db/seeds/test"))]
	#[case("seed_base", json!("/srv/app/db/seeds"))]
	fn test_evaluate(store: RecordStore, #[case] body: &str, #[case] expected: Value) {
		let settings = settings();
		let ctx = EvalContext::new(&store, &settings);

		assert_eq!(evaluate(body, &ctx).unwrap(), expected);
	}

	#[rstest]
	fn test_evaluate_unquoted_numeric_id(store: RecordStore) {
		// Arrange
		store
			.save(Dependency::new("Author", "2"), SeedRecord::with_pk("Author", json!(9), Map::new()))
			.unwrap();
		let settings = settings();
		let ctx = EvalContext::new(&store, &settings);

		// Act
		let value = evaluate("sprig_record(Author, 2).id", &ctx).unwrap();

		// Assert
		assert_eq!(value, json!(9));
	}

	#[rstest]
	fn test_evaluate_unquoted_id_keeps_leading_zeros(store: RecordStore) {
		store
			.save(Dependency::new("Author", "007"), SeedRecord::with_pk("Author", json!(3), Map::new()))
			.unwrap();
		let settings = settings();
		let ctx = EvalContext::new(&store, &settings);

		let value = evaluate("sprig_record(Author, 007).id", &ctx).unwrap();

		assert_eq!(value, json!(3));
	}

	#[rstest]
	fn test_evaluate_missing_record(store: RecordStore) {
		let settings = settings();
		let ctx = EvalContext::new(&store, &settings);

		let result = evaluate("sprig_record(Author, missing).id", &ctx);

		assert!(matches!(result, Err(SeedingError::RecordNotFound { .. })));
	}

	#[rstest]
	#[case("sprig_record(Author, a1).nope")]
	#[case("unknown_helper(1)")]
	#[case("sprig_record(Author)")]
	#[case("SomeConstant")]
	#[case("1 +")]
	fn test_evaluate_errors(store: RecordStore, #[case] body: &str) {
		let settings = settings();
		let ctx = EvalContext::new(&store, &settings);

		let result = evaluate(body, &ctx);

		assert!(matches!(result, Err(SeedingError::Expression { .. })));
	}

	#[rstest]
	fn test_sprig_file_resolves_under_seed_directory(store: RecordStore) {
		// Arrange
		let dir = TempDir::new().unwrap();
		let settings = SeedSettings::new()
			.with_root(dir.path())
			.with_environment("test");
		let files = settings.directory().join("files");
		fs::create_dir_all(&files).unwrap();
		fs::write(files.join("avatar.png"), b"png").unwrap();
		let ctx = EvalContext::new(&store, &settings);

		// Act
		let value = evaluate("sprig_file('files/avatar.png')", &ctx).unwrap();

		// Assert
		assert_eq!(value, path_value(&files.join("avatar.png")));
		assert!(evaluate("sprig_file('files/missing.png')", &ctx).is_err());
	}

	#[rstest]
	fn test_resolve_computed_replaces_nested_values(store: RecordStore) {
		let settings = settings();
		let ctx = EvalContext::new(&store, &settings);
		let raw = json!({
			"author_id": "<%= sprig_record(Author, 'a1').id %>",
			"names": ["<%= sprig_record(Author, a1).name %>", "plain"],
			"count": 3
		});

		let resolved = resolve_computed(&raw, &ctx).unwrap();

		assert_eq!(
			resolved,
			json!({"author_id": 7, "names": ["Ursula", "plain"], "count": 3})
		);
	}
}
