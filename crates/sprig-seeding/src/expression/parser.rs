//! Grammar for computed-expression bodies.
//!
//! The grammar is deliberately closed:
//!
//! ```text
//! expr     := primary ('.' identifier)*
//! primary  := string | number | identifier ['(' [argument (',' argument)*] ')']
//! argument := expr | bare-token
//! ```
//!
//! `true`, `false`, `nil` and `null` are literals. A bare token (for
//! example `1abc` in `sprig_record(Post, 1abc)`) is any run of characters
//! without whitespace, quotes, commas or closing parentheses. A number or
//! keyword standing alone as an argument is kept as a bare token, so
//! `sprig_record(Post, 007)` names the id `007`, not `7`.

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::{tag, take_while, take_while1},
	character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
	combinator::{all_consuming, map, opt, peek, recognize},
	multi::{many0, many0_count, separated_list0},
	sequence::{delimited, pair, preceded, terminated},
};
use serde_json::Value;

// ============================================================================
// AST Definitions
// ============================================================================

/// Parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	/// A literal value.
	Literal(Value),
	/// A bare identifier: a helper, a model token or a symbolic id.
	Ident(String),
	/// An unquoted argument that is not an identifier or a number.
	Bare(String),
	/// A function call.
	Call {
		/// Function name.
		name: String,
		/// Arguments in order.
		args: Vec<Expr>,
	},
	/// Field access on the value of `target`.
	Field {
		/// Expression whose value is accessed.
		target: Box<Expr>,
		/// Field name.
		field: String,
	},
}

// ============================================================================
// Nom Parsers
// ============================================================================

/// Parse an identifier; `::` separators are allowed for namespaced model names.
fn identifier(input: &str) -> IResult<&str, &str> {
	recognize(pair(
		alt((alpha1, tag("_"))),
		many0_count(alt((alphanumeric1, tag("_"), tag("::")))),
	))
	.parse(input)
}

fn quoted(input: &str) -> IResult<&str, Expr> {
	map(
		alt((
			delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
			delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
		)),
		|s: &str| Expr::Literal(Value::String(s.to_string())),
	)
	.parse(input)
}

/// Parse an integer or decimal literal. Exponents are not accepted, so that
/// unquoted hex ids such as `4e2f` are left to the bare-token parser.
fn number(input: &str) -> IResult<&str, Expr> {
	let digits = recognize(pair(
		opt(char('-')),
		pair(digit1, opt(pair(char('.'), digit1))),
	));
	map(digits, |s: &str| {
		let value = match s.parse::<i64>() {
			Ok(int) => Value::from(int),
			Err(_) => s.parse::<f64>().map(Value::from).unwrap_or(Value::Null),
		};
		Expr::Literal(value)
	})
	.parse(input)
}

fn keyword_or_ident(name: &str) -> Expr {
	match name {
		"true" => Expr::Literal(Value::Bool(true)),
		"false" => Expr::Literal(Value::Bool(false)),
		"nil" | "null" => Expr::Literal(Value::Null),
		_ => Expr::Ident(name.to_string()),
	}
}

fn argument_end(input: &str) -> IResult<&str, char> {
	preceded(multispace0, alt((char(','), char(')')))).parse(input)
}

fn literal_argument(input: &str) -> IResult<&str, Expr> {
	map(
		terminated(
			alt((
				recognize(number),
				tag("true"),
				tag("false"),
				tag("nil"),
				tag("null"),
			)),
			peek(argument_end),
		),
		|s: &str| Expr::Bare(s.to_string()),
	)
	.parse(input)
}

fn bare(input: &str) -> IResult<&str, Expr> {
	map(
		take_while1(|c: char| !c.is_whitespace() && !matches!(c, ',' | ')' | '"' | '\'')),
		|s: &str| Expr::Bare(s.to_string()),
	)
	.parse(input)
}

fn argument(input: &str) -> IResult<&str, Expr> {
	delimited(
		multispace0,
		alt((
			literal_argument,
			terminated(expr, peek(argument_end)),
			bare,
		)),
		multispace0,
	)
	.parse(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Expr>> {
	delimited(
		preceded(multispace0, char('(')),
		separated_list0(char(','), argument),
		preceded(multispace0, char(')')),
	)
	.parse(input)
}

fn call_or_ident(input: &str) -> IResult<&str, Expr> {
	map(pair(identifier, opt(arguments)), |(name, args)| match args {
		Some(args) => Expr::Call {
			name: name.to_string(),
			args,
		},
		None => keyword_or_ident(name),
	})
	.parse(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
	alt((quoted, number, call_or_ident)).parse(input)
}

fn expr(input: &str) -> IResult<&str, Expr> {
	map(
		pair(
			primary,
			many0(preceded(pair(multispace0, char('.')), identifier)),
		),
		|(target, fields)| {
			fields.into_iter().fold(target, |target, field| Expr::Field {
				target: Box::new(target),
				field: field.to_string(),
			})
		},
	)
	.parse(input)
}

/// Parses a complete expression body.
///
/// # Errors
///
/// Returns a description of where parsing stopped.
pub fn parse_expression(body: &str) -> Result<Expr, String> {
	all_consuming(delimited(multispace0, expr, multispace0))
		.parse(body)
		.map(|(_, expr)| expr)
		.map_err(|e| match e {
			nom::Err::Error(e) | nom::Err::Failure(e) => {
				format!("unexpected input at `{}`", e.input)
			}
			nom::Err::Incomplete(_) => "incomplete expression".to_string(),
		})
}
