//! Transpilation of JSON Schema documents into the schema languages of
//! downstream analytic systems: BigQuery table schemas and Avro record
//! schemas.
//!
//! The pipeline is `parse` (generic JSON value into the schema AST),
//! `normalise` (combinator folding and nullability resolution through the
//! merge lattice in [`unify`]), then one of the two synthesizers. Each
//! invocation owns its whole tree; there is no shared state, so concurrent
//! callers need no locks.

pub mod ast;
pub mod avro;
pub mod bigquery;
pub mod error;
pub mod normalise;
pub mod parse;
pub mod unify;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::error::{Result, TranspileError};

/// Knobs for a single transpile invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranspileConfig {
    /// Print merge and normalization decisions to stderr.
    pub debug: bool,
}

impl TranspileConfig {
    pub fn debug(&self, args: std::fmt::Arguments) {
        if self.debug {
            eprintln!("{}", args);
        }
    }
}

#[macro_export]
macro_rules! debug {
    ($cfg:expr, $($arg:tt)*) => {
        $cfg.debug(format_args!($($arg)*))
    };
}

/// Transpilation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Bigquery,
    Avro,
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "bigquery" => Ok(Target::Bigquery),
            "avro" => Ok(Target::Avro),
            other => Err(format!(
                "unknown target format: {other} (expected bigquery|avro)"
            )),
        }
    }
}

/// Transpile a decoded JSON Schema document into the schema language of
/// `target`. Parsing is the only fallible stage apart from Avro name
/// mangling; normalization and synthesis are total.
pub fn transpile(value: &Value, target: Target, config: &TranspileConfig) -> Result<Value> {
    synthesize(parse::parse_schema(value)?, target, config)
}

/// Transpile from JSON Schema text.
pub fn transpile_str(text: &str, target: Target, config: &TranspileConfig) -> Result<Value> {
    synthesize(parse::parse_schema_str(text)?, target, config)
}

fn synthesize(ast: ast::Schema, target: Target, config: &TranspileConfig) -> Result<Value> {
    let normalized = normalise::normalise(ast, config);
    match target {
        Target::Bigquery => {
            let field = bigquery::lower(&normalized, config);
            Ok(serde_json::to_value(field).expect("BqField is valid JSON"))
        }
        Target::Avro => Ok(avro::lower(&normalized, config)?.to_value()),
    }
}

/// Transpile into a BigQuery schema with default configuration.
pub fn bq_schema(value: &Value) -> Result<Value> {
    transpile(value, Target::Bigquery, &TranspileConfig::default())
}

/// Transpile into an Avro schema with default configuration.
pub fn avro_schema(value: &Value) -> Result<Value> {
    transpile(value, Target::Avro, &TranspileConfig::default())
}
