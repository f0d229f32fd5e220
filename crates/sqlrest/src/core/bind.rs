//! Resolves a statement's named parameters against an untyped input object.
//!
//! Placeholder discovery is left to the driver: SQLite parses `:name`
//! (and `@name`, `$name`) while preparing, and hands the names back in
//! slot order. This module only maps those names onto input values.

use crate::core::types::{InputObject, Value};
use crate::error::{AppError, AppResult};

/// A statement registered once at startup.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    sql: String,
}

impl QueryDescriptor {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Input key a driver parameter name refers to, without its sigil.
///
/// Positional parameters (`?`, `?3`) have no key.
pub fn parameter_key(name: &str) -> Option<&str> {
    name.strip_prefix(|c: char| matches!(c, ':' | '@' | '$'))
        .filter(|key| !key.is_empty())
}

/// Produces one value per parameter slot, in the order the driver listed them.
///
/// Keys in `input` that the statement never mentions are ignored.
pub fn bind(names: &[String], input: &InputObject) -> AppResult<Vec<Value>> {
    names
        .iter()
        .map(|name| {
            let key = parameter_key(name).ok_or_else(|| AppError::MissingParameter(name.clone()))?;
            input
                .get(key)
                .map(Value::from)
                .ok_or_else(|| AppError::MissingParameter(key.to_string()))
        })
        .collect()
}
