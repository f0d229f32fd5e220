use rusqlite::{
    types::{ToSqlOutput, ValueRef},
    Connection, Rows, Statement, ToSql,
};

use crate::core::decode::{CursorError, RowCursor};
use crate::core::query::StatementExecutor;
use crate::core::types::{RawValue, Value};
use crate::error::{AppError, AppResult};

impl StatementExecutor for Connection {
    fn parameter_names(&self, sql: &str) -> AppResult<Vec<String>> {
        let stmt = self.prepare(sql).map_err(query_error)?;
        Ok(parameter_names(&stmt))
    }

    fn with_cursor<T, B, F>(&self, sql: &str, bind: B, consume: F) -> AppResult<T>
    where
        B: FnOnce(&[String]) -> AppResult<Vec<Value>>,
        F: FnOnce(&mut dyn RowCursor) -> AppResult<T>,
    {
        let mut stmt = self.prepare(sql).map_err(query_error)?;
        let params = bind(&parameter_names(&stmt))?;
        for (i, value) in params.iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value).map_err(query_error)?;
        }
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut cursor = SqliteCursor {
            columns,
            rows: stmt.raw_query(),
        };
        // Dropping `cursor` resets the statement, discarding unread rows.
        consume(&mut cursor)
    }
}

/// Parameter names in slot order, as SQLite parsed them (`:name`, `@name`, `?3`).
fn parameter_names(stmt: &Statement<'_>) -> Vec<String> {
    (1..=stmt.parameter_count())
        .map(|i| {
            stmt.parameter_name(i)
                .map_or_else(|| format!("?{i}"), str::to_owned)
        })
        .collect()
}

struct SqliteCursor<'stmt> {
    columns: Vec<String>,
    rows: Rows<'stmt>,
}

impl RowCursor for SqliteCursor<'_> {
    fn columns(&mut self) -> Result<Vec<String>, CursorError> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, CursorError> {
        let Some(row) = self.rows.next()? else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(self.columns.len());
        for i in 0..self.columns.len() {
            values.push(RawValue::from(row.get_ref(i)?));
        }
        Ok(Some(values))
    }
}

impl From<ValueRef<'_>> for RawValue {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => RawValue::Null,
            ValueRef::Integer(x) => RawValue::Int(x),
            ValueRef::Real(x) => RawValue::Float(x),
            ValueRef::Text(t) => RawValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => RawValue::Bytes(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::Int(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

fn query_error(e: rusqlite::Error) -> AppError {
    AppError::Query(e.to_string())
}
