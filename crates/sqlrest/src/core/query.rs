use crate::core::bind::{bind, QueryDescriptor};
use crate::core::decode::{decode_all, RowCursor};
use crate::core::types::{InputObject, RawValue, Record, Value, ID_FIELD};
use crate::error::{AppError, AppResult};

/// Statement-execution interface the core runs against.
pub trait StatementExecutor {
    /// Parameter names of `sql` in slot order, as the driver parses them.
    fn parameter_names(&self, sql: &str) -> AppResult<Vec<String>>;

    /// Prepares `sql`, asks `bind` for one value per parameter name, then
    /// lends the open cursor to `consume`.
    ///
    /// Nothing is executed when `bind` fails. Failures to prepare or start
    /// the statement are reported as [`AppError::Query`]. The cursor is
    /// released when `with_cursor` returns.
    fn with_cursor<T, B, F>(&self, sql: &str, bind: B, consume: F) -> AppResult<T>
    where
        B: FnOnce(&[String]) -> AppResult<Vec<Value>>,
        F: FnOnce(&mut dyn RowCursor) -> AppResult<T>;
}

/// Checks that `query` prepares and returns its parameter names.
pub fn describe<E: StatementExecutor>(db: &E, query: &QueryDescriptor) -> AppResult<Vec<String>> {
    db.parameter_names(query.sql())
}

/// Runs a read statement that takes no input.
pub fn run_read<E: StatementExecutor>(db: &E, query: &QueryDescriptor) -> AppResult<Vec<Record>> {
    run_read_with(db, query, &InputObject::new())
}

pub fn run_read_with<E: StatementExecutor>(
    db: &E,
    query: &QueryDescriptor,
    input: &InputObject,
) -> AppResult<Vec<Record>> {
    let res = db.with_cursor(query.sql(), |names| bind(names, input), |cursor| decode_all(cursor));
    if let Err(e) = &res {
        tracing::error!(error = %e, sql = query.sql(), "read query failed");
    }
    res
}

/// Runs an insert-style statement and returns the identifier from its first row.
pub fn run_write<E: StatementExecutor>(
    db: &E,
    query: &QueryDescriptor,
    input: &InputObject,
) -> AppResult<i64> {
    let res = db.with_cursor(query.sql(), |names| bind(names, input), read_generated_id);
    if let Err(e) = &res {
        tracing::error!(error = %e, sql = query.sql(), "write query failed");
    }
    res
}

/// Inserts `input` and returns it with the generated identifier added under `id`.
///
/// Inputs that already carry an `id` field are rejected before anything is executed.
pub fn insert_returning_input<E: StatementExecutor>(
    db: &E,
    query: &QueryDescriptor,
    mut input: InputObject,
) -> AppResult<InputObject> {
    if input.contains_key(ID_FIELD) {
        return Err(AppError::IdConflict(ID_FIELD));
    }
    let id = run_write(db, query, &input)?;
    input.insert(ID_FIELD.to_string(), serde_json::Value::from(id));
    Ok(input)
}

fn read_generated_id(cursor: &mut dyn RowCursor) -> AppResult<i64> {
    let row = cursor
        .next_row()
        .map_err(|e| AppError::Query(e.to_string()))?
        .ok_or_else(|| AppError::Scan("no rows in result set".into()))?;
    match row.into_iter().next() {
        Some(RawValue::Int(id)) => Ok(id),
        Some(other) => Err(AppError::Scan(format!(
            "expected an integer identifier, got {}",
            other.kind()
        ))),
        None => Err(AppError::Scan("result row has no columns".into())),
    }
}
