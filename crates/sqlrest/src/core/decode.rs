//! Turns a raw result cursor into schema-agnostic [`Record`]s.

use std::iter::FusedIterator;

use crate::core::types::{RawValue, Record, Value};
use crate::error::{AppError, AppResult};

pub type CursorError = Box<dyn std::error::Error + Send + Sync>;

/// An open result set: column names plus a forward-only row fetch.
pub trait RowCursor {
    fn columns(&mut self) -> Result<Vec<String>, CursorError>;

    /// Returns `Ok(None)` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, CursorError>;
}

impl<C: RowCursor + ?Sized> RowCursor for &mut C {
    fn columns(&mut self) -> Result<Vec<String>, CursorError> {
        (**self).columns()
    }

    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, CursorError> {
        (**self).next_row()
    }
}

/// Lazy, single-pass sequence of records over a cursor.
///
/// The cursor is dropped as soon as the sequence ends, on the first error,
/// or when the iterator itself is dropped, whichever comes first.
pub struct Records<C: RowCursor> {
    columns: Vec<String>,
    cursor: Option<C>,
}

impl<C: RowCursor> Records<C> {
    pub fn open(mut cursor: C) -> AppResult<Self> {
        let columns = cursor
            .columns()
            .map_err(|e| AppError::Decode(format!("cannot read column metadata: {e}")))?;
        Ok(Self {
            columns,
            cursor: Some(cursor),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn release(&mut self) {
        self.cursor = None;
    }

    fn decode_row(&self, raw: Vec<RawValue>) -> AppResult<Record> {
        if raw.len() != self.columns.len() {
            return Err(AppError::Decode(format!(
                "row has {} values but the result set has {} columns",
                raw.len(),
                self.columns.len()
            )));
        }
        let mut record = Record::with_capacity(self.columns.len());
        for (name, value) in self.columns.iter().zip(raw) {
            record.push(name.clone(), Value::from(value));
        }
        Ok(record)
    }
}

impl<C: RowCursor> Iterator for Records<C> {
    type Item = AppResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let fetched = self.cursor.as_mut()?.next_row();
        match fetched {
            Ok(Some(raw)) => {
                let record = self.decode_row(raw);
                if record.is_err() {
                    self.release();
                }
                Some(record)
            }
            Ok(None) => {
                self.release();
                None
            }
            Err(e) => {
                self.release();
                Some(Err(AppError::Query(e.to_string())))
            }
        }
    }
}

impl<C: RowCursor> FusedIterator for Records<C> {}

/// Decodes every row, stopping at the first failure.
pub fn decode_all<C: RowCursor>(cursor: C) -> AppResult<Vec<Record>> {
    Records::open(cursor)?.collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::Cell, collections::VecDeque, rc::Rc};

    use super::*;

    pub(crate) struct MockCursor {
        columns: Result<Vec<String>, String>,
        rows: VecDeque<Result<Vec<RawValue>, String>>,
        drops: Rc<Cell<usize>>,
    }

    impl MockCursor {
        pub(crate) fn new(columns: &[&str], rows: Vec<Vec<RawValue>>) -> Self {
            Self {
                columns: Ok(columns.iter().map(|c| c.to_string()).collect()),
                rows: rows.into_iter().map(Ok).collect(),
                drops: Rc::new(Cell::new(0)),
            }
        }

        fn broken_metadata() -> Self {
            Self {
                columns: Err("metadata unavailable".into()),
                rows: VecDeque::new(),
                drops: Rc::new(Cell::new(0)),
            }
        }

        fn fail_after(mut self, msg: &str) -> Self {
            self.rows.push_back(Err(msg.to_string()));
            self
        }

        fn drop_counter(&self) -> Rc<Cell<usize>> {
            self.drops.clone()
        }
    }

    impl RowCursor for MockCursor {
        fn columns(&mut self) -> Result<Vec<String>, CursorError> {
            self.columns.clone().map_err(Into::into)
        }

        fn next_row(&mut self) -> Result<Option<Vec<RawValue>>, CursorError> {
            match self.rows.pop_front() {
                Some(Ok(row)) => Ok(Some(row)),
                Some(Err(e)) => Err(e.into()),
                None => Ok(None),
            }
        }
    }

    impl Drop for MockCursor {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn grid(n: usize, k: usize) -> (Vec<String>, Vec<Vec<RawValue>>) {
        let cols = (0..k).map(|c| format!("c{c}")).collect();
        let rows = (0..n)
            .map(|r| (0..k).map(|c| RawValue::Int((r * k + c) as i64)).collect())
            .collect();
        (cols, rows)
    }

    #[test]
    fn decodes_every_row_with_every_column_in_order() {
        for (n, k) in [(0, 1), (1, 1), (3, 4), (10, 2)] {
            let (cols, rows) = grid(n, k);
            let col_refs: Vec<&str> = cols.iter().map(String::as_str).collect();
            let records = decode_all(MockCursor::new(&col_refs, rows)).unwrap();

            assert_eq!(records.len(), n);
            for rec in &records {
                assert_eq!(rec.len(), k);
                assert_eq!(rec.columns().collect::<Vec<_>>(), col_refs);
            }
        }
    }

    #[test]
    fn empty_result_is_an_empty_sequence() {
        let records = decode_all(MockCursor::new(&["id", "name"], vec![])).unwrap();
        assert!(records.is_empty());
        assert_eq!(serde_json::to_string(&records).unwrap(), "[]");
    }

    #[test]
    fn byte_values_are_rendered_as_text() {
        let cursor = MockCursor::new(
            &["id", "body"],
            vec![vec![RawValue::Int(1), RawValue::Bytes(b"large text".to_vec())]],
        );
        let records = decode_all(cursor).unwrap();

        assert_eq!(records[0].get("body"), Some(&Value::Text("large text".into())));
        assert_eq!(
            serde_json::to_string(&records).unwrap(),
            r#"[{"id":1,"body":"large text"}]"#
        );
    }

    #[test]
    fn other_values_pass_through() {
        let cursor = MockCursor::new(
            &["n", "b", "f", "t"],
            vec![vec![
                RawValue::Null,
                RawValue::Bool(false),
                RawValue::Float(2.5),
                RawValue::Text("x".into()),
            ]],
        );
        let rec = &decode_all(cursor).unwrap()[0];
        assert_eq!(rec.get("n"), Some(&Value::Null));
        assert_eq!(rec.get("b"), Some(&Value::Bool(false)));
        assert_eq!(rec.get("f"), Some(&Value::Float(2.5)));
        assert_eq!(rec.get("t"), Some(&Value::Text("x".into())));
    }

    #[test]
    fn decoding_identical_rows_twice_is_stable() {
        let rows = || {
            vec![
                vec![RawValue::Int(1), RawValue::Bytes(vec![0x61, 0x62])],
                vec![RawValue::Int(2), RawValue::Null],
            ]
        };
        let first = decode_all(MockCursor::new(&["id", "v"], rows())).unwrap();
        let second = decode_all(MockCursor::new(&["id", "v"], rows())).unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn unreadable_metadata_is_a_decode_error() {
        let cursor = MockCursor::broken_metadata();
        let drops = cursor.drop_counter();

        let err = decode_all(cursor).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)), "{err:?}");
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn row_failure_stops_the_sequence() {
        let cursor = MockCursor::new(&["id"], vec![vec![RawValue::Int(1)]]).fail_after("disk I/O error");
        let drops = cursor.drop_counter();
        let mut records = Records::open(cursor).unwrap();

        assert!(records.next().unwrap().is_ok());
        let err = records.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("disk I/O error"));
        assert_eq!(drops.get(), 1);
        assert!(records.next().is_none());
    }

    #[test]
    fn duplicate_column_names_collapse_to_one_key() {
        let cursor = MockCursor::new(
            &["a", "b", "a"],
            vec![vec![RawValue::Int(1), RawValue::Int(2), RawValue::Int(3)]],
        );
        let rec = &decode_all(cursor).unwrap()[0];
        assert_eq!(rec.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(rec.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn width_mismatch_is_a_decode_error() {
        let cursor = MockCursor::new(&["a", "b"], vec![vec![RawValue::Int(1)]]);
        let err = decode_all(cursor).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)), "{err:?}");
    }

    #[test]
    fn cursor_is_released_exactly_once() {
        let cursor = MockCursor::new(&["id"], vec![vec![RawValue::Int(1)], vec![RawValue::Int(2)]]);
        let drops = cursor.drop_counter();
        let mut records = Records::open(cursor).unwrap();
        assert_eq!(records.columns(), ["id"]);

        assert!(records.next().is_some());
        assert!(records.next().is_some());
        assert_eq!(drops.get(), 0);
        assert!(records.next().is_none());
        assert_eq!(drops.get(), 1);
        drop(records);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn dropping_early_releases_the_cursor() {
        let cursor = MockCursor::new(&["id"], vec![vec![RawValue::Int(1)], vec![RawValue::Int(2)]]);
        let drops = cursor.drop_counter();
        let mut records = Records::open(cursor).unwrap();
        let _ = records.next();
        drop(records);
        assert_eq!(drops.get(), 1);
    }
}
