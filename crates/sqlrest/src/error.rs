use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to open database: {path}: {source}")]
    DbOpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("scan error: {0}")]
    Scan(String),

    #[error("input already defines reserved field `{0}`")]
    IdConflict(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Query(e.to_string())
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::DbOpenFailed { .. } => "DB_OPEN_FAILED",
            AppError::Decode(_) => "DECODE_ERROR",
            AppError::MissingParameter(_) => "MISSING_PARAMETER",
            AppError::Query(_) => "QUERY_ERROR",
            AppError::Scan(_) => "SCAN_ERROR",
            AppError::IdConflict(_) => "ID_CONFLICT",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl AppError {
    /// Text shown to clients: the underlying message where there is one,
    /// without the classification prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidRequest(m)
            | AppError::Decode(m)
            | AppError::Query(m)
            | AppError::Scan(m)
            | AppError::Internal(m) => m.clone(),
            AppError::DbOpenFailed { source, .. } => source.to_string(),
            AppError::Io(e) => e.to_string(),
            AppError::MissingParameter(_) | AppError::IdConflict(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_drops_the_class_prefix() {
        let e = AppError::Query("UNIQUE constraint failed: preference.name".into());
        assert_eq!(e.to_string(), "query error: UNIQUE constraint failed: preference.name");
        assert_eq!(e.message(), "UNIQUE constraint failed: preference.name");
        assert_eq!(e.code(), "QUERY_ERROR");
    }

    #[test]
    fn errors_without_an_underlying_message_keep_their_description() {
        assert_eq!(AppError::MissingParameter("value".into()).message(), "missing parameter: value");
        assert_eq!(
            AppError::IdConflict("id").message(),
            "input already defines reserved field `id`"
        );
    }
}

pub type AppResult<T> = Result<T, AppError>;
