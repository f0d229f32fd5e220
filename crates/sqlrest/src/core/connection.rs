use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use rusqlite::{Connection, OpenFlags};
use tokio::sync::oneshot;

use crate::{
    core::{
        bind::QueryDescriptor,
        query, schema,
        types::{InputObject, Record},
    },
    error::{AppError, AppResult},
};

/// Handle to the database worker thread.
///
/// The worker owns the only connection and runs statements one at a time;
/// handles are cheap to clone and are shared by every request.
#[derive(Debug, Clone)]
pub struct Database {
    tx: mpsc::Sender<DbTask>,
    pub db_path: PathBuf,
}

impl Database {
    /// Opens the connection on the caller's thread so open failures surface here.
    pub fn open(db_path: &Path, busy_timeout: Duration) -> AppResult<Self> {
        let conn = open_conn(db_path, busy_timeout)?;
        let (tx, rx) = mpsc::channel::<DbTask>();
        let path_for_thread = db_path.to_path_buf();
        thread::Builder::new()
            .name("sqlrest-db".into())
            .spawn(move || db_worker_main(conn, path_for_thread, rx))?;
        Ok(Self {
            tx,
            db_path: db_path.to_path_buf(),
        })
    }

    pub async fn init_schema(&self) -> AppResult<Vec<String>> {
        self.call(|respond_to| DbTask::InitSchema { respond_to }).await
    }

    /// Prepares `query` without running it and returns its parameter names.
    pub async fn describe(&self, query: Arc<QueryDescriptor>) -> AppResult<Vec<String>> {
        self.call(|respond_to| DbTask::Describe { query, respond_to }).await
    }

    pub async fn read(&self, query: Arc<QueryDescriptor>) -> AppResult<Vec<Record>> {
        self.call(|respond_to| DbTask::Read { query, respond_to }).await
    }

    pub async fn insert(&self, query: Arc<QueryDescriptor>, input: InputObject) -> AppResult<InputObject> {
        self.call(|respond_to| DbTask::Insert {
            query,
            input,
            respond_to,
        })
        .await
    }

    async fn call<T>(&self, task: impl FnOnce(oneshot::Sender<AppResult<T>>) -> DbTask) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(task(tx))
            .map_err(|_| AppError::Internal("db worker unavailable".into()))?;
        rx.await
            .map_err(|_| AppError::Internal("db worker dropped response".into()))?
    }
}

enum DbTask {
    InitSchema {
        respond_to: oneshot::Sender<AppResult<Vec<String>>>,
    },
    Describe {
        query: Arc<QueryDescriptor>,
        respond_to: oneshot::Sender<AppResult<Vec<String>>>,
    },
    Read {
        query: Arc<QueryDescriptor>,
        respond_to: oneshot::Sender<AppResult<Vec<Record>>>,
    },
    Insert {
        query: Arc<QueryDescriptor>,
        input: InputObject,
        respond_to: oneshot::Sender<AppResult<InputObject>>,
    },
}

fn db_worker_main(conn: Connection, db_path: PathBuf, rx: mpsc::Receiver<DbTask>) {
    tracing::debug!(path = %db_path.display(), "db worker started");

    while let Ok(task) = rx.recv() {
        match task {
            DbTask::InitSchema { respond_to } => {
                let _ = respond_to.send(schema::init(&conn));
            }
            DbTask::Describe { query, respond_to } => {
                let _ = respond_to.send(query::describe(&conn, &query));
            }
            DbTask::Read { query, respond_to } => {
                let _ = respond_to.send(query::run_read(&conn, &query));
            }
            DbTask::Insert {
                query,
                input,
                respond_to,
            } => {
                let _ = respond_to.send(query::insert_returning_input(&conn, &query, input));
            }
        }
    }

    tracing::debug!(path = %db_path.display(), "db worker stopped");
}

fn open_conn(path: &Path, busy_timeout: Duration) -> AppResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| AppError::DbOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    if let Err(e) = conn.busy_timeout(busy_timeout) {
        tracing::warn!(error = %e, "failed to set busy timeout");
    }
    Ok(conn)
}
