mod handler;
mod protocol;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    cli::Args,
    core::{connection::Database, schema::TableQueries},
    error::AppResult,
};

use handler::TableState;
pub use protocol::ErrorBody;

pub fn create_router(db: Database) -> Router {
    Router::new()
        .route("/", get(handler::index))
        .merge(table_routes("/users", db.clone(), TableQueries::users()))
        .merge(table_routes("/prefs", db, TableQueries::prefs()))
        .layer(TraceLayer::new_for_http())
}

fn table_routes(path: &str, db: Database, queries: TableQueries) -> Router {
    Router::new()
        .route(path, get(handler::list_records).post(handler::create_record))
        .with_state(TableState { db, queries })
}

/// Opens the database, creates the schema, then serves until Ctrl-C / SIGTERM.
pub async fn run(args: Args) -> AppResult<()> {
    let db = Database::open(&args.db, args.busy_timeout())?;
    let tables = db.init_schema().await?;
    tracing::info!(path = %args.db.display(), ?tables, "schema ready");

    for queries in [TableQueries::users(), TableQueries::prefs()] {
        for query in queries.statements() {
            let params = db.describe(query.clone()).await?;
            tracing::debug!(sql = query.sql(), ?params, "statement prepared");
        }
    }

    let app = create_router(db);
    let listener = TcpListener::bind(args.listen).await?;
    tracing::info!(addr = %args.listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
