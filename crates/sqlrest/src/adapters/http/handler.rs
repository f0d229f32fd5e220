use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Html,
    Json,
};

use crate::{
    core::{
        connection::Database,
        schema::TableQueries,
        types::{InputObject, Record},
    },
    error::{AppError, AppResult},
};

const INDEX_HTML: &str = r#"<html><a href="/users">Users</a> <a href="/prefs">Preferences</a></html>"#;

/// Per-table router state: the shared database handle plus that table's statements.
#[derive(Debug, Clone)]
pub struct TableState {
    pub db: Database,
    pub queries: TableQueries,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn list_records(State(table): State<TableState>) -> AppResult<Json<Vec<Record>>> {
    let rows = table.db.read(table.queries.list.clone()).await?;
    Ok(Json(rows))
}

pub async fn create_record(
    State(table): State<TableState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<InputObject>)> {
    // Parsed by hand so malformed bodies get the same error shape as everything else.
    let input: InputObject =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidRequest(e.to_string()))?;
    let created = table.db.insert(table.queries.insert.clone(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
