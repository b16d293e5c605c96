use crate::error::AppError;
use crate::persister::with_store;
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;
use types::entry::EnrichedEntry;
use types::record::BookRecord;
use types::row::Row;

pub async fn enrich_books(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<Vec<EnrichedEntry>>, AppError> {
    let Json(rows) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let rows: Vec<Row> = rows.into_iter().map(Row::new).collect();

    let outcome = state.pipeline.run(rows).await?;
    Ok(Json(outcome.entries))
}

pub async fn list_books(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookRecord>>, AppError> {
    let books = with_store(&state.store, |s| s.list_books()).await?;
    Ok(Json(books))
}
