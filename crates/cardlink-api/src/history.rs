//! Handlers for modification history.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use cardlink_core::{history::ModificationRecord, store::CrmStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, reply::Reply};

/// `GET /contacts/:id/history`: newest first.
pub async fn for_contact<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reply<Vec<ModificationRecord>>>, ApiError>
where
  S: CrmStore,
{
  let records = store.contact_history(id).await.map_err(ApiError::store)?;
  Ok(Reply::ok(records))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /history[?limit=50]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Reply<Vec<ModificationRecord>>>, ApiError>
where
  S: CrmStore,
{
  let records = store
    .all_history(params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(records))
}
