//! Handler for `POST /import`.
//!
//! The CSV file itself is parsed upstream; this endpoint takes the rows as
//! header-keyed JSON objects.

use std::sync::Arc;

use axum::{Json, extract::State};
use cardlink_core::{
  import::{CsvRow, ImportReport},
  store::CrmStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError, reply::Reply};

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub rows:       Vec<CsvRow>,
  pub created_by: Option<Uuid>,
}

/// `POST /import`: body: `{"rows":[{"name":"...","email":"..."}]}`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<ImportBody>,
) -> Result<Json<Reply<ImportReport>>, ApiError>
where
  S: CrmStore,
{
  if body.rows.is_empty() {
    return Err(ApiError::BadRequest("no rows to import".into()));
  }
  let created_by = caller.actor(body.created_by, None);
  let report = store
    .import_rows(body.rows, created_by)
    .await
    .map_err(ApiError::store)?;
  let message = format!(
    "Imported {} of {} rows ({} new, {} updated)",
    report.success_count, report.total_rows, report.inserted_count, report.updated_count
  );
  Ok(Reply::with_message(message, report))
}
