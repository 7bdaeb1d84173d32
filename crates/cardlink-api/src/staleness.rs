//! Handler for `POST /staleness/scan`: run the scan now instead of waiting
//! for the scheduler.

use std::sync::Arc;

use axum::{Json, extract::State};
use cardlink_core::{staleness::ScanReport, store::CrmStore};
use chrono::Utc;

use crate::{caller::Caller, error::ApiError, reply::Reply};

pub async fn handler<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Reply<ScanReport>>, ApiError>
where
  S: CrmStore,
{
  caller.role.require_reviewer("run the staleness scan")?;
  let report = store
    .scan_stale_contacts(Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(report))
}
