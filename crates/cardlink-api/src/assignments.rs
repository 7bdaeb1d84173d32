//! Handlers for `/assignments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/assignments` | Body: [`AssignBody`]; reviewers only |
//! | `DELETE` | `/assignments/:id` | Revoke |
//! | `GET`    | `/assignments/assigned-to/:user` | Work handed to `user` |
//! | `GET`    | `/assignments/assigned-by/:user` | Work `user` handed out |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use cardlink_core::{
  store::CrmStore,
  workflow::{AssignmentView, NewAssignment},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError, reply::Reply};

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub event_ids:   Vec<Uuid>,
  pub assigned_to: Uuid,
  /// Defaults to the calling user.
  pub assigned_by: Option<Uuid>,
}

/// `POST /assignments`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<AssignBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
{
  let assigned_by = body
    .assigned_by
    .or(caller.user())
    .ok_or_else(|| ApiError::BadRequest("assigned_by is required".into()))?;
  let created = store
    .create_assignments(caller.role, NewAssignment {
      event_ids: body.event_ids,
      assigned_to: body.assigned_to,
      assigned_by,
    })
    .await
    .map_err(ApiError::store)?;
  let message = format!("{} event(s) assigned", created.len());
  Ok((StatusCode::CREATED, Reply::with_message(message, created)))
}

/// `DELETE /assignments/:id`
pub async fn revoke<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reply<()>>, ApiError>
where
  S: CrmStore,
{
  store.revoke_assignment(id).await.map_err(ApiError::store)?;
  Ok(Reply::with_message("Assignment revoked", ()))
}

/// `GET /assignments/assigned-to/:user`
pub async fn assigned_to<S>(
  State(store): State<Arc<S>>,
  Path(user): Path<Uuid>,
) -> Result<Json<Reply<Vec<AssignmentView>>>, ApiError>
where
  S: CrmStore,
{
  let views = store
    .assignments_for_user(user)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(views))
}

/// `GET /assignments/assigned-by/:user`
pub async fn assigned_by<S>(
  State(store): State<Arc<S>>,
  Path(user): Path<Uuid>,
) -> Result<Json<Reply<Vec<AssignmentView>>>, ApiError>
where
  S: CrmStore,
{
  let views = store
    .assignments_by_user(user)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(views))
}
