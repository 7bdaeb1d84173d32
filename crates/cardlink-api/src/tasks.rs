//! Handlers for `/tasks` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tasks` | `?category=` required unless `userType=admin` |
//! | `POST`   | `/tasks` | Body: [`NewTask`]; title, deadline and category required |
//! | `GET`    | `/tasks/:id` | |
//! | `PUT`    | `/tasks/:id` | Body: [`TaskUpdate`]; open tasks only |
//! | `DELETE` | `/tasks/:id` | Open tasks only |
//! | `POST`   | `/tasks/:id/complete` | Body: [`CompleteBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cardlink_core::{
  actor::Actor,
  contact::Category,
  store::CrmStore,
  task::{NewTask, Task, TaskCompletion, TaskList, TaskUpdate},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError, reply::Reply};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub category: Option<Category>,
}

/// `GET /tasks[?category=A]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Reply<TaskList>>, ApiError>
where
  S: CrmStore,
{
  let tasks = store
    .list_tasks(caller.role, params.category)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(tasks))
}

/// `POST /tasks`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewTask>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
{
  let task = store.create_task(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Reply::with_message("Task created", task)))
}

/// `GET /tasks/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reply<Task>>, ApiError>
where
  S: CrmStore,
{
  let task = store
    .get_task(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("task {id} not found")))?;
  Ok(Reply::ok(task))
}

/// `PUT /tasks/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TaskUpdate>,
) -> Result<Json<Reply<Task>>, ApiError>
where
  S: CrmStore,
{
  let task = store.update_task(id, body).await.map_err(ApiError::store)?;
  Ok(Reply::with_message("Task updated", task))
}

/// `DELETE /tasks/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reply<()>>, ApiError>
where
  S: CrmStore,
{
  store.delete_task(id).await.map_err(ApiError::store)?;
  Ok(Reply::with_message("Task deleted", ()))
}

fn completed_default() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
  #[serde(default = "completed_default")]
  pub completed:   bool,
  /// Defaults to the calling user. Without one, no CONTACT record is kept.
  pub modified_by: Option<Uuid>,
}

/// `POST /tasks/:id/complete`
pub async fn complete<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<CompleteBody>,
) -> Result<Json<Reply<Task>>, ApiError>
where
  S: CrmStore,
{
  let completion = TaskCompletion {
    completed:   body.completed,
    modified_by: body.modified_by.or(caller.user()).map(Actor::User),
  };
  let task = store
    .complete_task(id, completion)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(task))
}
