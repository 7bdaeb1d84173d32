//! Handlers for event endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/events` | Photo capture; the event has no contact yet |
//! | `GET`    | `/events/unverified` | Optional `category`; excludes actively assigned events |
//! | `POST`   | `/events/:id/review` | Body: `{"decision":"approve"\|"reject"}` |
//! | `DELETE` | `/events/:id` | Role-gated; reviewers soft-reject |
//! | `POST`   | `/contacts/:id/events` | Body: [`EventBody`]; name, role and date required |
//! | `POST`   | `/contacts/:id/events/reconcile` | Body: [`ReconcileBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cardlink_core::{
  contact::Category,
  event::{Event, EventFlags, EventPayload, MatchKey, ReconcileOptions, ReconciledEvent},
  store::CrmStore,
  workflow::{DeletionOutcome, ReviewDecision, UnverifiedEntry},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError, reply::Reply};

/// An event payload plus the optional body-level actor fields.
#[derive(Debug, Deserialize)]
pub struct EventBody {
  #[serde(flatten)]
  pub payload:    EventPayload,
  pub created_by: Option<Uuid>,
  #[serde(rename = "userId")]
  pub user_id:    Option<Uuid>,
}

/// `POST /events`
pub async fn capture<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<EventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
{
  let actor = caller.actor(body.created_by, body.user_id);
  let event = store
    .capture_event(body.payload, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Reply::ok(event)))
}

/// `POST /contacts/:id/events`
pub async fn add_to_contact<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(contact_id): Path<Uuid>,
  Json(body): Json<EventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
{
  let actor = caller.actor(body.created_by, body.user_id);
  let event = store
    .add_event_to_contact(contact_id, body.payload, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Reply::with_message("Event added", event)))
}

// ─── Reconcile ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReconcileBody {
  #[serde(flatten)]
  pub payload:    EventPayload,
  #[serde(flatten)]
  pub flags:      EventFlags,
  #[serde(default)]
  pub match_key:  MatchKey,
  pub created_by: Option<Uuid>,
  #[serde(rename = "userId")]
  pub user_id:    Option<Uuid>,
}

/// `POST /contacts/:id/events/reconcile`: update, link or create one event.
pub async fn reconcile<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(contact_id): Path<Uuid>,
  Json(body): Json<ReconcileBody>,
) -> Result<Json<Reply<ReconciledEvent>>, ApiError>
where
  S: CrmStore,
{
  let options = ReconcileOptions {
    match_key: body.match_key,
    flags: body.flags,
    ..ReconcileOptions::new(caller.actor(body.created_by, body.user_id))
  };
  let reconciled = store
    .reconcile_event(contact_id, body.payload, options)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(reconciled))
}

// ─── Verification ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UnverifiedParams {
  pub category: Option<Category>,
}

/// `GET /events/unverified[?category=B]`
pub async fn unverified<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<UnverifiedParams>,
) -> Result<Json<Reply<Vec<UnverifiedEntry>>>, ApiError>
where
  S: CrmStore,
{
  let entries = store
    .list_unverified(params.category)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(entries))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub decision: ReviewDecision,
}

/// `POST /events/:id/review`
pub async fn review<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(event_id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<Reply<Event>>, ApiError>
where
  S: CrmStore,
{
  let event = store
    .review_event(caller.role, event_id, body.decision, caller.actor(None, None))
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(event))
}

/// `DELETE /events/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(event_id): Path<Uuid>,
) -> Result<Json<Reply<DeletionOutcome>>, ApiError>
where
  S: CrmStore,
{
  let outcome = store
    .delete_contact_event(caller.role, event_id, caller.actor(None, None))
    .await
    .map_err(ApiError::store)?;
  let message = match outcome {
    DeletionOutcome::Removed => "Event deleted",
    DeletionOutcome::SoftRejected => "Event marked as rejected",
  };
  Ok(Reply::with_message(message, outcome))
}
