//! Handlers for `/contacts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | Optional `category`, `created_by` |
//! | `POST`   | `/contacts` | Body: [`CaptureBody`]; 201 when a contact was inserted |
//! | `PUT`    | `/contacts` | Body: [`UpsertBody`]; update-or-create with one event |
//! | `GET`    | `/contacts/search` | `?q=`; verified contacts only |
//! | `GET`    | `/contacts/resolve` | `?email=` and/or `?phone=` |
//! | `GET`    | `/contacts/:id` | Contact with sub-records and events |
//! | `DELETE` | `/contacts/:id` | Reviewers only; marks the contact rejected |
//! | `PUT`    | `/contacts/:id/events` | Body: [`ContactEventsBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cardlink_core::{
  actor::{Actor, ActorSource},
  contact::{Category, Contact, ContactBundle, ContactDetails, ContactFields},
  event::{EventFlags, EventPayload},
  store::{ContactAndEvents, ContactFilter, ContactUpsert, CrmStore, NewContact, UpsertOutcome},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError, reply::Reply};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub category:   Option<Category>,
  /// Contacts with an event recorded by this user.
  pub created_by: Option<Uuid>,
}

/// `GET /contacts[?category=A][&created_by=<id>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Reply<Vec<ContactBundle>>>, ApiError>
where
  S: CrmStore,
{
  let filter = ContactFilter {
    category:   params.category,
    created_by: params.created_by.map(Actor::User),
  };
  let contacts = store.list_contacts(filter).await.map_err(ApiError::store)?;
  Ok(Reply::ok(contacts))
}

// ─── Capture ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /contacts`.
#[derive(Debug, Deserialize)]
pub struct CaptureBody {
  #[serde(flatten)]
  pub fields:     ContactFields,
  #[serde(flatten)]
  pub details:    ContactDetails,
  #[serde(default)]
  pub events:     Vec<EventPayload>,
  pub created_by: Option<Uuid>,
  #[serde(rename = "userId")]
  pub user_id:    Option<Uuid>,
}

/// `POST /contacts`: 201 for a new contact, 200 when an existing one was
/// matched by email or phone and merged.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<CaptureBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
{
  let created_by = caller.actor(body.created_by, body.user_id);
  let write = store
    .create_contact(NewContact {
      fields: body.fields,
      details: body.details,
      events: body.events,
      created_by,
    })
    .await
    .map_err(ApiError::store)?;

  if write.created {
    Ok((StatusCode::CREATED, Reply::with_message("Contact created", write)))
  } else {
    Ok((StatusCode::OK, Reply::with_message("Existing contact updated", write)))
  }
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /contacts`.
#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub contact_id:    Option<Uuid>,
  #[serde(flatten)]
  pub fields:        ContactFields,
  #[serde(flatten)]
  pub details:       ContactDetails,
  pub event:         Option<EventPayload>,
  /// `verified` and `contact_status`, applied to the event as given.
  #[serde(flatten)]
  pub flags:         EventFlags,
  pub assignment_id: Option<Uuid>,
  pub created_by:    Option<Uuid>,
  #[serde(rename = "userId")]
  pub user_id:       Option<Uuid>,
}

/// `PUT /contacts`
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<UpsertBody>,
) -> Result<Json<Reply<UpsertOutcome>>, ApiError>
where
  S: CrmStore,
{
  let actor = caller.sources(body.created_by, body.user_id);
  let (_, source) = actor.resolve();
  let outcome = store
    .upsert_contact(ContactUpsert {
      contact_id: body.contact_id,
      fields: body.fields,
      details: body.details,
      event: body.event,
      flags: body.flags,
      assignment_id: body.assignment_id,
      actor,
    })
    .await
    .map_err(ApiError::store)?;

  let message = match (source, outcome.audited) {
    (ActorSource::Fallback, _) => "Contact saved; no acting user supplied, attributed to system",
    (_, false) => "Contact saved; modification history could not be written",
    _ => "Contact saved",
  };
  Ok(Reply::with_message(message, outcome))
}

// ─── Search / resolve ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q: String,
}

/// `GET /contacts/search?q=...`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Reply<Vec<Contact>>>, ApiError>
where
  S: CrmStore,
{
  let contacts = store
    .search_contacts(params.q)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(contacts))
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
  pub email: Option<String>,
  pub phone: Option<String>,
}

/// `GET /contacts/resolve?email=...&phone=...`: `data` is `null` on no match.
pub async fn resolve<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ResolveParams>,
) -> Result<Json<Reply<Option<Contact>>>, ApiError>
where
  S: CrmStore,
{
  let contact = store
    .resolve_contact(params.email, params.phone)
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::ok(contact))
}

// ─── Single contact ───────────────────────────────────────────────────────────

/// `GET /contacts/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reply<ContactBundle>>, ApiError>
where
  S: CrmStore,
{
  let bundle = store
    .get_contact(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Reply::ok(bundle))
}

/// `DELETE /contacts/:id`
pub async fn delete_verified<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Reply<Contact>>, ApiError>
where
  S: CrmStore,
{
  let contact = store
    .delete_verified_contact(caller.role, id, caller.actor(None, None))
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::with_message("Contact marked as rejected", contact))
}

/// JSON body accepted by `PUT /contacts/:id/events`.
#[derive(Debug, Deserialize)]
pub struct ContactEventsBody {
  #[serde(flatten)]
  pub fields:     ContactFields,
  pub events:     Vec<EventPayload>,
  pub created_by: Option<Uuid>,
  #[serde(rename = "userId")]
  pub user_id:    Option<Uuid>,
}

/// `PUT /contacts/:id/events`: edit the contact and events it already owns.
pub async fn update_with_events<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<ContactEventsBody>,
) -> Result<Json<Reply<ContactBundle>>, ApiError>
where
  S: CrmStore,
{
  let actor = caller.actor(body.created_by, body.user_id);
  let bundle = store
    .update_contact_and_events(id, ContactAndEvents {
      fields: body.fields,
      events: body.events,
      actor,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(Reply::with_message("Contact and events updated", bundle))
}
