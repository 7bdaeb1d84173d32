//! JSON REST API for cardlink.
//!
//! Exposes an axum [`Router`] backed by any [`cardlink_core::store::CrmStore`].
//! Authentication and TLS are the caller's responsibility; the role arrives
//! as `?userType=` and the acting user as `?userId=` or the
//! [`caller::SESSION_USER_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cardlink_api::api_router(store.clone()))
//! ```

pub mod assignments;
pub mod caller;
pub mod contacts;
pub mod error;
pub mod events;
pub mod history;
pub mod import;
pub mod reply;
pub mod staleness;
pub mod tasks;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use cardlink_core::store::CrmStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CrmStore + 'static,
{
  Router::new()
    // Contacts
    .route(
      "/contacts",
      get(contacts::list::<S>)
        .post(contacts::create::<S>)
        .put(contacts::upsert::<S>),
    )
    .route("/contacts/search", get(contacts::search::<S>))
    .route("/contacts/resolve", get(contacts::resolve::<S>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>).delete(contacts::delete_verified::<S>),
    )
    .route(
      "/contacts/{id}/events",
      post(events::add_to_contact::<S>).put(contacts::update_with_events::<S>),
    )
    .route("/contacts/{id}/events/reconcile", post(events::reconcile::<S>))
    .route("/contacts/{id}/history", get(history::for_contact::<S>))
    // Events
    .route("/events", post(events::capture::<S>))
    .route("/events/unverified", get(events::unverified::<S>))
    .route("/events/{id}", delete(events::delete_one::<S>))
    .route("/events/{id}/review", post(events::review::<S>))
    // Assignments
    .route("/assignments", post(assignments::create::<S>))
    .route("/assignments/{id}", delete(assignments::revoke::<S>))
    .route("/assignments/assigned-to/{user}", get(assignments::assigned_to::<S>))
    .route("/assignments/assigned-by/{user}", get(assignments::assigned_by::<S>))
    // History
    .route("/history", get(history::list::<S>))
    // Tasks
    .route("/tasks", get(tasks::list::<S>).post(tasks::create::<S>))
    .route(
      "/tasks/{id}",
      get(tasks::get_one::<S>)
        .put(tasks::update::<S>)
        .delete(tasks::delete_one::<S>),
    )
    .route("/tasks/{id}/complete", post(tasks::complete::<S>))
    // Batch
    .route("/import", post(import::handler::<S>))
    .route("/staleness/scan", post(staleness::handler::<S>))
    .with_state(store)
}
