//! Who is calling, and with which role.
//!
//! The role comes from `?userType=`; the acting user from `?userId=` or the
//! [`SESSION_USER_HEADER`] set by whatever session layer sits in front of
//! the API. Body fields are consulted per handler, after those two.

use axum::{
  extract::{FromRequestParts, Query},
  http::request::Parts,
};
use cardlink_core::{
  actor::{Actor, ActorSource, ActorSources},
  workflow::Role,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the session user's id.
pub const SESSION_USER_HEADER: &str = "x-user-id";

#[derive(Debug, Default, Deserialize)]
struct CallerParams {
  #[serde(rename = "userType")]
  user_type: Option<Role>,
  #[serde(rename = "userId")]
  user_id:   Option<Uuid>,
}

/// Request-scoped caller identity. Defaults to [`Role::User`].
#[derive(Debug, Clone, Copy)]
pub struct Caller {
  pub role:            Role,
  pub query_user_id:   Option<Uuid>,
  pub session_user_id: Option<Uuid>,
}

impl Caller {
  /// All actor sources for this request, body fields included.
  pub fn sources(&self, body_created_by: Option<Uuid>, body_user_id: Option<Uuid>) -> ActorSources {
    ActorSources {
      query_user_id: self.query_user_id,
      session_user_id: self.session_user_id,
      body_created_by,
      body_user_id,
    }
  }

  /// Resolve the acting user, logging the `system` fallback.
  pub fn actor(&self, body_created_by: Option<Uuid>, body_user_id: Option<Uuid>) -> Actor {
    let (actor, source) = self.sources(body_created_by, body_user_id).resolve();
    if source == ActorSource::Fallback {
      tracing::warn!(role = %self.role, "no acting user supplied; attributing to system");
    }
    actor
  }

  /// The user named by the query or the session, if any.
  pub fn user(&self) -> Option<Uuid> { self.query_user_id.or(self.session_user_id) }
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Query(params) = Query::<CallerParams>::from_request_parts(parts, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let session_user_id = parts
      .headers
      .get(SESSION_USER_HEADER)
      .map(|v| {
        v.to_str()
          .ok()
          .and_then(|s| s.trim().parse::<Uuid>().ok())
          .ok_or_else(|| ApiError::BadRequest(format!("{SESSION_USER_HEADER} is not a user id")))
      })
      .transpose()?;

    Ok(Self {
      role: params.user_type.unwrap_or(Role::User),
      query_user_id: params.user_id,
      session_user_id,
    })
  }
}
