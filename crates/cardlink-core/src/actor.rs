//! Who performed an action.
//!
//! Audit rows and `created_by` columns store an [`Actor`]: either a user id or
//! the literal `system`. Which user acted is taken from several optional
//! sources in a fixed priority order (see [`ActorSources::resolve`]).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The principal a change is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Actor {
  User(Uuid),
  System,
}

impl Actor {
  pub fn user_id(self) -> Option<Uuid> {
    match self {
      Self::User(id) => Some(id),
      Self::System => None,
    }
  }
}

impl fmt::Display for Actor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::User(id) => write!(f, "{}", id.hyphenated()),
      Self::System => f.write_str("system"),
    }
  }
}

impl FromStr for Actor {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == "system" {
      return Ok(Self::System);
    }
    Uuid::parse_str(s)
      .map(Self::User)
      .map_err(|_| Error::validation(format!("invalid actor: {s:?}")))
  }
}

impl TryFrom<String> for Actor {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Actor> for String {
  fn from(a: Actor) -> Self { a.to_string() }
}

impl From<Uuid> for Actor {
  fn from(id: Uuid) -> Self { Self::User(id) }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Where a resolved [`Actor`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorSource {
  Query,
  Session,
  BodyCreatedBy,
  BodyUserId,
  /// No source supplied a user; the change is attributed to `system`.
  Fallback,
}

/// Every place a request may name the acting user, in priority order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActorSources {
  /// `?userId=` on the request.
  pub query_user_id:   Option<Uuid>,
  /// The identity established by the session layer.
  pub session_user_id: Option<Uuid>,
  /// `created_by` in the request body.
  pub body_created_by: Option<Uuid>,
  /// `userId` in the request body.
  pub body_user_id:    Option<Uuid>,
}

impl ActorSources {
  /// Pick the first populated source.
  ///
  /// Falling back to [`Actor::System`] is reported through
  /// [`ActorSource::Fallback`] so the caller can log it.
  pub fn resolve(&self) -> (Actor, ActorSource) {
    let ordered = [
      (self.query_user_id, ActorSource::Query),
      (self.session_user_id, ActorSource::Session),
      (self.body_created_by, ActorSource::BodyCreatedBy),
      (self.body_user_id, ActorSource::BodyUserId),
    ];
    ordered
      .into_iter()
      .find_map(|(id, source)| id.map(|id| (Actor::User(id), source)))
      .unwrap_or((Actor::System, ActorSource::Fallback))
  }
}

impl From<Actor> for ActorSources {
  fn from(actor: Actor) -> Self {
    Self {
      body_created_by: actor.user_id(),
      ..Self::default()
    }
  }
}
