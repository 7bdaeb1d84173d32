//! Error types for `cardlink-core`.
//!
//! Every failure a caller can observe falls into one of five [`ErrorKind`]s.
//! Transport layers branch on the kind, never on the concrete variant.

use thiserror::Error;
use uuid::Uuid;

/// The caller-visible category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Required input missing or malformed.
  Validation,
  /// The operation collides with existing data.
  Conflict,
  /// A referenced row does not exist, or ids are paired inconsistently.
  NotFound,
  /// The caller's role does not allow the operation.
  PermissionDenied,
  /// Anything else; the enclosing transaction is rolled back.
  Fatal,
}

/// Anything that can report its [`ErrorKind`].
///
/// Store backends implement this for their own error type so generic callers
/// (the HTTP layer, the import pipeline) can classify failures.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(
    "email matches contact {by_email} but phone number matches contact {by_phone}"
  )]
  AmbiguousIdentity { by_email: Uuid, by_phone: Uuid },

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("event {event} does not belong to contact {contact}")]
  EventContactMismatch { event: Uuid, contact: Uuid },

  #[error("assignment not found: {0}")]
  AssignmentNotFound(Uuid),

  #[error("task not found: {0}")]
  TaskNotFound(Uuid),

  #[error("permission denied: {0}")]
  PermissionDenied(String),
}

impl Error {
  /// Shorthand for a [`Error::Validation`] with a static message.
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::Conflict(_) | Self::AmbiguousIdentity { .. } => ErrorKind::Conflict,
      Self::ContactNotFound(_)
      | Self::EventNotFound(_)
      | Self::EventContactMismatch { .. }
      | Self::AssignmentNotFound(_)
      | Self::TaskNotFound(_) => ErrorKind::NotFound,
      Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
