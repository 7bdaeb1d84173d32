//! Roles, assignments and the verification state machine.
//!
//! The state of an event is never stored directly. It is derived from the
//! event's `verified`/`contact_status` columns and its most recent
//! assignment, see [`VerificationState::derive`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  contact::Contact,
  event::{ContactStatus, Event},
};

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  User,
  CatA,
  CatB,
  CatC,
  Admin,
}

impl Role {
  /// Category verifiers and admins.
  pub fn is_reviewer(self) -> bool { !matches!(self, Self::User) }

  pub fn require_reviewer(self, action: &str) -> Result<()> {
    if self.is_reviewer() {
      Ok(())
    } else {
      Err(Error::PermissionDenied(format!(
        "role {self} may not {action}"
      )))
    }
  }
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// Delegation of one event's verification to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub event_id:      Uuid,
  pub assigned_to:   Uuid,
  pub assigned_by:   Uuid,
  pub completed:     bool,
  pub created_at:    DateTime<Utc>,
}

impl Assignment {
  pub fn is_active(&self) -> bool { !self.completed }
}

/// Input for assigning one or more events to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
  pub event_ids:   Vec<Uuid>,
  pub assigned_to: Uuid,
  pub assigned_by: Uuid,
}

/// An assignment joined with what it refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentView {
  pub assignment: Assignment,
  pub event:      Event,
  pub contact:    Option<Contact>,
  pub state:      VerificationState,
}

/// An event that is waiting for verification and free to be assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnverifiedEntry {
  pub contact: Contact,
  pub event:   Event,
}

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationState {
  PendingUnverified,
  Assigned,
  UserUpdated,
  Verified,
  Approved,
  Rejected,
}

impl VerificationState {
  /// Derive the state of an event from its columns and its latest
  /// assignment, if any.
  pub fn derive(event: &Event, latest: Option<&Assignment>) -> Self {
    match (event.contact_status, event.verified, latest) {
      (ContactStatus::Approved, ..) => Self::Approved,
      (ContactStatus::Rejected, ..) => Self::Rejected,
      (_, true, _) => Self::Verified,
      (_, false, Some(a)) if a.is_active() => Self::Assigned,
      (_, false, Some(_)) => Self::UserUpdated,
      (_, false, None) => Self::PendingUnverified,
    }
  }
}

/// A reviewer's verdict on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
  Approve,
  Reject,
}

impl ReviewDecision {
  pub fn status(self) -> ContactStatus {
    match self {
      Self::Approve => ContactStatus::Approved,
      Self::Reject => ContactStatus::Rejected,
    }
  }
}

// ─── Deletion policy ─────────────────────────────────────────────────────────

/// What a delete request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionOutcome {
  /// The event row was removed.
  Removed,
  /// The event was marked rejected and verified; nothing was removed.
  SoftRejected,
}

/// Decide what deleting `event` means for `role`.
///
/// A plain user may only remove an event while it is pending and unverified,
/// or after it was bounced back (rejected and verified). Reviewers never
/// remove rows; their delete is a soft rejection.
pub fn deletion_outcome(role: Role, event: &Event) -> Result<DeletionOutcome> {
  if role.is_reviewer() {
    return Ok(DeletionOutcome::SoftRejected);
  }
  match (event.contact_status, event.verified) {
    (ContactStatus::Pending, false) | (ContactStatus::Rejected, true) => {
      Ok(DeletionOutcome::Removed)
    }
    (ContactStatus::Approved, true) => Err(Error::PermissionDenied(
      "approved and verified contacts cannot be deleted".into(),
    )),
    (status, verified) => Err(Error::PermissionDenied(format!(
      "cannot delete an event that is {status} with verified={verified}"
    ))),
  }
}
