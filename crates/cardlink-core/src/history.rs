//! The modification audit trail.
//!
//! Records are write-once. The tag strings of [`ModificationType`] are a
//! stable contract with existing audit consumers: add new tags, never rename
//! or repurpose existing ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::actor::Actor;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum ModificationType {
  #[serde(rename = "CREATE")]
  #[strum(serialize = "CREATE")]
  Create,
  #[serde(rename = "UPDATE")]
  #[strum(serialize = "UPDATE")]
  Update,
  #[serde(rename = "USER UPDATE")]
  #[strum(serialize = "USER UPDATE")]
  UserUpdate,
  #[serde(rename = "USER VERIFY")]
  #[strum(serialize = "USER VERIFY")]
  UserVerify,
  #[serde(rename = "ASSIGN")]
  #[strum(serialize = "ASSIGN")]
  Assign,
  #[serde(rename = "DELETE")]
  #[strum(serialize = "DELETE")]
  Delete,
  #[serde(rename = "CONTACT")]
  #[strum(serialize = "CONTACT")]
  Contact,
  #[serde(rename = "UPDATE USER EVENT")]
  #[strum(serialize = "UPDATE USER EVENT")]
  UpdateUserEvent,
}

impl ModificationType {
  /// Classify an update to a contact/event by its assignment context.
  ///
  /// - the caller names an assignment: the assignee finished the delegated work
  /// - the event has any assignment: a verifier touched an assigned event
  /// - otherwise: a routine edit
  pub fn for_update(assignment_supplied: bool, event_has_assignment: bool) -> Self {
    if assignment_supplied {
      Self::UserUpdate
    } else if event_has_assignment {
      Self::UserVerify
    } else {
      Self::Update
    }
  }

  pub fn default_description(self) -> &'static str {
    match self {
      Self::Create => "Contact created",
      Self::Update => "Contact updated",
      Self::UserUpdate => "Contact updated by assigned user",
      Self::UserVerify => "Contact verified",
      Self::Assign => "Contact assigned for verification",
      Self::Delete => "Contact deleted",
      Self::Contact => "Contact reached out",
      Self::UpdateUserEvent => "Event added to contact",
    }
  }
}

/// A persisted audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationRecord {
  pub history_id:        Uuid,
  pub contact_id:        Uuid,
  pub modified_by:       Actor,
  pub modification_type: ModificationType,
  pub description:       String,
  pub created_at:        DateTime<Utc>,
}

/// Input for appending an audit record.
#[derive(Debug, Clone)]
pub struct NewModification {
  pub contact_id:        Uuid,
  pub modified_by:       Actor,
  pub modification_type: ModificationType,
  /// Defaults to [`ModificationType::default_description`].
  pub description:       Option<String>,
}

impl NewModification {
  pub fn new(contact_id: Uuid, modified_by: Actor, modification_type: ModificationType) -> Self {
    Self {
      contact_id,
      modified_by,
      modification_type,
      description: None,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn description(&self) -> &str {
    self
      .description
      .as_deref()
      .unwrap_or_else(|| self.modification_type.default_description())
  }
}
