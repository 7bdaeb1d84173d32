//! Events and the inputs of event reconciliation.
//!
//! An event documents one interaction between a contact and the
//! organisation. Events captured from a photo start without a contact
//! (`contact_id = None`) and are linked later.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, actor::Actor};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review outcome of an event.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

// ─── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:                Uuid,
  /// `None` while the event is an orphan awaiting linkage.
  pub contact_id:              Option<Uuid>,
  pub photo_id:                Option<String>,
  pub event_name:              String,
  pub event_role:              Option<String>,
  pub event_date:              Option<NaiveDate>,
  pub event_held_organization: Option<String>,
  pub event_location:          Option<String>,
  pub verified:                bool,
  pub contact_status:          ContactStatus,
  pub created_by:              Option<Actor>,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              Option<DateTime<Utc>>,
}

impl Event {
  pub fn is_orphan(&self) -> bool { self.contact_id.is_none() }
}

// ─── Reconciliation inputs ───────────────────────────────────────────────────

/// Incoming event data. Every field is optional; which ones are required
/// depends on the operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPayload {
  pub event_id:                Option<Uuid>,
  pub photo_id:                Option<String>,
  pub event_name:              Option<String>,
  pub event_role:              Option<String>,
  pub event_date:              Option<NaiveDate>,
  pub event_held_organization: Option<String>,
  pub event_location:          Option<String>,
}

impl EventPayload {
  /// The event name with surrounding whitespace removed, if non-blank.
  pub fn name(&self) -> Option<&str> {
    self
      .event_name
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
  }

  pub fn require_name(&self) -> Result<&str> {
    self
      .name()
      .ok_or_else(|| Error::validation("event_name is required"))
  }
}

/// Verification flags decided by the caller. The reconciler applies them
/// as given and never infers them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFlags {
  pub verified:       Option<bool>,
  pub contact_status: Option<ContactStatus>,
}

impl EventFlags {
  /// Flags for trusted bulk data: verified and approved.
  pub const TRUSTED: Self = Self {
    verified:       Some(true),
    contact_status: Some(ContactStatus::Approved),
  };
}

/// Which columns identify "the same event" for a linked contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
  /// `(contact_id, event_name, event_held_organization)`.
  #[default]
  NameAndOrganization,
  /// `(contact_id, event_name)`.
  Name,
}

/// Which events the [`EventFlags`] of a reconciliation are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagScope {
  /// Created, matched and linked events alike.
  #[default]
  AnyEvent,
  /// Only events the reconciliation inserts. A matched event keeps its
  /// verification state.
  NewEvents,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
  pub match_key:  MatchKey,
  pub flags:      EventFlags,
  pub flag_scope: FlagScope,
  pub created_by: Actor,
}

impl ReconcileOptions {
  pub fn new(created_by: Actor) -> Self {
    Self {
      match_key: MatchKey::default(),
      flags: EventFlags::default(),
      flag_scope: FlagScope::default(),
      created_by,
    }
  }

  /// Options for bulk data: events are keyed by name and pre-approved
  /// when created, while existing events go through review as usual.
  pub fn bulk_import(created_by: Actor) -> Self {
    Self {
      match_key: MatchKey::Name,
      flags: EventFlags::TRUSTED,
      flag_scope: FlagScope::NewEvents,
      created_by,
    }
  }

  /// The flags to write onto an event that already exists.
  pub fn flags_for_existing(&self) -> EventFlags {
    match self.flag_scope {
      FlagScope::AnyEvent => self.flags,
      FlagScope::NewEvents => EventFlags::default(),
    }
  }
}

// ─── Reconciliation outputs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOperation {
  Created,
  Updated,
  /// An orphan event was attached to the contact.
  Linked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledEvent {
  pub event:     Event,
  pub operation: EventOperation,
}
