//! The `CrmStore` trait and its request/response types.
//!
//! The trait is implemented by storage backends (e.g.
//! `cardlink-store-sqlite`). Higher layers (`cardlink-api`,
//! `cardlink-server`) depend on this abstraction, not on a concrete backend.
//!
//! Every write method is one transaction: it either commits as a whole or
//! leaves no trace. Audit records are written inside that transaction on a
//! best-effort basis; a failed audit write never fails the operation.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Classify,
  actor::{Actor, ActorSources},
  contact::{Category, Contact, ContactBundle, ContactDetails, ContactFields},
  event::{Event, EventFlags, EventPayload, ReconcileOptions, ReconciledEvent},
  history::{ModificationRecord, ModificationType},
  import::{CsvRow, ImportReport},
  staleness::ScanReport,
  task::{NewTask, Task, TaskCompletion, TaskList, TaskUpdate},
  workflow::{
    Assignment, AssignmentView, DeletionOutcome, NewAssignment, ReviewDecision, Role,
    UnverifiedEntry,
  },
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Capture a contact with its sub-records and events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
  #[serde(flatten)]
  pub fields:     ContactFields,
  #[serde(flatten)]
  pub details:    ContactDetails,
  #[serde(default)]
  pub events:     Vec<EventPayload>,
  pub created_by: Actor,
}

/// Update-or-create a contact and at most one event.
///
/// With `contact_id` the contact's fields are replaced wholesale. Without it
/// the identity resolver decides between merging into a match and inserting.
#[derive(Debug, Clone, Default)]
pub struct ContactUpsert {
  pub contact_id:    Option<Uuid>,
  pub fields:        ContactFields,
  pub details:       ContactDetails,
  pub event:         Option<EventPayload>,
  /// Verification flags to stamp on the event, as decided by the caller.
  pub flags:         EventFlags,
  /// Set when the assignee submits the delegated work.
  pub assignment_id: Option<Uuid>,
  pub actor:         ActorSources,
}

/// Edit a contact together with events it already owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactAndEvents {
  #[serde(flatten)]
  pub fields: ContactFields,
  /// Each payload must carry the `event_id` of an event of this contact.
  pub events: Vec<EventPayload>,
  pub actor:  Actor,
}

/// Parameters for [`CrmStore::list_contacts`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFilter {
  pub category:   Option<Category>,
  /// Contacts with at least one event created by this actor.
  pub created_by: Option<Actor>,
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactWrite {
  pub bundle:  ContactBundle,
  /// `false` when the identity resolver matched an existing contact.
  pub created: bool,
  pub events:  Vec<ReconciledEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertOutcome {
  pub bundle:            ContactBundle,
  pub created:           bool,
  pub event:             Option<ReconciledEvent>,
  /// The audit classification applied to this write.
  pub modification_type: ModificationType,
  /// `false` if the audit record could not be written.
  pub audited:           bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a cardlink storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CrmStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Identity ──────────────────────────────────────────────────────────

  /// Find the live contact whose email or phone number matches.
  ///
  /// At least one of the two must be given. Matching two different contacts
  /// (one by email, one by phone) is a conflict.
  fn resolve_contact(
    &self,
    email: Option<String>,
    phone: Option<String>,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Capture a contact. A match on email or phone reuses the existing
  /// contact (merging supplied fields) instead of inserting a duplicate.
  fn create_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<ContactWrite, Self::Error>> + Send + '_;

  fn upsert_contact(
    &self,
    input: ContactUpsert,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  fn update_contact_and_events(
    &self,
    contact_id: Uuid,
    input: ContactAndEvents,
  ) -> impl Future<Output = Result<ContactBundle, Self::Error>> + Send + '_;

  /// Attach a new event to an existing contact. Name, role and date are
  /// required.
  fn add_event_to_contact(
    &self,
    contact_id: Uuid,
    payload: EventPayload,
    actor: Actor,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Record an event from a photo capture, not yet linked to a contact.
  fn capture_event(
    &self,
    payload: EventPayload,
    actor: Actor,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Create, update or link an event for `contact_id`.
  fn reconcile_event(
    &self,
    contact_id: Uuid,
    payload: EventPayload,
    options: ReconcileOptions,
  ) -> impl Future<Output = Result<ReconciledEvent, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    contact_id: Uuid,
  ) -> impl Future<Output = Result<Option<ContactBundle>, Self::Error>> + Send + '_;

  /// Live (non-rejected) contacts matching `filter`.
  fn list_contacts(
    &self,
    filter: ContactFilter,
  ) -> impl Future<Output = Result<Vec<ContactBundle>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over name, email and phone number,
  /// restricted to contacts with a verified event. At most ten results.
  fn search_contacts(
    &self,
    text: String,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  // ── Verification workflow ─────────────────────────────────────────────

  /// Unverified events with no active assignment.
  fn list_unverified(
    &self,
    category: Option<Category>,
  ) -> impl Future<Output = Result<Vec<UnverifiedEntry>, Self::Error>> + Send + '_;

  fn review_event(
    &self,
    role: Role,
    event_id: Uuid,
    decision: ReviewDecision,
    actor: Actor,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Role-gated delete of one event; see [`crate::workflow::deletion_outcome`].
  fn delete_contact_event(
    &self,
    role: Role,
    event_id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<DeletionOutcome, Self::Error>> + Send + '_;

  /// Soft-delete a whole contact. Reviewers only.
  fn delete_verified_contact(
    &self,
    role: Role,
    contact_id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn create_assignments(
    &self,
    role: Role,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  fn revoke_assignment(
    &self,
    assignment_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Assignments handed to `user`.
  fn assignments_for_user(
    &self,
    user: Uuid,
  ) -> impl Future<Output = Result<Vec<AssignmentView>, Self::Error>> + Send + '_;

  /// Assignments handed out by `user`.
  fn assignments_by_user(
    &self,
    user: Uuid,
  ) -> impl Future<Output = Result<Vec<AssignmentView>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Audit records for one contact, newest first.
  fn contact_history(
    &self,
    contact_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ModificationRecord>, Self::Error>> + Send + '_;

  /// The whole audit log, newest first.
  fn all_history(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<ModificationRecord>, Self::Error>> + Send + '_;

  // ── Tasks ─────────────────────────────────────────────────────────────

  fn create_task(
    &self,
    input: NewTask,
  ) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  fn get_task(
    &self,
    task_id: Uuid,
  ) -> impl Future<Output = Result<Option<Task>, Self::Error>> + Send + '_;

  /// Admins see every task; other roles see `category` only.
  fn list_tasks(
    &self,
    role: Role,
    category: Option<Category>,
  ) -> impl Future<Output = Result<TaskList, Self::Error>> + Send + '_;

  fn update_task(
    &self,
    task_id: Uuid,
    update: TaskUpdate,
  ) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  fn delete_task(
    &self,
    task_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn complete_task(
    &self,
    task_id: Uuid,
    completion: TaskCompletion,
  ) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  // ── Batch entry points ────────────────────────────────────────────────

  /// Emit automated tasks for stale contacts as of `now`. Idempotent.
  fn scan_stale_contacts(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<ScanReport, Self::Error>> + Send + '_;

  /// Apply a CSV import. Row errors are reported, not raised.
  fn import_rows(
    &self,
    rows: Vec<CsvRow>,
    created_by: Actor,
  ) -> impl Future<Output = Result<ImportReport, Self::Error>> + Send + '_;
}
