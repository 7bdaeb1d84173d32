//! [`SqliteStore`]: the SQLite implementation of [`CrmStore`].

use std::path::Path;

use cardlink_core::{
  actor::Actor,
  contact::{Category, Contact, ContactBundle},
  event::{Event, EventPayload, ReconcileOptions, ReconciledEvent},
  history::ModificationRecord,
  import::{CsvRow, ImportReport},
  staleness::ScanReport,
  store::{
    ContactAndEvents, ContactFilter, ContactUpsert, ContactWrite, CrmStore, NewContact,
    UpsertOutcome,
  },
  task::{NewTask, Task, TaskCompletion, TaskList, TaskUpdate},
  workflow::{
    Assignment, AssignmentView, DeletionOutcome, NewAssignment, ReviewDecision, Role,
    UnverifiedEntry,
  },
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result, assignments, contacts, history, identity, import, lifecycle, schema::SCHEMA,
  staleness, tasks,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A cardlink store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All access
/// is serialised on the connection's thread, and writes take the database
/// lock up front (`BEGIN IMMEDIATE`), so an identity check and the insert
/// that follows it cannot interleave with another writer.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` in an immediate transaction; commit only if it succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&mut tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run raw SQL against the database. Tests use this to break things.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CrmStore impl ───────────────────────────────────────────────────────────

impl CrmStore for SqliteStore {
  type Error = Error;

  // ── Identity ──────────────────────────────────────────────────────────────

  async fn resolve_contact(
    &self,
    email: Option<String>,
    phone: Option<String>,
  ) -> Result<Option<Contact>> {
    self
      .read(move |conn| identity::resolve(conn, email.as_deref(), phone.as_deref()))
      .await
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn create_contact(&self, input: NewContact) -> Result<ContactWrite> {
    let write = self
      .write(move |tx| lifecycle::create_contact(tx, &input))
      .await?;
    tracing::info!(
      contact_id = %write.bundle.contact.contact_id,
      created = write.created,
      events = write.events.len(),
      "contact captured"
    );
    Ok(write)
  }

  async fn upsert_contact(&self, input: ContactUpsert) -> Result<UpsertOutcome> {
    let outcome = self
      .write(move |tx| lifecycle::upsert_contact(tx, &input))
      .await?;
    tracing::info!(
      contact_id = %outcome.bundle.contact.contact_id,
      created = outcome.created,
      kind = %outcome.modification_type,
      "contact upserted"
    );
    Ok(outcome)
  }

  async fn update_contact_and_events(
    &self,
    contact_id: Uuid,
    input: ContactAndEvents,
  ) -> Result<ContactBundle> {
    self
      .write(move |tx| lifecycle::update_contact_and_events(tx, contact_id, &input))
      .await
  }

  async fn add_event_to_contact(
    &self,
    contact_id: Uuid,
    payload: EventPayload,
    actor: Actor,
  ) -> Result<Event> {
    self
      .write(move |tx| lifecycle::add_event_to_contact(tx, contact_id, &payload, actor))
      .await
  }

  async fn capture_event(&self, payload: EventPayload, actor: Actor) -> Result<Event> {
    self
      .write(move |tx| lifecycle::capture_event(tx, &payload, actor))
      .await
  }

  async fn reconcile_event(
    &self,
    contact_id: Uuid,
    payload: EventPayload,
    options: ReconcileOptions,
  ) -> Result<ReconciledEvent> {
    self
      .write(move |tx| lifecycle::reconcile_event(tx, contact_id, &payload, options))
      .await
  }

  async fn get_contact(&self, contact_id: Uuid) -> Result<Option<ContactBundle>> {
    self
      .read(move |conn| {
        contacts::fetch(conn, contact_id)?
          .map(|c| contacts::bundle(conn, c))
          .transpose()
      })
      .await
  }

  async fn list_contacts(&self, filter: ContactFilter) -> Result<Vec<ContactBundle>> {
    self.read(move |conn| contacts::list(conn, &filter)).await
  }

  async fn search_contacts(&self, text: String) -> Result<Vec<Contact>> {
    self.read(move |conn| contacts::search(conn, &text)).await
  }

  // ── Verification workflow ─────────────────────────────────────────────────

  async fn list_unverified(&self, category: Option<Category>) -> Result<Vec<UnverifiedEntry>> {
    self
      .read(move |conn| assignments::unverified(conn, category))
      .await
  }

  async fn review_event(
    &self,
    role: Role,
    event_id: Uuid,
    decision: ReviewDecision,
    actor: Actor,
  ) -> Result<Event> {
    self
      .write(move |tx| assignments::review(tx, role, event_id, decision, actor))
      .await
  }

  async fn delete_contact_event(
    &self,
    role: Role,
    event_id: Uuid,
    actor: Actor,
  ) -> Result<DeletionOutcome> {
    self
      .write(move |tx| assignments::delete_event(tx, role, event_id, actor))
      .await
  }

  async fn delete_verified_contact(
    &self,
    role: Role,
    contact_id: Uuid,
    actor: Actor,
  ) -> Result<Contact> {
    self
      .write(move |tx| assignments::delete_contact(tx, role, contact_id, actor))
      .await
  }

  async fn create_assignments(&self, role: Role, input: NewAssignment) -> Result<Vec<Assignment>> {
    self
      .write(move |tx| assignments::create(tx, role, &input))
      .await
  }

  async fn revoke_assignment(&self, assignment_id: Uuid) -> Result<()> {
    self
      .write(move |tx| assignments::revoke(tx, assignment_id))
      .await
  }

  async fn assignments_for_user(&self, user: Uuid) -> Result<Vec<AssignmentView>> {
    self
      .read(move |conn| assignments::assigned_to(conn, user))
      .await
  }

  async fn assignments_by_user(&self, user: Uuid) -> Result<Vec<AssignmentView>> {
    self
      .read(move |conn| assignments::assigned_by(conn, user))
      .await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn contact_history(&self, contact_id: Uuid) -> Result<Vec<ModificationRecord>> {
    self
      .read(move |conn| history::for_contact(conn, contact_id))
      .await
  }

  async fn all_history(&self, limit: Option<usize>) -> Result<Vec<ModificationRecord>> {
    self.read(move |conn| history::all(conn, limit)).await
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  async fn create_task(&self, input: NewTask) -> Result<Task> {
    self.write(move |tx| tasks::create(tx, &input)).await
  }

  async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>> {
    self.read(move |conn| tasks::fetch(conn, task_id)).await
  }

  async fn list_tasks(&self, role: Role, category: Option<Category>) -> Result<TaskList> {
    self
      .read(move |conn| tasks::list(conn, role, category))
      .await
  }

  async fn update_task(&self, task_id: Uuid, update: TaskUpdate) -> Result<Task> {
    self
      .write(move |tx| tasks::update(tx, task_id, &update))
      .await
  }

  async fn delete_task(&self, task_id: Uuid) -> Result<()> {
    self.write(move |tx| tasks::delete(tx, task_id)).await
  }

  async fn complete_task(&self, task_id: Uuid, completion: TaskCompletion) -> Result<Task> {
    self
      .write(move |tx| tasks::complete(tx, task_id, completion))
      .await
  }

  // ── Batch entry points ────────────────────────────────────────────────────

  async fn scan_stale_contacts(&self, now: DateTime<Utc>) -> Result<ScanReport> {
    let report = self.write(move |tx| staleness::scan(tx, now)).await?;
    tracing::info!(
      checked = report.contacts_checked,
      created = report.tasks_created(),
      skipped = report.duplicates_skipped,
      "staleness scan finished"
    );
    Ok(report)
  }

  async fn import_rows(&self, rows: Vec<CsvRow>, created_by: Actor) -> Result<ImportReport> {
    self
      .write(move |tx| import::run(tx, &rows, created_by))
      .await
  }
}
