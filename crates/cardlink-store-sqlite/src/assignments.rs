//! Assignments and the reviewer-facing workflow transitions.

use cardlink_core::{
  Error as CoreError,
  actor::Actor,
  contact::{Category, Contact},
  event::Event,
  history::{ModificationType, NewModification},
  workflow::{
    Assignment, AssignmentView, DeletionOutcome, NewAssignment, ReviewDecision, Role,
    UnverifiedEntry, VerificationState, deletion_outcome,
  },
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result, contacts,
  encode::{
    ASSIGNMENT_COLUMNS, CONTACT_COLUMNS, EVENT_COLUMNS, RawAssignment, RawContact, RawEvent,
    encode_dt, encode_uuid, opt_str,
  },
  events, history,
};

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn fetch(conn: &Connection, assignment_id: Uuid) -> Result<Option<Assignment>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ASSIGNMENT_COLUMNS} FROM user_assignments a WHERE a.assignment_id = ?1"),
      rusqlite::params![encode_uuid(assignment_id)],
      RawAssignment::from_row,
    )
    .optional()?;
  raw.map(RawAssignment::into_assignment).transpose()
}

/// The most recent assignment of an event, completed or not.
pub fn latest_for_event(conn: &Connection, event_id: Uuid) -> Result<Option<Assignment>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM user_assignments a
         WHERE a.event_id = ?1 ORDER BY a.created_at DESC, a.rowid DESC LIMIT 1"
      ),
      rusqlite::params![encode_uuid(event_id)],
      RawAssignment::from_row,
    )
    .optional()?;
  raw.map(RawAssignment::into_assignment).transpose()
}

fn has_active(conn: &Connection, event_id: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM user_assignments WHERE event_id = ?1 AND completed = 0",
        rusqlite::params![encode_uuid(event_id)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn views(conn: &Connection, column: &str, user: Uuid) -> Result<Vec<AssignmentView>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ASSIGNMENT_COLUMNS} FROM user_assignments a
     WHERE a.{column} = ?1 ORDER BY a.created_at DESC, a.rowid DESC"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![encode_uuid(user)], RawAssignment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      let assignment = raw.into_assignment()?;
      let event = events::require(conn, assignment.event_id)?;
      let contact = event
        .contact_id
        .map(|id| contacts::fetch(conn, id))
        .transpose()?
        .flatten();
      let latest = latest_for_event(conn, event.event_id)?;
      let state = VerificationState::derive(&event, latest.as_ref());
      Ok(AssignmentView {
        assignment,
        event,
        contact,
        state,
      })
    })
    .collect()
}

pub fn assigned_to(conn: &Connection, user: Uuid) -> Result<Vec<AssignmentView>> {
  views(conn, "assigned_to", user)
}

pub fn assigned_by(conn: &Connection, user: Uuid) -> Result<Vec<AssignmentView>> {
  views(conn, "assigned_by", user)
}

/// Unverified events of live contacts with no active assignment.
pub fn unverified(conn: &Connection, category: Option<Category>) -> Result<Vec<UnverifiedEntry>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CONTACT_COLUMNS}, {EVENT_COLUMNS}
     FROM events e JOIN contacts c ON c.contact_id = e.contact_id
     WHERE e.verified = 0
       AND c.rejected = 0
       AND (?1 IS NULL OR c.category = ?1)
       AND NOT EXISTS (
             SELECT 1 FROM user_assignments a
             WHERE a.event_id = e.event_id AND a.completed = 0)
     ORDER BY e.created_at DESC, e.rowid DESC"
  ))?;
  let rows = stmt
    .query_map(rusqlite::params![opt_str(category)], |row| {
      Ok((RawContact::from_row(row)?, RawEvent::from_row_at(row, 21)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  rows
    .into_iter()
    .map(|(c, e)| {
      Ok(UnverifiedEntry {
        contact: c.into_contact()?,
        event:   e.into_event()?,
      })
    })
    .collect()
}

// ─── Assignment writes ───────────────────────────────────────────────────────

pub fn create(conn: &Connection, role: Role, input: &NewAssignment) -> Result<Vec<Assignment>> {
  role.require_reviewer("assign events")?;
  if input.event_ids.is_empty() {
    return Err(CoreError::validation("at least one event_id is required").into());
  }

  let mut created = Vec::with_capacity(input.event_ids.len());
  for &event_id in &input.event_ids {
    let event = events::require(conn, event_id)?;
    if event.verified {
      return Err(CoreError::Conflict(format!("event {event_id} is already verified")).into());
    }
    if has_active(conn, event_id)? {
      return Err(
        CoreError::Conflict(format!("event {event_id} already has an active assignment")).into(),
      );
    }

    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      event_id,
      assigned_to: input.assigned_to,
      assigned_by: input.assigned_by,
      completed: false,
      created_at: Utc::now(),
    };
    conn.execute(
      "INSERT INTO user_assignments (
         assignment_id, event_id, assigned_to, assigned_by, completed, created_at
       ) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
      rusqlite::params![
        encode_uuid(assignment.assignment_id),
        encode_uuid(event_id),
        encode_uuid(assignment.assigned_to),
        encode_uuid(assignment.assigned_by),
        encode_dt(assignment.created_at),
      ],
    )?;

    if let Some(contact_id) = event.contact_id {
      history::log_modification(
        conn,
        NewModification::new(contact_id, Actor::User(input.assigned_by), ModificationType::Assign)
          .with_description(format!("Event {} assigned to {}", event.event_name, input.assigned_to)),
      )
      .ok();
    }
    created.push(assignment);
  }
  tracing::info!(count = created.len(), assigned_to = %input.assigned_to, "assignments created");
  Ok(created)
}

/// Mark the assignment done. Completing twice is harmless.
pub fn complete(conn: &Connection, assignment_id: Uuid) -> Result<Assignment> {
  let changed = conn.execute(
    "UPDATE user_assignments SET completed = 1 WHERE assignment_id = ?1",
    rusqlite::params![encode_uuid(assignment_id)],
  )?;
  if changed == 0 {
    return Err(CoreError::AssignmentNotFound(assignment_id).into());
  }
  fetch(conn, assignment_id)?.ok_or_else(|| CoreError::AssignmentNotFound(assignment_id).into())
}

pub fn revoke(conn: &Connection, assignment_id: Uuid) -> Result<()> {
  let changed = conn.execute(
    "DELETE FROM user_assignments WHERE assignment_id = ?1",
    rusqlite::params![encode_uuid(assignment_id)],
  )?;
  if changed == 0 {
    return Err(CoreError::AssignmentNotFound(assignment_id).into());
  }
  Ok(())
}

pub fn event_has_any(conn: &Connection, event_id: Uuid) -> Result<bool> {
  Ok(latest_for_event(conn, event_id)?.is_some())
}

// ─── Review and deletion ─────────────────────────────────────────────────────

pub fn review(
  conn: &Connection,
  role: Role,
  event_id: Uuid,
  decision: ReviewDecision,
  actor: Actor,
) -> Result<Event> {
  role.require_reviewer("review events")?;
  events::require(conn, event_id)?;
  let event = events::set_review(conn, event_id, decision.status(), true)?;
  if let Some(contact_id) = event.contact_id {
    history::log_modification(
      conn,
      NewModification::new(contact_id, actor, ModificationType::Update)
        .with_description(format!("Event {} marked {}", event.event_name, event.contact_status)),
    )
    .ok();
  }
  Ok(event)
}

pub fn delete_event(conn: &Connection, role: Role, event_id: Uuid, actor: Actor) -> Result<DeletionOutcome> {
  let event = events::require(conn, event_id)?;
  let outcome = deletion_outcome(role, &event)?;
  match outcome {
    DeletionOutcome::Removed => events::delete(conn, event_id)?,
    DeletionOutcome::SoftRejected => {
      events::set_review(conn, event_id, ReviewDecision::Reject.status(), true)?;
    }
  }
  if let Some(contact_id) = event.contact_id {
    let description = match outcome {
      DeletionOutcome::Removed => format!("Event {} deleted", event.event_name),
      DeletionOutcome::SoftRejected => format!("Event {} rejected", event.event_name),
    };
    history::log_modification(
      conn,
      NewModification::new(contact_id, actor, ModificationType::Delete).with_description(description),
    )
    .ok();
  }
  tracing::info!(%event_id, %role, ?outcome, "event deletion applied");
  Ok(outcome)
}

pub fn delete_contact(conn: &Connection, role: Role, contact_id: Uuid, actor: Actor) -> Result<Contact> {
  role.require_reviewer("delete verified contacts")?;
  let contact = contacts::soft_delete(conn, contact_id)?;
  history::log_modification(
    conn,
    NewModification::new(contact_id, actor, ModificationType::Delete)
      .with_description("Contact marked as rejected"),
  )
  .ok();
  Ok(contact)
}
