//! Event persistence and the event reconciler.

use cardlink_core::{
  Error as CoreError,
  actor::Actor,
  event::{
    ContactStatus, Event, EventFlags, EventOperation, EventPayload, MatchKey, ReconcileOptions,
    ReconciledEvent,
  },
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  encode::{EVENT_COLUMNS, RawEvent, encode_dt, encode_uuid, opt_date, opt_str},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn fetch(conn: &Connection, event_id: Uuid) -> Result<Option<Event>> {
  let raw = conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.event_id = ?1"),
      rusqlite::params![encode_uuid(event_id)],
      RawEvent::from_row,
    )
    .optional()?;
  raw.map(RawEvent::into_event).transpose()
}

pub fn require(conn: &Connection, event_id: Uuid) -> Result<Event> {
  fetch(conn, event_id)?.ok_or_else(|| CoreError::EventNotFound(event_id).into())
}

pub fn for_contact(conn: &Connection, contact_id: Uuid) -> Result<Vec<Event>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {EVENT_COLUMNS} FROM events e WHERE e.contact_id = ?1 ORDER BY e.created_at, e.rowid"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![encode_uuid(contact_id)], RawEvent::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawEvent::into_event).collect()
}

fn find_one(conn: &Connection, filter: &str, params: impl rusqlite::Params) -> Result<Option<Event>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {EVENT_COLUMNS} FROM events e WHERE {filter}
         ORDER BY e.created_at, e.rowid LIMIT 1"
      ),
      params,
      RawEvent::from_row,
    )
    .optional()?;
  raw.map(RawEvent::into_event).transpose()
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Insert a new event. New events default to unverified and pending unless
/// `flags` say otherwise.
pub fn insert(
  conn: &Connection,
  contact_id: Option<Uuid>,
  payload: &EventPayload,
  flags: EventFlags,
  created_by: Actor,
) -> Result<Event> {
  let event = Event {
    event_id:                Uuid::new_v4(),
    contact_id,
    photo_id:                payload.photo_id.clone(),
    event_name:              payload.require_name()?.to_owned(),
    event_role:              payload.event_role.clone(),
    event_date:              payload.event_date,
    event_held_organization: payload.event_held_organization.clone(),
    event_location:          payload.event_location.clone(),
    verified:                flags.verified.unwrap_or(false),
    contact_status:          flags.contact_status.unwrap_or_default(),
    created_by:              Some(created_by),
    created_at:              Utc::now(),
    updated_at:              None,
  };
  conn.execute(
    "INSERT INTO events (
       event_id, contact_id, photo_id, event_name, event_role, event_date,
       event_held_organization, event_location, verified, contact_status,
       created_by, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      encode_uuid(event.event_id),
      event.contact_id.map(encode_uuid),
      event.photo_id,
      event.event_name,
      event.event_role,
      opt_date(event.event_date),
      event.event_held_organization,
      event.event_location,
      event.verified,
      event.contact_status.as_ref(),
      created_by.to_string(),
      encode_dt(event.created_at),
    ],
  )?;
  Ok(event)
}

/// COALESCE-merge `payload` into an event: supplied fields overwrite,
/// absent fields keep their stored value.
fn merge(
  conn: &Connection,
  event_id: Uuid,
  contact_id: Option<Uuid>,
  payload: &EventPayload,
  flags: EventFlags,
) -> Result<Event> {
  conn.execute(
    "UPDATE events SET
       contact_id              = COALESCE(?2, contact_id),
       photo_id                = COALESCE(?3, photo_id),
       event_name              = COALESCE(?4, event_name),
       event_role              = COALESCE(?5, event_role),
       event_date              = COALESCE(?6, event_date),
       event_held_organization = COALESCE(?7, event_held_organization),
       event_location          = COALESCE(?8, event_location),
       verified                = COALESCE(?9, verified),
       contact_status          = COALESCE(?10, contact_status),
       updated_at              = ?11
     WHERE event_id = ?1",
    rusqlite::params![
      encode_uuid(event_id),
      contact_id.map(encode_uuid),
      payload.photo_id,
      payload.name(),
      payload.event_role,
      opt_date(payload.event_date),
      payload.event_held_organization,
      payload.event_location,
      flags.verified,
      opt_str(flags.contact_status),
      encode_dt(Utc::now()),
    ],
  )?;
  require(conn, event_id)
}

/// Set the review columns of an event.
pub fn set_review(
  conn: &Connection,
  event_id: Uuid,
  status: ContactStatus,
  verified: bool,
) -> Result<Event> {
  merge(
    conn,
    event_id,
    None,
    &EventPayload::default(),
    EventFlags {
      verified:       Some(verified),
      contact_status: Some(status),
    },
  )
}

pub fn delete(conn: &Connection, event_id: Uuid) -> Result<()> {
  conn.execute(
    "DELETE FROM events WHERE event_id = ?1",
    rusqlite::params![encode_uuid(event_id)],
  )?;
  Ok(())
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Decide whether `payload` updates, links or creates an event of
/// `contact_id`, and apply it.
///
/// Order: explicit `event_id`, then `(photo_id, event_name)` among orphans and
/// the contact's own events, then the [`MatchKey`], then insert.
pub fn reconcile(
  conn: &Connection,
  contact_id: Uuid,
  payload: &EventPayload,
  options: ReconcileOptions,
) -> Result<ReconciledEvent> {
  let contact_str = encode_uuid(contact_id);

  if let Some(event_id) = payload.event_id {
    let existing = require(conn, event_id)?;
    return link_or_update(conn, contact_id, existing, payload, options.flags_for_existing());
  }

  if let (Some(photo_id), Some(name)) = (payload.photo_id.as_deref(), payload.name()) {
    let found = find_one(
      conn,
      "e.photo_id = ?1 AND e.event_name = ?2 AND (e.contact_id IS NULL OR e.contact_id = ?3)",
      rusqlite::params![photo_id, name, contact_str],
    )?;
    if let Some(existing) = found {
      return link_or_update(conn, contact_id, existing, payload, options.flags_for_existing());
    }
  }

  let name = payload.require_name()?;
  let found = match options.match_key {
    MatchKey::NameAndOrganization => find_one(
      conn,
      "e.contact_id = ?1 AND e.event_name = ?2 AND e.event_held_organization IS ?3",
      rusqlite::params![contact_str, name, payload.event_held_organization],
    )?,
    MatchKey::Name => find_one(
      conn,
      "e.contact_id = ?1 AND e.event_name = ?2",
      rusqlite::params![contact_str, name],
    )?,
  };

  if let Some(existing) = found {
    // Only the columns outside the match key are merged.
    let event_held_organization = match options.match_key {
      MatchKey::Name => payload.event_held_organization.clone(),
      MatchKey::NameAndOrganization => None,
    };
    let details = EventPayload {
      event_role: payload.event_role.clone(),
      event_date: payload.event_date,
      event_held_organization,
      event_location: payload.event_location.clone(),
      ..EventPayload::default()
    };
    let event = merge(
      conn,
      existing.event_id,
      None,
      &details,
      options.flags_for_existing(),
    )?;
    tracing::debug!(event_id = %event.event_id, "reconciled onto existing event");
    return Ok(ReconciledEvent {
      event,
      operation: EventOperation::Updated,
    });
  }

  let event = insert(conn, Some(contact_id), payload, options.flags, options.created_by)?;
  tracing::debug!(event_id = %event.event_id, %contact_id, "created event");
  Ok(ReconciledEvent {
    event,
    operation: EventOperation::Created,
  })
}

fn link_or_update(
  conn: &Connection,
  contact_id: Uuid,
  existing: Event,
  payload: &EventPayload,
  flags: EventFlags,
) -> Result<ReconciledEvent> {
  let operation = match existing.contact_id {
    None => EventOperation::Linked,
    Some(owner) if owner == contact_id => EventOperation::Updated,
    Some(_) => {
      return Err(
        CoreError::EventContactMismatch {
          event:   existing.event_id,
          contact: contact_id,
        }
        .into(),
      );
    }
  };
  let event = merge(conn, existing.event_id, Some(contact_id), payload, flags)?;
  tracing::debug!(event_id = %event.event_id, ?operation, "reconciled explicit event");
  Ok(ReconciledEvent { event, operation })
}
