//! Composite contact writes: identity resolution, sub-records, event
//! reconciliation and the audit record, in that order.

use cardlink_core::{
  Error as CoreError,
  actor::{Actor, ActorSource},
  contact::{Contact, ContactBundle, ContactFields},
  event::{Event, EventFlags, EventPayload, ReconcileOptions, ReconciledEvent},
  history::{ModificationType, NewModification},
  store::{ContactAndEvents, ContactUpsert, ContactWrite, NewContact, UpsertOutcome},
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::{Result, assignments, contacts, events, history, identity};

/// Merge into the matching contact, or insert a new one.
fn resolve_or_insert(conn: &Connection, fields: &ContactFields, actor: Actor) -> Result<(Contact, bool)> {
  let existing = identity::resolve(
    conn,
    fields.email_address.as_deref(),
    fields.phone_number.as_deref(),
  )?;
  match existing {
    Some(found) => {
      tracing::debug!(contact_id = %found.contact_id, "identity matched existing contact");
      Ok((contacts::merge(conn, found.contact_id, fields)?, false))
    }
    None => Ok((contacts::insert(conn, fields, actor)?, true)),
  }
}

pub fn create_contact(conn: &Connection, input: &NewContact) -> Result<ContactWrite> {
  input.fields.require_identity()?;
  let (contact, created) = resolve_or_insert(conn, &input.fields, input.created_by)?;
  contacts::write_details(conn, contact.contact_id, &input.details)?;

  let options = ReconcileOptions::new(input.created_by);
  let reconciled = input
    .events
    .iter()
    .map(|payload| events::reconcile(conn, contact.contact_id, payload, options))
    .collect::<Result<Vec<_>>>()?;

  let kind = if created {
    ModificationType::Create
  } else {
    ModificationType::Update
  };
  history::log_modification(
    conn,
    NewModification::new(contact.contact_id, input.created_by, kind),
  )
  .ok();

  Ok(ContactWrite {
    bundle: contacts::bundle(conn, contact)?,
    created,
    events: reconciled,
  })
}

pub fn upsert_contact(conn: &Connection, input: &ContactUpsert) -> Result<UpsertOutcome> {
  let (actor, source) = input.actor.resolve();
  if source == ActorSource::Fallback {
    tracing::warn!("no acting user supplied; attributing contact update to system");
  }

  let (contact, created) = match input.contact_id {
    Some(id) => {
      contacts::require(conn, id)?;
      (contacts::replace(conn, id, &input.fields)?, false)
    }
    None => resolve_or_insert(conn, &input.fields, actor)?,
  };
  contacts::write_details(conn, contact.contact_id, &input.details)?;

  let event = match &input.event {
    Some(payload) => {
      let options = ReconcileOptions {
        flags: input.flags,
        ..ReconcileOptions::new(actor)
      };
      Some(events::reconcile(conn, contact.contact_id, payload, options)?)
    }
    None => None,
  };

  if let Some(assignment_id) = input.assignment_id {
    let assignment = assignments::fetch(conn, assignment_id)?
      .ok_or(CoreError::AssignmentNotFound(assignment_id))?;
    if let Some(r) = &event
      && r.event.event_id != assignment.event_id
    {
      return Err(
        CoreError::Validation(format!(
          "assignment {assignment_id} does not cover event {}",
          r.event.event_id
        ))
        .into(),
      );
    }
    assignments::complete(conn, assignment_id)?;
  }

  // Only an explicitly addressed event counts as a verification target.
  let event_has_assignment = match input.event.as_ref().and_then(|e| e.event_id) {
    Some(event_id) => assignments::event_has_any(conn, event_id)?,
    None => false,
  };
  let modification_type = match (input.assignment_id, event_has_assignment, created) {
    (None, false, true) => ModificationType::Create,
    (assigned, has, _) => ModificationType::for_update(assigned.is_some(), has),
  };

  let audited = history::log_modification(
    conn,
    NewModification::new(contact.contact_id, actor, modification_type),
  )
  .is_ok();

  Ok(UpsertOutcome {
    bundle: contacts::bundle(conn, contact)?,
    created,
    event,
    modification_type,
    audited,
  })
}

pub fn update_contact_and_events(
  conn: &Connection,
  contact_id: Uuid,
  input: &ContactAndEvents,
) -> Result<ContactBundle> {
  input.fields.require_identity()?;
  if input.events.is_empty() {
    return Err(CoreError::validation("at least one event is required").into());
  }
  contacts::require(conn, contact_id)?;
  contacts::merge(conn, contact_id, &input.fields)?;

  for payload in &input.events {
    let event_id = payload
      .event_id
      .ok_or_else(|| CoreError::validation("every event needs an event_id"))?;
    let existing = events::require(conn, event_id)?;
    if existing.contact_id != Some(contact_id) {
      return Err(
        CoreError::EventContactMismatch {
          event:   event_id,
          contact: contact_id,
        }
        .into(),
      );
    }
    events::reconcile(conn, contact_id, payload, ReconcileOptions::new(input.actor))?;
  }

  history::log_modification(
    conn,
    NewModification::new(contact_id, input.actor, ModificationType::Update)
      .with_description("Contact and events updated"),
  )
  .ok();

  contacts::require_bundle(conn, contact_id)
}

pub fn add_event_to_contact(
  conn: &Connection,
  contact_id: Uuid,
  payload: &EventPayload,
  actor: Actor,
) -> Result<Event> {
  payload.require_name()?;
  if payload.event_role.as_deref().is_none_or(|r| r.trim().is_empty()) || payload.event_date.is_none()
  {
    return Err(CoreError::validation("event_name, event_role and event_date are required").into());
  }
  contacts::require(conn, contact_id)?;
  let event = events::insert(conn, Some(contact_id), payload, EventFlags::default(), actor)?;
  history::log_modification(
    conn,
    NewModification::new(contact_id, actor, ModificationType::UpdateUserEvent)
      .with_description(format!("Event {} added", event.event_name)),
  )
  .ok();
  Ok(event)
}

pub fn capture_event(conn: &Connection, payload: &EventPayload, actor: Actor) -> Result<Event> {
  events::insert(conn, None, payload, EventFlags::default(), actor)
}

pub fn reconcile_event(
  conn: &Connection,
  contact_id: Uuid,
  payload: &EventPayload,
  options: ReconcileOptions,
) -> Result<ReconciledEvent> {
  contacts::require(conn, contact_id)?;
  events::reconcile(conn, contact_id, payload, options)
}
