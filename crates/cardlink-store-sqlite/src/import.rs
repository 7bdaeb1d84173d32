//! CSV bulk reconciliation.
//!
//! The import runs in one transaction with a savepoint per row. A row that
//! fails with a domain error (validation, conflict, not found) is rolled back
//! to its savepoint and reported; a fatal error aborts the whole import.

use cardlink_core::{
  Classify as _, ErrorKind,
  actor::Actor,
  event::{EventOperation, ReconcileOptions},
  history::{ModificationType, NewModification},
  import::{CsvRow, ImportReport, NormalizedRow, ProcessedContact, RowAction, RowError},
};
use rusqlite::{Connection, Transaction};

use crate::{Result, contacts, events, history, identity};

struct RowOutcome {
  processed: ProcessedContact,
  event:     Option<EventOperation>,
}

pub fn run(tx: &mut Transaction<'_>, rows: &[CsvRow], created_by: Actor) -> Result<ImportReport> {
  let mut report = ImportReport::new(rows.len());

  for (index, row) in rows.iter().enumerate() {
    let number = index + 1;
    let email = row.get("email_address").or_else(|| row.get("email"));

    let normalized = match row.normalize() {
      Ok(n) => n,
      Err(e) => {
        report.record_error(RowError {
          row: number,
          email,
          message: e.to_string(),
        });
        continue;
      }
    };
    for warning in &normalized.warnings {
      tracing::warn!(row = number, "{warning}");
    }

    let sp = tx.savepoint()?;
    match apply_row(&sp, number, &normalized, created_by) {
      Ok(outcome) => {
        sp.commit()?;
        match outcome.event {
          Some(EventOperation::Created) => report.events_created += 1,
          Some(EventOperation::Updated | EventOperation::Linked) => report.events_updated += 1,
          None => {}
        }
        report.record_success(outcome.processed);
      }
      Err(e) if e.kind() == ErrorKind::Fatal => return Err(e),
      Err(e) => {
        drop(sp);
        tracing::debug!(row = number, error = %e, "row rejected");
        report.record_error(RowError {
          row: number,
          email,
          message: e.to_string(),
        });
      }
    }
  }

  tracing::info!(
    total = report.total_rows,
    inserted = report.inserted_count,
    updated = report.updated_count,
    errors = report.error_count,
    "csv import finished"
  );
  Ok(report)
}

fn apply_row(conn: &Connection, number: usize, row: &NormalizedRow, created_by: Actor) -> Result<RowOutcome> {
  let existing = identity::resolve(
    conn,
    row.fields.email_address.as_deref(),
    row.fields.phone_number.as_deref(),
  )?;

  let (contact, action) = match existing {
    Some(found) => (contacts::merge(conn, found.contact_id, &row.fields)?, RowAction::Updated),
    None => (contacts::insert(conn, &row.fields, created_by)?, RowAction::Inserted),
  };
  let kind = match action {
    RowAction::Inserted => ModificationType::Create,
    RowAction::Updated => ModificationType::Update,
  };
  history::log_modification(
    conn,
    NewModification::new(contact.contact_id, created_by, kind)
      .with_description(format!("{} via CSV import", kind.default_description())),
  )
  .ok();

  contacts::write_details(conn, contact.contact_id, &row.details)?;

  let event = match &row.event {
    Some(payload) => {
      let options = ReconcileOptions::bulk_import(created_by);
      Some(events::reconcile(conn, contact.contact_id, payload, options)?.operation)
    }
    None => None,
  };

  Ok(RowOutcome {
    processed: ProcessedContact {
      row: number,
      contact_id: contact.contact_id,
      name: contact.name,
      action,
    },
    event,
  })
}

