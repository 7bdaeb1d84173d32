//! The modification audit log.
//!
//! [`log_modification`] is the only writer. It runs inside the caller's
//! transaction and reports failure as a warning; callers are free to drop
//! the returned `Result`.

use cardlink_core::history::{ModificationRecord, ModificationType, NewModification};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  encode::{HISTORY_COLUMNS, RawHistory, decode_dt, encode_dt, encode_uuid},
};

fn insert(conn: &Connection, entry: &NewModification) -> Result<ModificationRecord> {
  let record = ModificationRecord {
    history_id:        Uuid::new_v4(),
    contact_id:        entry.contact_id,
    modified_by:       entry.modified_by,
    modification_type: entry.modification_type,
    description:       entry.description().to_owned(),
    created_at:        Utc::now(),
  };
  conn.execute(
    "INSERT INTO contact_modification_history (
       history_id, contact_id, modified_by, modification_type, description, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(record.history_id),
      encode_uuid(record.contact_id),
      record.modified_by.to_string(),
      record.modification_type.as_ref(),
      record.description,
      encode_dt(record.created_at),
    ],
  )?;
  Ok(record)
}

/// Append an audit record. Failure is logged here and never escalated.
pub fn log_modification(conn: &Connection, entry: NewModification) -> Result<ModificationRecord> {
  let result = insert(conn, &entry);
  match &result {
    Ok(record) => tracing::debug!(
      contact_id = %record.contact_id,
      kind = %record.modification_type,
      "audit record written"
    ),
    Err(e) => tracing::warn!(
      contact_id = %entry.contact_id,
      kind = %entry.modification_type,
      error = %e,
      "failed to write audit record; continuing"
    ),
  }
  result
}

fn collect(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ModificationRecord>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, RawHistory::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawHistory::into_record).collect()
}

pub fn for_contact(conn: &Connection, contact_id: Uuid) -> Result<Vec<ModificationRecord>> {
  collect(
    conn,
    &format!(
      "SELECT {HISTORY_COLUMNS} FROM contact_modification_history
       WHERE contact_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ),
    rusqlite::params![encode_uuid(contact_id)],
  )
}

pub fn all(conn: &Connection, limit: Option<usize>) -> Result<Vec<ModificationRecord>> {
  // SQLite treats a negative LIMIT as "no limit".
  let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
  collect(
    conn,
    &format!(
      "SELECT {HISTORY_COLUMNS} FROM contact_modification_history
       ORDER BY created_at DESC, rowid DESC LIMIT ?1"
    ),
    rusqlite::params![limit],
  )
}

/// Newest record of `kind` for a contact and how many there are.
pub fn latest_of_type(
  conn: &Connection,
  contact_id: Uuid,
  kind: ModificationType,
) -> Result<(Option<chrono::DateTime<Utc>>, usize)> {
  let (latest, count): (Option<String>, i64) = conn
    .query_row(
      "SELECT MAX(created_at), COUNT(*) FROM contact_modification_history
       WHERE contact_id = ?1 AND modification_type = ?2",
      rusqlite::params![encode_uuid(contact_id), kind.as_ref()],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .unwrap_or((None, 0));
  let latest = latest.as_deref().map(decode_dt).transpose()?;
  Ok((latest, usize::try_from(count).unwrap_or(0)))
}
