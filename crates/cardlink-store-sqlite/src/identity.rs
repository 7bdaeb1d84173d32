//! Identity resolution: "is this person already on file?"

use cardlink_core::{Error as CoreError, contact::Contact};
use rusqlite::Connection;

use crate::{
  Result,
  encode::{CONTACT_COLUMNS, RawContact},
};

/// Find the live contact owning `email` or `phone`.
///
/// Blank inputs count as absent; at least one must remain. If the email and
/// the phone number belong to two different contacts the match is ambiguous
/// and reported as a conflict naming both.
pub fn resolve(conn: &Connection, email: Option<&str>, phone: Option<&str>) -> Result<Option<Contact>> {
  let email = email.map(str::trim).filter(|s| !s.is_empty());
  let phone = phone.map(str::trim).filter(|s| !s.is_empty());
  if email.is_none() && phone.is_none() {
    return Err(CoreError::validation("an email address or phone number is required").into());
  }

  let mut stmt = conn.prepare(&format!(
    "SELECT {CONTACT_COLUMNS} FROM contacts c
     WHERE c.rejected = 0
       AND ((?1 IS NOT NULL AND c.email_address = ?1)
         OR (?2 IS NOT NULL AND c.phone_number = ?2))
     ORDER BY c.created_at
     LIMIT 2"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![email, phone], RawContact::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let mut matches = raws
    .into_iter()
    .map(RawContact::into_contact)
    .collect::<Result<Vec<_>>>()?;

  match matches.len() {
    0 => Ok(None),
    1 => Ok(matches.pop()),
    _ => {
      let (by_email, by_phone) = if matches[0].email_address.as_deref() == email {
        (matches[0].contact_id, matches[1].contact_id)
      } else {
        (matches[1].contact_id, matches[0].contact_id)
      };
      tracing::warn!(%by_email, %by_phone, "email and phone resolve to different contacts");
      Err(CoreError::AmbiguousIdentity { by_email, by_phone }.into())
    }
  }
}
