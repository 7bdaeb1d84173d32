//! Contact rows and their sub-records.

use cardlink_core::{
  Error as CoreError,
  actor::Actor,
  contact::{Address, Contact, ContactBundle, ContactDetails, ContactFields, Education, Experience},
  store::ContactFilter,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    CONTACT_COLUMNS, RawContact, RawEducation, RawExperience, address_from_row, encode_dt,
    encode_uuid, opt_date, opt_str,
  },
  events,
};

/// Writable columns, in the order of [`field_values`].
const FIELD_COLUMNS: [&str; 16] = [
  "name",
  "phone_number",
  "email_address",
  "secondary_phone_number",
  "secondary_email",
  "dob",
  "gender",
  "nationality",
  "marital_status",
  "category",
  "emergency_contact_name",
  "emergency_contact_relationship",
  "emergency_contact_phone_number",
  "skills",
  "linkedin_url",
  "logger",
];

fn field_values(f: &ContactFields) -> [Option<String>; 16] {
  [
    f.name.as_deref().map(str::trim).map(str::to_owned),
    f.phone_number.clone(),
    f.email_address.clone(),
    f.secondary_phone_number.clone(),
    f.secondary_email.clone(),
    opt_date(f.dob),
    opt_str(f.gender),
    f.nationality.clone(),
    f.marital_status.clone(),
    opt_str(f.category),
    f.emergency_contact_name.clone(),
    f.emergency_contact_relationship.clone(),
    f.emergency_contact_phone_number.clone(),
    f.skills.clone(),
    f.linkedin_url.clone(),
    f.logger.clone(),
  ]
}

/// `col = ?2, ...` (or the COALESCE form) for every writable column.
fn set_clause(coalesce: bool) -> String {
  FIELD_COLUMNS
    .iter()
    .enumerate()
    .map(|(i, col)| {
      let p = i + 2;
      if coalesce {
        format!("{col} = COALESCE(?{p}, {col})")
      } else {
        format!("{col} = ?{p}")
      }
    })
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn fetch(conn: &Connection, contact_id: Uuid) -> Result<Option<Contact>> {
  let raw = conn
    .query_row(
      &format!("SELECT {CONTACT_COLUMNS} FROM contacts c WHERE c.contact_id = ?1"),
      rusqlite::params![encode_uuid(contact_id)],
      RawContact::from_row,
    )
    .optional()?;
  raw.map(RawContact::into_contact).transpose()
}

pub fn require(conn: &Connection, contact_id: Uuid) -> Result<Contact> {
  fetch(conn, contact_id)?.ok_or_else(|| CoreError::ContactNotFound(contact_id).into())
}

pub fn bundle(conn: &Connection, contact: Contact) -> Result<ContactBundle> {
  let id = encode_uuid(contact.contact_id);

  let address = conn
    .query_row(
      "SELECT street, city, state, country, zipcode
       FROM contact_addresses WHERE contact_id = ?1",
      rusqlite::params![id],
      address_from_row,
    )
    .optional()?;

  let education = conn
    .query_row(
      "SELECT pg_course_name, pg_college_name, pg_university_type, pg_start_date,
              pg_end_date, ug_course_name, ug_college_name, ug_university_type,
              ug_start_date, ug_end_date
       FROM contact_education WHERE contact_id = ?1",
      rusqlite::params![id],
      RawEducation::from_row,
    )
    .optional()?
    .map(RawEducation::into_education)
    .transpose()?;

  let mut stmt = conn.prepare(
    "SELECT job_title, company_name, department_type, from_date, to_date, company_skills
     FROM contact_experience WHERE contact_id = ?1 ORDER BY position",
  )?;
  let experiences = stmt
    .query_map(rusqlite::params![id], RawExperience::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawExperience::into_experience)
    .collect::<Result<Vec<_>>>()?;

  let events = events::for_contact(conn, contact.contact_id)?;

  Ok(ContactBundle {
    contact,
    address,
    education,
    experiences,
    events,
  })
}

pub fn require_bundle(conn: &Connection, contact_id: Uuid) -> Result<ContactBundle> {
  let contact = require(conn, contact_id)?;
  bundle(conn, contact)
}

pub fn list(conn: &Connection, filter: &ContactFilter) -> Result<Vec<ContactBundle>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CONTACT_COLUMNS} FROM contacts c
     WHERE c.rejected = 0
       AND (?1 IS NULL OR c.category = ?1)
       AND (?2 IS NULL OR EXISTS (
             SELECT 1 FROM events e
             WHERE e.contact_id = c.contact_id AND e.created_by = ?2))
     ORDER BY c.created_at DESC, c.rowid DESC"
  ))?;
  let raws = stmt
    .query_map(
      rusqlite::params![opt_str(filter.category), filter.created_by.map(|a| a.to_string())],
      RawContact::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws
    .into_iter()
    .map(|raw| bundle(conn, raw.into_contact()?))
    .collect()
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for ch in text.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out.push('%');
  out
}

pub fn search(conn: &Connection, text: &str) -> Result<Vec<Contact>> {
  let text = text.trim();
  if text.is_empty() {
    return Ok(Vec::new());
  }
  let mut stmt = conn.prepare(&format!(
    "SELECT {CONTACT_COLUMNS} FROM contacts c
     WHERE c.rejected = 0
       AND (c.name LIKE ?1 ESCAPE '\\'
         OR c.email_address LIKE ?1 ESCAPE '\\'
         OR c.phone_number LIKE ?1 ESCAPE '\\')
       AND EXISTS (SELECT 1 FROM events e WHERE e.contact_id = c.contact_id AND e.verified = 1)
     ORDER BY c.name
     LIMIT 10"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![like_pattern(text)], RawContact::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawContact::into_contact).collect()
}

// ─── Writes ──────────────────────────────────────────────────────────────────

pub fn insert(conn: &Connection, fields: &ContactFields, created_by: Actor) -> Result<Contact> {
  fields.require_name()?;
  let contact_id = Uuid::new_v4();
  let placeholders = (4..4 + FIELD_COLUMNS.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "INSERT INTO contacts (contact_id, created_by, created_at, {}) VALUES (?1, ?2, ?3, {placeholders})",
    FIELD_COLUMNS.join(", ")
  );
  let head = [
    Some(encode_uuid(contact_id)),
    Some(created_by.to_string()),
    Some(encode_dt(Utc::now())),
  ];
  conn.execute(
    &sql,
    rusqlite::params_from_iter(head.into_iter().chain(field_values(fields))),
  )?;
  require(conn, contact_id)
}

/// Overwrite supplied fields, keep the rest.
pub fn merge(conn: &Connection, contact_id: Uuid, fields: &ContactFields) -> Result<Contact> {
  update(conn, contact_id, fields, true)
}

/// Overwrite every field, clearing those not supplied. A name is required.
pub fn replace(conn: &Connection, contact_id: Uuid, fields: &ContactFields) -> Result<Contact> {
  fields.require_name()?;
  update(conn, contact_id, fields, false)
}

fn update(conn: &Connection, contact_id: Uuid, fields: &ContactFields, coalesce: bool) -> Result<Contact> {
  let sql = format!(
    "UPDATE contacts SET {}, updated_at = ?{} WHERE contact_id = ?1",
    set_clause(coalesce),
    FIELD_COLUMNS.len() + 2
  );
  let changed = conn.execute(
    &sql,
    rusqlite::params_from_iter(
      std::iter::once(Some(encode_uuid(contact_id)))
        .chain(field_values(fields))
        .chain(std::iter::once(Some(encode_dt(Utc::now())))),
    ),
  )?;
  if changed == 0 {
    return Err(CoreError::ContactNotFound(contact_id).into());
  }
  require(conn, contact_id)
}

pub fn soft_delete(conn: &Connection, contact_id: Uuid) -> Result<Contact> {
  let changed = conn.execute(
    "UPDATE contacts SET rejected = 1, updated_at = ?2 WHERE contact_id = ?1",
    rusqlite::params![encode_uuid(contact_id), encode_dt(Utc::now())],
  )?;
  if changed == 0 {
    return Err(CoreError::ContactNotFound(contact_id).into());
  }
  require(conn, contact_id)
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

pub fn write_details(conn: &Connection, contact_id: Uuid, details: &ContactDetails) -> Result<()> {
  if let Some(address) = &details.address {
    upsert_address(conn, contact_id, address)?;
  }
  if let Some(education) = &details.education {
    upsert_education(conn, contact_id, education)?;
  }
  if let Some(experiences) = &details.experiences {
    replace_experiences(conn, contact_id, experiences)?;
  }
  Ok(())
}

fn upsert_address(conn: &Connection, contact_id: Uuid, a: &Address) -> Result<()> {
  conn.execute(
    "INSERT INTO contact_addresses (contact_id, street, city, state, country, zipcode)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT (contact_id) DO UPDATE SET
       street = excluded.street, city = excluded.city, state = excluded.state,
       country = excluded.country, zipcode = excluded.zipcode",
    rusqlite::params![encode_uuid(contact_id), a.street, a.city, a.state, a.country, a.zipcode],
  )?;
  Ok(())
}

fn upsert_education(conn: &Connection, contact_id: Uuid, e: &Education) -> Result<()> {
  conn.execute(
    "INSERT INTO contact_education (
       contact_id, pg_course_name, pg_college_name, pg_university_type, pg_start_date,
       pg_end_date, ug_course_name, ug_college_name, ug_university_type, ug_start_date,
       ug_end_date
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
     ON CONFLICT (contact_id) DO UPDATE SET
       pg_course_name = excluded.pg_course_name,
       pg_college_name = excluded.pg_college_name,
       pg_university_type = excluded.pg_university_type,
       pg_start_date = excluded.pg_start_date,
       pg_end_date = excluded.pg_end_date,
       ug_course_name = excluded.ug_course_name,
       ug_college_name = excluded.ug_college_name,
       ug_university_type = excluded.ug_university_type,
       ug_start_date = excluded.ug_start_date,
       ug_end_date = excluded.ug_end_date",
    rusqlite::params![
      encode_uuid(contact_id),
      e.pg_course_name,
      e.pg_college_name,
      e.pg_university_type,
      opt_date(e.pg_start_date),
      opt_date(e.pg_end_date),
      e.ug_course_name,
      e.ug_college_name,
      e.ug_university_type,
      opt_date(e.ug_start_date),
      opt_date(e.ug_end_date),
    ],
  )?;
  Ok(())
}

fn replace_experiences(conn: &Connection, contact_id: Uuid, rows: &[Experience]) -> Result<()> {
  let id = encode_uuid(contact_id);
  conn.execute(
    "DELETE FROM contact_experience WHERE contact_id = ?1",
    rusqlite::params![id],
  )?;
  let mut stmt = conn.prepare(
    "INSERT INTO contact_experience (
       experience_id, contact_id, position, job_title, company_name, department_type,
       from_date, to_date, company_skills
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
  )?;
  for (position, x) in rows.iter().enumerate() {
    stmt.execute(rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      id,
      i64::try_from(position).unwrap_or(i64::MAX),
      x.job_title,
      x.company_name,
      x.department_type,
      opt_date(x.from_date),
      opt_date(x.to_date),
      x.company_skills,
    ])?;
  }
  Ok(())
}
