//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, timestamps as
//! fixed-width RFC 3339 (microsecond precision, `Z` suffix), dates as
//! `YYYY-MM-DD`, and enums by their canonical string form.

use std::str::FromStr;

use cardlink_core::{
  actor::Actor,
  contact::{Address, Contact, Education, Experience},
  event::Event,
  history::ModificationRecord,
  task::Task,
  workflow::Assignment,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse an enum stored by its `strum` string form.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode {
    column,
    value: s.to_owned(),
  })
}

pub fn decode_actor(s: &str) -> Result<Actor> { Ok(s.parse()?) }

fn opt<T>(s: Option<String>, f: impl Fn(&str) -> Result<T>) -> Result<Option<T>> {
  s.as_deref().map(f).transpose()
}

pub fn opt_date(d: Option<NaiveDate>) -> Option<String> { d.map(encode_date) }

pub fn opt_str<T: AsRef<str>>(v: Option<T>) -> Option<String> {
  v.map(|v| v.as_ref().to_owned())
}

// ─── Contacts ────────────────────────────────────────────────────────────────

pub const CONTACT_COLUMNS: &str = "c.contact_id, c.name, c.phone_number, c.email_address,
  c.secondary_phone_number, c.secondary_email, c.dob, c.gender, c.nationality,
  c.marital_status, c.category, c.emergency_contact_name,
  c.emergency_contact_relationship, c.emergency_contact_phone_number, c.skills,
  c.linkedin_url, c.logger, c.rejected, c.created_by, c.created_at, c.updated_at";

/// Raw strings read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id:                     String,
  pub name:                           String,
  pub phone_number:                   Option<String>,
  pub email_address:                  Option<String>,
  pub secondary_phone_number:         Option<String>,
  pub secondary_email:                Option<String>,
  pub dob:                            Option<String>,
  pub gender:                         Option<String>,
  pub nationality:                    Option<String>,
  pub marital_status:                 Option<String>,
  pub category:                       Option<String>,
  pub emergency_contact_name:         Option<String>,
  pub emergency_contact_relationship: Option<String>,
  pub emergency_contact_phone_number: Option<String>,
  pub skills:                         Option<String>,
  pub linkedin_url:                   Option<String>,
  pub logger:                         Option<String>,
  pub rejected:                       bool,
  pub created_by:                     Option<String>,
  pub created_at:                     String,
  pub updated_at:                     Option<String>,
}

impl RawContact {
  /// Read from a row selected with [`CONTACT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id:                     row.get(0)?,
      name:                           row.get(1)?,
      phone_number:                   row.get(2)?,
      email_address:                  row.get(3)?,
      secondary_phone_number:         row.get(4)?,
      secondary_email:                row.get(5)?,
      dob:                            row.get(6)?,
      gender:                         row.get(7)?,
      nationality:                    row.get(8)?,
      marital_status:                 row.get(9)?,
      category:                       row.get(10)?,
      emergency_contact_name:         row.get(11)?,
      emergency_contact_relationship: row.get(12)?,
      emergency_contact_phone_number: row.get(13)?,
      skills:                         row.get(14)?,
      linkedin_url:                   row.get(15)?,
      logger:                         row.get(16)?,
      rejected:                       row.get(17)?,
      created_by:                     row.get(18)?,
      created_at:                     row.get(19)?,
      updated_at:                     row.get(20)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id: decode_uuid(&self.contact_id)?,
      name: self.name,
      phone_number: self.phone_number,
      email_address: self.email_address,
      secondary_phone_number: self.secondary_phone_number,
      secondary_email: self.secondary_email,
      dob: opt(self.dob, decode_date)?,
      gender: opt(self.gender, |s| decode_enum("gender", s))?,
      nationality: self.nationality,
      marital_status: self.marital_status,
      category: opt(self.category, |s| decode_enum("category", s))?,
      emergency_contact_name: self.emergency_contact_name,
      emergency_contact_relationship: self.emergency_contact_relationship,
      emergency_contact_phone_number: self.emergency_contact_phone_number,
      skills: self.skills,
      linkedin_url: self.linkedin_url,
      logger: self.logger,
      rejected: self.rejected,
      created_by: opt(self.created_by, decode_actor)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: opt(self.updated_at, decode_dt)?,
    })
  }
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

pub fn address_from_row(row: &Row<'_>) -> rusqlite::Result<Address> {
  Ok(Address {
    street:  row.get(0)?,
    city:    row.get(1)?,
    state:   row.get(2)?,
    country: row.get(3)?,
    zipcode: row.get(4)?,
  })
}

/// Education columns with dates still encoded.
pub struct RawEducation {
  pub text:  [Option<String>; 6],
  pub dates: [Option<String>; 4],
}

impl RawEducation {
  /// Column order: pg course, college, type, start, end; then the same for ug.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      text:  [row.get(0)?, row.get(1)?, row.get(2)?, row.get(5)?, row.get(6)?, row.get(7)?],
      dates: [row.get(3)?, row.get(4)?, row.get(8)?, row.get(9)?],
    })
  }

  pub fn into_education(self) -> Result<Education> {
    let [pg_course_name, pg_college_name, pg_university_type, ug_course_name, ug_college_name, ug_university_type] =
      self.text;
    let [pg_start, pg_end, ug_start, ug_end] = self.dates;
    Ok(Education {
      pg_course_name,
      pg_college_name,
      pg_university_type,
      pg_start_date: opt(pg_start, decode_date)?,
      pg_end_date: opt(pg_end, decode_date)?,
      ug_course_name,
      ug_college_name,
      ug_university_type,
      ug_start_date: opt(ug_start, decode_date)?,
      ug_end_date: opt(ug_end, decode_date)?,
    })
  }
}

pub struct RawExperience {
  pub job_title:       Option<String>,
  pub company_name:    Option<String>,
  pub department_type: Option<String>,
  pub from_date:       Option<String>,
  pub to_date:         Option<String>,
  pub company_skills:  Option<String>,
}

impl RawExperience {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      job_title:       row.get(0)?,
      company_name:    row.get(1)?,
      department_type: row.get(2)?,
      from_date:       row.get(3)?,
      to_date:         row.get(4)?,
      company_skills:  row.get(5)?,
    })
  }

  pub fn into_experience(self) -> Result<Experience> {
    Ok(Experience {
      job_title:       self.job_title,
      company_name:    self.company_name,
      department_type: self.department_type,
      from_date:       opt(self.from_date, decode_date)?,
      to_date:         opt(self.to_date, decode_date)?,
      company_skills:  self.company_skills,
    })
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

pub const EVENT_COLUMNS: &str = "e.event_id, e.contact_id, e.photo_id, e.event_name,
  e.event_role, e.event_date, e.event_held_organization, e.event_location,
  e.verified, e.contact_status, e.created_by, e.created_at, e.updated_at";

pub struct RawEvent {
  pub event_id:                String,
  pub contact_id:              Option<String>,
  pub photo_id:                Option<String>,
  pub event_name:              String,
  pub event_role:              Option<String>,
  pub event_date:              Option<String>,
  pub event_held_organization: Option<String>,
  pub event_location:          Option<String>,
  pub verified:                bool,
  pub contact_status:          String,
  pub created_by:              Option<String>,
  pub created_at:              String,
  pub updated_at:              Option<String>,
}

impl RawEvent {
  /// Read from a row selected with [`EVENT_COLUMNS`] starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:                row.get(offset)?,
      contact_id:              row.get(offset + 1)?,
      photo_id:                row.get(offset + 2)?,
      event_name:              row.get(offset + 3)?,
      event_role:              row.get(offset + 4)?,
      event_date:              row.get(offset + 5)?,
      event_held_organization: row.get(offset + 6)?,
      event_location:          row.get(offset + 7)?,
      verified:                row.get(offset + 8)?,
      contact_status:          row.get(offset + 9)?,
      created_by:              row.get(offset + 10)?,
      created_at:              row.get(offset + 11)?,
      updated_at:              row.get(offset + 12)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { Self::from_row_at(row, 0) }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:                decode_uuid(&self.event_id)?,
      contact_id:              opt(self.contact_id, decode_uuid)?,
      photo_id:                self.photo_id,
      event_name:              self.event_name,
      event_role:              self.event_role,
      event_date:              opt(self.event_date, decode_date)?,
      event_held_organization: self.event_held_organization,
      event_location:          self.event_location,
      verified:                self.verified,
      contact_status:          decode_enum("contact_status", &self.contact_status)?,
      created_by:              opt(self.created_by, decode_actor)?,
      created_at:              decode_dt(&self.created_at)?,
      updated_at:              opt(self.updated_at, decode_dt)?,
    })
  }
}

// ─── Assignments ─────────────────────────────────────────────────────────────

pub const ASSIGNMENT_COLUMNS: &str =
  "a.assignment_id, a.event_id, a.assigned_to, a.assigned_by, a.completed, a.created_at";

pub struct RawAssignment {
  pub assignment_id: String,
  pub event_id:      String,
  pub assigned_to:   String,
  pub assigned_by:   String,
  pub completed:     bool,
  pub created_at:    String,
}

impl RawAssignment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      event_id:      row.get(1)?,
      assigned_to:   row.get(2)?,
      assigned_by:   row.get(3)?,
      completed:     row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      event_id:      decode_uuid(&self.event_id)?,
      assigned_to:   decode_uuid(&self.assigned_to)?,
      assigned_by:   decode_uuid(&self.assigned_by)?,
      completed:     self.completed,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

pub const HISTORY_COLUMNS: &str =
  "history_id, contact_id, modified_by, modification_type, description, created_at";

pub struct RawHistory {
  pub history_id:        String,
  pub contact_id:        String,
  pub modified_by:       String,
  pub modification_type: String,
  pub description:       String,
  pub created_at:        String,
}

impl RawHistory {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:        row.get(0)?,
      contact_id:        row.get(1)?,
      modified_by:       row.get(2)?,
      modification_type: row.get(3)?,
      description:       row.get(4)?,
      created_at:        row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<ModificationRecord> {
    Ok(ModificationRecord {
      history_id:        decode_uuid(&self.history_id)?,
      contact_id:        decode_uuid(&self.contact_id)?,
      modified_by:       decode_actor(&self.modified_by)?,
      modification_type: decode_enum("modification_type", &self.modification_type)?,
      description:       self.description,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

pub const TASK_COLUMNS: &str = "task_id, task_title, task_description, task_deadline,
  task_assigned_category, task_type, task_completion, contact_id, created_at, updated_at";

pub struct RawTask {
  pub task_id:                String,
  pub task_title:             String,
  pub task_description:       Option<String>,
  pub task_deadline:          String,
  pub task_assigned_category: Option<String>,
  pub task_type:              String,
  pub task_completion:        bool,
  pub contact_id:             Option<String>,
  pub created_at:             String,
  pub updated_at:             Option<String>,
}

impl RawTask {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      task_id:                row.get(0)?,
      task_title:             row.get(1)?,
      task_description:       row.get(2)?,
      task_deadline:          row.get(3)?,
      task_assigned_category: row.get(4)?,
      task_type:              row.get(5)?,
      task_completion:        row.get(6)?,
      contact_id:             row.get(7)?,
      created_at:             row.get(8)?,
      updated_at:             row.get(9)?,
    })
  }

  pub fn into_task(self) -> Result<Task> {
    Ok(Task {
      task_id:                decode_uuid(&self.task_id)?,
      task_title:             self.task_title,
      task_description:       self.task_description,
      task_deadline:          decode_date(&self.task_deadline)?,
      task_assigned_category: opt(self.task_assigned_category, |s| {
        decode_enum("task_assigned_category", s)
      })?,
      task_type:              decode_enum("task_type", &self.task_type)?,
      task_completion:        self.task_completion,
      contact_id:             opt(self.contact_id, decode_uuid)?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             opt(self.updated_at, decode_dt)?,
    })
  }
}
