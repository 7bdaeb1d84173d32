//! CSV row normalisation and the bulk import report.
//!
//! Rows arrive already parsed: one header-to-value map per line. This module
//! turns a row into typed contact, sub-record and event inputs. Applying
//! them is the store's job.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  contact::{Address, Category, ContactDetails, ContactFields, Education, Experience, Gender},
  event::EventPayload,
};

/// Maximum column widths. Longer values are cut with a warning.
pub const FIELD_LIMITS: [(&str, usize); 4] = [
  ("phone_number", 20),
  ("category", 20),
  ("nationality", 50),
  ("marital_status", 20),
];

/// At most this many row errors are listed in an [`ImportReport`].
pub const MAX_REPORTED_ERRORS: usize = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Row ─────────────────────────────────────────────────────────────────────

/// One header-mapped CSV line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsvRow(pub BTreeMap<String, serde_json::Value>);

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CsvRow {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(
      iter
        .into_iter()
        .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
        .collect(),
    )
  }
}

impl CsvRow {
  /// Trimmed, non-empty value of a header, matched case-insensitively.
  pub fn get(&self, header: &str) -> Option<String> {
    let value = self
      .0
      .iter()
      .find(|(k, _)| k.trim().eq_ignore_ascii_case(header))
      .map(|(_, v)| v)?;
    let text = match value {
      serde_json::Value::String(s) => s.trim().to_owned(),
      serde_json::Value::Number(n) => n.to_string(),
      serde_json::Value::Bool(b) => b.to_string(),
      _ => return None,
    };
    (!text.is_empty()).then_some(text)
  }

  /// First populated header among `headers`.
  fn get_any(&self, headers: &[&str]) -> Option<String> {
    headers.iter().find_map(|h| self.get(h))
  }

  /// Normalise the row, or fail if a required column is missing.
  pub fn normalize(&self) -> Result<NormalizedRow> {
    let mut warnings = Vec::new();
    let mut limited = |field: &str, value: Option<String>| {
      truncate_field(field, value, &mut warnings)
    };

    let phone_number = limited("phone_number", self.get_any(&["phone_number", "phone"]));
    let nationality = limited("nationality", self.get("nationality"));
    let marital_status = limited("marital_status", self.get("marital_status"));
    let raw_category = limited("category", self.get("category").map(|c| c.to_uppercase()));

    let fields = ContactFields {
      name: self.get("name"),
      phone_number,
      email_address: self.get_any(&["email_address", "email"]),
      secondary_phone_number: self.get("secondary_phone_number"),
      secondary_email: self.get("secondary_email"),
      dob: self.date("dob")?,
      gender: self.get("gender").as_deref().and_then(Gender::normalize),
      nationality,
      marital_status,
      category: None,
      emergency_contact_name: self.get("emergency_contact_name"),
      emergency_contact_relationship: self.get("emergency_contact_relationship"),
      emergency_contact_phone_number: self.get("emergency_contact_phone_number"),
      skills: self.get("skills"),
      linkedin_url: self.get("linkedin_url"),
      logger: self.get("logger"),
    };
    fields.require_identity()?;

    let category = match raw_category {
      Some(c) => match c.parse::<Category>() {
        Ok(cat) => Some(cat),
        Err(_) => {
          warnings.push(format!("unknown category {c:?} ignored"));
          None
        }
      },
      None => None,
    };

    Ok(NormalizedRow {
      fields: ContactFields { category, ..fields },
      details: ContactDetails {
        address:     self.address(),
        education:   self.education()?,
        experiences: self.experience()?.map(|e| vec![e]),
      },
      event: self.event()?,
      warnings,
    })
  }

  fn date(&self, header: &str) -> Result<Option<NaiveDate>> {
    self
      .get(header)
      .map(|raw| {
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
          .map_err(|_| Error::Validation(format!("{header}: invalid date {raw:?}")))
      })
      .transpose()
  }

  fn address(&self) -> Option<Address> {
    let address = Address {
      street:  self.get("street"),
      city:    self.get("city"),
      state:   self.get("state"),
      country: self.get("country"),
      zipcode: self.get("zipcode"),
    };
    (address != Address::default()).then_some(address)
  }

  fn education(&self) -> Result<Option<Education>> {
    let education = Education {
      pg_course_name:     self.get("pg_course_name"),
      pg_college_name:    self.get("pg_college_name"),
      pg_university_type: self.get("pg_university_type"),
      pg_start_date:      self.date("pg_start_date")?,
      pg_end_date:        self.date("pg_end_date")?,
      ug_course_name:     self.get("ug_course_name"),
      ug_college_name:    self.get("ug_college_name"),
      ug_university_type: self.get("ug_university_type"),
      ug_start_date:      self.date("ug_start_date")?,
      ug_end_date:        self.date("ug_end_date")?,
    };
    Ok((education != Education::default()).then_some(education))
  }

  fn experience(&self) -> Result<Option<Experience>> {
    let experience = Experience {
      job_title:       self.get("job_title"),
      company_name:    self.get("company_name"),
      department_type: self.get("department_type"),
      from_date:       self.date("from_date")?,
      to_date:         self.date("to_date")?,
      company_skills:  self.get("company_skills"),
    };
    Ok((experience != Experience::default()).then_some(experience))
  }

  fn event(&self) -> Result<Option<EventPayload>> {
    let Some(event_name) = self.get("event_name") else {
      return Ok(None);
    };
    Ok(Some(EventPayload {
      event_id: None,
      photo_id: None,
      event_name: Some(event_name),
      event_role: self.get("event_role"),
      event_date: self.date("event_date")?,
      event_held_organization: self.get("event_held_organization"),
      event_location: self.get("event_location"),
    }))
  }
}

fn truncate_field(field: &str, value: Option<String>, warnings: &mut Vec<String>) -> Option<String> {
  let value = value?;
  let Some(limit) = FIELD_LIMITS
    .iter()
    .find(|(name, _)| *name == field)
    .map(|(_, limit)| *limit)
  else {
    return Some(value);
  };
  if value.chars().count() <= limit {
    return Some(value);
  }
  warnings.push(format!("{field} truncated to {limit} characters"));
  Some(value.chars().take(limit).collect())
}

/// Typed inputs derived from one [`CsvRow`].
#[derive(Debug, Clone)]
pub struct NormalizedRow {
  pub fields:   ContactFields,
  pub details:  ContactDetails,
  pub event:    Option<EventPayload>,
  pub warnings: Vec<String>,
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
  /// 1-based position of the row in the import.
  pub row:     usize,
  pub email:   Option<String>,
  pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
  Inserted,
  Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedContact {
  pub row:        usize,
  pub contact_id: Uuid,
  pub name:       String,
  pub action:     RowAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub total_rows:     usize,
  pub success_count:  usize,
  pub inserted_count: usize,
  pub updated_count:  usize,
  pub events_created: usize,
  pub events_updated: usize,
  pub error_count:    usize,
  /// The first [`MAX_REPORTED_ERRORS`] row errors.
  pub errors:         Vec<RowError>,
  pub processed:      Vec<ProcessedContact>,
}

impl ImportReport {
  pub fn new(total_rows: usize) -> Self {
    Self {
      total_rows,
      ..Self::default()
    }
  }

  pub fn record_error(&mut self, error: RowError) {
    self.error_count += 1;
    if self.errors.len() < MAX_REPORTED_ERRORS {
      self.errors.push(error);
    }
  }

  pub fn record_success(&mut self, processed: ProcessedContact) {
    self.success_count += 1;
    match processed.action {
      RowAction::Inserted => self.inserted_count += 1,
      RowAction::Updated => self.updated_count += 1,
    }
    self.processed.push(processed);
  }
}
