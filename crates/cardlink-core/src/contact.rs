//! Contact records and their sub-records.
//!
//! A [`Contact`] is the root aggregate. Its address and education records are
//! singular; experience rows are a list. Events live in [`crate::event`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, actor::Actor, event::Event};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The verifier tier that owns a contact.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Category {
  A,
  B,
  C,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  /// Map free-form input onto a gender.
  ///
  /// Only `m`, `male`, `f` and `female` (any case, surrounding whitespace
  /// ignored) are recognised; everything else is `None`, never an error.
  pub fn normalize(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "m" | "male" => Some(Self::Male),
      "f" | "female" => Some(Self::Female),
      _ => None,
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// Writable contact attributes. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFields {
  pub name:                           Option<String>,
  pub phone_number:                   Option<String>,
  pub email_address:                  Option<String>,
  pub secondary_phone_number:         Option<String>,
  pub secondary_email:                Option<String>,
  pub dob:                            Option<NaiveDate>,
  pub gender:                         Option<Gender>,
  pub nationality:                    Option<String>,
  pub marital_status:                 Option<String>,
  pub category:                       Option<Category>,
  pub emergency_contact_name:         Option<String>,
  pub emergency_contact_relationship: Option<String>,
  pub emergency_contact_phone_number: Option<String>,
  pub skills:                         Option<String>,
  pub linkedin_url:                   Option<String>,
  pub logger:                         Option<String>,
}

impl ContactFields {
  /// Name, phone number and email address must all be present and non-blank.
  pub fn require_identity(&self) -> Result<()> {
    let missing: Vec<&str> = [
      ("name", &self.name),
      ("phone_number", &self.phone_number),
      ("email_address", &self.email_address),
    ]
    .into_iter()
    .filter(|(_, v)| v.as_deref().is_none_or(|s| s.trim().is_empty()))
    .map(|(k, _)| k)
    .collect();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(format!(
        "missing required field(s): {}",
        missing.join(", ")
      )))
    }
  }

  /// The name, trimmed, or a validation error if absent.
  pub fn require_name(&self) -> Result<&str> {
    self
      .name
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .ok_or_else(|| Error::validation("name is required"))
  }
}

/// A persisted contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id:                     Uuid,
  pub name:                           String,
  pub phone_number:                   Option<String>,
  pub email_address:                  Option<String>,
  pub secondary_phone_number:         Option<String>,
  pub secondary_email:                Option<String>,
  pub dob:                            Option<NaiveDate>,
  pub gender:                         Option<Gender>,
  pub nationality:                    Option<String>,
  pub marital_status:                 Option<String>,
  pub category:                       Option<Category>,
  pub emergency_contact_name:         Option<String>,
  pub emergency_contact_relationship: Option<String>,
  pub emergency_contact_phone_number: Option<String>,
  pub skills:                         Option<String>,
  pub linkedin_url:                   Option<String>,
  pub logger:                         Option<String>,
  /// Whole-contact soft delete; rejected contacts never match identity.
  pub rejected:                       bool,
  pub created_by:                     Option<Actor>,
  pub created_at:                     DateTime<Utc>,
  pub updated_at:                     Option<DateTime<Utc>>,
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
  pub street:  Option<String>,
  pub city:    Option<String>,
  pub state:   Option<String>,
  pub country: Option<String>,
  pub zipcode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
  pub pg_course_name:     Option<String>,
  pub pg_college_name:    Option<String>,
  pub pg_university_type: Option<String>,
  pub pg_start_date:      Option<NaiveDate>,
  pub pg_end_date:        Option<NaiveDate>,
  pub ug_course_name:     Option<String>,
  pub ug_college_name:    Option<String>,
  pub ug_university_type: Option<String>,
  pub ug_start_date:      Option<NaiveDate>,
  pub ug_end_date:        Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
  pub job_title:       Option<String>,
  pub company_name:    Option<String>,
  pub department_type: Option<String>,
  pub from_date:       Option<NaiveDate>,
  pub to_date:         Option<NaiveDate>,
  pub company_skills:  Option<String>,
}

/// Sub-record writes that accompany a contact write.
///
/// `None` leaves the stored record alone. `Some(experiences)` replaces every
/// experience row of the contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetails {
  pub address:     Option<Address>,
  pub education:   Option<Education>,
  pub experiences: Option<Vec<Experience>>,
}

/// A contact with everything hanging off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactBundle {
  pub contact:     Contact,
  pub address:     Option<Address>,
  pub education:   Option<Education>,
  pub experiences: Vec<Experience>,
  pub events:      Vec<Event>,
}
