//! Staleness predicates for the periodic contact scan.
//!
//! Only contacts with at least one verified event are considered; the store
//! applies that precondition before handing [`Anchors`] to a rule.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{contact::Contact, history::ModificationType};

/// Timestamps a rule needs to judge one contact.
#[derive(Debug, Clone, Copy)]
pub struct Anchors {
  pub created_at:    DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
  /// Newest history record of the rule's [`StalenessRule::history_type`].
  pub last_history:  Option<DateTime<Utc>>,
  /// Number of history records of that type.
  pub history_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalenessRule {
  /// Details not touched for two calendar months.
  DetailUpdate,
  /// Nobody reached out for thirty days.
  FollowUp,
}

impl StalenessRule {
  pub const ALL: [Self; 2] = [Self::DetailUpdate, Self::FollowUp];

  pub fn title(self) -> &'static str {
    match self {
      Self::DetailUpdate => "Monthly Personal Check of Details",
      Self::FollowUp => "Contact Follow-up Required",
    }
  }

  /// Which audit records reset the clock.
  pub fn history_type(self) -> ModificationType {
    match self {
      Self::DetailUpdate => ModificationType::Update,
      Self::FollowUp => ModificationType::Contact,
    }
  }

  /// Anything at or before this instant is stale.
  pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
    match self {
      Self::DetailUpdate => now
        .checked_sub_months(Months::new(2))
        .unwrap_or(now - Duration::days(61)),
      Self::FollowUp => now - Duration::days(30),
    }
  }

  pub fn deadline(self, now: DateTime<Utc>) -> NaiveDate {
    let days = match self {
      Self::DetailUpdate => 5,
      Self::FollowUp => 7,
    };
    (now + Duration::days(days)).date_naive()
  }

  /// The instant the staleness clock started.
  ///
  /// Detail updates fall back to `updated_at`/`created_at` and take the newer
  /// of that and the last UPDATE record. Follow-ups only fall back to
  /// `created_at`.
  pub fn anchor(self, a: &Anchors) -> DateTime<Utc> {
    match self {
      Self::DetailUpdate => {
        let touched = a.updated_at.unwrap_or(a.created_at);
        match a.last_history {
          Some(h) if a.history_count > 0 => h.max(touched),
          _ => touched,
        }
      }
      Self::FollowUp => match a.last_history {
        Some(h) if a.history_count > 0 => h,
        _ => a.created_at,
      },
    }
  }

  pub fn is_stale(self, now: DateTime<Utc>, a: &Anchors) -> bool {
    self.anchor(a) <= self.cutoff(now)
  }

  /// Task description explaining which history the decision was based on.
  pub fn describe(self, contact: &Contact, a: &Anchors) -> String {
    let phone = contact.phone_number.as_deref().unwrap_or("N/A");
    let email = contact.email_address.as_deref().unwrap_or("N/A");
    let last = a
      .last_history
      .filter(|_| a.history_count > 0)
      .map(|h| h.format("%Y-%m-%d").to_string());

    match self {
      Self::DetailUpdate => {
        let history = match last {
          Some(d) => format!("Last updated on {d}"),
          None => "No previous updates on record".to_owned(),
        };
        format!(
          "Update the details of {} whose phone number and email is {phone} and \
           {email}. {history}. Total previous updates: {}. Please verify and update \
           contact information.",
          contact.name, a.history_count
        )
      }
      Self::FollowUp => {
        let history = match last {
          Some(d) => format!("Last contacted on {d}"),
          None => "No previous contact on record".to_owned(),
        };
        format!(
          "Follow-up contact needed for {} (Phone: {phone}, Email: {email}). \
           {history}. Total previous contacts: {}. Please reach out to maintain \
           relationship.",
          contact.name, a.history_count
        )
      }
    }
  }
}

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
  pub contacts_checked:      usize,
  pub detail_update_created: usize,
  pub follow_up_created:     usize,
  /// Stale contacts that already had an open task.
  pub duplicates_skipped:    usize,
}

impl ScanReport {
  pub fn record_created(&mut self, rule: StalenessRule) {
    match rule {
      StalenessRule::DetailUpdate => self.detail_update_created += 1,
      StalenessRule::FollowUp => self.follow_up_created += 1,
    }
  }

  pub fn tasks_created(&self) -> usize { self.detail_update_created + self.follow_up_created }
}
