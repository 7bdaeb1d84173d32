//! The staleness scan: emit automated tasks for neglected contacts.

use cardlink_core::{
  staleness::{Anchors, ScanReport, StalenessRule},
  task::TaskType,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::{
  Result,
  encode::{CONTACT_COLUMNS, RawContact},
  history,
  tasks::{self, TaskRow},
};

pub fn scan(conn: &Connection, now: DateTime<Utc>) -> Result<ScanReport> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CONTACT_COLUMNS} FROM contacts c
     WHERE c.rejected = 0
       AND EXISTS (SELECT 1 FROM events e WHERE e.contact_id = c.contact_id AND e.verified = 1)
     ORDER BY c.created_at"
  ))?;
  let candidates = stmt
    .query_map([], RawContact::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawContact::into_contact)
    .collect::<Result<Vec<_>>>()?;

  let mut report = ScanReport::default();
  for contact in &candidates {
    report.contacts_checked += 1;
    for rule in StalenessRule::ALL {
      let (last_history, history_count) =
        history::latest_of_type(conn, contact.contact_id, rule.history_type())?;
      let anchors = Anchors {
        created_at: contact.created_at,
        updated_at: contact.updated_at,
        last_history,
        history_count,
      };
      if !rule.is_stale(now, &anchors) {
        continue;
      }
      if tasks::open_automated_exists(conn, contact.contact_id, contact.category, rule.title())? {
        report.duplicates_skipped += 1;
        continue;
      }
      let description = rule.describe(contact, &anchors);
      tasks::insert(
        conn,
        TaskRow {
          title:       rule.title(),
          description: Some(&description),
          deadline:    rule.deadline(now),
          category:    contact.category,
          task_type:   TaskType::Automated,
          contact_id:  Some(contact.contact_id),
        },
      )?;
      report.record_created(rule);
    }
  }
  Ok(report)
}
