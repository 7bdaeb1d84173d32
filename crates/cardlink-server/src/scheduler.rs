//! Periodic staleness scan.

use std::{sync::Arc, time::Duration};

use cardlink_core::{staleness::ScanReport, store::CrmStore};
use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Run one scan, logging the outcome. Failures are logged, not returned:
/// the next tick simply tries again.
pub async fn scan_once<S>(store: &S) -> Option<ScanReport>
where
  S: CrmStore,
{
  match store.scan_stale_contacts(Utc::now()).await {
    Ok(report) => {
      tracing::info!(
        checked = report.contacts_checked,
        created = report.tasks_created(),
        "scheduled staleness scan complete"
      );
      Some(report)
    }
    Err(e) => {
      tracing::warn!(error = %e, "scheduled staleness scan failed");
      None
    }
  }
}

/// Spawn the scan loop. With `run_immediately` the first scan happens right
/// away, otherwise after one full `every`.
pub fn spawn<S>(store: Arc<S>, every: Duration, run_immediately: bool) -> JoinHandle<()>
where
  S: CrmStore + 'static,
{
  tracing::info!(?every, run_immediately, "starting staleness scan scheduler");
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    if !run_immediately {
      interval.tick().await;
    }
    loop {
      interval.tick().await;
      scan_once(store.as_ref()).await;
    }
  })
}
