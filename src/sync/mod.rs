pub mod apply;
pub mod key;
pub mod reconciler;
pub mod report;

pub use apply::apply_plan;
pub use reconciler::{reconcile, reconcile_with, CalendarOperation, Plan, ReconcileOptions};
pub use report::{CleanupReport, SyncReport};

use crate::components::{AssignmentSource, CalendarClient};
use crate::error::SyncResult;
use report::FailedItem;
use tracing::{info, warn};

/// One full sync: fetch, reconcile, write.
///
/// The calendar is looked up before anything is fetched so bad Google
/// credentials abort the run before any work is done. In a dry run a missing
/// calendar is not created and every assignment is planned as a create.
pub async fn run_sync(
    source: &dyn AssignmentSource,
    calendar: &dyn CalendarClient,
    calendar_name: &str,
    options: &ReconcileOptions,
    dry_run: bool,
) -> SyncResult<SyncReport> {
    let existing_calendar = calendar.find_calendar(calendar_name).await?;

    let fetched = source.fetch_all().await?;

    let calendar_id = match existing_calendar {
        Some(id) => Some(id),
        None if dry_run => None,
        None => Some(calendar.ensure_calendar(calendar_name).await?),
    };

    let existing_events = match &calendar_id {
        Some(id) => calendar.list_owned_events(id).await?,
        None => Vec::new(),
    };

    let plan = reconcile_with(&fetched.records, &existing_events, options);
    info!(
        "Planned {} writes for {} assignments ({} unchanged, {} skipped)",
        plan.operations.len(),
        fetched.records.len(),
        plan.unchanged.len(),
        plan.skipped.len()
    );
    for skipped in &plan.skipped {
        warn!("Skipping {} [{}]: {}", skipped.title, skipped.course_name, skipped.reason);
    }
    if !plan.duplicate_events.is_empty() {
        warn!(
            "Calendar has {} duplicate synced events: {:?}",
            plan.duplicate_events.len(),
            plan.duplicate_events
        );
    }

    let mut report = apply_plan(
        calendar,
        calendar_id.as_deref().unwrap_or_default(),
        plan,
        dry_run,
    )
    .await?;
    report.failed_courses = fetched.failed_courses;

    Ok(report)
}

/// Delete every event this tool owns in the named calendar
pub async fn cleanup(calendar: &dyn CalendarClient, calendar_name: &str) -> SyncResult<CleanupReport> {
    let mut report = CleanupReport::default();

    let Some(calendar_id) = calendar.find_calendar(calendar_name).await? else {
        info!("Calendar '{}' not found, nothing to clean up", calendar_name);
        return Ok(report);
    };
    report.calendar_found = true;

    let events = calendar.list_owned_events(&calendar_id).await?;
    info!("Deleting {} synced events from '{}'", events.len(), calendar_name);

    for event in events.into_iter().filter(|e| e.is_owned()) {
        match calendar.delete_event(&calendar_id, &event.id).await {
            Ok(()) => report.deleted.push(event.title),
            Err(e) if e.is_auth() => {
                warn!("Stopping cleanup at {}: {}", event.title, e);
                report.aborted = Some(e.to_string());
                break;
            }
            Err(e) => {
                warn!("Failed to delete event {}: {}", event.title, e);
                report.failed.push(FailedItem {
                    external_key: event.external_key.unwrap_or_default(),
                    title: event.title,
                    course_name: String::new(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
