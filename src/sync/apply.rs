use super::reconciler::{CalendarOperation, Plan};
use super::report::{FailedItem, SyncReport, SyncedItem};
use crate::components::CalendarClient;
use crate::error::SyncResult;
use tracing::{error, info};

/// Perform a plan's writes one at a time, in plan order.
///
/// A failed write is recorded and the rest continue; nothing is rolled back.
/// An authentication failure stops the writes and is recorded in `aborted`,
/// so the report still lists what was written before it.
/// With `dry_run` no write is issued and every operation is reported as if it
/// succeeded.
pub async fn apply_plan(
    client: &dyn CalendarClient,
    calendar_id: &str,
    plan: Plan,
    dry_run: bool,
) -> SyncResult<SyncReport> {
    let mut report = SyncReport {
        unchanged: plan.unchanged,
        skipped: plan.skipped,
        duplicate_events: plan.duplicate_events,
        dry_run,
        ..Default::default()
    };

    for operation in plan.operations {
        let draft = operation.to_draft();

        let result = if dry_run {
            Ok(match &operation {
                CalendarOperation::Create { .. } => None,
                CalendarOperation::Update { event_id, .. } => Some(event_id.clone()),
            })
        } else {
            match &operation {
                CalendarOperation::Create { .. } => {
                    client.create_event(calendar_id, &draft).await.map(Some)
                }
                CalendarOperation::Update { event_id, .. } => client
                    .update_event(calendar_id, event_id, &draft)
                    .await
                    .map(|_| Some(event_id.clone())),
            }
        };

        match result {
            Ok(event_id) => {
                let item = SyncedItem {
                    external_key: draft.external_key,
                    event_id,
                    title: draft.title,
                    course_name: operation.course_name().to_string(),
                    due_at: draft.due_at,
                };
                match operation {
                    CalendarOperation::Create { .. } => {
                        info!("Created event: {} ({})", item.title, item.external_key);
                        report.created.push(item);
                    }
                    CalendarOperation::Update {
                        previous_due_at, ..
                    } => {
                        info!(
                            "Updated event: {} ({}) due {:?} -> {}",
                            item.title,
                            item.external_key,
                            previous_due_at.map(|d| d.to_rfc3339()),
                            item.due_at.to_rfc3339()
                        );
                        report.updated.push(item);
                    }
                }
            }
            Err(e) if e.is_auth() => {
                error!("Stopping writes after {}: {}", draft.title, e);
                report.aborted = Some(e.to_string());
                break;
            }
            Err(e) => {
                error!("Failed to write event {}: {}", draft.title, e);
                report.failed.push(FailedItem {
                    external_key: draft.external_key,
                    title: draft.title,
                    course_name: operation.course_name().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
