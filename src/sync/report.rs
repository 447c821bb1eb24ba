use super::reconciler::{SkippedAssignment, UnchangedAssignment};
use crate::components::gradescope::FailedCourse;
use crate::utils::time::format_due;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use std::fmt::Write as _;

/// An assignment that was (or in a dry run would have been) written
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedItem {
    pub external_key: String,
    pub event_id: Option<String>,
    pub title: String,
    pub course_name: String,
    pub due_at: DateTime<FixedOffset>,
}

/// A write that the calendar rejected
#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub external_key: String,
    pub title: String,
    pub course_name: String,
    pub error: String,
}

/// Outcome of one sync run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub created: Vec<SyncedItem>,
    pub updated: Vec<SyncedItem>,
    pub unchanged: Vec<UnchangedAssignment>,
    pub skipped: Vec<SkippedAssignment>,
    pub failed: Vec<FailedItem>,
    pub failed_courses: Vec<FailedCourse>,
    pub duplicate_events: Vec<String>,
    pub dry_run: bool,
    /// Set when an authentication failure stopped the writes part way
    pub aborted: Option<String>,
}

impl SyncReport {
    /// Writes or course fetches went wrong; the next run will retry them
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || !self.failed_courses.is_empty() || self.aborted.is_some()
    }

    /// Human readable summary, due dates shown in `tz`
    pub fn render(&self, tz: &Tz) -> String {
        let mut out = String::new();
        let prefix = if self.dry_run { "Would have " } else { "" };

        let _ = writeln!(
            out,
            "Sync summary{}: {} created, {} updated, {} unchanged, {} skipped, {} failed",
            if self.dry_run { " (dry run)" } else { "" },
            self.created.len(),
            self.updated.len(),
            self.unchanged.len(),
            self.skipped.len(),
            self.failed.len() + self.failed_courses.len(),
        );

        for item in &self.created {
            let _ = writeln!(
                out,
                "  {}created: {} [{}] due {}",
                prefix,
                item.title,
                item.course_name,
                format_due(&item.due_at, tz)
            );
        }
        for item in &self.updated {
            let _ = writeln!(
                out,
                "  {}updated: {} [{}] due {}",
                prefix,
                item.title,
                item.course_name,
                format_due(&item.due_at, tz)
            );
        }
        for item in &self.skipped {
            let _ = writeln!(
                out,
                "  skipped: {} [{}] ({})",
                item.title, item.course_name, item.reason
            );
        }
        for item in &self.failed {
            let _ = writeln!(
                out,
                "  failed: {} [{}]: {}",
                item.title, item.course_name, item.error
            );
        }
        for course in &self.failed_courses {
            let _ = writeln!(
                out,
                "  failed course: {} ({}): {}",
                course.course.name, course.course.id, course.reason
            );
        }
        if !self.duplicate_events.is_empty() {
            let _ = writeln!(
                out,
                "  {} duplicate events found, run with --cleanup to remove all synced events",
                self.duplicate_events.len()
            );
        }
        if let Some(reason) = &self.aborted {
            let _ = writeln!(out, "  aborted, remaining writes not attempted: {}", reason);
        }

        out
    }
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub calendar_found: bool,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedItem>,
    pub aborted: Option<String>,
}

impl CleanupReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || self.aborted.is_some()
    }

    pub fn render(&self) -> String {
        if !self.calendar_found {
            return "Cleanup: calendar not found, nothing to delete\n".to_string();
        }

        let mut out = format!(
            "Cleanup summary: {} deleted, {} failed\n",
            self.deleted.len(),
            self.failed.len()
        );
        for item in &self.failed {
            let _ = writeln!(out, "  failed: {}: {}", item.title, item.error);
        }
        if let Some(reason) = &self.aborted {
            let _ = writeln!(out, "  aborted, remaining deletes not attempted: {}", reason);
        }
        out
    }
}
