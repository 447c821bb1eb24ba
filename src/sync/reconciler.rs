//! Deciding which calendar writes bring the calendar in line with Gradescope.
//!
//! [`reconcile`] is pure: it looks at the scraped assignments and the owned
//! events read back from the calendar and describes the writes, it never
//! performs them. Same inputs, same plan.
//!
//! Per assignment (after deduplicating by correlation key, last record wins):
//!
//! | due date | matching event | outcome |
//! |---|---|---|
//! | missing | any | skipped |
//! | unparseable | any | skipped, reported |
//! | valid | none | `Create` |
//! | valid | due differs | `Update` |
//! | valid | due equal | unchanged |
//!
//! Owned events with no assignment are left alone, absence upstream is never
//! read as a deletion. Events without the marker are ignored entirely.

use super::key::external_key;
use crate::components::gradescope::AssignmentRecord;
use crate::components::google_calendar::{CalendarEvent, EventDraft};
use crate::utils::time::parse_due_at;
use chrono::{DateTime, Duration, FixedOffset};
use std::collections::HashMap;

/// A write the calendar client should perform
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarOperation {
    Create {
        external_key: String,
        title: String,
        course_name: String,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
    Update {
        event_id: String,
        external_key: String,
        title: String,
        course_name: String,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        previous_due_at: Option<DateTime<FixedOffset>>,
    },
}

impl CalendarOperation {
    pub fn external_key(&self) -> &str {
        match self {
            CalendarOperation::Create { external_key, .. }
            | CalendarOperation::Update { external_key, .. } => external_key,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CalendarOperation::Create { title, .. } | CalendarOperation::Update { title, .. } => {
                title
            }
        }
    }

    pub fn course_name(&self) -> &str {
        match self {
            CalendarOperation::Create { course_name, .. }
            | CalendarOperation::Update { course_name, .. } => course_name,
        }
    }

    /// The due instant, which is always the event start
    pub fn due_at(&self) -> DateTime<FixedOffset> {
        match self {
            CalendarOperation::Create { start, .. } | CalendarOperation::Update { start, .. } => {
                *start
            }
        }
    }

    /// Request body for the calendar client
    pub fn to_draft(&self) -> EventDraft {
        let (start, end) = match self {
            CalendarOperation::Create { start, end, .. }
            | CalendarOperation::Update { start, end, .. } => (*start, *end),
        };

        EventDraft {
            external_key: self.external_key().to_string(),
            title: self.title().to_string(),
            description: format!("Course: {}\nSynced from Gradescope.", self.course_name()),
            start,
            end,
            due_at: start,
        }
    }
}

/// Why an assignment produced no operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoDueDate,
    InvalidDueDate(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoDueDate => write!(f, "no due date"),
            SkipReason::InvalidDueDate(raw) => write!(f, "unparseable due date {:?}", raw),
        }
    }
}

/// An assignment the plan leaves out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAssignment {
    pub external_key: String,
    pub title: String,
    pub course_name: String,
    pub reason: SkipReason,
}

/// An assignment whose event is already up to date
#[derive(Debug, Clone, PartialEq)]
pub struct UnchangedAssignment {
    pub external_key: String,
    pub event_id: String,
    pub title: String,
    pub course_name: String,
    pub due_at: DateTime<FixedOffset>,
}

/// Output of [`reconcile`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub operations: Vec<CalendarOperation>,
    pub skipped: Vec<SkippedAssignment>,
    pub unchanged: Vec<UnchangedAssignment>,
    /// Ids of owned events sharing a key with an earlier event
    pub duplicate_events: Vec<String>,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Tunables that shape the emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// `end - start` of every event
    pub event_duration: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            event_duration: Duration::zero(),
        }
    }
}

/// Reconcile with zero-length events
pub fn reconcile(assignments: &[AssignmentRecord], existing_events: &[CalendarEvent]) -> Plan {
    reconcile_with(assignments, existing_events, &ReconcileOptions::default())
}

/// Compute the operations that make `existing_events` match `assignments`
pub fn reconcile_with(
    assignments: &[AssignmentRecord],
    existing_events: &[CalendarEvent],
    options: &ReconcileOptions,
) -> Plan {
    let mut plan = Plan::default();

    // Last record per key wins, but keeps the position of the first one
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, &AssignmentRecord> = HashMap::new();
    for assignment in assignments {
        let key = external_key(&assignment.course_id, &assignment.assignment_id);
        if latest.insert(key.clone(), assignment).is_none() {
            order.push(key);
        }
    }

    let mut events: HashMap<&str, &CalendarEvent> = HashMap::new();
    for event in existing_events {
        let Some(key) = event.external_key.as_deref() else {
            continue;
        };
        if events.contains_key(key) {
            plan.duplicate_events.push(event.id.clone());
        } else {
            events.insert(key, event);
        }
    }

    for key in order {
        let assignment = latest[&key];

        let due_at = match assignment.due_at.as_deref() {
            None => {
                plan.skipped.push(skipped(&key, assignment, SkipReason::NoDueDate));
                continue;
            }
            Some(raw) => match parse_due_at(raw) {
                Some(due_at) => due_at,
                None => {
                    let reason = SkipReason::InvalidDueDate(raw.to_string());
                    plan.skipped.push(skipped(&key, assignment, reason));
                    continue;
                }
            },
        };

        let start = due_at;
        let end = due_at + options.event_duration;

        match events.get(key.as_str()) {
            None => plan.operations.push(CalendarOperation::Create {
                external_key: key,
                title: assignment.title.clone(),
                course_name: assignment.course_name.clone(),
                start,
                end,
            }),
            Some(event) => {
                let synced = event.last_synced_due_at.or(event.start);
                if synced == Some(due_at) {
                    plan.unchanged.push(UnchangedAssignment {
                        external_key: key,
                        event_id: event.id.clone(),
                        title: assignment.title.clone(),
                        course_name: assignment.course_name.clone(),
                        due_at,
                    });
                } else {
                    plan.operations.push(CalendarOperation::Update {
                        event_id: event.id.clone(),
                        external_key: key,
                        title: assignment.title.clone(),
                        course_name: assignment.course_name.clone(),
                        start,
                        end,
                        previous_due_at: synced,
                    });
                }
            }
        }
    }

    plan
}

fn skipped(key: &str, assignment: &AssignmentRecord, reason: SkipReason) -> SkippedAssignment {
    SkippedAssignment {
        external_key: key.to_string(),
        title: assignment.title.clone(),
        course_name: assignment.course_name.clone(),
        reason,
    }
}
