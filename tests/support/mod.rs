//! In-memory stand-ins for Gradescope and Google Calendar.
#![allow(dead_code)]

use async_trait::async_trait;
use gradesync::components::gradescope::{AssignmentRecord, FetchOutcome};
use gradesync::components::google_calendar::{CalendarEvent, EventDraft};
use gradesync::components::{AssignmentSource, CalendarClient};
use gradesync::error::{auth_error, google_calendar_error, SyncResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Build an assignment record
pub fn assignment(course: &str, id: &str, title: &str, due: Option<&str>) -> AssignmentRecord {
    AssignmentRecord {
        course_id: course.to_string(),
        course_name: format!("Course {}", course),
        assignment_id: id.to_string(),
        title: title.to_string(),
        due_at: due.map(|d| d.to_string()),
    }
}

#[derive(Debug, Default)]
struct CalendarState {
    calendars: HashMap<String, String>,
    events: Vec<(String, CalendarEvent)>,
    next_id: usize,
    failing_keys: HashSet<String>,
    reject_credentials: bool,
    revoke_after_writes: Option<usize>,
    writes: Vec<String>,
}

/// Mock calendar service keeping events in memory
#[derive(Debug, Clone, Default)]
pub struct MockCalendar {
    state: Arc<Mutex<CalendarState>>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that already has a calendar with the given name
    pub async fn with_calendar(name: &str) -> (Self, String) {
        let mock = Self::new();
        let id = mock.ensure_calendar(name).await.unwrap();
        (mock, id)
    }

    /// Put an event in place without going through the client API
    pub async fn insert_event(&self, calendar_id: &str, event: CalendarEvent) {
        let mut state = self.state.lock().await;
        state.events.push((calendar_id.to_string(), event));
    }

    /// Make every write for this correlation key fail
    pub async fn fail_writes_for(&self, key: &str) {
        self.state.lock().await.failing_keys.insert(key.to_string());
    }

    /// Answer every call with an authentication failure
    pub async fn reject_credentials(&self) {
        self.state.lock().await.reject_credentials = true;
    }

    /// Accept this many writes, then answer every call with an authentication failure
    pub async fn revoke_credentials_after(&self, writes: usize) {
        self.state.lock().await.revoke_after_writes = Some(writes);
    }

    /// All events, owned or not, in one calendar
    pub async fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        let state = self.state.lock().await;
        state
            .events
            .iter()
            .filter(|(cal, _)| cal == calendar_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Log of write calls, e.g. `create 1:A`
    pub async fn writes(&self) -> Vec<String> {
        self.state.lock().await.writes.clone()
    }

    async fn check_credentials(&self) -> SyncResult<()> {
        let state = self.state.lock().await;
        let revoked = state
            .revoke_after_writes
            .is_some_and(|limit| state.writes.len() >= limit);
        if state.reject_credentials || revoked {
            return Err(auth_error("mock rejected credentials"));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarClient for MockCalendar {
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<String>> {
        self.check_credentials().await?;
        Ok(self.state.lock().await.calendars.get(name).cloned())
    }

    async fn ensure_calendar(&self, name: &str) -> SyncResult<String> {
        self.check_credentials().await?;
        let mut state = self.state.lock().await;
        let next = state.calendars.len() + 1;
        let id = state
            .calendars
            .entry(name.to_string())
            .or_insert_with(|| format!("cal{}", next))
            .clone();
        Ok(id)
    }

    async fn list_owned_events(&self, calendar_id: &str) -> SyncResult<Vec<CalendarEvent>> {
        self.check_credentials().await?;
        Ok(self
            .events(calendar_id)
            .await
            .into_iter()
            .filter(|e| e.is_owned())
            .collect())
    }

    async fn create_event(&self, calendar_id: &str, draft: &EventDraft) -> SyncResult<String> {
        self.check_credentials().await?;
        let mut state = self.state.lock().await;
        state.writes.push(format!("create {}", draft.external_key));
        if state.failing_keys.contains(&draft.external_key) {
            return Err(google_calendar_error("mock write failure"));
        }

        state.next_id += 1;
        let id = format!("evt{}", state.next_id);
        state.events.push((
            calendar_id.to_string(),
            CalendarEvent {
                id: id.clone(),
                external_key: Some(draft.external_key.clone()),
                title: draft.title.clone(),
                start: Some(draft.start),
                end: Some(draft.end),
                last_synced_due_at: Some(draft.due_at),
            },
        ));
        Ok(id)
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> SyncResult<()> {
        self.check_credentials().await?;
        let mut state = self.state.lock().await;
        state.writes.push(format!("update {}", draft.external_key));
        if state.failing_keys.contains(&draft.external_key) {
            return Err(google_calendar_error("mock write failure"));
        }

        let event = state
            .events
            .iter_mut()
            .find(|(cal, e)| cal == calendar_id && e.id == event_id)
            .map(|(_, e)| e)
            .ok_or_else(|| google_calendar_error("HTTP 404 Not Found"))?;
        event.title = draft.title.clone();
        event.start = Some(draft.start);
        event.end = Some(draft.end);
        event.last_synced_due_at = Some(draft.due_at);
        Ok(())
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        self.check_credentials().await?;
        let mut state = self.state.lock().await;
        state.writes.push(format!("delete {}", event_id));
        state
            .events
            .retain(|(cal, e)| !(cal == calendar_id && e.id == event_id));
        Ok(())
    }
}

/// Assignment source returning canned data
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub outcome: FetchOutcome,
    pub reject_credentials: bool,
}

impl StaticSource {
    pub fn new(records: Vec<AssignmentRecord>) -> Self {
        Self {
            outcome: FetchOutcome {
                records,
                failed_courses: Vec::new(),
            },
            reject_credentials: false,
        }
    }
}

#[async_trait]
impl AssignmentSource for StaticSource {
    async fn fetch_all(&self) -> SyncResult<FetchOutcome> {
        if self.reject_credentials {
            return Err(auth_error("Gradescope login failed"));
        }
        Ok(self.outcome.clone())
    }
}
