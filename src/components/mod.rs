use crate::error::SyncResult;
use async_trait::async_trait;

pub mod gradescope;
pub mod google_calendar;

pub use gradescope::{AssignmentRecord, FetchOutcome, GradescopeClient};
pub use google_calendar::{CalendarEvent, EventDraft, GoogleCalendarClient};

/// Where assignments come from
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Authenticate and collect assignments from every course.
    ///
    /// An authentication failure is returned as an error. A single course that
    /// fails to load ends up in `FetchOutcome::failed_courses` instead.
    async fn fetch_all(&self) -> SyncResult<FetchOutcome>;
}

/// The calendar primitives the sync needs, scoped by calendar id
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Look up a calendar id by its display name
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<String>>;

    /// Look up a calendar id by name, creating the calendar if missing
    async fn ensure_calendar(&self, name: &str) -> SyncResult<String>;

    /// All events carrying this tool's correlation-key marker
    async fn list_owned_events(&self, calendar_id: &str) -> SyncResult<Vec<CalendarEvent>>;

    /// Create an event, returning its id
    async fn create_event(&self, calendar_id: &str, draft: &EventDraft) -> SyncResult<String>;

    /// Overwrite an existing event in place
    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> SyncResult<()>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SyncResult<()>;
}
