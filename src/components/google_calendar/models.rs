use crate::sync::key::{DUE_PROPERTY, KEY_PROPERTY, KEY_VERSION, KEY_VERSION_PROPERTY};
use crate::utils::time::parse_due_at;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Calendar event as seen by the reconciler
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalendarEvent {
    pub id: String,
    /// Correlation key, `None` for events this tool does not own
    pub external_key: Option<String>,
    pub title: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub last_synced_due_at: Option<DateTime<FixedOffset>>,
}

impl CalendarEvent {
    pub fn is_owned(&self) -> bool {
        self.external_key.is_some()
    }
}

/// Everything needed to write an owned event
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub external_key: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub due_at: DateTime<FixedOffset>,
}

/// Event resource of the Calendar v3 API, limited to the fields we use
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ApiEventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ApiEventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtendedProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<HashMap<String, String>>,
}

/// One page of `events.list`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

/// Entry of `calendarList.list`
#[derive(Debug, Deserialize)]
pub struct CalendarListEntry {
    pub id: String,
    pub summary: Option<String>,
}

/// One page of `calendarList.list`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListPage {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
    pub next_page_token: Option<String>,
}

impl ApiEvent {
    /// Build the request body for an owned event
    pub fn from_draft(draft: &EventDraft, time_zone: &str) -> Self {
        let mut private = HashMap::new();
        private.insert(KEY_PROPERTY.to_string(), draft.external_key.clone());
        private.insert(KEY_VERSION_PROPERTY.to_string(), KEY_VERSION.to_string());
        private.insert(DUE_PROPERTY.to_string(), draft.due_at.to_rfc3339());

        Self {
            id: None,
            summary: Some(draft.title.clone()),
            description: Some(draft.description.clone()),
            start: Some(ApiEventDateTime {
                date_time: Some(draft.start.to_rfc3339()),
                date: None,
                time_zone: Some(time_zone.to_string()),
            }),
            end: Some(ApiEventDateTime {
                date_time: Some(draft.end.to_rfc3339()),
                date: None,
                time_zone: Some(time_zone.to_string()),
            }),
            extended_properties: Some(ExtendedProperties {
                private: Some(private),
            }),
        }
    }

    /// Convert an API event into the reconciler's view
    pub fn into_calendar_event(self) -> CalendarEvent {
        let private = self
            .extended_properties
            .and_then(|p| p.private)
            .unwrap_or_default();

        let parse = |slot: Option<ApiEventDateTime>| {
            slot.and_then(|s| s.date_time)
                .and_then(|dt| parse_due_at(&dt))
        };

        CalendarEvent {
            id: self.id.unwrap_or_default(),
            external_key: private.get(KEY_PROPERTY).cloned(),
            title: self.summary.unwrap_or_default(),
            start: parse(self.start),
            end: parse(self.end),
            last_synced_due_at: private.get(DUE_PROPERTY).and_then(|d| parse_due_at(d)),
        }
    }
}
