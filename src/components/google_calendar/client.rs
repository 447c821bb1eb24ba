use super::models::{
    ApiEvent, CalendarEvent, CalendarListPage, EventDraft, EventsPage,
};
use super::token::TokenManager;
use crate::components::CalendarClient;
use crate::config::Config;
use crate::error::{auth_error, google_calendar_error, SyncResult};
use crate::sync::key::{KEY_VERSION, KEY_VERSION_PROPERTY};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

/// Google Calendar v3 over plain REST
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    api_url: Url,
    token_manager: TokenManager,
    time_zone: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &Config, token_manager: TokenManager, client: Client) -> SyncResult<Self> {
        let api_url = Url::parse(&config.calendar_api_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        if api_url.cannot_be_a_base() {
            return Err(google_calendar_error("Calendar API URL cannot be a base URL"));
        }

        Ok(Self {
            client,
            api_url,
            token_manager,
            time_zone: config.timezone.clone(),
        })
    }

    /// API root joined with already unescaped path segments
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request(&self, method: Method, url: Url) -> SyncResult<RequestBuilder> {
        let access_token = self.token_manager.access_token().await?;
        Ok(self.client.request(method, url).bearer_auth(access_token))
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> SyncResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;
        check_status(response, action).await
    }
}

/// Turn error statuses into our error type
async fn check_status(response: Response, action: &str) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());

    if is_auth_failure(status, &error_body) {
        return Err(auth_error(&format!(
            "Google rejected the credentials while trying to {}: HTTP {}",
            action, status
        )));
    }

    Err(google_calendar_error(&format!(
        "Failed to {}: HTTP {} - {}",
        action, status, error_body
    )))
}

fn is_auth_failure(status: StatusCode, body: &str) -> bool {
    match status {
        StatusCode::UNAUTHORIZED => true,
        // 403 is also used for quota errors, those are retried on the next run
        StatusCode::FORBIDDEN => !body.contains("rateLimitExceeded") && !body.contains("quotaExceeded"),
        _ => false,
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn find_calendar(&self, name: &str) -> SyncResult<Option<String>> {
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["users", "me", "calendarList"]);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let request = self.request(Method::GET, url).await?;
            let page: CalendarListPage = self
                .send(request, "list calendars")
                .await?
                .json()
                .await
                .map_err(|e| google_calendar_error(&format!("Failed to parse calendar list: {}", e)))?;

            if let Some(entry) = page
                .items
                .into_iter()
                .find(|entry| entry.summary.as_deref() == Some(name))
            {
                debug!("Found calendar '{}' with ID: {}", name, entry.id);
                return Ok(Some(entry.id));
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(None),
            }
        }
    }

    async fn ensure_calendar(&self, name: &str) -> SyncResult<String> {
        if let Some(id) = self.find_calendar(name).await? {
            return Ok(id);
        }

        info!("Calendar '{}' not found, creating it", name);
        let url = self.endpoint(&["calendars"]);
        let request = self
            .request(Method::POST, url)
            .await?
            .json(&json!({ "summary": name, "timeZone": self.time_zone }));

        let created: serde_json::Value = self
            .send(request, "create calendar")
            .await?
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse calendar: {}", e)))?;

        created
            .get("id")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| google_calendar_error("Created calendar has no id"))
    }

    async fn list_owned_events(&self, calendar_id: &str) -> SyncResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let marker = format!("{}={}", KEY_VERSION_PROPERTY, KEY_VERSION);

        loop {
            let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("privateExtendedProperty", &marker);
                query.append_pair("showDeleted", "false");
                query.append_pair("maxResults", "2500");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let request = self.request(Method::GET, url).await?;
            let page: EventsPage = self
                .send(request, "fetch events")
                .await?
                .json()
                .await
                .map_err(|e| google_calendar_error(&format!("Failed to parse events response: {}", e)))?;

            events.extend(page.items.into_iter().map(ApiEvent::into_calendar_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Found {} owned events in calendar {}", events.len(), calendar_id);
        Ok(events)
    }

    async fn create_event(&self, calendar_id: &str, draft: &EventDraft) -> SyncResult<String> {
        let url = self.endpoint(&["calendars", calendar_id, "events"]);
        let request = self
            .request(Method::POST, url)
            .await?
            .json(&ApiEvent::from_draft(draft, &self.time_zone));

        let created: ApiEvent = self
            .send(request, "create event")
            .await?
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse created event: {}", e)))?;

        created
            .id
            .ok_or_else(|| google_calendar_error("Created event has no id"))
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> SyncResult<()> {
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id]);
        let request = self
            .request(Method::PATCH, url)
            .await?
            .json(&ApiEvent::from_draft(draft, &self.time_zone));

        self.send(request, "update event").await?;
        Ok(())
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id]);
        let request = self.request(Method::DELETE, url).await?;

        let response = request
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to delete event: {}", e)))?;

        // Already gone counts as deleted
        if response.status() == StatusCode::GONE {
            debug!("Event {} was already deleted", event_id);
            return Ok(());
        }

        check_status(response, "delete event").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_403_is_not_auth() {
        assert!(is_auth_failure(StatusCode::UNAUTHORIZED, ""));
        assert!(is_auth_failure(
            StatusCode::FORBIDDEN,
            r#"{"error":{"errors":[{"reason":"insufficientPermissions"}]}}"#
        ));
        assert!(!is_auth_failure(
            StatusCode::FORBIDDEN,
            r#"{"error":{"errors":[{"reason":"rateLimitExceeded"}]}}"#
        ));
        assert!(!is_auth_failure(StatusCode::NOT_FOUND, ""));
    }
}
