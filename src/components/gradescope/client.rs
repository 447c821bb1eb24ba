use super::models::{AssignmentRecord, Course, FailedCourse, FetchOutcome};
use super::parser::{parse_assignments, parse_authenticity_token, parse_courses};
use crate::components::AssignmentSource;
use crate::config::Config;
use crate::error::{auth_error, gradescope_error, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const LOGIN_PATH: &str = "/login";

fn is_login_page(url: &Url) -> bool {
    url.path().trim_end_matches('/').ends_with(LOGIN_PATH)
}

/// Authenticated Gradescope session.
///
/// The session lives in the client's cookie store, so one instance is one login.
pub struct GradescopeClient {
    client: Client,
    base_url: Url,
    email: String,
    password: String,
}

impl GradescopeClient {
    pub fn new(config: &Config) -> SyncResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("gradesync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.gradescope_base_url)
            .map_err(|e| gradescope_error(&format!("Failed to parse URL: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            email: config.gradescope_email.clone(),
            password: config.gradescope_password.clone(),
        })
    }

    fn url(&self, path: &str) -> SyncResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| gradescope_error(&format!("Failed to build URL for {}: {}", path, e)))
    }

    async fn get_page(&self, path: &str) -> SyncResult<String> {
        let response = self.client.get(self.url(path)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(gradescope_error(&format!("GET {} returned HTTP {}", path, status)));
        }
        // An expired session redirects every page to the login form
        if path != LOGIN_PATH && is_login_page(response.url()) {
            return Err(gradescope_error(&format!(
                "GET {} was redirected to the login page, session expired",
                path
            )));
        }
        Ok(response.text().await?)
    }

    /// Log in with the configured credentials
    pub async fn login(&self) -> SyncResult<()> {
        info!("Logging into Gradescope as {}", self.email);

        let login_page = self.get_page(LOGIN_PATH).await?;
        let token = parse_authenticity_token(&login_page)?
            .ok_or_else(|| gradescope_error("Login page has no authenticity token"))?;

        let form = [
            ("utf8", "✓"),
            ("authenticity_token", token.as_str()),
            ("session[email]", self.email.as_str()),
            ("session[password]", self.password.as_str()),
            ("session[remember_me]", "0"),
            ("commit", "Log In"),
            ("session[remember_me_sso]", "0"),
        ];

        let response = self.client.post(self.url(LOGIN_PATH)?).form(&form).send().await?;
        let status = response.status();

        // A successful login redirects away from /login, a failed one renders the form again
        if !status.is_success() || is_login_page(response.url()) {
            return Err(auth_error(&format!(
                "Gradescope login failed for {} (HTTP {})",
                self.email, status
            )));
        }

        debug!("Gradescope login landed on {}", response.url().path());
        Ok(())
    }

    pub async fn list_courses(&self) -> SyncResult<Vec<Course>> {
        let page = self.get_page("/account").await?;
        let courses = parse_courses(&page)?;
        info!("Found {} courses", courses.len());
        Ok(courses)
    }

    pub async fn list_assignments(&self, course: &Course) -> SyncResult<Vec<AssignmentRecord>> {
        let page = self.get_page(&format!("/courses/{}", course.id)).await?;
        parse_assignments(course, &page)
    }
}

#[async_trait]
impl AssignmentSource for GradescopeClient {
    async fn fetch_all(&self) -> SyncResult<FetchOutcome> {
        self.login().await?;

        let courses = self.list_courses().await?;
        let mut outcome = FetchOutcome::default();

        for course in courses {
            match self.list_assignments(&course).await {
                Ok(records) => {
                    debug!("Course {} has {} assignments", course.name, records.len());
                    outcome.records.extend(records);
                }
                Err(e) => {
                    warn!("Skipping course {} ({}): {}", course.name, course.id, e);
                    outcome.failed_courses.push(FailedCourse {
                        course,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Fetched {} assignments, {} courses failed",
            outcome.records.len(),
            outcome.failed_courses.len()
        );
        Ok(outcome)
    }
}
