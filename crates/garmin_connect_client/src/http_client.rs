//! HTTP client implementation for the Garmin Connect API.
//!
//! This module provides a reqwest-based implementation of the [`GarminClient`](crate::GarminClient) trait.
//! Instances are produced by [`ReqwestAuthenticator`](crate::auth::ReqwestAuthenticator) after a
//! successful login.

use crate::{GarminClient, GarminError};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

const USER_AGENT: &str = concat!("garmin-connect-mcp/", env!("CARGO_PKG_VERSION"));

/// Build the shared reqwest client. Cookies are kept so the SSO steps share a session.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, GarminError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(timeout)
        .build()?)
}

/// Authenticated session against the Garmin Connect API.
#[derive(Clone, Debug)]
pub struct ReqwestGarminClient {
    api_url: String,
    display_name: String,
    access_token: SecretString,
    client: reqwest::Client,
}

impl ReqwestGarminClient {
    /// Create a session from an already obtained bearer token.
    ///
    /// # Arguments
    /// * `client` - Shared reqwest client
    /// * `api_url` - Connect API root (e.g., "https://connectapi.garmin.com")
    /// * `display_name` - The user's display name, used by per-user wellness endpoints
    /// * `access_token` - OAuth2 bearer token from the login exchange
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        display_name: impl Into<String>,
        access_token: SecretString,
    ) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            display_name: display_name.into(),
            access_token,
            client,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Build an API URL from path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, GarminError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| GarminError::Config(format!("invalid api url {}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| GarminError::Config(format!("api url cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build an authenticated GET request.
    fn get_request(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .header("NK", "NT")
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, GarminError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(resp).await);
        }
        // Some wellness endpoints answer 204 for days without data.
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            let body_snippet: String = text.chars().take(256).collect();
            GarminError::Decode(format!("{} - body: {}", e, body_snippet))
        })
    }
}

/// Extract error information from a failed response.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> GarminError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(256).collect();
    GarminError::from_status(status, body_snippet)
}

#[async_trait]
impl GarminClient for ReqwestGarminClient {
    async fn get_user_summary(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&[
            "usersummary-service",
            "usersummary",
            "daily",
            &self.display_name,
        ])?;
        let qp = [("calendarDate", date.to_string())];
        self.execute_json(self.get_request(url).query(&qp)).await
    }

    async fn get_activities(
        &self,
        start: NaiveDate,
        limit: u32,
    ) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&[
            "activitylist-service",
            "activities",
            "search",
            "activities",
        ])?;
        let qp = [
            ("startDate", start.to_string()),
            ("start", "0".to_string()),
            ("limit", limit.to_string()),
        ];
        self.execute_json(self.get_request(url).query(&qp)).await
    }

    async fn get_activity_details(
        &self,
        activity_id: &str,
    ) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&["activity-service", "activity", activity_id, "details"])?;
        let qp = [("maxChartSize", "2000"), ("maxPolylineSize", "4000")];
        self.execute_json(self.get_request(url).query(&qp)).await
    }

    async fn get_sleep_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&[
            "wellness-service",
            "wellness",
            "dailySleepData",
            &self.display_name,
        ])?;
        let qp = [
            ("date", date.to_string()),
            ("nonSleepBufferMinutes", "60".to_string()),
        ];
        self.execute_json(self.get_request(url).query(&qp)).await
    }

    async fn get_heart_rates(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&[
            "wellness-service",
            "wellness",
            "dailyHeartRate",
            &self.display_name,
        ])?;
        let qp = [("date", date.to_string())];
        self.execute_json(self.get_request(url).query(&qp)).await
    }

    async fn get_steps_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&[
            "wellness-service",
            "wellness",
            "dailySummaryChart",
            &self.display_name,
        ])?;
        let qp = [("date", date.to_string())];
        self.execute_json(self.get_request(url).query(&qp)).await
    }

    async fn get_body_composition(
        &self,
        date: NaiveDate,
    ) -> Result<serde_json::Value, GarminError> {
        let url = self.endpoint(&["weight-service", "weight", "dateRange"])?;
        let day = date.to_string();
        let qp = [("startDate", day.as_str()), ("endDate", day.as_str())];
        self.execute_json(self.get_request(url).query(&qp)).await
    }
}
