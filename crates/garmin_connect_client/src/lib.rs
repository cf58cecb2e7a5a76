//! `GarminClient` trait and a reqwest-based Garmin Connect implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod dates;
pub mod http_client;
pub mod oauth1;

#[derive(Debug, Error)]
pub enum GarminError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("garmin api returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl GarminError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => GarminError::Auth(body),
            404 => GarminError::NotFound(body),
            400 | 422 => GarminError::InvalidInput(body),
            _ => GarminError::Api { status, body },
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GarminError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GarminError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Account credentials used for the SSO login.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Read access to one authenticated Garmin Connect session.
///
/// Payloads are returned untouched so callers can pass them through.
#[async_trait]
pub trait GarminClient: Send + Sync + 'static {
    /// Daily summary (steps, calories, stress, body battery, ...).
    async fn get_user_summary(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError>;

    /// Activities starting on or after `start`, newest first.
    async fn get_activities(
        &self,
        start: NaiveDate,
        limit: u32,
    ) -> Result<serde_json::Value, GarminError>;

    async fn get_activity_details(
        &self,
        activity_id: &str,
    ) -> Result<serde_json::Value, GarminError>;

    async fn get_sleep_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError>;

    async fn get_heart_rates(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError>;

    /// Step counts in 15 minute buckets for one day.
    async fn get_steps_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError>;

    async fn get_body_composition(
        &self,
        date: NaiveDate,
    ) -> Result<serde_json::Value, GarminError>;
}

/// Performs the login handshake and hands back a ready session.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn login(&self, credentials: &Credentials)
    -> Result<Arc<dyn GarminClient>, GarminError>;
}

#[cfg(test)]
mod tests {
    use super::GarminError;

    #[test]
    fn from_status_maps_known_codes() {
        assert!(matches!(
            GarminError::from_status(401, "x".into()),
            GarminError::Auth(_)
        ));
        assert!(matches!(
            GarminError::from_status(403, "x".into()),
            GarminError::Auth(_)
        ));
        assert!(matches!(
            GarminError::from_status(404, "x".into()),
            GarminError::NotFound(_)
        ));
        assert!(matches!(
            GarminError::from_status(422, "x".into()),
            GarminError::InvalidInput(_)
        ));
        assert!(matches!(
            GarminError::from_status(502, "x".into()),
            GarminError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn transient_only_for_throttling_and_server_errors() {
        assert!(GarminError::from_status(429, String::new()).is_transient());
        assert!(GarminError::from_status(503, String::new()).is_transient());
        assert!(!GarminError::from_status(404, String::new()).is_transient());
        assert!(!GarminError::Config("missing".into()).is_transient());
    }

    #[test]
    fn api_error_message_includes_status_and_body() {
        let e = GarminError::from_status(500, "boom".into());
        assert_eq!(e.to_string(), "garmin api returned 500: boom");
    }
}
