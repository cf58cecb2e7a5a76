use std::time::Duration;

use std::collections::HashMap;

use crate::oauth1::OAuthConsumer;
use crate::{Credentials, GarminError};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_SSO_URL: &str = "https://sso.garmin.com";
pub const DEFAULT_API_URL: &str = "https://connectapi.garmin.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Published consumer key/secret used by the Garmin Connect mobile login.
pub const DEFAULT_OAUTH_CONSUMER_URL: &str = "https://thegarth.s3.amazonaws.com/oauth_consumer.json";

const MISSING_CREDENTIALS: &str = "GARMIN_USERNAME and GARMIN_PASSWORD must be set";

/// Process configuration, loaded once at startup.
///
/// Credentials are kept optional here: a server without them still starts and
/// reports the problem on each call, before touching the network.
#[derive(Clone, Debug)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub sso_url: String,
    pub api_url: String,
    pub http_timeout: Duration,
    /// Fixed OAuth1 consumer; fetched from `oauth_consumer_url` when unset.
    pub oauth_consumer: Option<OAuthConsumer>,
    pub oauth_consumer_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            sso_url: DEFAULT_SSO_URL.into(),
            api_url: DEFAULT_API_URL.into(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            oauth_consumer: None,
            oauth_consumer_url: DEFAULT_OAUTH_CONSUMER_URL.into(),
        }
    }
}

impl Config {
    /// Read the environment, falling back to a `.env` file found from the
    /// working directory. The process environment is never modified.
    pub fn load() -> Self {
        let file = read_dotenv();
        Self::from_env_with(|k| std::env::var(k).ok().or_else(|| file.get(k).cloned()))
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function, so tests never mutate the global environment.
    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let username = get("GARMIN_USERNAME").filter(|s| !s.trim().is_empty());
        let password = get("GARMIN_PASSWORD")
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::new(s.into()));
        let sso_url = get("GARMIN_SSO_URL").unwrap_or_else(|| DEFAULT_SSO_URL.into());
        let api_url = get("GARMIN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let http_timeout = get("GARMIN_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        let oauth_consumer = match (
            get("GARMIN_OAUTH_CONSUMER_KEY").filter(|s| !s.is_empty()),
            get("GARMIN_OAUTH_CONSUMER_SECRET").filter(|s| !s.is_empty()),
        ) {
            (Some(key), Some(secret)) => Some(OAuthConsumer::new(&key, &secret)),
            _ => None,
        };
        let oauth_consumer_url = get("GARMIN_OAUTH_CONSUMER_URL")
            .unwrap_or_else(|| DEFAULT_OAUTH_CONSUMER_URL.into());
        Self {
            username,
            password,
            sso_url,
            api_url,
            http_timeout,
            oauth_consumer,
            oauth_consumer_url,
        }
    }

    /// Builder used by tests and embedders that do not go through the environment.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_owned());
        self.password = Some(SecretString::new(password.into()));
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Validated credentials, or a configuration error when either half is
    /// missing or empty.
    pub fn credentials(&self) -> Result<Credentials, GarminError> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) if !u.trim().is_empty() && !p.expose_secret().is_empty() => {
                Ok(Credentials {
                    username: u.clone(),
                    password: p.clone(),
                })
            }
            _ => Err(GarminError::Config(MISSING_CREDENTIALS.into())),
        }
    }
}

fn read_dotenv() -> HashMap<String, String> {
    match dotenvy::dotenv_iter() {
        Ok(iter) => iter
            .filter_map(|item| match item {
                Ok(pair) => Some(pair),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed .env line");
                    None
                }
            })
            .collect(),
        Err(e) if e.not_found() => HashMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable .env");
            HashMap::new()
        }
    }
}
