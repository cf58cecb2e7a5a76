//! Garmin SSO login handshake.
//!
//! The flow mirrors the embedded sign-in widget:
//! 1. open the embed page and the sign-in form to collect the CSRF token,
//! 2. post the credentials and read the service ticket from the reply,
//! 3. trade the ticket for an OAuth1 token on `oauth/preauthorized`,
//! 4. exchange that token for a Connect API bearer token,
//! 5. look up the display name used by the per-user endpoints.
//!
//! Steps 3 and 4 are OAuth1-signed with the consumer credentials.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::http_client::{ReqwestGarminClient, build_http_client, error_from_response};
use crate::oauth1::{ConsumerDocument, OAuth1Token, OAuthConsumer, authorization_header};
use crate::{Authenticator, Credentials, GarminClient, GarminError};

static CSRF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).expect("valid regex"));
static TICKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"embed\?ticket=([^"&]+)""#).expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]*)</title>").expect("valid regex"));

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialProfile {
    display_name: Option<String>,
}

/// The token endpoints only answer the mobile app's user agent.
const OAUTH_USER_AGENT: &str = "com.garmin.android.apps.connectmobile";

/// Logs in against Garmin SSO with reqwest; every call opens a fresh session.
#[derive(Clone, Debug)]
pub struct ReqwestAuthenticator {
    sso_url: String,
    api_url: String,
    timeout: std::time::Duration,
    consumer: Option<OAuthConsumer>,
    consumer_url: String,
}

impl ReqwestAuthenticator {
    pub fn new(sso_url: &str, api_url: &str, timeout: std::time::Duration) -> Self {
        Self {
            sso_url: sso_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
            consumer: None,
            consumer_url: crate::config::DEFAULT_OAUTH_CONSUMER_URL.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let auth = Self::new(&config.sso_url, &config.api_url, config.http_timeout)
            .with_consumer_url(&config.oauth_consumer_url);
        match &config.oauth_consumer {
            Some(consumer) => auth.with_consumer(consumer.clone()),
            None => auth,
        }
    }

    /// Sign with a fixed consumer instead of fetching the published one.
    pub fn with_consumer(mut self, consumer: OAuthConsumer) -> Self {
        self.consumer = Some(consumer);
        self
    }

    pub fn with_consumer_url(mut self, url: &str) -> Self {
        self.consumer_url = url.to_string();
        self
    }

    fn embed_url(&self) -> String {
        format!("{}/sso/embed", self.sso_url)
    }

    fn signin_params(&self) -> Vec<(&'static str, String)> {
        let embed = self.embed_url();
        vec![
            ("id", "gauth-widget".to_string()),
            ("embedWidget", "true".to_string()),
            ("gauthHost", embed.clone()),
            ("service", embed.clone()),
            ("source", embed.clone()),
            ("redirectAfterAccountLoginUrl", embed.clone()),
            ("redirectAfterAccountCreationUrl", embed),
        ]
    }

    async fn fetch_csrf(&self, http: &reqwest::Client) -> Result<String, GarminError> {
        let embed_params = [
            ("id", "gauth-widget"),
            ("embedWidget", "true"),
            ("gauthHost", self.sso_url.as_str()),
        ];
        let resp = http
            .get(self.embed_url())
            .query(&embed_params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let url = format!("{}/sso/signin", self.sso_url);
        let resp = http.get(url).query(&self.signin_params()).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let html = resp.text().await?;
        extract_csrf(&html)
            .ok_or_else(|| GarminError::Decode("sign-in page carries no csrf token".into()))
    }

    async fn submit_credentials(
        &self,
        http: &reqwest::Client,
        credentials: &Credentials,
        csrf: &str,
    ) -> Result<String, GarminError> {
        let url = format!("{}/sso/signin", self.sso_url);
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
            ("embed", "true"),
            ("_csrf", csrf),
        ];
        let resp = http
            .post(url)
            .query(&self.signin_params())
            .header("Referer", format!("{}/sso/signin", self.sso_url))
            .form(&form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let html = resp.text().await?;
        if let Some(ticket) = extract_ticket(&html) {
            return Ok(ticket);
        }
        let title = extract_title(&html).unwrap_or_default();
        if title.to_ascii_lowercase().contains("mfa") {
            return Err(GarminError::Auth(
                "multi-factor authentication is not supported".into(),
            ));
        }
        Err(GarminError::Auth(format!(
            "sign-in rejected for {} ({})",
            credentials.username,
            if title.is_empty() { "no ticket" } else { title.as_str() }
        )))
    }

    async fn consumer(&self, http: &reqwest::Client) -> Result<OAuthConsumer, GarminError> {
        if let Some(consumer) = &self.consumer {
            return Ok(consumer.clone());
        }
        let resp = http.get(&self.consumer_url).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let doc: ConsumerDocument = resp
            .json()
            .await
            .map_err(|e| GarminError::Decode(format!("oauth consumer: {}", e)))?;
        Ok(doc.into())
    }

    async fn preauthorize(
        &self,
        http: &reqwest::Client,
        consumer: &OAuthConsumer,
        ticket: &str,
    ) -> Result<OAuth1Token, GarminError> {
        let login_url = self.embed_url();
        let url = reqwest::Url::parse_with_params(
            &format!("{}/oauth-service/oauth/preauthorized", self.api_url),
            &[
                ("ticket", ticket),
                ("login-url", login_url.as_str()),
                ("accepts-mfa-tokens", "true"),
            ],
        )
        .map_err(|e| GarminError::Config(format!("invalid api url {}: {}", self.api_url, e)))?;
        let authorization = authorization_header(consumer, None, "GET", &url, &[]);
        let resp = http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::USER_AGENT, OAUTH_USER_AGENT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        OAuth1Token::parse(&resp.text().await?)
    }

    async fn exchange_token(
        &self,
        http: &reqwest::Client,
        consumer: &OAuthConsumer,
        oauth1: &OAuth1Token,
    ) -> Result<SecretString, GarminError> {
        let url = reqwest::Url::parse(&format!(
            "{}/oauth-service/oauth/exchange/user/2.0",
            self.api_url
        ))
        .map_err(|e| GarminError::Config(format!("invalid api url {}: {}", self.api_url, e)))?;
        let form: Vec<(&str, &str)> = oauth1
            .mfa_token
            .as_deref()
            .map(|m| vec![("mfa_token", m)])
            .unwrap_or_default();
        let authorization = authorization_header(consumer, Some(oauth1), "POST", &url, &form);
        let resp = http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::USER_AGENT, OAUTH_USER_AGENT)
            .form(&form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| GarminError::Decode(format!("token exchange: {}", e)))?;
        Ok(SecretString::new(token.access_token.into()))
    }

    async fn fetch_display_name(
        &self,
        http: &reqwest::Client,
        token: &SecretString,
    ) -> Result<String, GarminError> {
        let url = format!("{}/userprofile-service/socialProfile", self.api_url);
        let resp = http
            .get(url)
            .bearer_auth(token.expose_secret())
            .header("NK", "NT")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let profile: SocialProfile = resp
            .json()
            .await
            .map_err(|e| GarminError::Decode(format!("social profile: {}", e)))?;
        profile
            .display_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| GarminError::Decode("social profile has no displayName".into()))
    }
}

#[async_trait]
impl Authenticator for ReqwestAuthenticator {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<dyn GarminClient>, GarminError> {
        let http = build_http_client(self.timeout)?;

        tracing::debug!(sso = %self.sso_url, "garmin login: fetching csrf token");
        let csrf = self.fetch_csrf(&http).await?;

        tracing::debug!("garmin login: submitting credentials");
        let ticket = self.submit_credentials(&http, credentials, &csrf).await?;

        tracing::debug!("garmin login: trading service ticket for oauth1 token");
        let consumer = self.consumer(&http).await?;
        let oauth1 = self.preauthorize(&http, &consumer, &ticket).await?;

        tracing::debug!("garmin login: exchanging oauth1 token");
        let token = self.exchange_token(&http, &consumer, &oauth1).await?;

        let display_name = self.fetch_display_name(&http, &token).await?;
        tracing::info!(%display_name, "garmin login succeeded");

        Ok(Arc::new(ReqwestGarminClient::new(
            http,
            &self.api_url,
            display_name,
            token,
        )))
    }
}

fn extract_csrf(html: &str) -> Option<String> {
    CSRF_RE.captures(html).map(|c| c[1].to_string())
}

fn extract_ticket(html: &str) -> Option<String> {
    TICKET_RE.captures(html).map(|c| c[1].to_string())
}

fn extract_title(html: &str) -> Option<String> {
    TITLE_RE.captures(html).map(|c| c[1].trim().to_string())
}
