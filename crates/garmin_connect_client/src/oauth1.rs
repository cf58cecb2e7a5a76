//! OAuth 1.0a request signing (HMAC-SHA1) for the Connect token endpoints.
//!
//! The SSO ticket is traded for an OAuth1 token on `oauth/preauthorized`, and
//! that token in turn for the bearer token on `oauth/exchange/user/2.0`. Both
//! requests carry an `Authorization: OAuth ...` header built here.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::{RngExt, rng};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha1::Sha1;

use crate::GarminError;

type HmacSha1 = Hmac<Sha1>;

/// Application credentials identifying this client to the OAuth1 endpoints.
#[derive(Clone, Debug)]
pub struct OAuthConsumer {
    pub key: String,
    pub secret: SecretString,
}

impl OAuthConsumer {
    pub fn new(key: &str, secret: &str) -> Self {
        Self {
            key: key.to_owned(),
            secret: SecretString::new(secret.into()),
        }
    }
}

/// Shape of the published consumer document.
#[derive(Deserialize)]
pub(crate) struct ConsumerDocument {
    consumer_key: String,
    consumer_secret: String,
}

impl From<ConsumerDocument> for OAuthConsumer {
    fn from(doc: ConsumerDocument) -> Self {
        OAuthConsumer::new(&doc.consumer_key, &doc.consumer_secret)
    }
}

/// Token returned by `oauth/preauthorized`.
#[derive(Clone, Debug)]
pub struct OAuth1Token {
    pub token: String,
    pub secret: SecretString,
    pub mfa_token: Option<String>,
}

#[derive(Deserialize)]
struct RawToken {
    oauth_token: String,
    oauth_token_secret: String,
    mfa_token: Option<String>,
}

impl OAuth1Token {
    /// Parse the form-encoded response body.
    pub fn parse(body: &str) -> Result<Self, GarminError> {
        let raw: RawToken = serde_urlencoded::from_str(body.trim())
            .map_err(|e| GarminError::Decode(format!("oauth1 token: {}", e)))?;
        Ok(Self {
            token: raw.oauth_token,
            secret: SecretString::new(raw.oauth_token_secret.into()),
            mfa_token: raw.mfa_token.filter(|t| !t.is_empty()),
        })
    }
}

/// `Authorization` header value for one request.
///
/// Query parameters are read from `url`; `form` holds the url-encoded body
/// parameters, which take part in the signature as well.
pub fn authorization_header(
    consumer: &OAuthConsumer,
    token: Option<&OAuth1Token>,
    method: &str,
    url: &Url,
    form: &[(&str, &str)],
) -> String {
    let mut rng = rng();
    let nonce = format!(
        "{:016x}{:016x}",
        rng.random_range(0..u64::MAX),
        rng.random_range(0..u64::MAX)
    );
    let timestamp = chrono::Utc::now().timestamp().to_string();
    authorization_header_with(consumer, token, method, url, form, &nonce, &timestamp)
}

pub(crate) fn authorization_header_with(
    consumer: &OAuthConsumer,
    token: Option<&OAuth1Token>,
    method: &str,
    url: &Url,
    form: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut oauth: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), consumer.key.clone()),
        ("oauth_nonce".into(), nonce.to_owned()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), timestamp.to_owned()),
        ("oauth_version".into(), "1.0".into()),
    ];
    if let Some(t) = token {
        oauth.push(("oauth_token".into(), t.token.clone()));
    }

    let mut params = oauth.clone();
    params.extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));
    params.extend(form.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let base = signature_base(method, url, &params);
    let signature = sign(&consumer.secret, token.map(|t| &t.secret), &base);
    oauth.push(("oauth_signature".into(), signature));
    oauth.sort();

    let fields = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Scheme, host, non-default port and path; no query or fragment.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

fn signature_base(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();
    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&joined)
    )
}

fn sign(consumer_secret: &SecretString, token_secret: Option<&SecretString>, base: &str) -> String {
    let key = format!(
        "{}&{}",
        encode(consumer_secret.expose_secret()),
        token_secret
            .map(|s| encode(s.expose_secret()))
            .unwrap_or_default()
    );
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
