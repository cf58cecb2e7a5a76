use std::time::Duration;

use chrono::NaiveDate;
use garmin_connect_client::auth::ReqwestAuthenticator;
use garmin_connect_client::config::Config;
use garmin_connect_client::oauth1::OAuthConsumer;
use garmin_connect_client::{Authenticator, GarminError};
use wiremock::matchers::{
    body_string, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNIN_PAGE: &str = r#"<html><head><title>GARMIN Authentication Application</title></head>
<body><form method="post"><input type="hidden" name="_csrf" value="csrf-token-1"/></form></body></html>"#;

const SUCCESS_PAGE: &str = r#"<html><head><title>Success</title></head>
<body><script>var response_url = "https://sso.garmin.com/sso/embed?ticket=ST-42-xyz-cas";</script></body></html>"#;

async fn mount_signin_form(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/sso/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/signin"))
        .and(query_param("embedWidget", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SIGNIN_PAGE))
        .mount(server)
        .await;
}

fn authenticator(server: &MockServer) -> ReqwestAuthenticator {
    ReqwestAuthenticator::new(&server.uri(), &server.uri(), Duration::from_secs(5))
        .with_consumer(OAuthConsumer::new("consumer-key", "consumer-secret"))
}

async fn mount_signin_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_PAGE))
        .mount(server)
        .await;
}

/// Preauthorized endpoint answering a consumer-signed request for the ticket.
async fn mount_preauthorized(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/oauth-service/oauth/preauthorized"))
        .and(query_param("ticket", "ST-42-xyz-cas"))
        .and(query_param("login-url", format!("{}/sso/embed", server.uri())))
        .and(query_param("accepts-mfa-tokens", "true"))
        .and(header_regex("authorization", r#"^OAuth .*oauth_consumer_key="consumer-key""#))
        .and(header_regex("authorization", r#"oauth_signature_method="HMAC-SHA1""#))
        .and(header_regex("authorization", r#"oauth_signature="[^"]+""#))
        .and(header("user-agent", "com.garmin.android.apps.connectmobile"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/userprofile-service/socialProfile"))
        .and(header("authorization", "Bearer bearer-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"displayName": "runner-42", "id": 7})),
        )
        .mount(server)
        .await;
}

fn bearer_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "access_token": "bearer-1",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

fn credentials() -> garmin_connect_client::Credentials {
    Config::default()
        .with_credentials("runner@example.com", "hunter2")
        .credentials()
        .expect("credentials")
}

#[tokio::test]
async fn login_runs_full_handshake_and_returns_session() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;

    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .and(body_string_contains("_csrf=csrf-token-1"))
        .and(body_string_contains("username=runner%40example.com"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    mount_preauthorized(&server, "oauth_token=oauth1-token&oauth_token_secret=oauth1-secret").await;
    Mock::given(method("POST"))
        .and(path("/oauth-service/oauth/exchange/user/2.0"))
        .and(header_regex("authorization", r#"^OAuth .*oauth_consumer_key="consumer-key""#))
        .and(header_regex("authorization", r#"oauth_token="oauth1-token""#))
        .and(header_regex("authorization", r#"oauth_signature="[^"]+""#))
        .and(header("user-agent", "com.garmin.android.apps.connectmobile"))
        .and(body_string(""))
        .respond_with(bearer_response())
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server).await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyHeartRate/runner-42"))
        .and(query_param("date", "2024-03-10"))
        .and(header("authorization", "Bearer bearer-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"restingHeartRate": 51})),
        )
        .mount(&server)
        .await;

    let session = authenticator(&server)
        .login(&credentials())
        .await
        .expect("login");
    let hr = session
        .get_heart_rates(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        .await
        .expect("heart rate");
    assert_eq!(hr.get("restingHeartRate").and_then(|v| v.as_i64()), Some(51));
}

#[tokio::test]
async fn login_without_ticket_is_an_auth_error() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;
    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>GARMIN Authentication Application</title></head></html>",
        ))
        .mount(&server)
        .await;

    let err = authenticator(&server)
        .login(&credentials())
        .await
        .err()
        .expect("login must fail");
    match err {
        GarminError::Auth(msg) => {
            assert!(msg.contains("runner@example.com"));
            assert!(!msg.contains("hunter2"));
        }
        other => panic!("expected Auth, got {:?}", other),
    }
}

#[tokio::test]
async fn login_detects_mfa_prompt() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;
    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Enter MFA code for login</title></head></html>",
        ))
        .mount(&server)
        .await;

    let err = authenticator(&server)
        .login(&credentials())
        .await
        .err()
        .expect("login must fail");
    assert!(err.to_string().contains("multi-factor"));
}

#[tokio::test]
async fn locked_account_status_maps_to_auth_error() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;
    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(403).set_body_string("account locked"))
        .mount(&server)
        .await;

    let err = authenticator(&server)
        .login(&credentials())
        .await
        .err()
        .expect("login must fail");
    assert!(matches!(err, GarminError::Auth(ref m) if m == "account locked"));
}

#[tokio::test]
async fn missing_csrf_token_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sso/embed"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nothing here</html>"))
        .mount(&server)
        .await;

    let err = authenticator(&server)
        .login(&credentials())
        .await
        .err()
        .expect("login must fail");
    assert!(matches!(err, GarminError::Decode(_)));
}

#[tokio::test]
async fn unreachable_sso_is_an_http_error() {
    // Nothing listens on the discard port.
    let auth = ReqwestAuthenticator::new(
        "http://127.0.0.1:9",
        "http://127.0.0.1:9",
        Duration::from_secs(2),
    );
    let err = auth
        .login(&credentials())
        .await
        .err()
        .expect("login must fail");
    assert!(matches!(err, GarminError::Http(_)));
}

#[tokio::test]
async fn mfa_token_from_preauthorization_is_forwarded() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;
    mount_signin_success(&server).await;
    mount_preauthorized(
        &server,
        "oauth_token=oauth1-token&oauth_token_secret=oauth1-secret&mfa_token=mfa-7",
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/oauth-service/oauth/exchange/user/2.0"))
        .and(header_regex("authorization", r#"oauth_token="oauth1-token""#))
        .and(body_string_contains("mfa_token=mfa-7"))
        .respond_with(bearer_response())
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server).await;

    authenticator(&server)
        .login(&credentials())
        .await
        .expect("login");
}

#[tokio::test]
async fn consumer_is_fetched_when_not_configured() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;
    mount_signin_success(&server).await;
    Mock::given(method("GET"))
        .and(path("/oauth_consumer.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "consumer_key": "consumer-key",
            "consumer_secret": "consumer-secret"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_preauthorized(&server, "oauth_token=oauth1-token&oauth_token_secret=oauth1-secret").await;
    Mock::given(method("POST"))
        .and(path("/oauth-service/oauth/exchange/user/2.0"))
        .and(header_regex("authorization", r#"oauth_consumer_key="consumer-key""#))
        .respond_with(bearer_response())
        .mount(&server)
        .await;
    mount_profile(&server).await;

    let config = Config {
        sso_url: server.uri(),
        api_url: server.uri(),
        oauth_consumer_url: format!("{}/oauth_consumer.json", server.uri()),
        ..Config::default()
    };
    ReqwestAuthenticator::from_config(&config)
        .login(&credentials())
        .await
        .expect("login");
}

#[tokio::test]
async fn rejected_preauthorization_is_an_auth_error() {
    let server = MockServer::start().await;
    mount_signin_form(&server).await;
    mount_signin_success(&server).await;
    Mock::given(method("GET"))
        .and(path("/oauth-service/oauth/preauthorized"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid signature"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth-service/oauth/exchange/user/2.0"))
        .respond_with(bearer_response())
        .expect(0)
        .mount(&server)
        .await;

    let err = authenticator(&server)
        .login(&credentials())
        .await
        .err()
        .expect("login must fail");
    assert!(matches!(err, GarminError::Auth(ref m) if m.contains("invalid signature")));
}
