use chrono::{Duration, Local};
use garmin_connect_client::{Authenticator, auth::ReqwestAuthenticator, config::Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects GARMIN_USERNAME / GARMIN_PASSWORD in env or .env
    let cfg = Config::load();
    let credentials = match cfg.credentials() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let session = ReqwestAuthenticator::from_config(&cfg)
        .login(&credentials)
        .await?;
    let yesterday = Local::now().date_naive() - Duration::days(1);
    let summary = session.get_user_summary(yesterday).await?;
    println!(
        "{}: {} steps",
        yesterday,
        summary
            .get("totalSteps")
            .and_then(|v| v.as_i64())
            .unwrap_or_default()
    );
    Ok(())
}
