//! Shared test utilities: a recording `GarminClient` and authenticators.
#![cfg(test)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use garmin_connect_client::{Authenticator, Credentials, GarminClient, GarminError};
use serde_json::json;

type FailureFn = Box<dyn Fn() -> GarminError + Send + Sync>;

pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// Records every provider call as `method(args)` and answers with a small payload.
#[derive(Default)]
pub struct MockClient {
    calls: Mutex<Vec<String>>,
    failure: Option<FailureFn>,
}

impl MockClient {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String, payload: serde_json::Value) -> Result<serde_json::Value, GarminError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(f) => Err(f()),
            None => Ok(payload),
        }
    }
}

#[async_trait]
impl GarminClient for MockClient {
    async fn get_user_summary(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        self.record(
            format!("get_user_summary({date})"),
            json!({"op": "get_user_summary"}),
        )
    }

    async fn get_activities(
        &self,
        start: NaiveDate,
        limit: u32,
    ) -> Result<serde_json::Value, GarminError> {
        self.record(format!("get_activities({start}, {limit})"), json!([]))
    }

    async fn get_activity_details(
        &self,
        activity_id: &str,
    ) -> Result<serde_json::Value, GarminError> {
        self.record(
            format!("get_activity_details({activity_id})"),
            json!({"activityId": activity_id}),
        )
    }

    async fn get_sleep_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        self.record(
            format!("get_sleep_data({date})"),
            json!({"op": "get_sleep_data"}),
        )
    }

    async fn get_heart_rates(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        self.record(
            format!("get_heart_rates({date})"),
            json!({"op": "get_heart_rates"}),
        )
    }

    async fn get_steps_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        self.record(
            format!("get_steps_data({date})"),
            json!({"op": "get_steps_data"}),
        )
    }

    async fn get_body_composition(
        &self,
        date: NaiveDate,
    ) -> Result<serde_json::Value, GarminError> {
        self.record(
            format!("get_body_composition({date})"),
            json!({"op": "get_body_composition"}),
        )
    }
}

/// Always logs in successfully and hands out the same recording client.
#[derive(Default)]
pub struct MockAuthenticator {
    pub client: Arc<MockClient>,
    logins: AtomicUsize,
}

impl MockAuthenticator {
    /// Login succeeds but every data call fails with the produced error.
    pub fn failing_with<F>(failure: F) -> Self
    where
        F: Fn() -> GarminError + Send + Sync + 'static,
    {
        Self {
            client: Arc::new(MockClient {
                calls: Mutex::new(Vec::new()),
                failure: Some(Box::new(failure)),
            }),
            logins: AtomicUsize::new(0),
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn login(
        &self,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn GarminClient>, GarminError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(self.client.clone())
    }
}

/// Rejects every login with the given message.
pub struct FailingAuthenticator(pub String);

#[async_trait]
impl Authenticator for FailingAuthenticator {
    async fn login(
        &self,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn GarminClient>, GarminError> {
        Err(GarminError::Auth(self.0.clone()))
    }
}
