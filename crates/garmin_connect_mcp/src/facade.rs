//! Data access facade: one authenticated provider call per operation.
//!
//! Every operation resolves its arguments, logs in with the configured
//! credentials, forwards exactly one call and wraps the payload in its
//! envelope. Nothing is cached between calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use garmin_connect_client::config::Config;
use garmin_connect_client::{Authenticator, GarminClient};
use tracing::{Instrument, debug, warn};

use crate::activity_id::ActivityId;
use crate::dates;
use crate::error::{OperationError, OperationResult};
use crate::types::{
    ActivitiesResult, ActivityResult, HeartRateResult, SleepResult, StepsResult, SummaryResult,
    WeightResult,
};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct GarminFacade {
    config: Arc<Config>,
    authenticator: Arc<dyn Authenticator>,
    clock: Clock,
}

impl GarminFacade {
    pub fn new(config: Config, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            config: Arc::new(config),
            authenticator,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Replace the local-calendar clock used for date defaults.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Default day for the date-bearing operations.
    pub fn yesterday(&self) -> NaiveDate {
        self.today() - chrono::Duration::days(1)
    }

    /// Validate credentials and log in. Missing credentials fail before any
    /// network activity.
    pub async fn authenticate(&self) -> OperationResult<Arc<dyn GarminClient>> {
        let credentials = self
            .config
            .credentials()
            .map_err(OperationError::from_login)?;
        self.authenticator
            .login(&credentials)
            .await
            .map_err(OperationError::from_login)
    }

    /// Run one operation with logging and metrics around it.
    async fn observe<T, Fut>(&self, operation: &'static str, fut: Fut) -> OperationResult<T>
    where
        Fut: Future<Output = OperationResult<T>>,
    {
        let span = tracing::info_span!("garmin_operation", operation);
        async move {
            let start = Instant::now();
            debug!("starting");
            metrics::counter!("garmin_operations_total", "operation" => operation).increment(1);

            let result = fut.await;

            let elapsed = start.elapsed();
            match &result {
                Ok(_) => debug!(?elapsed, "completed"),
                Err(e) => {
                    warn!(?elapsed, kind = e.kind(), error = %e, "failed");
                    metrics::counter!(
                        "garmin_operation_failures_total",
                        "operation" => operation,
                        "kind" => e.kind()
                    )
                    .increment(1);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    pub async fn user_summary(&self, date: Option<&str>) -> OperationResult<SummaryResult> {
        self.observe("user_summary", async {
            let date = dates::resolve_day(date, self.today())?;
            let client = self.authenticate().await?;
            let summary = client.get_user_summary(date).await?;
            Ok(SummaryResult {
                success: true,
                date: date.to_string(),
                summary,
            })
        })
        .await
    }

    pub async fn user_activities(
        &self,
        start: Option<&str>,
        limit: Option<u32>,
    ) -> OperationResult<ActivitiesResult> {
        self.observe("user_activities", async {
            let start = dates::resolve_activities_start(start, self.today())?;
            let limit = dates::resolve_limit(limit);
            let client = self.authenticate().await?;
            let activities = client.get_activities(start, limit).await?;
            Ok(ActivitiesResult {
                success: true,
                activities,
            })
        })
        .await
    }

    pub async fn user_activity(&self, activity_id: &ActivityId) -> OperationResult<ActivityResult> {
        self.observe("user_activity", async {
            let id = activity_id.as_cow();
            if id.trim().is_empty() {
                return Err(OperationError::InvalidArgument(
                    "activity_id must not be empty".into(),
                ));
            }
            let client = self.authenticate().await?;
            let activity = client.get_activity_details(&id).await?;
            Ok(ActivityResult {
                success: true,
                activity_id: id.into_owned(),
                activity,
            })
        })
        .await
    }

    pub async fn user_sleep(&self, date: Option<&str>) -> OperationResult<SleepResult> {
        self.observe("user_sleep", async {
            let date = dates::resolve_day(date, self.today())?;
            let client = self.authenticate().await?;
            let sleep = client.get_sleep_data(date).await?;
            Ok(SleepResult {
                success: true,
                date: date.to_string(),
                sleep,
            })
        })
        .await
    }

    pub async fn user_heart_rate(&self, date: Option<&str>) -> OperationResult<HeartRateResult> {
        self.observe("user_heart_rate", async {
            let date = dates::resolve_day(date, self.today())?;
            let client = self.authenticate().await?;
            let heart_rate = client.get_heart_rates(date).await?;
            Ok(HeartRateResult {
                success: true,
                date: date.to_string(),
                heart_rate,
            })
        })
        .await
    }

    pub async fn user_steps(&self, date: Option<&str>) -> OperationResult<StepsResult> {
        self.observe("user_steps", async {
            let date = dates::resolve_day(date, self.today())?;
            let client = self.authenticate().await?;
            let steps = client.get_steps_data(date).await?;
            Ok(StepsResult {
                success: true,
                date: date.to_string(),
                steps,
            })
        })
        .await
    }

    pub async fn user_weight(&self, date: Option<&str>) -> OperationResult<WeightResult> {
        self.observe("user_weight", async {
            let date = dates::resolve_day(date, self.today())?;
            let client = self.authenticate().await?;
            let weight = client.get_body_composition(date).await?;
            Ok(WeightResult {
                success: true,
                date: date.to_string(),
                weight,
            })
        })
        .await
    }
}
