//! Tool parameters and the success envelopes returned by each operation.
//!
//! Provider payloads are passed through as raw JSON under an operation
//! specific field name.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::activity_id::ActivityId;

// === Parameters ===

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct DateParams {
    /// Calendar date in ISO format (YYYY-MM-DD). Defaults to yesterday.
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ActivitiesParams {
    /// First day to include, ISO format (YYYY-MM-DD). Defaults to 30 days ago.
    pub start: Option<String>,
    /// Maximum number of activities to return. Defaults to 10.
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ActivityIdParams {
    /// Garmin activity ID.
    pub activity_id: ActivityId,
}

// === Envelopes ===

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SummaryResult {
    pub success: bool,
    pub date: String,
    pub summary: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ActivitiesResult {
    pub success: bool,
    pub activities: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ActivityResult {
    pub success: bool,
    pub activity_id: String,
    pub activity: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SleepResult {
    pub success: bool,
    pub date: String,
    pub sleep: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct HeartRateResult {
    pub success: bool,
    pub date: String,
    pub heart_rate: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct StepsResult {
    pub success: bool,
    pub date: String,
    pub steps: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WeightResult {
    pub success: bool,
    pub date: String,
    pub weight: serde_json::Value,
}

// === Prompt Parameters ===

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct DailyHealthReviewParams {
    /// Day to review (YYYY-MM-DD). Defaults to yesterday.
    pub date: Option<String>,
}
