//! MCP server exposing Garmin Connect health data as tools.

use std::sync::Arc;

use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    GetPromptRequestParams, GetPromptResult, ListPromptsResult, PaginatedRequestParams,
};
use rmcp::service::RequestContext;
use rmcp::RoleServer;
use rmcp::{prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router};

use garmin_connect_client::Authenticator;
use garmin_connect_client::auth::ReqwestAuthenticator;
use garmin_connect_client::config::Config;

pub mod activity_id;
pub mod dates;
pub mod error;
pub mod facade;
mod prompts;
pub mod telemetry;
mod test_utils;
pub mod types;

pub use error::{OperationError, OperationResult};
pub use facade::GarminFacade;
use types::{
    ActivitiesParams, ActivitiesResult, ActivityIdParams, ActivityResult, DailyHealthReviewParams,
    DateParams, HeartRateResult, SleepResult, StepsResult, SummaryResult, WeightResult,
};

#[derive(Clone)]
pub struct GarminMcpHandler {
    facade: GarminFacade,
    tool_router: rmcp::handler::server::tool::ToolRouter<GarminMcpHandler>,
    prompt_router: rmcp::handler::server::router::prompt::PromptRouter<GarminMcpHandler>,
}

#[tool_router]
#[prompt_router]
impl GarminMcpHandler {
    pub fn new(facade: GarminFacade) -> Self {
        Self {
            facade,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Handler talking to Garmin Connect over HTTP with the given configuration.
    pub fn from_config(config: Config) -> Self {
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(ReqwestAuthenticator::from_config(&config));
        Self::new(GarminFacade::new(config, authenticator))
    }

    pub fn facade(&self) -> &GarminFacade {
        &self.facade
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_router.list_all().len()
    }

    #[tool(name = "user_summary", description = "Get user summary for a given date.")]
    async fn user_summary(
        &self,
        params: Parameters<DateParams>,
    ) -> Result<Json<SummaryResult>, String> {
        let p = params.0;
        self.facade
            .user_summary(p.date.as_deref())
            .await
            .map(Json)
            .map_err(String::from)
    }

    #[tool(name = "user_activities", description = "Get list of user activities.")]
    async fn user_activities(
        &self,
        params: Parameters<ActivitiesParams>,
    ) -> Result<Json<ActivitiesResult>, String> {
        let p = params.0;
        self.facade
            .user_activities(p.start.as_deref(), p.limit)
            .await
            .map(Json)
            .map_err(String::from)
    }

    #[tool(
        name = "user_activity",
        description = "Get details for a specific activity."
    )]
    async fn user_activity(
        &self,
        params: Parameters<ActivityIdParams>,
    ) -> Result<Json<ActivityResult>, String> {
        let p = params.0;
        self.facade
            .user_activity(&p.activity_id)
            .await
            .map(Json)
            .map_err(String::from)
    }

    #[tool(name = "user_sleep", description = "Get user sleep data.")]
    async fn user_sleep(
        &self,
        params: Parameters<DateParams>,
    ) -> Result<Json<SleepResult>, String> {
        let p = params.0;
        self.facade
            .user_sleep(p.date.as_deref())
            .await
            .map(Json)
            .map_err(String::from)
    }

    #[tool(name = "user_heart_rate", description = "Get user heart rate data.")]
    async fn user_heart_rate(
        &self,
        params: Parameters<DateParams>,
    ) -> Result<Json<HeartRateResult>, String> {
        let p = params.0;
        self.facade
            .user_heart_rate(p.date.as_deref())
            .await
            .map(Json)
            .map_err(String::from)
    }

    #[tool(name = "user_steps", description = "Get user step count data.")]
    async fn user_steps(
        &self,
        params: Parameters<DateParams>,
    ) -> Result<Json<StepsResult>, String> {
        let p = params.0;
        self.facade
            .user_steps(p.date.as_deref())
            .await
            .map(Json)
            .map_err(String::from)
    }

    #[tool(name = "user_weight", description = "Get user weight data.")]
    async fn user_weight(
        &self,
        params: Parameters<DateParams>,
    ) -> Result<Json<WeightResult>, String> {
        let p = params.0;
        self.facade
            .user_weight(p.date.as_deref())
            .await
            .map(Json)
            .map_err(String::from)
    }

    // === MCP Prompts ===

    /// Guided review of one day of health data
    #[prompt(
        name = "daily-health-review",
        description = "Review summary, sleep, heart rate, steps and weight for one day"
    )]
    async fn daily_health_review(
        &self,
        params: Parameters<DailyHealthReviewParams>,
    ) -> GetPromptResult {
        let date = params
            .0
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.facade.yesterday().to_string());

        prompts::daily_health_review_prompt(&date)
    }
}

#[tool_handler]
#[prompt_handler(router = self.prompt_router)]
impl rmcp::ServerHandler for GarminMcpHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Garmin Connect MCP server - provides daily summary, activities, sleep, \
                 heart rate, steps and weight data. Dates are ISO (YYYY-MM-DD) and \
                 default to yesterday."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }
}
