use garmin_connect_client::config::Config;
use garmin_connect_mcp::{GarminMcpHandler, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_level = telemetry::init();
    tracing::info!("garmin_connect_mcp: log filter: {}", log_level);

    let config = Config::load();
    if !config.has_credentials() {
        // Keep serving: each tool call reports the missing configuration.
        tracing::warn!("GARMIN_USERNAME / GARMIN_PASSWORD not set; tool calls will fail");
    }

    let handler = GarminMcpHandler::from_config(config);
    tracing::info!(
        "garmin_connect_mcp: registered {} tools and {} prompts",
        handler.tool_count(),
        handler.prompt_count()
    );

    // Start RMCP server over stdio transport so it's immediately usable with MCP clients
    tracing::info!("garmin_connect_mcp: starting stdio MCP server...");

    use rmcp::serve_server;
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = serve_server(handler, transport).await?;

    tracing::info!("garmin_connect_mcp: service initialized as server");

    server.waiting().await?;

    Ok(())
}
