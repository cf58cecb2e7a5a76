use std::sync::Arc;
use std::time::Duration;

use garmin_connect_client::config::Config;
use garmin_connect_mcp::GarminMcpHandler;
use reqwest::Client;

const ACCEPT: &str = "application/json, text/event-stream";

async fn spawn_app() -> String {
    let handler = GarminMcpHandler::from_config(
        Config::default().with_credentials("runner@example.com", "hunter2"),
    );

    let session = Arc::new(
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default(),
    );
    let mcp_service = rmcp::transport::streamable_http_server::tower::StreamableHttpService::new(
        move || -> Result<_, std::io::Error> { Ok(handler.clone()) },
        session,
        rmcp::transport::streamable_http_server::tower::StreamableHttpServerConfig::default(),
    );

    let app = axum::Router::new()
        .route("/health", axum::routing::get(|| async { "ok" }))
        .nest_service("/mcp", mcp_service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("serve");
    });
    format!("http://{addr}")
}

fn http() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client")
}

#[tokio::test]
async fn e2e_http_health() {
    let base = spawn_app().await;
    let resp = http()
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health");
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn e2e_http_initialize_and_list_tools() {
    let base = spawn_app().await;
    let client = http();

    let init = client
        .post(format!("{base}/mcp"))
        .header("accept", ACCEPT)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "e2e", "version": "0.0.0" }
            }
        }))
        .send()
        .await
        .expect("initialize");
    assert!(init.status().is_success(), "status {}", init.status());
    let session_id = init
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("session id header");
    let body = init.text().await.expect("initialize body");
    assert!(body.contains("Garmin Connect MCP server"), "{body}");

    let ack = client
        .post(format!("{base}/mcp"))
        .header("accept", ACCEPT)
        .header("mcp-session-id", &session_id)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .send()
        .await
        .expect("initialized");
    assert!(ack.status().is_success(), "status {}", ack.status());

    let list = client
        .post(format!("{base}/mcp"))
        .header("accept", ACCEPT)
        .header("mcp-session-id", &session_id)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/list"
        }))
        .send()
        .await
        .expect("tools/list");
    assert!(list.status().is_success());
    let body = list.text().await.expect("tools body");
    for name in ["user_summary", "user_activity", "user_weight"] {
        assert!(body.contains(name), "missing {name} in {body}");
    }
}
