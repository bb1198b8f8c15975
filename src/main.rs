//! Travel Agent - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the search, trip planning and chat API.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_agent::agents::{ConversationStore, TravelAgent, TravelCoordinator};
use travel_agent::api::{self, AppState};
use travel_agent::config::Config;
use travel_agent::llm::tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: provider={:?} model={}",
        config.llm_provider, config.model
    );

    let serpapi = config.serpapi_client()?;
    let agent = TravelAgent::builder(config.gateway()?, config.model.clone())
        .tools(ToolRegistry::travel_tools(serpapi.clone())?)
        .limits(config.agent_limits())
        .build();
    info!(
        "Agent ready: tools=[{}] max_turns={} deadline={:?}",
        agent.tools().names().join(", "),
        agent.limits().max_turns,
        agent.limits().deadline
    );

    let state = Arc::new(AppState::with_store(
        agent,
        TravelCoordinator::with_serpapi(serpapi),
        ConversationStore::with_limits(config.store_limits()),
    ));

    let addr = config.bind_address();
    info!("Starting server on {}", addr);

    api::serve(state, &addr).await
}
