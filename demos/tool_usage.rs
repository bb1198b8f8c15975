//! Calling the travel tools directly
//!
//! Runs the event and hotel lookups without a model in the loop and prints what the
//! model would receive as function responses. Needs `SERP_API_KEY`.
//!
//! Run with: cargo run --example tool_usage

use serde_json::{json, Value};
use std::collections::HashMap;
use travel_agent::llm::tools::ToolRegistry;
use travel_agent::search::SerpApiClient;

fn args(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let serpapi = SerpApiClient::new(std::env::var("SERP_API_KEY").unwrap_or_default())?;
    let registry = ToolRegistry::travel_tools(serpapi)?;

    println!("Registered tools: {}\n", registry.names().join(", "));

    let calls = [
        ("event_api", json!({"query": "Events in Atlanta, GA"})),
        (
            "hotel_api",
            json!({
                "query": "Midtown Atlanta",
                "check_in_date": "2024-09-02",
                "check_out_date": "2024-09-03",
                "adults": 2
            }),
        ),
    ];

    for (name, arguments) in calls {
        let Some(tool) = registry.get(name) else {
            continue;
        };

        println!("--- {} ---", name);
        match tool.run(&args(arguments)).await {
            Ok(outcome) => println!("{}\n", serde_json::to_string_pretty(&outcome)?),
            Err(e) => eprintln!("Error: {}\n", e),
        }
    }

    Ok(())
}
