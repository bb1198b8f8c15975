//! Travel chat walkthrough
//!
//! Sends three requests through one conversation: a greeting, an events lookup and
//! a hotel lookup. Needs `GEMINI_API_KEY` and `SERP_API_KEY` (or `LLM_PROVIDER=ollama`).
//!
//! Run with: cargo run --example travel_chat

use travel_agent::agents::{Conversation, TravelAgent};
use travel_agent::config::Config;
use travel_agent::llm::tools::ToolRegistry;

const PROMPTS: [&str; 3] = [
    "Hello",
    "What are the events happening in Atlanta, GA?",
    "Find me hotels in Midtown Atlanta for a stay from 2024-09-02 to 2024-09-03 for 2 adults.",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let agent = TravelAgent::builder(config.gateway()?, config.model.clone())
        .tools(ToolRegistry::travel_tools(config.serpapi_client()?)?)
        .limits(config.agent_limits())
        .build();

    println!("Travel Chat Example");
    println!("===================\n");

    let mut conversation = Conversation::new();
    for prompt in PROMPTS {
        println!("You: {}", prompt);

        match agent.run(conversation.clone(), prompt).await {
            Ok(run) => {
                println!(
                    "Agent ({} turns, {} tool calls): {}\n",
                    run.turns, run.tool_invocations, run.answer
                );
                conversation = run.conversation;
            }
            Err(e) => eprintln!("Error: {}\n", e),
        }
    }

    Ok(())
}
