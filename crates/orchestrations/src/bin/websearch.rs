//! Answers one question with the websearch agent.
//!
//! Usage: `websearch [QUERY...]`. Without arguments a built-in sample
//! question is used.

#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use orchestrations::config::{
    load_dotenv, openai_config_from_env, tavily_config_from_env,
};
use orchestrations::core::AgentBuilder;
use orchestrations::prompt::answer_text;
use orchestrations::tools::WebSearchTool;
use orchestrations_openai_model::OpenAIProvider;
use orchestrations_tavily::TavilyClient;
use owo_colors::OwoColorize;

const SAMPLE_QUERY: &str =
    "Crie uma história usando o meme mais atual do Brasil?";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (openai_config, tavily_config) =
        match (openai_config_from_env(), tavily_config_from_env()) {
            (Ok(openai), Ok(tavily)) => (openai, tavily),
            (Err(err), _) | (_, Err(err)) => {
                eprintln!("{}", err.bright_red());
                return ExitCode::FAILURE;
            }
        };
    debug!("using {openai_config:?} and {tavily_config:?}");

    let args: Vec<String> = env::args().skip(1).collect();
    let query = if args.is_empty() {
        SAMPLE_QUERY.to_owned()
    } else {
        args.join(" ")
    };

    let agent =
        AgentBuilder::with_model_provider(OpenAIProvider::new(openai_config))
            .with_tool(WebSearchTool::new(TavilyClient::new(tavily_config)))
            .build();

    println!("Searching for: {query}");

    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
        progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    progress_bar.set_message("🔍 Searching...");
    progress_bar.enable_steady_tick(Duration::from_millis(100));

    let result = agent.run(query).await;
    progress_bar.finish_and_clear();

    match result {
        Ok(run) => {
            info!(
                "answered after {} model calls and {} tool steps",
                run.agent_steps, run.tool_steps
            );
            println!("\nSearch Result:");
            println!("{}", answer_text(&run));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err}", "Error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}
