//! An interactive chat with the model.
//!
//! Type `quit`, `exit` or `q` to leave.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;

use orchestrations::config::{load_dotenv, openai_config_from_env};
use orchestrations::core::ChatSessionBuilder;
use orchestrations::core::checkpoint::MemoryCheckpointer;
use orchestrations::prompt::is_quit_command;
use orchestrations_openai_model::OpenAIProvider;
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const THREAD_ID: &str = "1";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match openai_config_from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.bright_red());
            return ExitCode::FAILURE;
        }
    };

    let session = ChatSessionBuilder::with_model_provider(OpenAIProvider::new(
        config,
    ))
    .with_checkpointer(MemoryCheckpointer::new(), THREAD_ID)
    .on_transcript(|delta| {
        print!("{delta}");
        std::io::stdout().flush().ok();
    })
    .build()
    .await;
    let mut session = match session {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{} {err}", "Error:".bright_red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut lines = io::BufReader::new(io::stdin()).lines();
    loop {
        print!("{} ", "User:".bright_green().bold());
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                println!("\nChat session terminated.");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                error!("error reading input: {err}");
                println!("\nChat session terminated.");
                return ExitCode::FAILURE;
            }
        };
        if is_quit_command(&line) {
            println!("Goodbye!");
            return ExitCode::SUCCESS;
        }

        print!("{} ", "Assistant:".bright_cyan().bold());
        std::io::stdout().flush().ok();
        match session.send_message(line).await {
            Ok(_) => println!(),
            Err(err) => {
                println!();
                eprintln!("{} {err}", "Error:".bright_red().bold());
                return ExitCode::FAILURE;
            }
        }
    }
}
