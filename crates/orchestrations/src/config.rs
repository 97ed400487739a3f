//! Environment configuration.
//!
//! Variables are read once at startup. A `.env` file in the working
//! directory (or any parent) is loaded first by [`load_dotenv`], and real
//! environment variables take precedence over it.

use std::error::Error as StdError;
use std::fmt::{self, Display};

use orchestrations_openai_model::{OpenAIConfig, OpenAIConfigBuilder};
use orchestrations_tavily::{TavilyConfig, TavilyConfigBuilder};

/// API key of the chat model endpoint. Required.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Base URL of the chat model endpoint.
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Model name.
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
/// API key of the search service. Required for web search.
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";
/// Maximum number of search results per query.
pub const TAVILY_MAX_RESULTS: &str = "TAVILY_MAX_RESULTS";

/// Error type for loading configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    MissingVar(&'static str),
    /// A variable is set to something that cannot be used.
    InvalidVar {
        /// Name of the variable.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => {
                write!(f, "{name} environment variable is not set")
            }
            ConfigError::InvalidVar { name, reason } => {
                write!(f, "{name} environment variable is invalid: {reason}")
            }
        }
    }
}

impl StdError for ConfigError {}

/// Loads variables from a `.env` file, if there is one.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("loaded variables from {}", path.display()),
        Err(err) => trace!("no .env file loaded: {err}"),
    }
}

/// Reads the chat model configuration from the process environment.
#[inline]
pub fn openai_config_from_env() -> Result<OpenAIConfig, ConfigError> {
    openai_config(env_var)
}

/// Reads the search configuration from the process environment.
#[inline]
pub fn tavily_config_from_env() -> Result<TavilyConfig, ConfigError> {
    tavily_config(env_var)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn openai_config<F>(vars: F) -> Result<OpenAIConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = required(&vars, OPENAI_API_KEY)?;
    let mut builder = OpenAIConfigBuilder::with_api_key(api_key);
    if let Some(base_url) = optional(&vars, OPENAI_BASE_URL) {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidVar {
                name: OPENAI_BASE_URL,
                reason: format!("`{base_url}` is not an http(s) URL"),
            });
        }
        builder = builder.with_base_url(base_url);
    }
    if let Some(model) = optional(&vars, OPENAI_MODEL) {
        builder = builder.with_model(model);
    }
    Ok(builder.build())
}

fn tavily_config<F>(vars: F) -> Result<TavilyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = required(&vars, TAVILY_API_KEY)?;
    let mut builder = TavilyConfigBuilder::with_api_key(api_key);
    if let Some(max_results) = optional(&vars, TAVILY_MAX_RESULTS) {
        let max_results = match max_results.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigError::InvalidVar {
                    name: TAVILY_MAX_RESULTS,
                    reason: format!("`{max_results}` is not a positive number"),
                });
            }
        };
        builder = builder.with_max_results(max_results);
    }
    Ok(builder.build())
}

fn required<F>(vars: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(vars, name).ok_or(ConfigError::MissingVar(name))
}

fn optional<F>(vars: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    vars(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
