//! Tools that models can use.

mod web_search;

pub use web_search::{WEB_SEARCH_TOOL_NAME, WebSearchTool, format_results};
