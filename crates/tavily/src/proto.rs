use serde::{Deserialize, Serialize};

use crate::TavilyConfig;
use crate::config::SearchDepth;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: SearchDepth,
    include_raw_content: bool,
    include_images: bool,
    include_answer: bool,
}

#[inline]
pub fn create_request<'a>(
    query: &'a str,
    config: &TavilyConfig,
) -> SearchRequest<'a> {
    SearchRequest {
        query,
        max_results: config.max_results,
        search_depth: config.search_depth,
        include_raw_content: config.include_raw_content,
        include_images: config.include_images,
        include_answer: false,
    }
}

/// One hit of a web search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Page address.
    pub url: String,
    /// The most relevant snippet of the page.
    pub content: String,
    /// Relevance score reported by Tavily.
    #[serde(default)]
    pub score: f64,
    /// Cleaned page content, only present when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

/// The results of a web search, in the order Tavily ranked them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as Tavily received it.
    #[serde(default)]
    pub query: String,
    /// The hits.
    #[serde(default)]
    pub results: Vec<SearchResult>,
    /// Image URLs, only present when requested.
    #[serde(default)]
    pub images: Vec<Image>,
}

/// An image related to a query.
///
/// Tavily answers with bare URLs, or with objects when image descriptions
/// are enabled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Image {
    /// A bare image URL.
    Url(String),
    /// An image URL with a description.
    Described {
        /// Image address.
        url: String,
        /// What the image shows.
        #[serde(default)]
        description: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message { error: String },
    Text(String),
}

impl ErrorDetail {
    pub fn into_message(self) -> String {
        match self {
            ErrorDetail::Message { error } => error,
            ErrorDetail::Text(text) => text,
        }
    }
}
