use std::fmt::{self, Debug};

use serde::Serialize;

/// The public Tavily endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// How many results a search returns unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// How thoroughly Tavily searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, general-purpose search.
    #[default]
    Basic,
    /// Slower search that digs up more relevant sources.
    Advanced,
}

/// Builder for [`TavilyConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TavilyConfigBuilder {
    api_key: String,
    base_url: Option<String>,
    max_results: Option<usize>,
    include_raw_content: bool,
    include_images: bool,
    search_depth: SearchDepth,
}

impl TavilyConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            max_results: None,
            include_raw_content: false,
            include_images: false,
            search_depth: SearchDepth::Basic,
        }
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Caps the number of results per search. Zero is treated as one.
    #[inline]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results.max(1));
        self
    }

    /// Asks Tavily for the cleaned page content of every result.
    #[inline]
    pub fn with_raw_content(mut self, include: bool) -> Self {
        self.include_raw_content = include;
        self
    }

    /// Asks Tavily for images related to the query.
    #[inline]
    pub fn with_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }

    /// Sets the search depth.
    #[inline]
    pub fn with_search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> TavilyConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        TavilyConfig {
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_results: self.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            include_raw_content: self.include_raw_content,
            include_images: self.include_images,
            search_depth: self.search_depth,
        }
    }
}

impl Debug for TavilyConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("include_raw_content", &self.include_raw_content)
            .field("include_images", &self.include_images)
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Configuration for [`TavilyClient`](crate::TavilyClient).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TavilyConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) max_results: usize,
    pub(crate) include_raw_content: bool,
    pub(crate) include_images: bool,
    pub(crate) search_depth: SearchDepth,
}

impl TavilyConfig {
    /// Returns the maximum number of results per search.
    #[inline]
    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl Debug for TavilyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("include_raw_content", &self.include_raw_content)
            .field("include_images", &self.include_images)
            .field("search_depth", &self.search_depth)
            .finish()
    }
}
