use orchestrations_core::tool::{Error as ToolError, Tool, ToolResult};
use orchestrations_tavily::{SearchResult, TavilyClient};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The name the model uses to call [`WebSearchTool`].
pub const WEB_SEARCH_TOOL_NAME: &str = "tavily_search_results_json";

#[derive(Deserialize, JsonSchema)]
pub struct WebSearchParameters {
    #[schemars(description = "Search query to look up.")]
    query: String,
}

#[derive(Serialize)]
struct FormattedResult<'a> {
    title: &'a str,
    url: &'a str,
    content: &'a str,
}

/// A tool for searching the web with Tavily.
pub struct WebSearchTool {
    client: TavilyClient,
    parameter_schema: Value,
}

impl WebSearchTool {
    /// Creates a new web search tool backed by `client`.
    #[inline]
    pub fn new(client: TavilyClient) -> Self {
        Self {
            client,
            parameter_schema: schema_for!(WebSearchParameters).to_value(),
        }
    }
}

impl Tool for WebSearchTool {
    type Input = WebSearchParameters;

    fn name(&self) -> &str {
        WEB_SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted \
results. Useful for when you need to answer questions about current events. \
Input should be a search query."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: WebSearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let query = input.query.trim().to_owned();
        let search = (!query.is_empty()).then(|| self.client.search(&query));
        async move {
            let Some(search) = search else {
                return Err(ToolError::invalid_input()
                    .with_reason("`query` must not be empty"));
            };
            let response = search.await.map_err(|err| {
                ToolError::execution_error().with_reason(err.to_string())
            })?;
            info!("found {} results for `{query}`", response.results.len());
            format_results(&response.results)
        }
    }
}

/// Formats search results as a JSON array of `{title, url, content}`
/// objects, keeping their order.
pub fn format_results(results: &[SearchResult]) -> ToolResult {
    let items: Vec<_> = results
        .iter()
        .map(|result| FormattedResult {
            title: &result.title,
            url: &result.url,
            content: &result.content,
        })
        .collect();
    serde_json::to_string(&items).map_err(|err| {
        ToolError::execution_error().with_reason(err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use orchestrations_core::tool::ErrorKind as ToolErrorKind;
    use orchestrations_tavily::TavilyConfigBuilder;
    use serde_json::json;

    use super::*;

    fn result(title: &str, url: &str, content: &str) -> SearchResult {
        SearchResult {
            title: title.to_owned(),
            url: url.to_owned(),
            content: content.to_owned(),
            score: 0.9,
            raw_content: Some("<html>...</html>".to_owned()),
        }
    }

    fn tool() -> WebSearchTool {
        // Points at a closed local port so nothing reaches the network.
        let config = TavilyConfigBuilder::with_api_key("tvly-test")
            .with_base_url("http://127.0.0.1:9")
            .build();
        WebSearchTool::new(TavilyClient::new(config))
    }

    #[test]
    fn test_format_results() {
        let formatted = format_results(&[
            result("Paris weather", "https://weather.example/paris", "Sunny"),
            result("Météo Paris", "https://meteo.example/paris", "Ensoleillé"),
        ])
        .unwrap();
        let value: Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(
            value,
            json!([
                {
                    "title": "Paris weather",
                    "url": "https://weather.example/paris",
                    "content": "Sunny",
                },
                {
                    "title": "Météo Paris",
                    "url": "https://meteo.example/paris",
                    "content": "Ensoleillé",
                },
            ])
        );

        assert_eq!(format_results(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_schema() {
        let tool = tool();
        assert_eq!(tool.name(), "tavily_search_results_json");
        let schema = tool.parameter_schema();
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_empty_query() {
        let err = tool()
            .execute(WebSearchParameters {
                query: "   ".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_search_failure_is_tool_error() {
        let err = tool()
            .execute(WebSearchParameters {
                query: "weather Paris today".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::ExecutionError);
        assert!(err.reason().starts_with("web search failed"));
    }
}
