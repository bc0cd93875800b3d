use crate::domain::ports::WebSearcher;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";
pub const NO_RESULTS: &str = "No good search result found";

/// Query parameters sent with every search besides `q` and `api_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub engine: String,
    pub google_domain: String,
    pub gl: String,
    pub hl: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            engine: "google".to_string(),
            google_domain: "google.com".to_string(),
            gl: "us".to_string(),
            hl: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SerpApiSearcher {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    params: SearchParams,
}

impl SerpApiSearcher {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            params: SearchParams::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl WebSearcher for SerpApiSearcher {
    async fn search(&self, query: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| EtlError::MissingConfigError {
            field: "SERPAPI_API_KEY".to_string(),
        })?;

        tracing::debug!("Searching ({}): {}", self.params.engine, query);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("engine", self.params.engine.as_str()),
                ("q", query),
                ("api_key", api_key),
                ("google_domain", self.params.google_domain.as_str()),
                ("gl", self.params.gl.as_str()),
                ("hl", self.params.hl.as_str()),
                ("output", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Search response status: {}", status);

        let body: Value = response.json().await.map_err(|e| EtlError::SearchError {
            message: format!("HTTP {}: unreadable response body ({})", status, e),
        })?;

        if let Some(error) = body.get("error") {
            return Err(EtlError::SearchError {
                message: error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()),
            });
        }
        if !status.is_success() {
            return Err(EtlError::SearchError {
                message: format!("HTTP {}", status),
            });
        }

        Ok(summarize_results(&body))
    }
}

/// Flattens a SerpAPI response into plain text for the LLM.
///
/// A direct answer box wins. Otherwise the knowledge graph description and
/// its plain string attributes come first, then one line per organic result
/// in response order.
pub fn summarize_results(body: &Value) -> String {
    if let Some(answer) = answer_box_text(body) {
        return answer;
    }

    let mut lines = Vec::new();

    if let Some(graph) = body.get("knowledge_graph") {
        lines.extend(knowledge_graph_lines(graph));
    }

    if let Some(results) = body.get("organic_results").and_then(Value::as_array) {
        lines.extend(results.iter().filter_map(organic_line));
    }

    if lines.is_empty() {
        NO_RESULTS.to_string()
    } else {
        lines.join("\n")
    }
}

fn answer_box_text(body: &Value) -> Option<String> {
    let answer_box = body
        .get("answer_box_list")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .or_else(|| body.get("answer_box"))?;
    // 有時 answer_box 本身就是陣列
    let answer_box = match answer_box {
        Value::Array(items) => items.first()?,
        other => other,
    };

    for key in ["result", "answer", "snippet"] {
        if let Some(text) = str_field(answer_box, key) {
            return Some(text.to_string());
        }
    }

    highlighted_words(answer_box)
}

/// `description` first, then `"{title} {key}: {value}."` for every other
/// string attribute that is not a link.
fn knowledge_graph_lines(graph: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(fields) = graph.as_object() else {
        return lines;
    };

    if let Some(description) = str_field(graph, "description") {
        lines.push(description.to_string());
    }

    let title = str_field(graph, "title").unwrap_or_default();
    for (key, value) in fields {
        if key == "title" || key == "description" || key.ends_with("_stick") || key.ends_with("_link") {
            continue;
        }
        match value.as_str() {
            Some(text) if !text.trim().is_empty() && !text.starts_with("http") => {
                lines.push(format!("{} {}: {}.", title, key, text).trim_start().to_string());
            }
            _ => {}
        }
    }

    lines
}

/// `"{title}: {text} ({link})"`, where the text is the snippet, else the
/// highlighted words, else the rich snippet.
fn organic_line(result: &Value) -> Option<String> {
    let title = str_field(result, "title");
    let text = str_field(result, "snippet")
        .map(str::to_string)
        .or_else(|| highlighted_words(result))
        .or_else(|| rich_snippet_text(result));
    let link = str_field(result, "link");

    let mut line = match (title, text) {
        (Some(title), Some(text)) => format!("{}: {}", title, text),
        (Some(title), None) => title.to_string(),
        (None, Some(text)) => text,
        (None, None) => return link.map(str::to_string),
    };
    if let Some(link) = link {
        line.push_str(&format!(" ({})", link));
    }
    Some(line)
}

fn highlighted_words(value: &Value) -> Option<String> {
    value
        .get("snippet_highlighted_words")
        .and_then(Value::as_array)
        .map(|words| {
            words
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty())
}

fn rich_snippet_text(result: &Value) -> Option<String> {
    match result.get("rich_snippet")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(fields) if !fields.is_empty() => Some(Value::Object(fields.clone()).to_string()),
        _ => None,
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_summarize_organic_results() {
        let body = json!({
            "organic_results": [
                {
                    "title": "Staff Directory - Lincoln High",
                    "snippet": "Jane Doe, Principal, jane.doe@lincolnhigh.edu",
                    "link": "https://lincolnhigh.edu/staff"
                },
                {"title": "Lincoln High School", "link": "https://lincolnhigh.edu"},
                {"position": 3}
            ]
        });

        assert_eq!(
            summarize_results(&body),
            "Staff Directory - Lincoln High: Jane Doe, Principal, jane.doe@lincolnhigh.edu (https://lincolnhigh.edu/staff)\n\
             Lincoln High School (https://lincolnhigh.edu)"
        );
    }

    #[test]
    fn test_summarize_prefers_answer_box() {
        let body = json!({
            "answer_box": {"snippet": "Principal: Jane Doe"},
            "organic_results": [{"snippet": "ignored"}]
        });
        assert_eq!(summarize_results(&body), "Principal: Jane Doe");

        let listed = json!({"answer_box_list": [{"answer": "42"}]});
        assert_eq!(summarize_results(&listed), "42");

        let highlighted = json!({"answer_box": {"snippet_highlighted_words": ["Jane Doe", "John Roe"]}});
        assert_eq!(summarize_results(&highlighted), "Jane Doe, John Roe");
    }

    #[test]
    fn test_summarize_knowledge_graph_before_organic() {
        let body = json!({
            "knowledge_graph": {
                "title": "Lincoln High School",
                "type": "High school",
                "description": "Public high school in Springfield."
            },
            "organic_results": [{"snippet": "Main office: 555-0100"}]
        });

        assert_eq!(
            summarize_results(&body),
            "Public high school in Springfield.\nLincoln High School type: High school.\nMain office: 555-0100"
        );
    }

    #[test]
    fn test_knowledge_graph_skips_links() {
        let body = json!({
            "knowledge_graph": {
                "title": "Lincoln High School",
                "address": "100 Main St, Springfield",
                "website": "https://lincolnhigh.edu",
                "phone_link": "tel:5550100",
                "header_images": [{"image": "x"}]
            }
        });

        assert_eq!(
            summarize_results(&body),
            "Lincoln High School address: 100 Main St, Springfield."
        );
    }

    #[test]
    fn test_answer_box_result_key_wins() {
        let body = json!({"answer_box": {"result": "Jane Doe", "snippet": "Principal"}});
        assert_eq!(summarize_results(&body), "Jane Doe");
    }

    #[test]
    fn test_organic_fallbacks_without_snippet() {
        let body = json!({
            "organic_results": [
                {"title": "Faculty", "snippet_highlighted_words": ["Jane Doe", "Principal"]},
                {"title": "Contact", "rich_snippet": {"top": {"extensions": ["Office hours 8-4"]}}}
            ]
        });

        assert_eq!(
            summarize_results(&body),
            "Faculty: Jane Doe, Principal\nContact: {\"top\":{\"extensions\":[\"Office hours 8-4\"]}}"
        );
    }

    #[test]
    fn test_summarize_empty_response() {
        assert_eq!(summarize_results(&json!({})), NO_RESULTS);
        assert_eq!(summarize_results(&json!({"organic_results": []})), NO_RESULTS);
    }

    #[tokio::test]
    async fn test_search_sends_query_and_credentials() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("q", "Lincoln High Springfield staff directory")
                .query_param("api_key", "serp-test")
                .query_param("engine", "google");
            then.status(200).json_body(json!({
                "organic_results": [{"title": "Staff", "snippet": "Jane Doe, Principal"}]
            }));
        });

        let searcher = SerpApiSearcher::new(Some("serp-test".to_string())).with_base_url(server.base_url());
        let text = searcher
            .search("Lincoln High Springfield staff directory")
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(text, "Staff: Jane Doe, Principal");
    }

    #[tokio::test]
    async fn test_search_provider_error_is_returned() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(401).json_body(json!({"error": "Invalid API key."}));
        });

        let searcher = SerpApiSearcher::new(Some("bad".to_string())).with_base_url(server.base_url());
        let result = searcher.search("anything").await;

        match result {
            Err(EtlError::SearchError { message }) => assert_eq!(message, "Invalid API key."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_error_key_with_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200)
                .json_body(json!({"error": "Google hasn't returned any results for this query."}));
        });

        let searcher = SerpApiSearcher::new(Some("k".to_string())).with_base_url(server.base_url());
        assert!(matches!(
            searcher.search("  staff directory").await,
            Err(EtlError::SearchError { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_non_json_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(502).body("Bad Gateway");
        });

        let searcher = SerpApiSearcher::new(Some("k".to_string())).with_base_url(server.base_url());
        assert!(matches!(
            searcher.search("query").await,
            Err(EtlError::SearchError { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_without_key_fails() {
        let searcher = SerpApiSearcher::new(None);
        assert!(matches!(
            searcher.search("query").await,
            Err(EtlError::MissingConfigError { .. })
        ));
    }
}
