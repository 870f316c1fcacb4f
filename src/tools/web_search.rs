//! Tavily 网页搜索工具
//!
//! 每次调用只发一个 POST，不重试、不缓存、不限流。
//! 搜索结果先以 [`SearchOutcome`] 表示，只在 [`Tool::execute`] 处压平成文本：
//! Provider 侧的任何失败都变成一段说明文字回传给模型，不会中断对话。

use crate::error::{Result, ToolError};
use crate::tools::{Tool, ToolParameters, ToolResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::{debug, warn};

pub const NO_RESULTS: &str = "No search results found.";

/// 搜索 Provider 配置
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// 读取 API key 的环境变量
    pub credential_env: String,
    /// 最多保留的结果条数
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            credential_env: "TAVILY_API_KEY".to_string(),
            max_results: 5,
        }
    }
}

/// 单条搜索结果，字段缺失或为 `null` 时取空串
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// 正文摘要
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<SearchResult>>,
}

/// 一次搜索的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// 按 Provider 顺序排列，已截断到 `max_results`
    Hits(Vec<SearchResult>),
    NoResults,
    /// Provider 返回了非 200 状态码
    ProviderError { status: u16 },
    /// 请求未能完成或响应无法解析
    RequestFailed(String),
    /// 未配置 API key
    Unavailable(String),
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Hits(results) => {
                let blocks: Vec<String> = results
                    .iter()
                    .map(|r| format!("🏨 {}\n{}\n🔗 {}", r.title, r.content, r.url))
                    .collect();
                write!(f, "{}", blocks.join("\n\n"))
            }
            SearchOutcome::NoResults => write!(f, "{}", NO_RESULTS),
            SearchOutcome::ProviderError { status } => write!(f, "Search API error: {}", status),
            SearchOutcome::RequestFailed(reason) => write!(f, "Search request failed: {}", reason),
            SearchOutcome::Unavailable(reason) => write!(f, "Search unavailable: {}", reason),
        }
    }
}

pub struct WebSearchTool {
    client: Client,
    config: SearchConfig,
    api_key: Option<String>,
}

impl WebSearchTool {
    /// 从 `config.credential_env` 读取 API key
    pub fn new(config: SearchConfig) -> Self {
        let api_key = std::env::var(&config.credential_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(env = %config.credential_env, "⚠️ 未配置搜索 API key，web_search 将不可用");
        }
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: SearchConfig, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            api_key,
        }
    }

    pub async fn search(&self, query: &str) -> SearchOutcome {
        let Some(api_key) = &self.api_key else {
            return SearchOutcome::Unavailable(format!("{} is not set", self.config.credential_env));
        };

        let response = match self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&json!({ "query": query }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SearchOutcome::RequestFailed(e.to_string()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "搜索 API 返回错误状态");
            return SearchOutcome::ProviderError {
                status: status.as_u16(),
            };
        }

        let body = match response.json::<SearchResponse>().await {
            Ok(body) => body,
            Err(e) => return SearchOutcome::RequestFailed(e.to_string()),
        };

        let mut results = body.results.unwrap_or_default();
        debug!(query, hits = results.len(), "🔎 搜索完成");
        if results.is_empty() {
            return SearchOutcome::NoResults;
        }
        results.truncate(self.config.max_results);
        SearchOutcome::Hits(results)
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Perform a web search using the Tavily API to retrieve hotel info."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Free-text search query, e.g. '4-star hotels in Paris near the Louvre'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let query = parameters
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::MissingParameter("query".to_string()))?;

        let outcome = self.search(query).await;
        Ok(ToolResult::success(outcome.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactError;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    const KEY: &str = "tvly-test";

    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// 启动一个本地的假 Tavily 服务，返回搜索端点和请求记录
    async fn spawn_provider(status: u16, body: Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/search",
            post(move |headers: HeaderMap, Json(payload): Json<Value>| {
                let body = body.clone();
                let recorder = recorder.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, payload));
                    (
                        axum::http::StatusCode::from_u16(status).unwrap(),
                        Json(body),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/search"), seen)
    }

    fn tool_for(endpoint: String) -> WebSearchTool {
        let config = SearchConfig {
            endpoint,
            ..SearchConfig::default()
        };
        WebSearchTool::with_api_key(config, Some(KEY.to_string()))
    }

    fn results(n: usize) -> Value {
        let items: Vec<Value> = (1..=n)
            .map(|i| {
                json!({
                    "title": format!("Hotel {i}"),
                    "content": format!("Snippet {i}"),
                    "url": format!("https://example.com/{i}"),
                    "score": 0.9
                })
            })
            .collect();
        json!({ "query": "paris", "results": items })
    }

    fn params(query: &str) -> ToolParameters {
        let mut params = ToolParameters::new();
        params.insert("query".to_string(), json!(query));
        params
    }

    #[tokio::test]
    async fn test_top_five_in_provider_order() {
        let (endpoint, seen) = spawn_provider(200, results(7)).await;
        let tool = tool_for(endpoint);

        let result = tool.execute(params("hotels in Paris")).await.unwrap();
        assert!(result.success);

        let blocks: Vec<&str> = result.output.split("\n\n").collect();
        assert_eq!(blocks.len(), 5);
        for (i, block) in blocks.iter().enumerate() {
            let n = i + 1;
            assert_eq!(
                *block,
                format!("🏨 Hotel {n}\nSnippet {n}\n🔗 https://example.com/{n}")
            );
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "不应重试");
        assert_eq!(seen[0].0.as_deref(), Some("Bearer tvly-test"));
        assert_eq!(seen[0].1, json!({ "query": "hotels in Paris" }));
    }

    #[tokio::test]
    async fn test_fewer_than_five_results() {
        let (endpoint, _) = spawn_provider(200, results(2)).await;
        match tool_for(endpoint).search("rome").await {
            SearchOutcome::Hits(hits) => {
                assert_eq!(hits.len(), 2);
                assert_eq!(hits[1].title, "Hotel 2");
            }
            other => panic!("应该返回 Hits，实际: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_null_fields_keep_other_hits() {
        let body = json!({
            "results": [
                { "title": "Hotel A", "content": null, "url": "https://example.com/a" },
                { "title": "Hotel B", "content": "ok", "url": null }
            ]
        });
        let (endpoint, _) = spawn_provider(200, body).await;
        let result = tool_for(endpoint).execute(params("paris")).await.unwrap();
        assert_eq!(
            result.output,
            "🏨 Hotel A\n\n🔗 https://example.com/a\n\n🏨 Hotel B\nok\n🔗 "
        );
    }

    #[tokio::test]
    async fn test_empty_results() {
        let (endpoint, _) = spawn_provider(200, json!({ "results": [] })).await;
        let result = tool_for(endpoint).execute(params("nowhere")).await.unwrap();
        assert_eq!(result.output, NO_RESULTS);
    }

    #[tokio::test]
    async fn test_missing_results_field() {
        let (endpoint, _) = spawn_provider(200, json!({ "answer": null })).await;
        assert_eq!(tool_for(endpoint).search("x").await, SearchOutcome::NoResults);
    }

    #[tokio::test]
    async fn test_non_200_status_is_text() {
        for status in [401u16, 429, 502] {
            let (endpoint, _) = spawn_provider(status, json!({ "detail": "nope" })).await;
            let result = tool_for(endpoint).execute(params("berlin")).await.unwrap();
            assert!(result.success);
            assert!(result.output.contains(&status.to_string()));
            assert_eq!(result.output, format!("Search API error: {status}"));
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_text() {
        // 绑定后立即释放，得到一个没有服务监听的端口
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = tool_for(format!("http://{addr}/search")).search("oslo").await;
        assert!(matches!(outcome, SearchOutcome::RequestFailed(_)));
        assert!(outcome.to_string().starts_with("Search request failed: "));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let tool = WebSearchTool::with_api_key(SearchConfig::default(), None);
        let result = tool.execute(params("lisbon")).await.unwrap();
        assert_eq!(result.output, "Search unavailable: TAVILY_API_KEY is not set");
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let tool = WebSearchTool::with_api_key(SearchConfig::default(), Some(KEY.to_string()));
        match tool.execute(params("   ")).await {
            Err(ReactError::Tool(ToolError::MissingParameter(name))) => assert_eq!(name, "query"),
            other => panic!("应该返回 MissingParameter，实际: {:?}", other),
        }
    }
}
