pub mod provider;
pub mod types;

use crate::error::{LlmError, ReactError, Result};
use crate::llm::provider::ProviderKind;
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse, Message, ToolDefinition};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub use provider::{ProviderConfig, get_model};

pub fn assemble_req_header(apikey: Option<&str>) -> Result<HeaderMap> {
    let mut header_map = HeaderMap::new();

    if let Some(apikey) = apikey {
        header_map.insert(
            "Authorization",
            format!("Bearer {}", apikey)
                .parse()
                .map_err(|e| ReactError::Other(format!("Invalid Authorization header: {}", e)))?,
        );
    }
    header_map.insert(
        "Content-Type",
        "application/json"
            .parse()
            .map_err(|e| ReactError::Other(format!("Invalid Content-Type header: {}", e)))?,
    );
    Ok(header_map)
}

/// Agent 调用模型的接口，便于在测试中替换为 [`MockLlmClient`](crate::testing::MockLlmClient)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发送完整的对话历史，返回模型给出的 assistant 消息（可能带 tool_calls）
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message>;
}

/// OpenAI Chat Completions 兼容的模型客户端
///
/// 由 [`get_model`] 构建，持有已校验的端点、请求头和采样参数。
#[derive(Clone)]
pub struct ChatModel {
    client: Arc<Client>,
    provider: ProviderKind,
    model: String,
    endpoint: String,
    headers: HeaderMap,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatModel {
    pub(crate) fn new(
        client: Arc<Client>,
        provider: ProviderKind,
        model: String,
        endpoint: String,
        headers: HeaderMap,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            client,
            provider,
            model,
            endpoint,
            headers,
            temperature,
            max_tokens,
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// 完整的 `/chat/completions` URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// 发送一次 `/chat/completions` 请求，错误信息带上 Provider 名称
    async fn send(&self, request_body: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(request_body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("{} request failed: {}", self.provider, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: format!("{} ({}): {}", self.provider, self.model, body),
            }
            .into());
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("{}: {}", self.provider, e)))?;
        debug!(provider = %self.provider, id = %completion.id, usage = ?completion.usage, "模型已响应");
        Ok(completion)
    }
}

// 请求头里带有 API key，不输出
impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[async_trait]
impl LlmClient for ChatModel {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message> {
        let tool_choice = tools.as_ref().map(|_| "auto".to_string());
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            tools,
            tool_choice,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: Some(false),
        };

        let response = self.send(&request_body).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::EmptyResponse.into())
    }
}
