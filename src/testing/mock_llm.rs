//! Mock LLM 客户端，在不发起真实 HTTP 请求的情况下驱动 [`ReactAgent`](crate::agent::ReactAgent)。
//!
//! ```rust
//! use hotel_agent::testing::MockLlmClient;
//! use hotel_agent::llm::LlmClient;
//! use hotel_agent::llm::types::Message;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = MockLlmClient::new().with_response("Hotel Lutetia is a good pick.");
//!
//! let reply = mock.chat(vec![Message::user("hi".to_string())], None).await.unwrap();
//! assert_eq!(reply.content.as_deref(), Some("Hotel Lutetia is a good pick."));
//! assert_eq!(mock.call_count(), 1);
//! # }
//! ```

use crate::error::{LlmError, ReactError, Result};
use crate::llm::LlmClient;
use crate::llm::types::{Message, ToolDefinition};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 预设响应（assistant 消息或错误）
enum MockLlmResponse {
    Message(Message),
    Err(ReactError),
}

/// 一次调用收到的参数
#[derive(Debug, Clone)]
struct MockLlmCall {
    messages: Vec<Message>,
    tools: Option<Vec<ToolDefinition>>,
}

/// 可脚本化的 Mock LLM 客户端。
///
/// 按顺序返回预设的响应；队列耗尽后返回 `EmptyResponse` 错误。
pub struct MockLlmClient {
    responses: Arc<Mutex<VecDeque<MockLlmResponse>>>,
    calls: Arc<Mutex<Vec<MockLlmCall>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 追加一条纯文本 assistant 回复
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_message(Message::assistant(text.into()))
    }

    /// 批量追加多条纯文本回复
    pub fn with_responses(self, texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        {
            let mut q = self.responses.lock().unwrap();
            for t in texts {
                q.push_back(MockLlmResponse::Message(Message::assistant(t.into())));
            }
        }
        self
    }

    /// 追加一条任意 assistant 消息（常用于构造 tool_calls）
    pub fn with_message(self, message: Message) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockLlmResponse::Message(message));
        self
    }

    /// 追加一条错误响应
    pub fn with_error(self, err: ReactError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockLlmResponse::Err(err));
        self
    }

    pub fn with_network_error(self, msg: impl Into<String>) -> Self {
        self.with_error(ReactError::Llm(LlmError::NetworkError(msg.into())))
    }

    /// 已发生的调用总次数
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 最后一次调用时传入的 messages
    pub fn last_messages(&self) -> Option<Vec<Message>> {
        self.calls.lock().unwrap().last().map(|c| c.messages.clone())
    }

    /// 最后一次调用时声明的工具名
    pub fn last_tool_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .and_then(|c| c.tools.as_ref())
            .map(|tools| tools.iter().map(|t| t.function.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message> {
        self.calls.lock().unwrap().push(MockLlmCall { messages, tools });

        match self.responses.lock().unwrap().pop_front() {
            Some(MockLlmResponse::Message(message)) => Ok(message),
            Some(MockLlmResponse::Err(e)) => Err(e),
            None => Err(ReactError::Llm(LlmError::EmptyResponse)),
        }
    }
}
