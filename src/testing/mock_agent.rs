//! Mock Agent，实现 [`Agent`] trait，用于测试交互界面而不调用模型。
//!
//! ```rust
//! use hotel_agent::agent::ask;
//! use hotel_agent::testing::MockAgent;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut agent = MockAgent::new().with_response("Try Hotel Lutetia.");
//! let reply = ask(&mut agent, "Paris?", "1").await.unwrap();
//! assert_eq!(reply, "Try Hotel Lutetia.");
//! assert_eq!(agent.calls(), vec!["Paris?".to_string()]);
//! # }
//! ```

use crate::agent::{Agent, AgentOutput};
use crate::error::{ReactError, Result};
use crate::llm::types::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum MockAgentResponse {
    Reply(String),
    Err(ReactError),
}

/// 可脚本化的 Mock Agent。
///
/// 按顺序返回预设回复；队列耗尽后返回 `"mock agent response"`。
/// 每次 `invoke` 收到的用户文本都会被记录。
#[derive(Clone)]
pub struct MockAgent {
    responses: Arc<Mutex<VecDeque<MockAgentResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
    resets: Arc<Mutex<Vec<String>>>,
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            resets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, reply: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockAgentResponse::Reply(reply.into()));
        self
    }

    pub fn with_error(self, err: ReactError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockAgentResponse::Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 按顺序返回每次调用收到的用户文本
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// 被清空过的 thread_id
    pub fn resets(&self) -> Vec<String> {
        self.resets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        "mock_agent"
    }

    async fn invoke(&mut self, messages: Vec<Message>, thread_id: &str) -> Result<AgentOutput> {
        let text = messages
            .iter()
            .filter_map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.calls.lock().unwrap().push(text);

        let reply = match self.responses.lock().unwrap().pop_front() {
            Some(MockAgentResponse::Reply(reply)) => reply,
            Some(MockAgentResponse::Err(e)) => return Err(e),
            None => "mock agent response".to_string(),
        };

        let mut all = messages;
        all.push(Message::assistant(reply));
        Ok(AgentOutput {
            thread_id: thread_id.to_string(),
            messages: all,
        })
    }

    async fn reset_thread(&mut self, thread_id: &str) -> Result<()> {
        self.resets.lock().unwrap().push(thread_id.to_string());
        Ok(())
    }
}
