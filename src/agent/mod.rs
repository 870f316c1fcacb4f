use crate::error::Result;
use crate::llm::types::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod builder;
mod config;
pub mod react_agent;

pub use builder::{assemble_agent, build_agent};
pub use react_agent::{AgentConfig, ReactAgent};

/// 一轮对话结束后的完整会话状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub thread_id: String,
    /// 会话的全部消息（含 system、历史轮次、工具结果）
    pub messages: Vec<Message>,
}

/// 可被交互界面驱动的 Agent
#[async_trait]
pub trait Agent: Send + Sync {
    /// agent 的名称
    fn name(&self) -> &str;

    /// 把 `messages` 追加到 `thread_id` 对应的会话并执行一轮
    async fn invoke(&mut self, messages: Vec<Message>, thread_id: &str) -> Result<AgentOutput>;

    /// 清空 `thread_id` 对应的会话
    async fn reset_thread(&mut self, thread_id: &str) -> Result<()>;
}

/// 从一轮结果中取出最终回答。
///
/// 从最新消息往回找第一条内容非空白的 assistant 消息：部分执行路径会在最终回答之后
/// 再追加工具结果或空的 assistant 消息。找不到时退化为整个结果的文本形式。
pub fn extract_reply(output: &AgentOutput) -> String {
    output
        .messages
        .iter()
        .rev()
        .filter(|m| m.is_assistant())
        .filter_map(|m| m.content.as_deref())
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            serde_json::to_string(output).unwrap_or_else(|_| format!("{:?}", output))
        })
}

/// 发送一条用户消息并返回最终回答
pub async fn ask(agent: &mut dyn Agent, text: &str, thread_id: &str) -> Result<String> {
    let output = agent
        .invoke(vec![Message::user(text.to_string())], thread_id)
        .await?;
    Ok(extract_reply(&output))
}
