use crate::agent::{Agent, AgentOutput};
use crate::error::{AgentError, Result, ToolError};
use crate::llm::LlmClient;
use crate::llm::types::{Message, ToolCall};
use crate::memory::Checkpointer;
use crate::tools::{Tool, ToolManager, ToolParameters};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use super::config::AgentConfig;

/// 原生 Tool Calling 的对话 Agent
///
/// 每轮：读取会话快照 → 追加用户消息 → 循环调用模型；模型请求工具时依次执行并回传结果，
/// 模型给出不带工具调用的回复时结束本轮。每完成一步都写入一次快照。
pub struct ReactAgent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    tool_manager: ToolManager,
    checkpointer: Arc<dyn Checkpointer>,
}

// 模型客户端可能带有凭证，只输出配置和工具名
impl fmt::Debug for ReactAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactAgent")
            .field("config", &self.config)
            .field("tools", &self.list_tools())
            .finish()
    }
}

impl ReactAgent {
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmClient>,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Self {
        Self {
            config,
            llm,
            tool_manager: ToolManager::new(),
            checkpointer,
        }
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tool_manager.register(tool)
    }

    pub fn list_tools(&self) -> Vec<&str> {
        self.tool_manager.list_tools()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn checkpointer(&self) -> Arc<dyn Checkpointer> {
        self.checkpointer.clone()
    }

    /// 读取会话历史；新会话以 system 提示词开头
    async fn load_history(&self, thread_id: &str) -> Result<Vec<Message>> {
        match self.checkpointer.get(thread_id).await? {
            Some(checkpoint) => Ok(checkpoint.messages),
            None => Ok(vec![Message::system(self.config.system_prompt.clone())]),
        }
    }

    async fn think(&self, messages: &[Message]) -> Result<Message> {
        let tools = if self.tool_manager.is_empty() {
            None
        } else {
            Some(self.tool_manager.get_tool_definitions())
        };
        self.llm.chat(messages.to_vec(), tools).await
    }

    /// 执行单个工具调用；任何失败都转成 `Error: ...` 文本回传给模型
    async fn execute_tool(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        let params = match parse_arguments(&call.function.arguments) {
            Ok(params) => params,
            Err(e) => return format!("Error: {}", e),
        };

        if self.config.verbose {
            info!(tool = name, args = %call.function.arguments, "🚀 调用工具");
        }

        match self.tool_manager.execute_tool(name, params).await {
            Ok(result) => {
                let observation = result.into_observation();
                if self.config.verbose {
                    info!(tool = name, "📤 结果: {}", observation);
                }
                observation
            }
            Err(e) => {
                warn!(tool = name, error = %e, "工具执行失败");
                format!("Error: {}", e)
            }
        }
    }
}

/// 解析模型给出的 JSON 参数串；空串视为无参数
fn parse_arguments(raw: &str) -> Result<ToolParameters> {
    if raw.trim().is_empty() {
        return Ok(ToolParameters::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(ToolError::InvalidParameter {
            name: "arguments".to_string(),
            message: format!("expected a JSON object, got {}", other),
        }
        .into()),
        Err(e) => Err(ToolError::InvalidParameter {
            name: "arguments".to_string(),
            message: e.to_string(),
        }
        .into()),
    }
}

#[async_trait]
impl Agent for ReactAgent {
    fn name(&self) -> &str {
        &self.config.agent_name
    }

    async fn invoke(&mut self, messages: Vec<Message>, thread_id: &str) -> Result<AgentOutput> {
        let mut history = self.load_history(thread_id).await?;
        history.extend(messages);
        self.checkpointer.put(thread_id, history.clone()).await?;

        if self.config.verbose {
            info!(agent = %self.config.agent_name, thread_id, tools = ?self.list_tools(), "🧠 开始新一轮对话");
        }

        for iteration in 0..self.config.max_iterations {
            debug!(thread_id, iteration = iteration + 1, "--- 迭代 ---");

            let reply = self.think(&history).await?;
            history.push(reply.clone());

            let Some(tool_calls) = reply.tool_calls.filter(|calls| !calls.is_empty()) else {
                self.checkpointer.put(thread_id, history.clone()).await?;
                if self.config.verbose {
                    info!(thread_id, "✅ 本轮结束");
                }
                return Ok(AgentOutput {
                    thread_id: thread_id.to_string(),
                    messages: history,
                });
            };

            for call in &tool_calls {
                let observation = self.execute_tool(call).await;
                history.push(Message::tool_result(
                    call.id.clone(),
                    call.function.name.clone(),
                    observation,
                ));
            }
            self.checkpointer.put(thread_id, history.clone()).await?;
        }

        Err(AgentError::MaxIterationsExceeded(self.config.max_iterations).into())
    }

    async fn reset_thread(&mut self, thread_id: &str) -> Result<()> {
        self.checkpointer.delete_thread(thread_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ask, extract_reply};
    use crate::error::{LlmError, ReactError};
    use crate::memory::InMemoryCheckpointer;
    use crate::testing::{MockLlmClient, MockTool};

    fn agent_with(llm: Arc<MockLlmClient>) -> ReactAgent {
        let config = AgentConfig::new("hotel_agent", "You are a hotel booking assistant.");
        let mut agent = ReactAgent::new(config, llm, Arc::new(InMemoryCheckpointer::new()));
        agent.add_tool(Box::new(
            MockTool::new("web_search").with_response("🏨 Hotel Lutetia\nLeft bank\n🔗 https://example.com"),
        ));
        agent
    }

    fn search_call(id: &str, query: &str) -> Message {
        let args = serde_json::json!({ "query": query }).to_string();
        Message::assistant_with_tools(vec![ToolCall::function(id, "web_search", args)])
    }

    #[tokio::test]
    async fn test_plain_answer_without_tools() {
        let llm = Arc::new(MockLlmClient::new().with_response("Hello! Where are you travelling?"));
        let mut agent = agent_with(llm.clone());

        let reply = ask(&mut agent, "hi", "1").await.unwrap();
        assert_eq!(reply, "Hello! Where are you travelling?");

        let sent = llm.last_messages().unwrap();
        assert_eq!(sent[0].role, "system");
        assert_eq!(sent[0].content.as_deref(), Some("You are a hotel booking assistant."));
        assert_eq!(sent[1].content.as_deref(), Some("hi"));
        assert_eq!(llm.last_tool_names(), vec!["web_search"]);
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let llm = Arc::new(
            MockLlmClient::new()
                .with_message(search_call("call_1", "hotels in Paris"))
                .with_response("Try Hotel Lutetia."),
        );
        let mut agent = agent_with(llm.clone());

        let output = agent
            .invoke(vec![Message::user("Find hotels in Paris".to_string())], "1")
            .await
            .unwrap();

        let roles: Vec<&str> = output.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool", "assistant"]);
        assert_eq!(extract_reply(&output), "Try Hotel Lutetia.");

        let tool_msg = &output.messages[3];
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.as_deref().unwrap().contains("Hotel Lutetia"));

        // 第二次调用模型时必须带上工具结果
        assert_eq!(llm.call_count(), 2);
        assert_eq!(llm.last_messages().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_history_persists_per_thread() {
        let llm = Arc::new(
            MockLlmClient::new().with_responses(["Paris it is.", "Still Paris.", "Hi Bob."]),
        );
        let mut agent = agent_with(llm.clone());

        ask(&mut agent, "I want Paris", "1").await.unwrap();
        ask(&mut agent, "Which city?", "1").await.unwrap();
        // 第二轮看到的是 system + 第一轮两条 + 新的用户消息
        assert_eq!(llm.last_messages().unwrap().len(), 4);

        ask(&mut agent, "I'm Bob", "2").await.unwrap();
        assert_eq!(llm.last_messages().unwrap().len(), 2, "不同 thread 互不可见");

        let thread_1 = agent.checkpointer().get("1").await.unwrap().unwrap();
        assert_eq!(thread_1.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_become_observations() {
        let llm = Arc::new(
            MockLlmClient::new()
                .with_message(Message::assistant_with_tools(vec![
                    ToolCall::function("call_1", "book_room", "{}"),
                    ToolCall::function("call_2", "web_search", "not json"),
                ]))
                .with_response("Sorry, I could not search."),
        );
        let mut agent = agent_with(llm);

        let output = agent
            .invoke(vec![Message::user("Book it".to_string())], "1")
            .await
            .unwrap();
        let unknown = output.messages[3].content.as_deref().unwrap();
        let malformed = output.messages[4].content.as_deref().unwrap();
        assert!(unknown.starts_with("Error: "));
        assert!(unknown.contains("book_room"));
        assert!(malformed.contains("Invalid parameter 'arguments'"));
        assert_eq!(extract_reply(&output), "Sorry, I could not search.");
    }

    #[tokio::test]
    async fn test_failed_tool_result_becomes_error_observation() {
        let llm = Arc::new(
            MockLlmClient::new()
                .with_message(search_call("call_1", "hotels in Oslo"))
                .with_response("The search service is down, please try later."),
        );
        let search = MockTool::new("web_search").with_failure("quota exceeded");
        let config = AgentConfig::new("hotel_agent", "prompt");
        let mut agent = ReactAgent::new(config, llm, Arc::new(InMemoryCheckpointer::new()));
        agent.add_tool(Box::new(search.clone()));

        let output = agent
            .invoke(vec![Message::user("Hotels in Oslo?".to_string())], "1")
            .await
            .unwrap();

        let tool_msg = &output.messages[3];
        assert_eq!(tool_msg.role, "tool");
        assert_eq!(tool_msg.content.as_deref(), Some("Error: quota exceeded"));
        assert_eq!(
            extract_reply(&output),
            "The search service is down, please try later."
        );

        assert_eq!(search.call_count(), 1);
        assert_eq!(search.last_args().unwrap()["query"], "hotels in Oslo");
    }

    #[tokio::test]
    async fn test_max_iterations_exceeded() {
        let llm = Arc::new(
            MockLlmClient::new()
                .with_message(search_call("a", "x"))
                .with_message(search_call("b", "y")),
        );
        let config = AgentConfig::new("hotel_agent", "prompt").max_iterations(2);
        let mut agent = ReactAgent::new(config, llm, Arc::new(InMemoryCheckpointer::new()));
        agent.add_tool(Box::new(MockTool::new("web_search")));

        let err = ask(&mut agent, "loop", "1").await.unwrap_err();
        assert!(matches!(
            err,
            ReactError::Agent(AgentError::MaxIterationsExceeded(2))
        ));
    }

    #[tokio::test]
    async fn test_llm_error_propagates_and_input_is_kept() {
        let llm = Arc::new(MockLlmClient::new().with_network_error("connection refused"));
        let mut agent = agent_with(llm);

        let err = ask(&mut agent, "hello", "1").await.unwrap_err();
        assert!(matches!(err, ReactError::Llm(LlmError::NetworkError(_))));

        let saved = agent.checkpointer().get("1").await.unwrap().unwrap();
        assert_eq!(saved.messages.last().unwrap().content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_reset_thread() {
        let llm = Arc::new(MockLlmClient::new().with_responses(["one", "two"]));
        let mut agent = agent_with(llm.clone());

        ask(&mut agent, "first", "1").await.unwrap();
        agent.reset_thread("1").await.unwrap();
        ask(&mut agent, "again", "1").await.unwrap();
        assert_eq!(llm.last_messages().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_arguments() {
        assert!(parse_arguments("").unwrap().is_empty());
        let params = parse_arguments(r#"{"query":"rome"}"#).unwrap();
        assert_eq!(params["query"], "rome");
        assert!(parse_arguments("[1,2]").is_err());
    }
}
