//! Mock 工具，用于在不访问搜索 API 的情况下测试 Agent 的工具调用行为。

use crate::error::Result;
use crate::tools::{Tool, ToolParameters, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum MockToolResponse {
    Success(String),
    Failure(String),
}

/// 可脚本化的 Mock Tool。
///
/// 按顺序返回预设结果；队列耗尽后返回 `"mock response"`。
/// 克隆体共享队列和调用记录，注册进 Agent 后仍可检查。
#[derive(Clone)]
pub struct MockTool {
    name: String,
    description: String,
    parameters: Value,
    responses: Arc<Mutex<VecDeque<MockToolResponse>>>,
    /// 每次调用时收到的参数，按顺序记录
    calls: Arc<Mutex<Vec<ToolParameters>>>,
}

impl MockTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "A mock tool for testing".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, output: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockToolResponse::Success(output.into()));
        self
    }

    pub fn with_failure(self, error: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockToolResponse::Failure(error.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_args(&self) -> Option<ToolParameters> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        self.calls.lock().unwrap().push(parameters);
        match self.responses.lock().unwrap().pop_front() {
            Some(MockToolResponse::Success(output)) => Ok(ToolResult::success(output)),
            Some(MockToolResponse::Failure(error)) => Ok(ToolResult::error(error)),
            None => Ok(ToolResult::success("mock response".to_string())),
        }
    }
}
