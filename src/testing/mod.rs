//! 测试基础设施
//!
//! 在不依赖真实 LLM / 搜索服务的情况下测试各组件。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`MockLlmClient`] | 替代真实模型，驱动 `ReactAgent` 的工具调用循环 |
//! | [`MockTool`] | 替代 `web_search`，检查 Agent 传入的参数 |
//! | [`MockAgent`] | 替代整个 Agent，测试 CLI 与 Web 界面 |

mod mock_agent;
mod mock_llm;
mod mock_tool;

pub use mock_agent::MockAgent;
pub use mock_llm::MockLlmClient;
pub use mock_tool::MockTool;
