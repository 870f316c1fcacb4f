pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod shell;
pub mod testing;
pub mod tools;

pub mod prelude {
    pub use crate::agent::{Agent, AgentConfig, AgentOutput, ReactAgent, ask, build_agent, extract_reply};
    pub use crate::config::AppConfig;
    pub use crate::error::{ReactError, Result};
    pub use crate::tools::{Tool, ToolParameters, ToolResult};
}
