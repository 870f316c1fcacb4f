//! 应用配置
//!
//! 所有字段都有默认值，YAML 文件只需写出要覆盖的部分：
//! ```yaml
//! provider:
//!   primary:
//!     model: openai/gpt-4o-mini
//! search:
//!   max_results: 3
//! agent:
//!   thread_id: "alice"
//! ```

use crate::error::{ConfigError, Result};
use crate::llm::provider::ProviderConfig;
use crate::tools::web_search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub search: SearchConfig,
    pub agent: AgentSettings,
}

/// Agent 组装参数
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AgentSettings {
    /// 系统提示词文件，构建 Agent 时原样读取
    pub system_prompt_path: String,
    /// 交互界面使用的固定会话 ID
    pub thread_id: String,
    /// 单轮对话内最多调用模型的次数
    pub max_iterations: usize,
    /// 输出每一步的详细日志
    pub verbose: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt_path: "prompts/system_prompt.txt".to_string(),
            thread_id: "1".to_string(),
            max_iterations: 25,
            verbose: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: AppConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactError;

    #[test]
    fn test_defaults_match_hosted_setup() {
        let config = AppConfig::default();
        assert_eq!(config.provider.primary.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.provider.fallback.model, "llama3.2:3b");
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.agent.thread_id, "1");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "provider:\n  primary:\n    model: openai/gpt-4o-mini\nagent:\n  thread_id: alice\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.primary.model, "openai/gpt-4o-mini");
        assert_eq!(config.provider.primary.max_tokens, 2048);
        assert_eq!(config.agent.thread_id, "alice");
        assert_eq!(config.agent.max_iterations, 25);
        assert_eq!(config.search.endpoint, "https://api.tavily.com/search");
    }

    #[test]
    fn test_missing_file() {
        match AppConfig::load("/definitely/not/here.yaml") {
            Err(ReactError::Config(ConfigError::FileNotFound(path))) => {
                assert!(path.contains("not/here.yaml"))
            }
            other => panic!("应该返回 FileNotFound，实际: {:?}", other),
        }
    }
}
