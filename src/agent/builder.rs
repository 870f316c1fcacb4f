//! Agent 组装：模型 + 搜索工具 + 系统提示词 + 进程内 Checkpointer

use crate::agent::{AgentConfig, ReactAgent};
use crate::config::AppConfig;
use crate::error::Result;
use crate::llm::{ChatModel, get_model};
use crate::memory::InMemoryCheckpointer;
use crate::tools::web_search::WebSearchTool;
use std::sync::Arc;
use tracing::info;

/// 构建酒店搜索 Agent。
///
/// 模型选择失败（主 Provider 与回退都不可用）时原样返回错误；
/// 提示词文件读取失败返回 `ReactError::Io`。
pub fn build_agent(config: &AppConfig, credential: Option<&str>) -> Result<ReactAgent> {
    let model = get_model(&config.provider, credential)?;
    assemble_agent(config, model)
}

/// 用已选好的模型组装 Agent
pub fn assemble_agent(config: &AppConfig, model: ChatModel) -> Result<ReactAgent> {
    let prompt_path = &config.agent.system_prompt_path;
    let system_prompt = std::fs::read_to_string(prompt_path)?;
    info!(path = %prompt_path, bytes = system_prompt.len(), "📜 已加载系统提示词");

    let agent_config = AgentConfig::new("hotel_agent", &system_prompt)
        .max_iterations(config.agent.max_iterations)
        .verbose(config.agent.verbose);

    let mut agent = ReactAgent::new(
        agent_config,
        Arc::new(model),
        Arc::new(InMemoryCheckpointer::new()),
    );
    agent.add_tool(Box::new(WebSearchTool::new(config.search.clone())));
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ReactError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_prompt(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn config_with_prompt(path: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.provider.primary.credential_env = "HOTEL_AGENT_TEST_NEVER_SET_KEY".to_string();
        config.agent.system_prompt_path = path.display().to_string();
        config
    }

    #[test]
    fn test_build_agent_reads_prompt_verbatim() {
        let prompt = "You are a hotel booking assistant.\n\n- Always cite URLs.\n";
        let file = write_prompt(prompt);

        let agent = build_agent(&config_with_prompt(file.path()), Some("sk-or-test")).unwrap();
        assert_eq!(agent.config().get_system_prompt(), prompt);
        assert_eq!(agent.config().get_max_iterations(), 25);
        assert_eq!(agent.list_tools(), vec!["web_search"]);
        assert!(!agent.config().is_verbose());
    }

    #[test]
    fn test_build_agent_passes_run_settings() {
        let file = write_prompt("prompt");
        let mut config = config_with_prompt(file.path());
        config.agent.max_iterations = 3;
        config.agent.verbose = true;

        let agent = build_agent(&config, Some("sk-or-test")).unwrap();
        assert_eq!(agent.config().get_max_iterations(), 3);
        assert!(agent.config().is_verbose());
    }

    #[test]
    fn test_build_agent_without_credential_uses_fallback() {
        let file = write_prompt("prompt");
        // 没有凭证时回退到本地模型，组装本身仍然成功
        assert!(build_agent(&config_with_prompt(file.path()), None).is_ok());
    }

    #[test]
    fn test_missing_prompt_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_prompt(&dir.path().join("system_prompt.txt"));
        let err = build_agent(&config, Some("sk-or-test")).unwrap_err();
        assert!(matches!(err, ReactError::Io(_)));
    }

    #[test]
    fn test_provider_error_is_not_wrapped() {
        let file = write_prompt("prompt");
        let mut config = config_with_prompt(file.path());
        config.provider.fallback.base_url = "::broken::".to_string();

        let err = build_agent(&config, None).unwrap_err();
        assert!(matches!(
            err,
            ReactError::Provider(ProviderError::AllUnavailable { .. })
        ));
    }

    #[test]
    fn test_agent_debug_lists_tools() {
        let file = write_prompt("prompt");
        let agent = build_agent(&config_with_prompt(file.path()), Some("sk-or-test")).unwrap();
        let debug = format!("{:?}", agent);
        assert!(debug.contains("hotel_agent"));
        assert!(debug.contains("web_search"));
        assert!(!debug.contains("sk-or-test"));
    }
}
