//! 模型 Provider 选择
//!
//! 优先使用 OpenRouter 托管模型；凭证缺失或客户端构建失败时回退到本地 Ollama。
//! 两个 Provider 都走 OpenAI Chat Completions 兼容接口。
//!
//! 构建是 fail-fast 的：凭证和端点在客户端对象创建之前校验，
//! 不做网络探测。Ollama 未启动的情况会在第一次对话时以网络错误暴露。
//!
//! 选择模型不修改进程环境。需要把凭证同步到其他环境变量时，由启动代码在
//! 创建任何线程之前调用 [`stage_primary_credential`]。

use crate::error::{ProviderError, ReactError, Result};
use crate::llm::{ChatModel, assemble_req_header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    OpenRouter,
    Ollama,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenRouter => write!(f, "OpenRouter"),
            ProviderKind::Ollama => write!(f, "Ollama"),
        }
    }
}

/// 托管模型（OpenRouter）配置
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteProviderConfig {
    /// API 根地址，请求发往 `{base_url}/chat/completions`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 未显式传入凭证时读取的环境变量
    pub credential_env: String,
    /// [`stage_primary_credential`] 写入凭证的环境变量（部分下游代码只认 `OPENAI_API_KEY`）
    pub mirror_env: Vec<String>,
}

impl Default for RemoteProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "nvidia/nemotron-nano-12b-v2-vl:free".to_string(),
            temperature: 0.3,
            max_tokens: 2048,
            credential_env: "OPENROUTER_API_KEY".to_string(),
            mirror_env: vec!["OPENAI_API_KEY".to_string(), "OPENROUTER_API_KEY".to_string()],
        }
    }
}

/// 本地模型（Ollama）配置
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LocalProviderConfig {
    /// Ollama 服务地址，请求发往 `{base_url}/v1/chat/completions`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProviderConfig {
    pub primary: RemoteProviderConfig,
    pub fallback: LocalProviderConfig,
}

/// 选择模型客户端：OpenRouter 优先，失败时回退到 Ollama。
///
/// 主 Provider 的失败只被捕获一次；回退也失败时返回
/// [`ProviderError::AllUnavailable`]，携带两边的失败原因。
pub fn get_model(config: &ProviderConfig, preferred_credential: Option<&str>) -> Result<ChatModel> {
    match build_remote(&config.primary, preferred_credential) {
        Ok(model) => {
            info!(provider = %model.provider(), model = model.model_name(), "✅ 模型客户端已就绪");
            Ok(model)
        }
        Err(primary_err) => {
            warn!("OpenRouter failed: {primary_err}. Falling back to Ollama...");
            let model = build_local(&config.fallback).map_err(|fallback_err| {
                ReactError::from(ProviderError::AllUnavailable {
                    primary: primary_err.to_string(),
                    fallback: fallback_err.to_string(),
                })
            })?;
            info!(provider = %model.provider(), model = model.model_name(), "✅ 已切换到本地模型");
            Ok(model)
        }
    }
}

/// 优先使用显式传入的凭证，其次读取环境变量；空白值视为缺失
pub fn resolve_credential(preferred: Option<&str>, env_var: &str) -> Option<String> {
    preferred
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// 构建 OpenRouter 客户端
pub fn build_remote(
    config: &RemoteProviderConfig,
    preferred_credential: Option<&str>,
) -> Result<ChatModel> {
    let provider = ProviderKind::OpenRouter;
    let credential = resolve_credential(preferred_credential, &config.credential_env).ok_or_else(
        || ProviderError::MissingCredential {
            provider: provider.to_string(),
            env_var: config.credential_env.clone(),
        },
    )?;

    let endpoint = join_endpoint(provider, &config.base_url, "chat/completions")?;
    let headers = assemble_req_header(Some(&credential)).map_err(|e| unavailable(provider, e))?;
    let client = http_client(provider)?;

    Ok(ChatModel::new(
        client,
        provider,
        config.model.clone(),
        endpoint,
        headers,
        Some(config.temperature),
        Some(config.max_tokens),
    ))
}

/// 构建本地 Ollama 客户端（无需凭证）
pub fn build_local(config: &LocalProviderConfig) -> Result<ChatModel> {
    let provider = ProviderKind::Ollama;
    let endpoint = join_endpoint(provider, &config.base_url, "v1/chat/completions")?;
    let headers = assemble_req_header(None).map_err(|e| unavailable(provider, e))?;
    let client = http_client(provider)?;

    Ok(ChatModel::new(
        client,
        provider,
        config.model.clone(),
        endpoint,
        headers,
        Some(config.temperature),
        None,
    ))
}

fn join_endpoint(provider: ProviderKind, base_url: &str, path: &str) -> Result<String> {
    let endpoint = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let url = Url::parse(&endpoint).map_err(|e| unavailable(provider, format!("invalid base url '{base_url}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(endpoint),
        other => Err(unavailable(
            provider,
            format!("unsupported scheme '{other}' in '{base_url}'"),
        )),
    }
}

fn http_client(provider: ProviderKind) -> Result<Arc<Client>> {
    Client::builder()
        .build()
        .map(Arc::new)
        .map_err(|e| unavailable(provider, e))
}

fn unavailable(provider: ProviderKind, reason: impl fmt::Display) -> ReactError {
    ProviderError::Unavailable {
        provider: provider.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// `model` 来自 OpenRouter 时，把它使用的凭证写入 `config.mirror_env` 中的每个变量。
/// 回退到本地模型时不做任何事。返回写入的变量个数。
///
/// # Safety
///
/// 内部调用 [`std::env::set_var`]。调用时进程中不能有其他线程在读写环境变量，
/// 应在启动 tokio runtime 之前调用。
pub unsafe fn stage_primary_credential(
    config: &RemoteProviderConfig,
    model: &ChatModel,
    preferred_credential: Option<&str>,
) -> usize {
    if model.provider() != ProviderKind::OpenRouter {
        return 0;
    }
    let Some(credential) = resolve_credential(preferred_credential, &config.credential_env) else {
        return 0;
    };
    for var in &config.mirror_env {
        // SAFETY: 由调用方保证此时没有其他线程访问环境变量
        unsafe { std::env::set_var(var, &credential) };
    }
    config.mirror_env.len()
}
