use std::fmt;

/// hotel_agent 的统一错误类型
#[derive(Debug)]
pub enum ReactError {
    /// LLM 调用错误
    Llm(LlmError),
    /// 模型 Provider 选择错误
    Provider(ProviderError),
    /// 工具执行错误
    Tool(ToolError),
    /// Agent 执行错误
    Agent(AgentError),
    /// 配置错误
    Config(ConfigError),
    /// IO 错误
    Io(std::io::Error),
    /// 其他错误
    Other(String),
}

/// LLM 相关错误
#[derive(Debug)]
pub enum LlmError {
    /// 网络请求失败
    NetworkError(String),
    /// API 返回错误状态码
    ApiError { status: u16, message: String },
    /// 响应格式无效
    InvalidResponse(String),
    /// 没有返回内容
    EmptyResponse,
}

/// 模型 Provider 选择错误
#[derive(Debug)]
pub enum ProviderError {
    /// 找不到 Provider 所需的凭证
    MissingCredential { provider: String, env_var: String },
    /// Provider 客户端构建失败
    Unavailable { provider: String, reason: String },
    /// 主 Provider 与本地回退 Provider 都不可用
    AllUnavailable { primary: String, fallback: String },
}

/// 工具执行错误
#[derive(Debug)]
pub enum ToolError {
    /// 工具未找到
    NotFound(String),
    /// 参数缺失
    MissingParameter(String),
    /// 参数类型错误
    InvalidParameter { name: String, message: String },
}

/// Agent 执行错误
#[derive(Debug)]
pub enum AgentError {
    /// 超过最大迭代次数
    MaxIterationsExceeded(usize),
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
}

impl fmt::Display for ReactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactError::Llm(e) => write!(f, "LLM Error: {}", e),
            ReactError::Provider(e) => write!(f, "Provider Error: {}", e),
            ReactError::Tool(e) => write!(f, "Tool Error: {}", e),
            ReactError::Agent(e) => write!(f, "Agent Error: {}", e),
            ReactError::Config(e) => write!(f, "Config Error: {}", e),
            ReactError::Io(e) => write!(f, "IO Error: {}", e),
            ReactError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LlmError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            LlmError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            LlmError::EmptyResponse => write!(f, "Empty response from LLM"),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::MissingCredential { provider, env_var } => write!(
                f,
                "{} API key not found. Pass --api-key or set {}",
                provider, env_var
            ),
            ProviderError::Unavailable { provider, reason } => {
                write!(f, "{} unavailable: {}", provider, reason)
            }
            ProviderError::AllUnavailable { primary, fallback } => write!(
                f,
                "All providers unavailable (primary: {}; fallback: {})",
                primary, fallback
            ),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool '{}' not found", name),
            ToolError::MissingParameter(name) => write!(f, "Missing parameter: {}", name),
            ToolError::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter '{}': {}", name, message)
            }
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::MaxIterationsExceeded(n) => {
                write!(f, "Max iterations exceeded: {}", n)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ReactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReactError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for LlmError {}
impl std::error::Error for ProviderError {}
impl std::error::Error for ToolError {}
impl std::error::Error for AgentError {}
impl std::error::Error for ConfigError {}

// From 转换实现
impl From<std::io::Error> for ReactError {
    fn from(err: std::io::Error) -> Self {
        ReactError::Io(err)
    }
}

impl From<serde_yaml::Error> for ReactError {
    fn from(err: serde_yaml::Error) -> Self {
        ReactError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<LlmError> for ReactError {
    fn from(err: LlmError) -> Self {
        ReactError::Llm(err)
    }
}

impl From<ProviderError> for ReactError {
    fn from(err: ProviderError) -> Self {
        ReactError::Provider(err)
    }
}

impl From<ToolError> for ReactError {
    fn from(err: ToolError) -> Self {
        ReactError::Tool(err)
    }
}

impl From<AgentError> for ReactError {
    fn from(err: AgentError) -> Self {
        ReactError::Agent(err)
    }
}

impl From<ConfigError> for ReactError {
    fn from(err: ConfigError) -> Self {
        ReactError::Config(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, ReactError>;
