//! Agent 配置

/// Agent 运行时配置
///
/// 通过构建器链式调用设置各项参数，再传入 [`ReactAgent::new`](super::ReactAgent::new)。
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub(crate) agent_name: String,
    pub(crate) system_prompt: String,
    /// 单轮内最多调用模型的次数，防止死循环
    pub(crate) max_iterations: usize,
    pub(crate) verbose: bool,
}

impl AgentConfig {
    pub fn new(agent_name: &str, system_prompt: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            system_prompt: system_prompt.to_string(),
            max_iterations: 25,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn get_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn get_max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
