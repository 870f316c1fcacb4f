use clap::{Parser, Subcommand};
use hotel_agent::agent::{ReactAgent, assemble_agent};
use hotel_agent::config::AppConfig;
use hotel_agent::llm::get_model;
use hotel_agent::llm::provider::stage_primary_credential;
use hotel_agent::shell::{RustylineReader, run_repl, web};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hotel_agent", version, about = "🏨 Hotel booking assistant with web search")]
struct Cli {
    /// YAML 配置文件，未提供时使用内置默认值
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OpenRouter API key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// 系统提示词文件
    #[arg(long, global = true)]
    prompt: Option<String>,

    /// 会话 ID
    #[arg(long, global = true)]
    thread_id: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 终端对话（默认）
    Chat,
    /// 启动 Web 页面
    Web {
        #[arg(long, default_value = "127.0.0.1:7860")]
        addr: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "hotel_agent=info"
    } else {
        "hotel_agent=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(prompt) = cli.prompt {
        config.agent.system_prompt_path = prompt;
    }
    if let Some(thread_id) = cli.thread_id {
        config.agent.thread_id = thread_id;
    }
    config.agent.verbose |= cli.verbose;

    let credential = cli.api_key.as_deref();
    let agent = get_model(&config.provider, credential)
        .and_then(|model| {
            // SAFETY: runtime 尚未创建，进程中只有主线程
            unsafe { stage_primary_credential(&config.provider.primary, &model, credential) };
            assemble_agent(&config, model)
        })
        .inspect_err(|e| error!("❌ 无法构建 Agent: {}", e))?;
    info!(thread_id = %config.agent.thread_id, "✅ Agent 已就绪");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli.command.unwrap_or(Command::Chat), agent, &config.agent.thread_id))
}

async fn run(
    command: Command,
    mut agent: ReactAgent,
    thread_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Chat => {
            let mut reader = RustylineReader::new()?;
            let mut stdout = std::io::stdout();
            run_repl(&mut agent, &mut reader, &mut stdout, thread_id).await?;
        }
        Command::Web { addr } => {
            web::serve(Box::new(agent), thread_id, &addr).await?;
        }
    }
    Ok(())
}
