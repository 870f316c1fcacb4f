//! 命令行交互界面
//!
//! 逐行读取用户输入；`exit` / `quit`（不区分大小写）结束循环，其余输入作为一轮对话。
//! 单轮失败只在行内显示错误，不会退出循环。

use crate::agent::{Agent, ask};
use crate::error::{ReactError, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use tracing::debug;

/// 行输入源，返回 `None` 表示输入结束（EOF / Ctrl-C）
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// 基于 rustyline 的终端输入，支持方向键和历史记录
pub struct RustylineReader {
    editor: DefaultEditor,
}

impl RustylineReader {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| ReactError::Other(format!("无法初始化终端: {e}")))?;
        Ok(Self { editor })
    }
}

impl LineReader for RustylineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        debug!(error = %e, "无法记录输入历史");
                    }
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(ReactError::Other(format!("读取输入失败: {e}"))),
        }
    }
}

pub fn is_exit_command(line: &str) -> bool {
    let command = line.trim();
    command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit")
}

/// 运行交互循环，直到用户输入退出命令或输入结束
pub async fn run_repl<R: LineReader, W: Write>(
    agent: &mut dyn Agent,
    reader: &mut R,
    out: &mut W,
    thread_id: &str,
) -> Result<()> {
    writeln!(out, "🏨 Hotel Booking Agent (CLI Mode)")?;
    writeln!(out, "Type 'exit' or 'quit' to end.\n")?;

    while let Some(line) = reader.read_line("You: ")? {
        let input = line.trim();
        if is_exit_command(input) {
            writeln!(out, "👋 Goodbye!")?;
            return Ok(());
        }
        if input.is_empty() {
            continue;
        }

        let message = match ask(agent, input, thread_id).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!(error = ?e, "本轮对话失败");
                format!("⚠️ Error: {}", e)
            }
        };
        writeln!(out, "Agent: {}\n", message)?;
        out.flush()?;
    }

    writeln!(out, "👋 Goodbye!")?;
    Ok(())
}
