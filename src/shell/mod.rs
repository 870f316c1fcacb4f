//! 交互界面：终端 REPL 与 Web 表单，两者都只依赖 [`Agent`](crate::agent::Agent) trait。

pub mod cli;
pub mod web;

pub use cli::{LineReader, RustylineReader, is_exit_command, run_repl};
