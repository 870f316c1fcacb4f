//! 会话记忆
//!
//! 对话历史按 `thread_id` 存放在 [`Checkpointer`] 中，生命周期与进程相同。
//!
//! ```rust
//! use hotel_agent::memory::{Checkpointer, InMemoryCheckpointer};
//! use hotel_agent::llm::types::Message;
//!
//! # #[tokio::main]
//! # async fn main() -> hotel_agent::error::Result<()> {
//! let cp = InMemoryCheckpointer::new();
//! cp.put("1", vec![Message::user("Find hotels in Paris".to_string())]).await?;
//! assert_eq!(cp.get("1").await?.unwrap().messages.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;

pub use checkpointer::{Checkpoint, Checkpointer, InMemoryCheckpointer};
