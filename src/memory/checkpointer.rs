//! 会话状态快照（Checkpointer）
//!
//! 按 `thread_id` 保存对话历史，同一个 Agent 的多个会话互不干扰。
//! 只有进程内实现：进程退出即清空。

use crate::error::Result;
use crate::llm::types::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::debug;

// ── Checkpoint ────────────────────────────────────────────────────────────────

/// 单次对话状态快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// 所属会话标识
    pub thread_id: String,
    /// 快照唯一 ID（UUID v4）
    pub checkpoint_id: String,
    /// 该时刻的完整消息历史
    pub messages: Vec<Message>,
    /// 创建时间（Unix 秒）
    pub created_at: u64,
}

// ── Checkpointer trait ────────────────────────────────────────────────────────

#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// 保存会话的消息历史，返回新快照 ID
    async fn put(&self, thread_id: &str, messages: Vec<Message>) -> Result<String>;

    /// 获取指定会话的最新快照（若不存在返回 `None`）
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// 获取指定会话的全部历史快照（时间倒序）
    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>>;

    /// 删除指定会话的所有快照
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// 列出所有已存在的 thread_id
    async fn list_threads(&self) -> Result<Vec<String>>;
}

// ── InMemoryCheckpointer ──────────────────────────────────────────────────────

/// 进程内存 Checkpointer
pub struct InMemoryCheckpointer {
    data: RwLock<HashMap<String, Vec<Checkpoint>>>,
}

impl Default for InMemoryCheckpointer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn put(&self, thread_id: &str, messages: Vec<Message>) -> Result<String> {
        let checkpoint_id = new_checkpoint_id();
        debug!(thread_id, checkpoint_id = %checkpoint_id, messages = messages.len(), "🔖 保存 Checkpoint");
        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            checkpoint_id: checkpoint_id.clone(),
            messages,
            created_at: now_secs(),
        };
        self.data
            .write()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .push(checkpoint);
        Ok(checkpoint_id)
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self
            .data
            .read()
            .await
            .get(thread_id)
            .and_then(|v| v.last())
            .cloned())
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>> {
        let mut checkpoints = self
            .data
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default();
        checkpoints.reverse();
        Ok(checkpoints)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.data.write().await.remove(thread_id);
        debug!(thread_id, "🗑️ 会话 Checkpoint 已删除");
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        Ok(self.data.read().await.keys().cloned().collect())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn new_checkpoint_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
