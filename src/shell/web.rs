//! Web 表单界面
//!
//! | 路由 | 说明 |
//! |------|------|
//! | `GET /` | 聊天页面（历史记录 + 输入框 + 清空按钮） |
//! | `POST /chat` | 表单提交一轮对话，完成后重定向回 `/` |
//! | `POST /api/chat` | JSON 接口：`{"message": ...}` → `{"reply": ...}` |
//! | `POST /clear` | 清空页面历史与 Agent 会话 |
//!
//! 所有轮次通过同一把锁串行执行，共用一个固定的 thread_id。

use crate::agent::{Agent, ask};
use crate::error::Result;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

const PLACEHOLDER: &str = "Ask about hotels, e.g. 'Find 4-star hotels in Paris'";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEntry {
    pub role: String,
    pub content: String,
}

pub struct WebState {
    agent: Mutex<Box<dyn Agent>>,
    history: Mutex<Vec<ChatEntry>>,
    thread_id: String,
}

#[derive(Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct ChatReply {
    reply: String,
}

impl WebState {
    pub fn new(agent: Box<dyn Agent>, thread_id: &str) -> Self {
        Self {
            agent: Mutex::new(agent),
            history: Mutex::new(Vec::new()),
            thread_id: thread_id.to_string(),
        }
    }
}

pub fn router(agent: Box<dyn Agent>, thread_id: &str) -> Router {
    let state = Arc::new(WebState::new(agent, thread_id));

    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat_form))
        .route("/api/chat", post(chat_api))
        .route("/clear", post(clear))
        .with_state(state)
}

/// 在 `addr` 上启动 Web 界面，直到进程退出
pub async fn serve(agent: Box<dyn Agent>, thread_id: &str, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("🌐 Web UI listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(agent, thread_id)).await?;
    Ok(())
}

/// 执行一轮对话并记入页面历史；空白消息返回 `None`
async fn run_turn(state: &WebState, message: &str) -> Option<String> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }

    // 写完历史才释放 agent 锁，与 clear 的加锁顺序一致
    let mut agent = state.agent.lock().await;
    let reply = match ask(&mut **agent, message, &state.thread_id).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "本轮对话失败");
            format!("Sorry, I encountered an error: {}", e)
        }
    };

    let mut history = state.history.lock().await;
    history.push(ChatEntry {
        role: "user".to_string(),
        content: message.to_string(),
    });
    history.push(ChatEntry {
        role: "assistant".to_string(),
        content: reply.clone(),
    });
    Some(reply)
}

async fn index(State(state): State<Arc<WebState>>) -> Html<String> {
    let history = state.history.lock().await;
    Html(render_page(&history))
}

async fn chat_form(State(state): State<Arc<WebState>>, Form(form): Form<ChatForm>) -> Redirect {
    run_turn(&state, &form.message).await;
    Redirect::to("/")
}

async fn chat_api(State(state): State<Arc<WebState>>, Json(req): Json<ChatForm>) -> Response {
    match run_turn(&state, &req.message).await {
        Some(reply) => Json(ChatReply { reply }).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message must not be empty" })),
        )
            .into_response(),
    }
}

async fn clear(State(state): State<Arc<WebState>>) -> Redirect {
    // 持有 agent 锁直到历史清空，进行中的轮次不会在清空之后再写入
    let mut agent = state.agent.lock().await;
    if let Err(e) = agent.reset_thread(&state.thread_id).await {
        warn!(error = %e, "清空会话失败");
    }
    state.history.lock().await.clear();
    Redirect::to("/")
}

fn render_page(history: &[ChatEntry]) -> String {
    let messages: String = history
        .iter()
        .map(|entry| {
            let (class, label) = match entry.role.as_str() {
                "user" => ("user", "You"),
                _ => ("assistant", "Agent"),
            };
            format!(
                "<div class=\"msg {class}\"><b>{label}</b><p>{}</p></div>\n",
                html_escape(&entry.content)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Hotel Finder Agent</title>
<style>
body {{ font-family: sans-serif; display: flex; gap: 2rem; margin: 2rem; }}
main {{ flex: 3; }}
aside {{ flex: 1; border-left: 1px solid #ddd; padding-left: 1rem; }}
.msg p {{ white-space: pre-wrap; margin: 0.25rem 0 1rem; }}
.user b {{ color: #2563eb; }}
.assistant b {{ color: #16a34a; }}
form.ask {{ display: flex; gap: 0.5rem; }}
form.ask input {{ flex: 1; padding: 0.5rem; }}
</style>
</head>
<body>
<main>
<h1>🏨 Hotel Finder Agent</h1>
<div id="chat">
{messages}</div>
<form class="ask" method="post" action="/chat">
<input name="message" placeholder="{placeholder}" autofocus>
<button type="submit">Send</button>
</form>
</main>
<aside>
<h2>Chat Controls</h2>
<form method="post" action="/clear"><button type="submit">Clear Chat History</button></form>
<hr>
<h3>About</h3>
<p>This chatbot can help you:</p>
<ul>
<li>Find hotels by location and star rating</li>
<li>Compare hotel prices and amenities</li>
<li>Get recent reviews and availability</li>
<li>Book hotels based on your preferences</li>
</ul>
<hr>
<p>💡 <b>Tips:</b></p>
<ul>
<li>Be specific about location and dates</li>
<li>Mention your budget and preferences</li>
<li>Ask about amenities or special requirements</li>
</ul>
</aside>
</body>
</html>
"#,
        placeholder = html_escape(PLACEHOLDER),
    )
}

fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
