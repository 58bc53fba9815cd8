//! 会话编排
//!
//! 驱动两阶段工作流：发送消息立即检索论文，验证只在用户显式
//! 触发时进行。同时维护欢迎/会话/历史三个视图状态之间的切换，
//! 并在每次消息列表变更后显式落盘（落盘失败不回滚内存状态）。

use crate::error::{Error, Result};
use crate::gateway::ClaimGateway;
use crate::protocol::SearchFilters;
use crate::store::{derive_chat_name, ChatStore, ChatUpdate};
use crate::types::{Chat, ChatId, ChatMessage, ChatSummary, Role, Verification};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 默认检索数量
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// 单次验证分析的论文上限
pub const DEFAULT_MAX_PAPERS: u32 = 5;

/// 新会话的默认名称
pub const NEW_CHAT_NAME: &str = "New Chat";

/// 检索成功但无结果时的助手回复
const NO_PAPERS_REPLY: &str = "No papers found for this claim. Try rephrasing your query.";

/// 检索失败时的助手回复
const SEARCH_ERROR_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// 视图状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    /// 欢迎页（尚无消息）
    Welcome,
    /// 会话页
    Conversation,
    /// 历史页
    History,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::Welcome => write!(f, "welcome"),
            ViewState::Conversation => write!(f, "conversation"),
            ViewState::History => write!(f, "history"),
        }
    }
}

/// 会话编排器
///
/// 持有视图状态、内存中的消息列表和激活会话 ID；展示层只读取
/// 状态并分发动作，自身不持有任何可变状态
pub struct ChatSession<G> {
    store: Arc<ChatStore>,
    gateway: G,
    view: ViewState,
    messages: Vec<ChatMessage>,
    chat_id: Option<ChatId>,
    chat_name: String,
    /// 验证中的消息（按需验证的子状态，独立于主视图状态机）
    verifying: Option<Uuid>,
}

impl<G: ClaimGateway> ChatSession<G> {
    /// 创建编排器，初始为欢迎页
    pub fn new(store: Arc<ChatStore>, gateway: G) -> Self {
        Self {
            store,
            gateway,
            view: ViewState::Welcome,
            messages: Vec::new(),
            chat_id: None,
            chat_name: NEW_CHAT_NAME.to_string(),
            verifying: None,
        }
    }

    // ==================== 状态读取 ====================

    /// 当前视图状态
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// 当前消息列表
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// 激活会话 ID（尚未落盘时为 None）
    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    /// 当前会话名称
    pub fn chat_name(&self) -> &str {
        &self.chat_name
    }

    /// 正在验证中的消息 ID
    pub fn verifying(&self) -> Option<Uuid> {
        self.verifying
    }

    // ==================== 发送消息（第一阶段：检索） ====================

    /// 发送一条用户消息并检索支持论文
    ///
    /// 用户消息立即进入消息列表；检索结果（或失败说明）作为助手
    /// 消息追加，追加顺序严格在对应用户消息之后。空白消息直接
    /// 拒绝，不发起网络请求
    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }

        self.messages.push(ChatMessage::user(text));

        if self.view == ViewState::Welcome {
            self.view = ViewState::Conversation;
            self.chat_name = derive_chat_name(text);
        }

        let reply = match self
            .gateway
            .search_papers(text, &SearchFilters::default(), DEFAULT_SEARCH_LIMIT, 0)
            .await
        {
            Ok(result) if result.sources.is_empty() => ChatMessage::assistant(NO_PAPERS_REPLY),
            Ok(result) => {
                let content = format!("Found {} relevant papers", result.meta.total_sources);
                ChatMessage::assistant(content).with_sources(result.sources, result.meta)
            }
            Err(e) => {
                tracing::error!("论文检索失败: {}", e);
                ChatMessage::assistant(SEARCH_ERROR_REPLY)
            }
        };
        self.messages.push(reply);

        self.persist();
        Ok(())
    }

    // ==================== 按需验证（第二阶段） ====================

    /// 对指定助手消息附带的论文执行声明验证
    ///
    /// 声明取该消息之前最近一条用户消息的内容。验证结果只写入该
    /// 消息的内存元数据，不触发会话落盘：刷新后论文仍在、验证
    /// 结果丢失，属预期行为。目标消息不存在或没有论文时不做任何
    /// 事，返回 NoPapers
    pub async fn verify_message(&mut self, message_id: Uuid) -> Result<Verification> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == message_id && m.has_papers())
            .ok_or(Error::NoPapers)?;

        let papers = self.messages[index]
            .metadata
            .as_ref()
            .map(|m| m.papers.clone())
            .unwrap_or_default();

        // 声明 = 目标消息之前最近的一条用户消息
        let claim = self.messages[..index]
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .ok_or(Error::NoPapers)?;

        self.verifying = Some(message_id);
        let outcome = self
            .gateway
            .verify_claim(&claim, &papers, DEFAULT_MAX_PAPERS)
            .await;
        self.verifying = None;

        let verification = outcome.map_err(|e| {
            tracing::error!("声明验证失败: {}", e);
            e
        })?;

        if let Some(metadata) = self.messages[index].metadata.as_mut() {
            metadata.verification = Some(verification.clone());
        }
        Ok(verification)
    }

    // ==================== 视图切换 ====================

    /// 打开历史视图（任意状态下都允许）
    pub fn open_history(&mut self) {
        self.view = ViewState::History;
    }

    /// 关闭历史视图：有消息回到会话页，否则回到欢迎页
    pub fn close_history(&mut self) {
        self.view = if self.messages.is_empty() {
            ViewState::Welcome
        } else {
            ViewState::Conversation
        };
    }

    /// 开始新会话：清空消息与激活 ID，回到欢迎页
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.chat_id = None;
        self.chat_name = NEW_CHAT_NAME.to_string();
        self.verifying = None;
        self.view = ViewState::Welcome;
    }

    // ==================== 历史操作 ====================

    /// 列出历史会话
    pub fn history(&self) -> Vec<ChatSummary> {
        self.store.list()
    }

    /// 按名称过滤历史会话
    pub fn search_history(&self, query: &str) -> Vec<ChatSummary> {
        self.store.search(query)
    }

    /// 载入一条历史会话并进入会话视图
    pub fn load_chat(&mut self, id: ChatId) -> Result<()> {
        let chat = self.store.get(id).ok_or(Error::ChatNotFound(id))?;
        self.messages = chat.messages;
        self.chat_name = chat.name;
        self.chat_id = Some(chat.id);
        self.verifying = None;
        self.view = ViewState::Conversation;
        Ok(())
    }

    /// 重命名历史会话（若为激活会话则同步内存中的名称）
    pub fn rename_chat(&mut self, id: ChatId, new_name: &str) -> Result<Chat> {
        let chat = self.store.rename(id, new_name)?;
        if self.chat_id == Some(id) {
            self.chat_name = chat.name.clone();
        }
        Ok(chat)
    }

    /// 删除历史会话
    ///
    /// 激活会话被删除时内存状态保持不变，后续落盘按"未持久化"
    /// 处理（与原实现一致）
    pub fn delete_chat(&self, id: ChatId) -> Result<bool> {
        self.store.delete(id)
    }

    // ==================== 落盘 ====================

    /// 将当前消息列表落盘（无 ID 则创建，有则更新）
    ///
    /// 只在有消息时创建（惰性创建，不随每次按键落盘）；失败记录
    /// 日志后继续，内存中的会话仍然可用
    fn persist(&mut self) {
        if self.messages.is_empty() {
            return;
        }

        match self.chat_id {
            Some(id) => {
                let updates = ChatUpdate {
                    name: Some(self.chat_name.clone()),
                    messages: Some(self.messages.clone()),
                };
                if let Err(e) = self.store.update(id, updates) {
                    tracing::warn!("会话更新未落盘: {}", e);
                }
            }
            None => {
                let first_user_message = self
                    .messages
                    .iter()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or(NEW_CHAT_NAME);
                match self.store.create(first_user_message, self.messages.clone()) {
                    Ok(id) => self.chat_id = Some(id),
                    Err(e) => tracing::warn!("会话创建未落盘: {}", e),
                }
            }
        }
    }
}
