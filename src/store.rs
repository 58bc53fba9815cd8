//! 会话历史存储
//!
//! 整个会话集合序列化为 JSON，存放在单一 KV 槽位中，每次操作
//! 整体读写（与原 Web 端 localStorage 的语义一致）。读取侧的
//! 损坏数据按"无数据"处理并记录日志；写入失败向调用方返回
//! 错误，由编排层决定是否继续（可用性优先于持久性）。

use crate::config::DbConfig;
use crate::error::{Error, Result};
use crate::schema;
use crate::types::{Chat, ChatId, ChatMessage, ChatSummary};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;

/// 名称截断长度（字符数）
const MAX_NAME_CHARS: usize = 50;

/// 会话历史存储
pub struct ChatStore {
    conn: Arc<Mutex<Connection>>,
    #[allow(dead_code)]
    config: DbConfig,
}

/// 会话更新输入 (update 用)
///
/// 未给出的字段保持原值；给出 messages 时 messageCount 随之刷新
#[derive(Debug, Clone, Default)]
pub struct ChatUpdate {
    pub name: Option<String>,
    pub messages: Option<Vec<ChatMessage>>,
}

impl ChatStore {
    /// 连接本地存储
    pub fn connect(config: DbConfig) -> Result<Self> {
        // 确保目录存在
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.path)?;
        conn.execute_batch(schema::SCHEMA_SQL)?;

        tracing::info!("会话存储已连接: {:?}", config.path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// 获取底层连接 (用于测试)
    #[doc(hidden)]
    pub fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    // ==================== 集合读写 ====================

    /// 读取整个会话集合
    ///
    /// 存储不可读或数据损坏时记录日志并返回空集合，不向上传播
    fn load_chats(&self) -> Vec<Chat> {
        let conn = self.conn.lock();
        let raw: Option<String> = match conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![schema::CHAT_HISTORY_KEY],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("读取会话集合失败: {}", e);
                return Vec::new();
            }
        };

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(chats) => chats,
                Err(e) => {
                    // 损坏的集合按"无数据"处理，保证客户端仍可用
                    tracing::error!("会话集合反序列化失败，按空集合处理: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// 整体写回会话集合
    fn save_chats(&self, chats: &[Chat]) -> Result<()> {
        let json = serde_json::to_string(chats)?;
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![schema::CHAT_HISTORY_KEY, json, current_time_ms()],
        )?;
        Ok(())
    }

    // ==================== 会话操作 ====================

    /// 列出所有会话摘要（按 lastUpdated 倒序）
    ///
    /// 永不失败：没有数据或数据损坏时返回空列表
    pub fn list(&self) -> Vec<ChatSummary> {
        let mut chats = self.load_chats();
        chats.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| b.id.cmp(&a.id))
        });
        chats.iter().map(Chat::summary).collect()
    }

    /// 按名称搜索会话（大小写不敏感的子串匹配，空查询等同 list）
    pub fn search(&self, query: &str) -> Vec<ChatSummary> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list();
        }
        self.list()
            .into_iter()
            .filter(|chat| chat.name.to_lowercase().contains(&query))
            .collect()
    }

    /// 获取单个会话
    pub fn get(&self, id: ChatId) -> Option<Chat> {
        self.load_chats().into_iter().find(|chat| chat.id == id)
    }

    /// 创建会话，返回新 ID
    ///
    /// ID 取当前毫秒时间戳，与已有 ID 冲突时顺延，保证兼作创建顺序；
    /// 名称按首条消息的 50 字符截断规则推导
    pub fn create(&self, initial_message: &str, messages: Vec<ChatMessage>) -> Result<ChatId> {
        let mut chats = self.load_chats();

        let now = current_time_ms();
        let id = chats
            .iter()
            .map(|chat| chat.id)
            .max()
            .map_or(now, |max_id| now.max(max_id + 1));

        let chat = Chat {
            id,
            name: derive_chat_name(initial_message),
            message_count: messages.len() as i64,
            messages,
            created_at: now,
            last_updated: now,
        };

        chats.push(chat);
        self.save_chats(&chats)?;

        tracing::debug!("创建会话: id={}", id);
        Ok(id)
    }

    /// 更新会话
    ///
    /// 无论更新哪些字段，lastUpdated 都严格递增；createdAt 不变。
    /// ID 不存在时返回 ChatNotFound，且无任何副作用
    pub fn update(&self, id: ChatId, updates: ChatUpdate) -> Result<Chat> {
        let mut chats = self.load_chats();
        let chat = chats
            .iter_mut()
            .find(|chat| chat.id == id)
            .ok_or(Error::ChatNotFound(id))?;

        if let Some(name) = updates.name {
            chat.name = name;
        }
        if let Some(messages) = updates.messages {
            chat.message_count = messages.len() as i64;
            chat.messages = messages;
        }
        chat.last_updated = current_time_ms().max(chat.last_updated + 1);

        let updated = chat.clone();
        self.save_chats(&chats)?;
        Ok(updated)
    }

    /// 重命名会话
    pub fn rename(&self, id: ChatId, new_name: &str) -> Result<Chat> {
        self.update(
            id,
            ChatUpdate {
                name: Some(new_name.to_string()),
                ..Default::default()
            },
        )
    }

    /// 删除会话，返回是否确实删除了记录
    ///
    /// ID 不存在时返回 false，集合原样写回
    pub fn delete(&self, id: ChatId) -> Result<bool> {
        let mut chats = self.load_chats();
        let before = chats.len();
        chats.retain(|chat| chat.id != id);
        let deleted = chats.len() < before;

        self.save_chats(&chats)?;

        if deleted {
            tracing::debug!("删除会话: id={}", id);
        }
        Ok(deleted)
    }
}

/// 根据首条消息推导会话名称
///
/// 取前 50 个字符，超出部分以 "..." 结尾
pub fn derive_chat_name(initial_message: &str) -> String {
    let mut name: String = initial_message.chars().take(MAX_NAME_CHARS).collect();
    if initial_message.chars().count() > MAX_NAME_CHARS {
        name.push_str("...");
    }
    name
}

/// 获取当前时间戳 (毫秒)
fn current_time_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
