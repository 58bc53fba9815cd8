//! 存储 Schema 定义

/// 核心 Schema SQL
///
/// 单槽 KV 存储：整个会话集合序列化后存于固定 key 下，
/// 每次操作整体读写，不做分键访问
pub const SCHEMA_SQL: &str = r#"
-- KV 存储表
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);
"#;

/// 会话集合的固定存储 key
pub const CHAT_HISTORY_KEY: &str = "aset_chat_history";
