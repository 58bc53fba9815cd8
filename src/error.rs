//! 错误类型定义

use crate::types::ChatId;
use thiserror::Error;

/// 库错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 网络错误（传输层失败）
    #[cfg(feature = "gateway")]
    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),

    /// 后端返回非成功状态
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// 会话不存在
    #[error("会话不存在: {0}")]
    ChatNotFound(ChatId),

    /// 消息内容为空（校验失败，不发起网络请求）
    #[error("消息内容为空")]
    EmptyMessage,

    /// 目标消息没有可供验证的论文
    #[error("目标消息没有可供验证的论文")]
    NoPapers,

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
