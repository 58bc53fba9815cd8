//! aset-chat-db - ASET 声明验证客户端核心库
//!
//! 为 ASET 前端提供统一的会话存储与 SpaceDigest 后端访问层。
//!
//! # 核心功能
//!
//! - **会话存储**: 会话历史的 CRUD，单 KV 槽位整体读写
//! - **论文检索**: 按声明检索支持文献（POST /api/get-sources）
//! - **声明验证**: 按需触发 AI 验证（POST /api/verify-claim）
//! - **会话编排**: 欢迎/会话/历史三视图状态机 + 两阶段工作流
//!
//! # Feature Flags
//!
//! - `gateway`: SpaceDigest HTTP 网关（默认开启；关闭后仍可使用
//!   存储与编排，网关由调用方自行实现 [`ClaimGateway`]）
//!
//! # 架构
//!
//! 展示层是编排器状态的纯函数：只读取 [`ChatSession`] 暴露的
//! 视图状态并分发动作，自身不持有可变状态。落盘是发送流程末尾
//! 的显式步骤，而不是隐式的响应式副作用。

pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod schema;
pub mod store;
pub mod types;

// Re-exports
pub use chat::{
    ChatSession, ViewState, DEFAULT_MAX_PAPERS, DEFAULT_SEARCH_LIMIT, NEW_CHAT_NAME,
};
pub use config::{ApiConfig, DbConfig};
pub use error::{Error, Result};
pub use gateway::ClaimGateway;
pub use protocol::{FilterOptions, SearchFilters, SourcesRequest, SourcesResponse, VerifyRequest};
pub use store::{derive_chat_name, ChatStore, ChatUpdate};
pub use types::*;

#[cfg(feature = "gateway")]
pub use gateway::SpaceDigestClient;

/// 完整版本号（语义版本 + 编译时间戳）
///
/// 格式：`{CARGO_PKG_VERSION}-{BUILD_TIMESTAMP}`
/// 例如：`0.1.0-1706400000`
pub const VERSION_FULL: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("BUILD_TIMESTAMP"));
