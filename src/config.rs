//! 存储与后端配置

use std::path::PathBuf;

/// 本地存储配置
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// 数据库文件路径
    pub path: PathBuf,
}

impl DbConfig {
    /// 创建本地存储配置
    pub fn local<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// 从环境变量或默认路径创建配置
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("ASET_CHAT_DB_PATH") {
            return Self::local(path);
        }

        // 默认路径: ~/.aset/db/chat-history.db
        let default_path = dirs::home_dir()
            .map(|h| h.join(".aset").join("db").join("chat-history.db"))
            .unwrap_or_else(|| PathBuf::from("chat-history.db"));

        Self::local(default_path)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// SpaceDigest 后端配置
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// 后端基础地址（不含路径）
    pub base_url: String,
}

impl ApiConfig {
    /// 指定后端地址
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// 从环境变量或默认地址创建配置
    pub fn from_env() -> Self {
        let base_url = std::env::var("ASET_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        Self { base_url }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
