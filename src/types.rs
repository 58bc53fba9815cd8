//! 数据类型定义
//!
//! 会话/消息为本地存储模型；Paper/SearchMeta/Verification 与
//! SpaceDigest 后端的 JSON 形状一致（camelCase）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 会话 ID
///
/// 创建时取毫秒时间戳（与已有 ID 冲突时顺延），因此兼作创建顺序
pub type ChatId = i64;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// 一条会话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// 仅检索成功的助手消息携带（论文 + 检索元数据）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// 构造用户消息
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// 构造助手消息
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// 附加检索结果（papers + searchMetadata）
    pub fn with_sources(mut self, papers: Vec<Paper>, search_metadata: SearchMeta) -> Self {
        self.metadata = Some(MessageMetadata {
            papers,
            search_metadata,
            verification: None,
        });
        self
    }

    /// 消息是否携带可供验证的论文
    pub fn has_papers(&self) -> bool {
        self.metadata
            .as_ref()
            .map(|m| !m.papers.is_empty())
            .unwrap_or(false)
    }
}

/// 助手消息的检索元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub papers: Vec<Paper>,
    pub search_metadata: SearchMeta,
    /// 验证结果（按需触发后填充，仅保留在内存中）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

/// 论文来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperSource {
    #[default]
    Arxiv,
    NasaAds,
}

impl PaperSource {
    /// 展示用名称
    pub fn label(&self) -> &'static str {
        match self {
            PaperSource::Arxiv => "arXiv",
            PaperSource::NasaAds => "NASA ADS",
        }
    }
}

impl FromStr for PaperSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arxiv" => Ok(PaperSource::Arxiv),
            "nasa-ads" => Ok(PaperSource::NasaAds),
            _ => Err(format!("Invalid paper source: {}", s)),
        }
    }
}

impl fmt::Display for PaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSource::Arxiv => write!(f, "arxiv"),
            PaperSource::NasaAds => write!(f, "nasa-ads"),
        }
    }
}

/// 检索到的论文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default)]
    pub source: PaperSource,
    /// 相关性评分 (0-10)，仅用于展示分档，不保证排序
    pub relevance: f64,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<String>,
}

impl Paper {
    /// 相关性分档标签
    pub fn relevance_label(&self) -> &'static str {
        if self.relevance >= 8.0 {
            "Highly Relevant"
        } else if self.relevance >= 6.0 {
            "Very Relevant"
        } else if self.relevance >= 4.0 {
            "Relevant"
        } else {
            "Somewhat Relevant"
        }
    }
}

/// 检索分类与性能元数据
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub subtopic: String,
    #[serde(default)]
    pub total_sources: i64,
    /// 检索耗时（毫秒）
    #[serde(default)]
    pub query_time: i64,
}

/// 单篇论文的立场
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Supports,
    Contradicts,
    Neutral,
}

impl FromStr for Stance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supports" => Ok(Stance::Supports),
            "contradicts" => Ok(Stance::Contradicts),
            "neutral" => Ok(Stance::Neutral),
            _ => Err(format!("Invalid stance: {}", s)),
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::Supports => write!(f, "supports"),
            Stance::Contradicts => write!(f, "contradicts"),
            Stance::Neutral => write!(f, "neutral"),
        }
    }
}

/// 单篇论文的验证分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperAnalysis {
    pub paper_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_year: Option<i32>,
    /// 相关性评分 (0-10)
    pub relevance_score: f64,
    pub stance: Stance,
    /// 该立场的置信度 (0-100)
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// AI 验证结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// 验证评分 (0-100)
    pub verification_score: f64,
    pub verdict: String,
    pub confidence: String,
    pub summary: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<String>,
    /// 逐篇分析，数量不超过请求的 maxPapers
    #[serde(default)]
    pub analyses: Vec<PaperAnalysis>,
    #[serde(default)]
    pub papers_analyzed: i64,
    #[serde(default)]
    pub processing_time_ms: i64,
}

/// 一条持久化会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    /// messages.len() 的冗余缓存，每次更新时同步
    pub message_count: i64,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// 创建时间（毫秒时间戳，不可变）
    pub created_at: i64,
    /// 最后变更时间（毫秒时间戳，每次变更递增）
    pub last_updated: i64,
}

impl Chat {
    /// 提取摘要（history 列表用）
    pub fn summary(&self) -> ChatSummary {
        ChatSummary {
            id: self.id,
            name: self.name.clone(),
            message_count: self.message_count,
            created_at: self.created_at,
            last_updated: self.last_updated,
        }
    }
}

/// 会话摘要（不含消息体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: ChatId,
    pub name: String,
    pub message_count: i64,
    pub created_at: i64,
    pub last_updated: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("Assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert!("bot".parse::<Role>().is_err());
    }

    #[test]
    fn test_paper_source_labels() {
        assert_eq!(PaperSource::Arxiv.label(), "arXiv");
        assert_eq!(PaperSource::NasaAds.label(), "NASA ADS");
        assert_eq!("nasa-ads".parse::<PaperSource>().unwrap(), PaperSource::NasaAds);
    }

    #[test]
    fn test_paper_source_serde_kebab_case() {
        let json = serde_json::to_string(&PaperSource::NasaAds).unwrap();
        assert_eq!(json, "\"nasa-ads\"");
        let parsed: PaperSource = serde_json::from_str("\"arxiv\"").unwrap();
        assert_eq!(parsed, PaperSource::Arxiv);
    }

    #[test]
    fn test_relevance_labels() {
        let mut paper = Paper {
            title: "t".into(),
            authors: String::new(),
            year: None,
            journal: None,
            source: PaperSource::Arxiv,
            relevance: 9.1,
            abstract_text: None,
            url: None,
            paper_id: None,
        };
        assert_eq!(paper.relevance_label(), "Highly Relevant");
        paper.relevance = 6.0;
        assert_eq!(paper.relevance_label(), "Very Relevant");
        paper.relevance = 4.5;
        assert_eq!(paper.relevance_label(), "Relevant");
        paper.relevance = 1.0;
        assert_eq!(paper.relevance_label(), "Somewhat Relevant");
    }

    #[test]
    fn test_message_metadata_wire_shape() {
        // 与后端约定的 camelCase 字段名
        let msg = ChatMessage::assistant("Found 1 relevant papers").with_sources(
            vec![Paper {
                title: "Hawking radiation revisited".into(),
                authors: "S. Hawking".into(),
                year: Some(1975),
                journal: None,
                source: PaperSource::Arxiv,
                relevance: 8.5,
                abstract_text: Some("Black holes are not so black.".into()),
                url: None,
                paper_id: Some("1975.0001".into()),
            }],
            SearchMeta {
                domain: "astrophysics".into(),
                topic: "black holes".into(),
                subtopic: "hawking radiation".into(),
                total_sources: 1,
                query_time: 120,
            },
        );

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["createdAt"].as_str().is_some(), true);
        let meta = &value["metadata"];
        assert!(meta["searchMetadata"]["totalSources"].is_i64());
        assert_eq!(meta["papers"][0]["abstract"], "Black holes are not so black.");
        assert_eq!(meta["papers"][0]["paperId"], "1975.0001");
        // 未验证时不序列化 verification 字段
        assert!(meta.get("verification").is_none());
    }

    #[test]
    fn test_chat_summary_drops_messages() {
        let chat = Chat {
            id: 1700000000000,
            name: "Can neutron stars exceed 5 solar masses?".into(),
            message_count: 2,
            messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            created_at: 1700000000000,
            last_updated: 1700000000500,
        };
        let summary = chat.summary();
        assert_eq!(summary.id, chat.id);
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.last_updated, 1700000000500);
    }
}
