//! SpaceDigest 后端 HTTP 协议定义
//!
//! 两个 POST 端点（检索 / 验证）加一个 GET 端点（过滤词表），
//! 请求与响应均为 camelCase JSON

use crate::types::{Paper, PaperSource, SearchMeta};
use serde::{Deserialize, Serialize};

/// 论文检索请求（POST /api/get-sources）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesRequest {
    pub claim: String,
    pub filters: SearchFilters,
    pub limit: u32,
    pub offset: u32,
}

/// 检索过滤条件
///
/// 未设置的字段不随请求发送，由后端取默认语义
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PaperSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_relevance: Option<f64>,
}

/// 论文检索响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesResponse {
    #[serde(default)]
    pub sources: Vec<Paper>,
    /// 分类与性能元数据（domain/topic/subtopic/totalSources/queryTime）
    #[serde(flatten)]
    pub meta: SearchMeta,
}

/// 声明验证请求（POST /api/verify-claim）
///
/// 实际分析的论文子集由后端挑选，客户端只负责回传手头的论文列表
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub claim: String,
    pub papers: Vec<Paper>,
    pub max_papers: u32,
}

/// 可用过滤词表（GET /api/filters）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_max: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_serialize_to_empty_object() {
        // 默认过滤条件与原前端的 `filters: {}` 等价
        let json = serde_json::to_string(&SearchFilters::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_sources_request_wire_shape() {
        let request = SourcesRequest {
            claim: "Can black holes evaporate?".into(),
            filters: SearchFilters {
                year_min: Some(2015),
                ..Default::default()
            },
            limit: 50,
            offset: 0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["claim"], "Can black holes evaporate?");
        assert_eq!(value["filters"]["yearMin"], 2015);
        assert!(value["filters"].get("yearMax").is_none());
        assert_eq!(value["limit"], 50);
    }

    #[test]
    fn test_sources_response_flattened_meta() {
        // 后端把元数据与 sources 平铺在同一层
        let json = r#"{
            "sources": [],
            "domain": "astrophysics",
            "topic": "exoplanets",
            "subtopic": "habitability",
            "totalSources": 0,
            "queryTime": 87
        }"#;
        let parsed: SourcesResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.sources.is_empty());
        assert_eq!(parsed.meta.domain, "astrophysics");
        assert_eq!(parsed.meta.query_time, 87);
    }

    #[test]
    fn test_verify_request_wire_shape() {
        let request = VerifyRequest {
            claim: "claim".into(),
            papers: vec![],
            max_papers: 5,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["maxPapers"], 5);
    }
}
