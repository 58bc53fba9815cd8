//! SpaceDigest 后端网关
//!
//! 封装论文检索与声明验证两个 HTTP 端点，把传输失败与非 2xx
//! 响应统一转换为 [`Error`]，不让异常越过该边界。单次调用只
//! 尝试一次，不做重试，也不额外设置客户端超时。

use crate::error::Result;
use crate::protocol::{FilterOptions, SearchFilters, SourcesResponse};
use crate::types::{Paper, Verification};
use async_trait::async_trait;

/// 后端网关接口
///
/// 生产实现为 [`SpaceDigestClient`]；测试中以内存 mock 替代
#[async_trait]
pub trait ClaimGateway: Send + Sync {
    /// 按声明检索论文
    async fn search_papers(
        &self,
        claim: &str,
        filters: &SearchFilters,
        limit: u32,
        offset: u32,
    ) -> Result<SourcesResponse>;

    /// 用给定论文验证声明
    ///
    /// 实际分析的子集由后端挑选，上限 max_papers
    async fn verify_claim(
        &self,
        claim: &str,
        papers: &[Paper],
        max_papers: u32,
    ) -> Result<Verification>;

    /// 获取可用过滤词表
    async fn fetch_filters(&self) -> Result<FilterOptions>;
}

#[cfg(feature = "gateway")]
pub use http_client::SpaceDigestClient;

#[cfg(feature = "gateway")]
mod http_client {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::Error;
    use crate::protocol::{SourcesRequest, VerifyRequest};

    /// SpaceDigest HTTP 客户端
    pub struct SpaceDigestClient {
        client: reqwest::Client,
        config: ApiConfig,
    }

    impl SpaceDigestClient {
        /// 创建客户端
        pub fn new(config: ApiConfig) -> Self {
            Self {
                client: reqwest::Client::new(),
                config,
            }
        }

        fn endpoint(&self, path: &str) -> String {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
        }

        /// 非 2xx 响应转换为 Error::Api
        fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            Err(Error::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            })
        }
    }

    #[async_trait]
    impl ClaimGateway for SpaceDigestClient {
        async fn search_papers(
            &self,
            claim: &str,
            filters: &SearchFilters,
            limit: u32,
            offset: u32,
        ) -> Result<SourcesResponse> {
            let body = SourcesRequest {
                claim: claim.to_string(),
                filters: filters.clone(),
                limit,
                offset,
            };

            tracing::debug!("🔍 检索论文: limit={}, offset={}", limit, offset);

            let response = self
                .client
                .post(self.endpoint("/api/get-sources"))
                .json(&body)
                .send()
                .await?;
            let response = Self::check_status(response)?;
            let parsed: SourcesResponse = response.json().await?;

            tracing::debug!(
                "检索完成: totalSources={}, queryTime={}ms",
                parsed.meta.total_sources,
                parsed.meta.query_time
            );
            Ok(parsed)
        }

        async fn verify_claim(
            &self,
            claim: &str,
            papers: &[Paper],
            max_papers: u32,
        ) -> Result<Verification> {
            let body = VerifyRequest {
                claim: claim.to_string(),
                papers: papers.to_vec(),
                max_papers,
            };

            tracing::debug!("🔬 验证声明: papers={}, maxPapers={}", papers.len(), max_papers);

            let response = self
                .client
                .post(self.endpoint("/api/verify-claim"))
                .json(&body)
                .send()
                .await?;
            let response = Self::check_status(response)?;
            let verification: Verification = response.json().await?;

            tracing::debug!(
                "验证完成: score={}, papersAnalyzed={}",
                verification.verification_score,
                verification.papers_analyzed
            );
            Ok(verification)
        }

        async fn fetch_filters(&self) -> Result<FilterOptions> {
            let response = self
                .client
                .get(self.endpoint("/api/filters"))
                .send()
                .await?;
            let response = Self::check_status(response)?;
            Ok(response.json().await?)
        }
    }
}
