//! 会话刷新协作方
//!
//! 任务失败时由编排器调用一次：`POST {api_base}/telegram/game-data`，请求体为
//! `{game, telegram, api-key, proxy}`。响应体原样返回，不要求可解析；非 2xx 视为失败。

use async_trait::async_trait;
use serde::Serialize;

use crate::account::TelegramData;
use crate::core::error::RefreshError;
use crate::http::{HttpClient, ProxyConfig};

pub const DEFAULT_API_BASE: &str = "http://34.95.182.203:1337/api";

/// 刷新请求体
#[derive(Debug, Clone, Serialize)]
pub struct GameDataRequest<'a> {
    pub game: &'a str,
    pub telegram: &'a TelegramData,
    #[serde(rename = "api-key")]
    pub api_key: &'a str,
    pub proxy: &'a ProxyConfig,
}

/// 刷新会话的能力；测试中可替换为桩实现
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    async fn refresh(
        &self,
        http: &HttpClient,
        request: &GameDataRequest<'_>,
    ) -> Result<Vec<u8>, RefreshError>;
}

/// 调用 Nexus API 刷新 game-data
#[derive(Debug, Clone)]
pub struct NexusRefresher {
    api_base: String,
}

impl NexusRefresher {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/telegram/game-data", self.api_base.trim_end_matches('/'))
    }
}

impl Default for NexusRefresher {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[async_trait]
impl SessionRefresher for NexusRefresher {
    async fn refresh(
        &self,
        http: &HttpClient,
        request: &GameDataRequest<'_>,
    ) -> Result<Vec<u8>, RefreshError> {
        let body = serde_json::to_vec(request)?;
        let response = http.post(&self.endpoint(), body).await?;
        tracing::debug!(
            account = %request.telegram.telegram_id,
            bytes = response.len(),
            "Session refreshed"
        );
        Ok(response)
    }
}
