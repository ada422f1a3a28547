//! Handler 能力：任务执行时所需的最小接口
//!
//! 任务只依赖这里的 post / base_url / accounts，不依赖完整的编排器。

use std::sync::Arc;

use async_trait::async_trait;

use crate::account::Account;
use crate::core::error::HttpError;

#[async_trait]
pub trait Handler: Send + Sync {
    /// 向 url 发送 POST，返回完整响应体
    async fn post(&self, url: &str, payload: Vec<u8>) -> Result<Vec<u8>, HttpError>;

    /// 当前基础 URL（读取时的快照）
    fn base_url(&self) -> String;

    fn accounts(&self) -> &[Arc<Account>];
}
