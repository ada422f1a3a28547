//! 任务：一次性（OneTime）与周期（Recurrent）两种，封闭枚举
//!
//! 执行方式相同：载荷序列化为 JSON，POST 到 `handler.base_url()`；只要请求未出错即视为成功，
//! 响应体不做业务层面的检查。

pub mod handler;

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::account::Account;
use crate::core::error::TaskError;
use crate::http::ResponseBody;

pub use handler::Handler;

/// 任务载荷：任意 JSON 对象
pub type Payload = Map<String, Value>;

/// 任务类型
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum TaskKind {
    /// 每个账号执行一次
    OneTime,
    /// 每个账号按固定间隔重复执行
    Recurrent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneTimeTask {
    pub name: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentTask {
    pub name: String,
    pub payload: Payload,
    interval: Duration,
}

impl RecurrentTask {
    /// 间隔必须大于零
    pub fn new(name: impl Into<String>, payload: Payload, interval: Duration) -> Result<Self, TaskError> {
        let name = name.into();
        if interval.is_zero() {
            return Err(TaskError::InvalidInterval { task: name });
        }
        Ok(Self {
            name,
            payload,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    OneTime(OneTimeTask),
    Recurrent(RecurrentTask),
}

impl Task {
    pub fn one_time(name: impl Into<String>, payload: Payload) -> Self {
        Self::OneTime(OneTimeTask {
            name: name.into(),
            payload,
        })
    }

    pub fn recurrent(
        name: impl Into<String>,
        payload: Payload,
        interval: Duration,
    ) -> Result<Self, TaskError> {
        RecurrentTask::new(name, payload, interval).map(Self::Recurrent)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::OneTime(t) => &t.name,
            Self::Recurrent(t) => &t.name,
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Self::OneTime(t) => &t.payload,
            Self::Recurrent(t) => &t.payload,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Self::OneTime(_) => TaskKind::OneTime,
            Self::Recurrent(_) => TaskKind::Recurrent,
        }
    }

    /// 为单个账号执行一次
    pub async fn run(&self, account: &Account, handler: &dyn Handler) -> Result<(), TaskError> {
        tracing::debug!(
            account = account.id(),
            task = self.name(),
            kind = ?self.kind(),
            "Running task"
        );

        let body = serde_json::to_vec(self.payload()).map_err(|source| TaskError::Serialize {
            task: self.name().to_string(),
            source,
        })?;

        let response = handler
            .post(&handler.base_url(), body)
            .await
            .map_err(|source| TaskError::Execute {
                task: self.name().to_string(),
                account: account.id().to_string(),
                source,
            })?;

        match ResponseBody::<Value>::parse(&response) {
            ResponseBody::Json(value) => {
                tracing::debug!(account = account.id(), task = self.name(), response = %value, "Task succeeded")
            }
            ResponseBody::Text(text) => {
                tracing::debug!(account = account.id(), task = self.name(), response = %text, "Task succeeded")
            }
        }
        Ok(())
    }
}
