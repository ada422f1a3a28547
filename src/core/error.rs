//! 错误类型
//!
//! 分层：ProxyError（构造期，致命）→ HttpError（单次请求）→ TaskError（任务执行，被重试流程吞掉）；
//! RefreshError 为刷新协作方的失败；NexusError 汇总启动阶段的加载错误。

use std::path::PathBuf;

use thiserror::Error;

/// 代理配置错误：构造 HttpClient 时返回，不产生任何客户端
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("SOCKS4 proxy is not supported")]
    Unsupported,

    #[error("invalid SOCKS type: {0}")]
    InvalidType(i32),

    #[error("invalid proxy address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// 单次请求错误
#[derive(Error, Debug)]
pub enum HttpError {
    /// DNS / 连接 / TLS / 超时等传输层错误
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// 非 2xx 响应；消息即响应体原文（不含状态码）
    #[error("{0}")]
    Status(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// 任务执行错误，仅在刷新重试流程内部流转
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("failed to marshal payload for task '{task}': {source}")]
    Serialize {
        task: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to execute task '{task}' for account {account}: {source}")]
    Execute {
        task: String,
        account: String,
        #[source]
        source: HttpError,
    },

    #[error("recurrent task '{task}' needs an interval greater than zero")]
    InvalidInterval { task: String },
}

/// 会话刷新失败
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("failed to marshal refresh request: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("refresh request failed: {0}")]
    Http(#[from] HttpError),
}

/// 启动阶段错误：配置、代理、账号与任务文件
#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Invalid header: {0}")]
    Header(#[from] HttpError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_is_body() {
        let err = HttpError::Status("{\"error\":\"expired\"}".to_string());
        assert_eq!(err.to_string(), "{\"error\":\"expired\"}");
    }

    #[test]
    fn test_task_error_names_task_and_account() {
        let err = TaskError::Execute {
            task: "claim".into(),
            account: "42".into(),
            source: HttpError::Status("bad".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("'claim'"));
        assert!(msg.contains("42"));
        assert!(msg.ends_with("bad"));
    }

    #[test]
    fn test_proxy_error_invalid_type() {
        assert_eq!(ProxyError::InvalidType(7).to_string(), "invalid SOCKS type: 7");
    }
}
