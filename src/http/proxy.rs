//! 代理配置与 SOCKS 代理构造
//!
//! 仅支持 SOCKS5（可选用户名/密码认证）；SOCKS4 明确拒绝，其它版本号视为非法。

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::core::error::ProxyError;

/// 未配置或配置为非正数时使用的请求超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// 代理配置；刷新会话时原样转发给上游，因此序列化字段名与上游一致
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub ip: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// SOCKS 协议版本（4 或 5）
    #[serde(rename = "socksType", alias = "sockstype", alias = "socks_type")]
    pub socks_type: i32,
    /// 单次请求超时（秒）
    pub timeout: i64,
}

impl ProxyConfig {
    /// 地址与端口都有效时才走代理，否则直连
    pub fn is_configured(&self) -> bool {
        !self.ip.is_empty() && self.port > 0
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `host:port`，IPv6 地址加方括号
    pub fn address(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        if self.timeout > 0 {
            Duration::from_secs(self.timeout as u64)
        } else {
            DEFAULT_TIMEOUT
        }
    }
}

/// 按配置构造 reqwest 代理；未配置地址时返回 None（直连）
pub(crate) fn socks_proxy(config: &ProxyConfig) -> Result<Option<reqwest::Proxy>, ProxyError> {
    if !config.is_configured() {
        return Ok(None);
    }
    match config.socks_type {
        5 => {}
        4 => return Err(ProxyError::Unsupported),
        other => return Err(ProxyError::InvalidType(other)),
    }

    let address = config.address();
    let invalid = |reason: String| ProxyError::InvalidAddress {
        address: address.clone(),
        reason,
    };

    // socks5h：目标域名交给代理解析
    let mut url = Url::parse(&format!("socks5h://{address}")).map_err(|e| invalid(e.to_string()))?;
    if config.has_credentials() {
        url.set_username(&config.username)
            .map_err(|_| invalid("cannot attach username".to_string()))?;
        url.set_password(Some(&config.password))
            .map_err(|_| invalid("cannot attach password".to_string()))?;
    }

    reqwest::Proxy::all(url)
        .map(Some)
        .map_err(|e| invalid(e.to_string()))
}
