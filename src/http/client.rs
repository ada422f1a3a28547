//! 代理感知 HTTP 客户端
//!
//! 每次请求附加静态请求头；成功响应体完整读取，错误响应体读取中断时保留已收到部分。非 2xx 状态统一转为 `HttpError::Status(响应体原文)`，
//! 调用方只能通过消息内容区分 4xx / 5xx。

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

use crate::core::error::{HttpError, ProxyError};
use crate::http::proxy::{socks_proxy, ProxyConfig};

/// 包装 reqwest::Client；Clone 廉价，可被所有并发执行单元共享
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    headers: HeaderMap,
    proxied: bool,
}

impl HttpClient {
    /// 按代理配置构造客户端；地址为空时直连
    pub fn new(proxy: &ProxyConfig) -> Result<Self, ProxyError> {
        let socks = socks_proxy(proxy)?;
        let proxied = socks.is_some();

        // 直连时也忽略 HTTP(S)_PROXY 等环境变量
        let builder = Client::builder().timeout(proxy.request_timeout()).no_proxy();
        let builder = match socks {
            Some(p) => builder.proxy(p),
            None => builder,
        };
        let client = builder.build().map_err(ProxyError::Build)?;

        if proxied {
            tracing::info!(
                "HTTP client using SOCKS5 proxy {} (auth: {})",
                proxy.address(),
                proxy.has_credentials()
            );
        } else {
            tracing::debug!("HTTP client using direct connection");
        }

        Ok(Self {
            client,
            headers: HeaderMap::new(),
            proxied,
        })
    }

    /// 是否经由 SOCKS5 代理
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    /// 追加一个静态请求头
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// 批量追加静态请求头（来自配置 [http.headers]）
    pub fn with_headers(self, headers: &HashMap<String, String>) -> Result<Self, HttpError> {
        headers
            .iter()
            .try_fold(self, |client, (name, value)| client.with_header(name, value))
    }

    pub async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.execute(Method::GET, url, None).await
    }

    pub async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpError> {
        self.execute(Method::POST, url, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, HttpError> {
        let mut request = self.client.request(method.clone(), url).headers(self.headers.clone());
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::debug!("{} {} -> {}", method, url, status);
            let body = read_partial_body(response).await;
            return Err(HttpError::Status(String::from_utf8_lossy(&body).into_owned()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// 读取错误响应体：读取中断时保留已收到的部分，状态错误优先于读取错误
async fn read_partial_body(mut response: reqwest::Response) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Error body truncated: {}", e);
                break;
            }
        }
    }
    body
}

/// 响应体解析结果：能按 JSON 解出目标类型则为 Json，否则保留原文
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody<T> {
    Json(T),
    Text(String),
}

impl<T: DeserializeOwned> ResponseBody<T> {
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }
}
