//! HTTP 传输层：直连或 SOCKS5 代理

pub mod client;
pub mod proxy;

pub use client::{HttpClient, ResponseBody};
pub use proxy::{ProxyConfig, DEFAULT_TIMEOUT};
