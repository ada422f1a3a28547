//! Nexus - 多账号并行任务编排
//!
//! 模块划分：
//! - **account**: 账号与 Telegram 会话数据
//! - **config**: 应用配置加载（TOML/JSON + 环境变量）、账号与任务文件加载
//! - **core**: 编排器、刷新后重试状态机、周期任务调度、关闭信号
//! - **http**: 代理感知的 HTTP 传输（直连 / SOCKS5）
//! - **observability**: 日志初始化与任务执行观察钩子
//! - **refresh**: 会话刷新协作方（失败恢复时调用）
//! - **tasks**: 一次性 / 周期任务与 Handler 能力

pub mod account;
pub mod config;
pub mod core;
pub mod http;
pub mod observability;
pub mod refresh;
pub mod tasks;

pub use crate::account::{Account, TelegramData};
pub use crate::core::{ExecutionRecord, ExecutionState, GameHandler, HandlerBuilder, RunReport};
pub use crate::http::{HttpClient, ProxyConfig};
pub use crate::tasks::{Handler, Task, TaskKind};
