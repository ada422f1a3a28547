//! 编排器构建器：从 AppConfig 统一初始化传输层、刷新协作方与观察者

use std::sync::Arc;

use crate::account::Account;
use crate::config::AppConfig;
use crate::core::error::NexusError;
use crate::core::orchestrator::GameHandler;
use crate::core::shutdown::ShutdownManager;
use crate::http::HttpClient;
use crate::observability::{TaskObserver, TracingObserver};
use crate::refresh::{NexusRefresher, SessionRefresher};
use crate::tasks::Task;

/// 编排器构建器
pub struct HandlerBuilder {
    config: AppConfig,
    accounts: Vec<Account>,
    tasks: Vec<Task>,
    refresher: Option<Arc<dyn SessionRefresher>>,
    observer: Arc<dyn TaskObserver>,
    shutdown: Option<Arc<ShutdownManager>>,
}

impl HandlerBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            accounts: Vec::new(),
            tasks: Vec::new(),
            refresher: None,
            observer: Arc::new(TracingObserver),
            shutdown: None,
        }
    }

    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    /// 初始任务（按顺序追加）
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// 替换默认的 NexusRefresher（默认地址取自 [refresh] api_base）
    pub fn with_refresher(mut self, refresher: Arc<dyn SessionRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Arc<ShutdownManager>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// 构建编排器；代理配置非法或请求头非法时失败
    pub fn build(self) -> Result<GameHandler, NexusError> {
        let cfg = self.config;
        let http = HttpClient::new(&cfg.proxy)?.with_headers(&cfg.http.headers)?;
        let refresher = self
            .refresher
            .unwrap_or_else(|| Arc::new(NexusRefresher::new(cfg.refresh.api_base.clone())));

        let mut handler = GameHandler::with_http_client(
            cfg.game.name,
            cfg.proxy,
            cfg.api_key,
            self.accounts,
            http,
        )
        .with_refresher(refresher)
        .with_observer(self.observer);
        if let Some(shutdown) = self.shutdown {
            handler = handler.with_shutdown(shutdown);
        }

        if !cfg.game.base_url.is_empty() {
            handler.set_base_url(cfg.game.base_url);
        }
        for task in self.tasks {
            handler.add_task(task);
        }
        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ProxyError;
    use crate::tasks::{Handler, Payload};

    #[test]
    fn test_build_applies_config() {
        let mut cfg = AppConfig::default();
        cfg.game.name = "blum".into();
        cfg.game.base_url = "http://game.local/api".into();

        let handler = HandlerBuilder::new(cfg)
            .with_tasks(vec![
                Task::one_time("claim", Payload::new()),
                Task::one_time("join", Payload::new()),
            ])
            .build()
            .unwrap();

        assert_eq!(handler.game_name(), "blum");
        assert_eq!(handler.base_url(), "http://game.local/api");
        assert_eq!(handler.task_count(), 2);
        assert!(handler.accounts().is_empty());
    }

    #[test]
    fn test_build_fails_on_bad_proxy() {
        let mut cfg = AppConfig::default();
        cfg.proxy.ip = "127.0.0.1".into();
        cfg.proxy.port = 1080;
        cfg.proxy.socks_type = 9;

        let err = HandlerBuilder::new(cfg).build().err().unwrap();
        assert!(matches!(err, NexusError::Proxy(ProxyError::InvalidType(9))));
    }

    #[test]
    fn test_build_fails_on_bad_header() {
        let mut cfg = AppConfig::default();
        cfg.http.headers.insert("bad header".into(), "x".into());
        assert!(matches!(
            HandlerBuilder::new(cfg).build(),
            Err(NexusError::Header(_))
        ));
    }
}
