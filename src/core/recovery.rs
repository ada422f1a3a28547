//! 失败恢复：刷新会话后重试一次
//!
//! 任务首次失败多半是上游会话过期，因此只做一次刷新 + 一次重试；
//! 无论结果如何都不向调用方返回错误，最终状态写入 ExecutionRecord 并通知观察者。

use std::sync::Arc;

use crate::account::Account;
use crate::core::state::{ExecutionRecord, ExecutionState};
use crate::http::HttpClient;
use crate::observability::{TaskObserver, TracingObserver};
use crate::refresh::{GameDataRequest, SessionRefresher};
use crate::tasks::{Handler, Task};

/// 刷新所需的协作方与请求
pub struct RefreshCall<'a> {
    pub refresher: &'a dyn SessionRefresher,
    pub http: &'a HttpClient,
    pub request: GameDataRequest<'a>,
}

/// 刷新重试状态机的驱动者
pub struct RecoveryEngine {
    observer: Arc<dyn TaskObserver>,
}

impl RecoveryEngine {
    pub fn new(observer: Arc<dyn TaskObserver>) -> Self {
        Self { observer }
    }

    /// 运行一次完整的 run → (refresh → retry) 流程，返回终态记录
    pub async fn run_with_refresh(
        &self,
        task: &Task,
        account: &Account,
        handler: &dyn Handler,
        refresh: RefreshCall<'_>,
    ) -> ExecutionRecord {
        let mut record = ExecutionRecord::pending(account.id(), task);

        self.advance(&mut record, ExecutionState::Running);
        record.runs += 1;
        let err = match task.run(account, handler).await {
            Ok(()) => {
                self.advance(&mut record, ExecutionState::Succeeded);
                return record;
            }
            Err(e) => e,
        };
        tracing::warn!(
            account = account.id(),
            task = task.name(),
            error = %err,
            "Task failed, refreshing session"
        );
        record.last_error = Some(err.to_string());

        self.advance(&mut record, ExecutionState::Refreshing);
        if let Err(e) = refresh.refresher.refresh(refresh.http, &refresh.request).await {
            record.last_error = Some(e.to_string());
            self.advance(&mut record, ExecutionState::FailedSilent);
            return record;
        }
        record.refreshed = true;

        self.advance(&mut record, ExecutionState::Retrying);
        record.runs += 1;
        match task.run(account, handler).await {
            Ok(()) => {
                record.last_error = None;
                self.advance(&mut record, ExecutionState::Succeeded);
            }
            Err(e) => {
                record.last_error = Some(e.to_string());
                self.advance(&mut record, ExecutionState::FailedSilent);
            }
        }
        record
    }

    fn advance(&self, record: &mut ExecutionRecord, next: ExecutionState) {
        record.transition(next);
        self.observer.on_transition(record);
        if next.is_terminal() {
            self.observer.on_finished(record);
        }
    }
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::account::TelegramData;
    use crate::core::error::{HttpError, RefreshError};
    use crate::http::ProxyConfig;
    use crate::tasks::Payload;

    /// 按脚本依次返回成功/失败的 Handler
    struct ScriptedHandler {
        script: Mutex<VecDeque<bool>>,
        posts: AtomicUsize,
    }

    impl ScriptedHandler {
        fn new(script: &[bool]) -> Self {
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                posts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Handler for ScriptedHandler {
        async fn post(&self, _url: &str, _payload: Vec<u8>) -> Result<Vec<u8>, HttpError> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            let ok = self.script.lock().unwrap().pop_front().unwrap_or(false);
            if ok {
                Ok(Vec::new())
            } else {
                Err(HttpError::Status("session expired".into()))
            }
        }

        fn base_url(&self) -> String {
            "http://game.local".into()
        }

        fn accounts(&self) -> &[Arc<Account>] {
            &[]
        }
    }

    struct StubRefresher {
        ok: bool,
        calls: AtomicUsize,
    }

    impl StubRefresher {
        fn new(ok: bool) -> Self {
            Self {
                ok,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionRefresher for StubRefresher {
        async fn refresh(
            &self,
            _http: &HttpClient,
            _request: &GameDataRequest<'_>,
        ) -> Result<Vec<u8>, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                Ok(b"fresh".to_vec())
            } else {
                Err(RefreshError::Http(HttpError::Status("refresh denied".into())))
            }
        }
    }

    #[derive(Default)]
    struct CollectingObserver {
        states: Mutex<Vec<ExecutionState>>,
        finished: AtomicUsize,
    }

    impl TaskObserver for CollectingObserver {
        fn on_transition(&self, record: &ExecutionRecord) {
            self.states.lock().unwrap().push(record.state);
        }

        fn on_finished(&self, _record: &ExecutionRecord) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn account() -> Account {
        Account {
            game_data: "user=1".into(),
            telegram: TelegramData {
                telegram_id: "42".into(),
                ..Default::default()
            },
        }
    }

    async fn run(
        script: &[bool],
        refresh_ok: bool,
    ) -> (ExecutionRecord, usize, usize, Vec<ExecutionState>) {
        let observer = Arc::new(CollectingObserver::default());
        let engine = RecoveryEngine::new(observer.clone());
        let handler = ScriptedHandler::new(script);
        let refresher = StubRefresher::new(refresh_ok);
        let http = HttpClient::new(&ProxyConfig::default()).unwrap();
        let account = account();
        let proxy = ProxyConfig::default();
        let task = Task::one_time("claim", Payload::new());

        let record = engine
            .run_with_refresh(
                &task,
                &account,
                &handler,
                RefreshCall {
                    refresher: &refresher,
                    http: &http,
                    request: GameDataRequest {
                        game: "blum",
                        telegram: &account.telegram,
                        api_key: "key",
                        proxy: &proxy,
                    },
                },
            )
            .await;

        assert_eq!(observer.finished.load(Ordering::SeqCst), 1);
        let states = observer.states.lock().unwrap().clone();
        (
            record,
            handler.posts.load(Ordering::SeqCst),
            refresher.calls.load(Ordering::SeqCst),
            states,
        )
    }

    #[tokio::test]
    async fn test_first_run_succeeds_without_refresh() {
        let (record, runs, refreshes, states) = run(&[true], true).await;
        assert!(record.succeeded());
        assert_eq!((runs, refreshes), (1, 0));
        assert_eq!(record.runs, 1);
        assert!(!record.refreshed);
        assert_eq!(states, vec![ExecutionState::Running, ExecutionState::Succeeded]);
    }

    #[tokio::test]
    async fn test_fail_refresh_ok_retry_ok() {
        let (record, runs, refreshes, states) = run(&[false, true], true).await;
        assert!(record.succeeded());
        assert_eq!((runs, refreshes), (2, 1));
        assert!(record.refreshed);
        assert!(record.last_error.is_none());
        assert_eq!(
            states,
            vec![
                ExecutionState::Running,
                ExecutionState::Refreshing,
                ExecutionState::Retrying,
                ExecutionState::Succeeded
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_skips_retry() {
        let (record, runs, refreshes, states) = run(&[false, true], false).await;
        assert_eq!(record.state, ExecutionState::FailedSilent);
        assert_eq!((runs, refreshes), (1, 1));
        assert!(record.last_error.as_deref().unwrap().contains("refresh denied"));
        assert_eq!(states.last(), Some(&ExecutionState::FailedSilent));
    }

    #[tokio::test]
    async fn test_retry_failure_is_silent() {
        let (record, runs, refreshes, _) = run(&[false, false], true).await;
        assert_eq!(record.state, ExecutionState::FailedSilent);
        assert_eq!((runs, refreshes), (2, 1));
        assert_eq!(record.runs, 2);
        assert!(record.finished_at.is_some());
    }
}
