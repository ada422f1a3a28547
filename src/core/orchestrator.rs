//! 编排器：按账号并行执行任务列表
//!
//! 每个账号一个独立 tokio 任务，在其中按注册顺序遍历任务列表：一次性任务就地执行刷新重试流程，
//! 周期任务另起独立循环后立即继续下一个任务。run_tasks 只等待一次性任务全部完成。

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::account::Account;
use crate::core::error::{HttpError, ProxyError};
use crate::core::recovery::{RecoveryEngine, RefreshCall};
use crate::core::shutdown::ShutdownManager;
use crate::core::state::ExecutionRecord;
use crate::core::task_scheduler::{spawn_recurrent, RecurrentLoops};
use crate::http::{HttpClient, ProxyConfig};
use crate::observability::TaskObserver;
use crate::refresh::{GameDataRequest, NexusRefresher, SessionRefresher};
use crate::tasks::{Handler, Task};

/// run_tasks 的结果：启动的账号执行单元数与仍在运行的周期循环
pub struct RunReport {
    pub accounts: usize,
    pub loops: RecurrentLoops,
}

/// 游戏任务编排器
pub struct GameHandler {
    game_name: String,
    base_url: RwLock<String>,
    proxy: ProxyConfig,
    api_key: String,
    accounts: Vec<Arc<Account>>,
    tasks: Mutex<Vec<Arc<Task>>>,
    http: HttpClient,
    refresher: Arc<dyn SessionRefresher>,
    recovery: RecoveryEngine,
    shutdown: Arc<ShutdownManager>,
}

impl GameHandler {
    /// 按代理配置构造传输层；基础 URL 留空，需在 run_tasks 前调用 set_base_url
    pub fn new(
        game_name: impl Into<String>,
        proxy: ProxyConfig,
        api_key: impl Into<String>,
        accounts: Vec<Account>,
    ) -> Result<Self, ProxyError> {
        let http = HttpClient::new(&proxy)?;
        Ok(Self::with_http_client(game_name, proxy, api_key, accounts, http))
    }

    /// 使用已构造好的传输层（如带静态请求头）
    pub fn with_http_client(
        game_name: impl Into<String>,
        proxy: ProxyConfig,
        api_key: impl Into<String>,
        accounts: Vec<Account>,
        http: HttpClient,
    ) -> Self {
        Self {
            game_name: game_name.into(),
            base_url: RwLock::new(String::new()),
            proxy,
            api_key: api_key.into(),
            accounts: accounts.into_iter().map(Arc::new).collect(),
            tasks: Mutex::new(Vec::new()),
            http,
            refresher: Arc::new(NexusRefresher::default()),
            recovery: RecoveryEngine::default(),
            shutdown: Arc::new(ShutdownManager::new()),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn SessionRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.recovery = RecoveryEngine::new(observer);
        self
    }

    pub fn with_shutdown(mut self, shutdown: Arc<ShutdownManager>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    pub fn shutdown_manager(&self) -> &Arc<ShutdownManager> {
        &self.shutdown
    }

    pub fn set_base_url(&self, url: impl Into<String>) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    /// 追加任务；可与 run_tasks 并发调用，run_tasks 只看到开始时的快照
    pub fn add_task(&self, task: Task) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(task));
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn snapshot_tasks(&self) -> Vec<Arc<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 为所有账号执行任务列表；一次性任务全部完成后返回，周期循环继续在后台运行
    pub async fn run_tasks(self: &Arc<Self>) -> RunReport {
        let tasks = self.snapshot_tasks();
        let token = self.shutdown.child_token();

        let units: Vec<JoinHandle<Vec<JoinHandle<()>>>> = self
            .accounts
            .iter()
            .map(|account| {
                let handler = Arc::clone(self);
                let account = Arc::clone(account);
                let tasks = tasks.clone();
                let token = token.clone();
                tokio::spawn(async move { handler.run_account(account, tasks, token).await })
            })
            .collect();

        let started = units.len();
        tracing::info!(
            game = %self.game_name,
            accounts = started,
            tasks = tasks.len(),
            "Started account units"
        );

        let mut loops = RecurrentLoops::new(token);
        for result in join_all(units).await {
            match result {
                Ok(handles) => loops.extend(handles),
                Err(e) => tracing::error!("Account unit panicked: {}", e),
            }
        }
        tracing::info!(
            recurrent_loops = loops.len(),
            "One-time tasks finished for all accounts"
        );

        RunReport {
            accounts: started,
            loops,
        }
    }

    async fn run_account(
        self: Arc<Self>,
        account: Arc<Account>,
        tasks: Vec<Arc<Task>>,
        token: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let mut loops = Vec::new();
        for task in tasks {
            match task.as_ref() {
                Task::OneTime(_) => {
                    self.run_task_with_retry(&account, &task).await;
                }
                Task::Recurrent(recurrent) => {
                    let period = recurrent.interval();
                    loops.push(spawn_recurrent(
                        Arc::clone(&self),
                        Arc::clone(&account),
                        Arc::clone(&task),
                        period,
                        token.child_token(),
                    ));
                }
            }
        }
        loops
    }

    /// 执行一次刷新重试流程；失败只体现在返回的记录与日志中
    pub async fn run_task_with_retry(&self, account: &Account, task: &Task) -> ExecutionRecord {
        let refresh = RefreshCall {
            refresher: self.refresher.as_ref(),
            http: &self.http,
            request: GameDataRequest {
                game: &self.game_name,
                telegram: &account.telegram,
                api_key: &self.api_key,
                proxy: &self.proxy,
            },
        };
        self.recovery.run_with_refresh(task, account, self, refresh).await
    }
}

#[async_trait]
impl Handler for GameHandler {
    async fn post(&self, url: &str, payload: Vec<u8>) -> Result<Vec<u8>, HttpError> {
        self.http.post(url, payload).await
    }

    fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn accounts(&self) -> &[Arc<Account>] {
        &self.accounts
    }
}
