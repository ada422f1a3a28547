//! 周期任务调度
//!
//! 每个 (账号, 周期任务) 一个独立 tokio 任务：首个 tick 在一个间隔之后触发，每个 tick 执行一次
//! 刷新重试流程；执行超时导致的迟到 tick 顺延，不会集中补发。token 取消后在下一次等待时退出。

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::account::Account;
use crate::core::orchestrator::GameHandler;
use crate::tasks::Task;

/// 启动一个周期循环
pub(crate) fn spawn_recurrent(
    handler: Arc<GameHandler>,
    account: Arc<Account>,
    task: Arc<Task>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // 间隔大到无法表示首个 tick 时刻时，循环永不触发，只等待取消
        let Some(start) = Instant::now().checked_add(period) else {
            tracing::warn!(
                account = account.id(),
                task = task.name(),
                ?period,
                "Interval out of range, recurrent task will never fire"
            );
            token.cancelled().await;
            return;
        };
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(
                        account = account.id(),
                        task = task.name(),
                        "Recurrent loop stopped"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    handler.run_task_with_retry(&account, &task).await;
                }
            }
        }
    })
}

/// 一次 run_tasks 启动的全部周期循环
pub struct RecurrentLoops {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl RecurrentLoops {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            handles: Vec::new(),
        }
    }

    pub(crate) fn extend(&mut self, handles: impl IntoIterator<Item = JoinHandle<()>>) {
        self.handles.extend(handles);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 通知所有循环退出（不等待）
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// 等待所有循环结束；不调用 stop 时只会在进程退出或上级 token 取消后返回
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                tracing::error!("Recurrent loop panicked: {}", e);
            }
        }
    }

    pub async fn shutdown(self) {
        self.stop();
        self.join().await;
    }
}
