//! 可观测性：日志初始化与任务执行观察钩子
//!
//! 库代码只发出 tracing 事件，不依赖订阅者是否已安装；`init` 由进程入口显式调用一次。
//! 刷新重试流程吞掉所有最终失败，`TaskObserver` 让运维侧仍能看到它们。

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::{ExecutionRecord, ExecutionState};

static INIT: Once = Once::new();

/// 安装全局订阅者：默认 info，可通过 RUST_LOG 覆盖；重复调用无副作用
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    });
}

/// 执行观察者：状态每推进一步调用 on_transition，进入终态后调用 on_finished
pub trait TaskObserver: Send + Sync {
    fn on_transition(&self, _record: &ExecutionRecord) {}

    fn on_finished(&self, record: &ExecutionRecord);
}

/// 默认观察者：写日志
#[derive(Debug, Default)]
pub struct TracingObserver;

impl TaskObserver for TracingObserver {
    fn on_transition(&self, record: &ExecutionRecord) {
        tracing::trace!(
            account = %record.account_id,
            task = %record.task_name,
            state = ?record.state,
            "Execution state changed"
        );
    }

    fn on_finished(&self, record: &ExecutionRecord) {
        match record.state {
            ExecutionState::Succeeded => tracing::info!(
                account = %record.account_id,
                task = %record.task_name,
                runs = record.runs,
                refreshed = record.refreshed,
                "Task succeeded"
            ),
            _ => tracing::warn!(
                account = %record.account_id,
                task = %record.task_name,
                runs = record.runs,
                refreshed = record.refreshed,
                error = record.last_error.as_deref().unwrap_or(""),
                "Task failed after refresh/retry, giving up"
            ),
        }
    }
}
