//! 执行状态：单个 (账号, 任务) 一次执行的状态机与记录
//!
//! ```text
//! Pending → Running → Succeeded
//!              └→ Refreshing → Retrying → Succeeded
//!                      │           └→ FailedSilent
//!                      └→ FailedSilent
//! ```
//! 周期任务每个 tick 新建一条 Pending 记录，状态不跨 tick 保留。

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::tasks::{Task, TaskKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutionState {
    Pending,
    Running,
    Refreshing,
    Retrying,
    Succeeded,
    /// 刷新或重试失败；只记录日志与通知观察者，不向 run_tasks 的调用方传播
    FailedSilent,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedSilent)
    }

    /// 状态机允许的转换
    pub fn can_transition_to(self, next: Self) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Succeeded)
                | (Running, Refreshing)
                | (Refreshing, Retrying)
                | (Refreshing, FailedSilent)
                | (Retrying, Succeeded)
                | (Retrying, FailedSilent)
        )
    }
}

/// 一次执行的完整记录（含重试）
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub account_id: String,
    pub task_name: String,
    pub kind: TaskKind,
    pub state: ExecutionState,
    /// Task::run 被调用的次数（1 或 2）
    pub runs: u32,
    pub refreshed: bool,
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    pub fn pending(account_id: &str, task: &Task) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            task_name: task.name().to_string(),
            kind: task.kind(),
            state: ExecutionState::Pending,
            runs: 0,
            refreshed: false,
            last_error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// 推进状态；进入终态时记录结束时间
    pub(crate) fn transition(&mut self, next: ExecutionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == ExecutionState::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Payload;

    #[test]
    fn test_terminal_states() {
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::FailedSilent.is_terminal());
        assert!(!ExecutionState::Refreshing.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        use ExecutionState::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Refreshing));
        assert!(Refreshing.can_transition_to(FailedSilent));
        assert!(Retrying.can_transition_to(Succeeded));

        assert!(!Pending.can_transition_to(Succeeded));
        assert!(!Running.can_transition_to(Retrying));
        assert!(!Running.can_transition_to(FailedSilent));
        assert!(!Succeeded.can_transition_to(Running));
        assert!(!FailedSilent.can_transition_to(Retrying));
    }

    #[test]
    fn test_pending_record_is_fresh() {
        let task = Task::one_time("claim", Payload::new());
        let a = ExecutionRecord::pending("42", &task);
        let b = ExecutionRecord::pending("42", &task);
        assert_ne!(a.id, b.id);
        assert_eq!(a.state, ExecutionState::Pending);
        assert_eq!(a.runs, 0);
        assert!(a.finished_at.is_none());
    }

    #[test]
    fn test_transition_sets_finished_at_on_terminal() {
        let task = Task::one_time("claim", Payload::new());
        let mut record = ExecutionRecord::pending("42", &task);
        record.transition(ExecutionState::Running);
        assert!(record.finished_at.is_none());
        record.transition(ExecutionState::Succeeded);
        assert!(record.succeeded());
        assert!(record.finished_at.is_some());
    }
}
