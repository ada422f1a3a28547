//! 核心编排层：错误类型、执行状态、刷新重试、周期调度、关闭信号、编排器

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod shutdown;
pub mod state;
pub mod task_scheduler;

pub use builder::HandlerBuilder;
pub use error::{HttpError, NexusError, ProxyError, RefreshError, TaskError};
pub use orchestrator::{GameHandler, RunReport};
pub use recovery::{RecoveryEngine, RefreshCall};
pub use shutdown::{ShutdownManager, ShutdownReason};
pub use state::{ExecutionRecord, ExecutionState};
pub use task_scheduler::RecurrentLoops;
