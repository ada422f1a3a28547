//! Nexus - 多账号并行任务编排
//!
//! 入口：初始化日志、加载配置/账号/任务、构建编排器并运行；周期任务持续运行直到 Ctrl+C / SIGTERM。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use nexus::config::{load_accounts, load_config, load_tasks};
use nexus::core::{HandlerBuilder, ShutdownManager, ShutdownReason};
use nexus::observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let accounts = load_accounts(&cfg.paths.accounts).context("Failed to load accounts")?;
    let tasks = load_tasks(&cfg.paths.tasks)
        .context("Failed to load tasks")?
        .into_tasks()
        .context("Invalid task definition")?;

    if cfg.game.base_url.is_empty() {
        tracing::warn!("game.base_url is empty, task submissions will fail");
    }

    let shutdown = Arc::new(ShutdownManager::new());
    let handler = HandlerBuilder::new(cfg)
        .with_accounts(accounts)
        .with_tasks(tasks)
        .with_shutdown(Arc::clone(&shutdown))
        .build()
        .context("Failed to create game handler")?;
    let handler = Arc::new(handler);

    let mut reasons = shutdown.subscribe();
    shutdown.install_signal_handlers();

    let report = handler.run_tasks().await;
    if report.loops.is_empty() {
        tracing::info!("All tasks finished for {} accounts", report.accounts);
        return Ok(());
    }

    tracing::info!(
        "{} recurrent loops running, press Ctrl+C to stop",
        report.loops.len()
    );

    // 周期循环只在关闭后退出；先于关闭全部结束说明它们都崩溃了
    let joined = report.loops.join();
    tokio::pin!(joined);
    tokio::select! {
        _ = shutdown.wait_for_shutdown() => joined.await,
        _ = &mut joined => shutdown.shutdown(ShutdownReason::FatalError(
            "all recurrent loops exited".into(),
        )),
    }

    match reasons.try_recv() {
        Ok(ShutdownReason::FatalError(msg)) => anyhow::bail!("Stopped: {}", msg),
        Ok(reason) => tracing::info!("Stopped ({:?})", reason),
        Err(_) => tracing::info!("Stopped"),
    }

    Ok(())
}
