//! 应用配置：从 config/default.{toml,json} 与环境变量加载；账号与任务文件加载
//!
//! 加载顺序：先读默认配置文件，再叠加显式传入的路径，最后用环境变量 `NEXUS__*` 覆盖
//! （双下划线表示嵌套，如 `NEXUS__PROXY__IP=127.0.0.1`）。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::account::Account;
use crate::core::error::NexusError;
use crate::http::ProxyConfig;
use crate::refresh::DEFAULT_API_BASE;
use crate::tasks::{Payload, Task};

/// 应用配置根
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 刷新会话使用的 API Key
    pub api_key: String,
    pub proxy: ProxyConfig,
    pub game: GameSection,
    pub refresh: RefreshSection,
    pub http: HttpSection,
    pub paths: PathsSection,
}

/// [game] 段：游戏名（刷新请求中的 game 字段）与任务提交地址
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GameSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
}

/// [refresh] 段
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// [http] 段：每个请求附加的静态请求头
///
/// 配置的请求头与默认值合并（名称不区分大小写），同名时以配置为准。
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_headers", deserialize_with = "merge_default_headers")]
    pub headers: HashMap<String, String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            headers: default_headers(),
        }
    }
}

fn default_headers() -> HashMap<String, String> {
    HashMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

fn merge_default_headers<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut headers = HashMap::<String, String>::deserialize(deserializer)?;
    for (name, value) in default_headers() {
        if !headers.keys().any(|k| k.eq_ignore_ascii_case(&name)) {
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

/// [paths] 段：账号与任务文件
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_accounts_path")]
    pub accounts: PathBuf,
    #[serde(default = "default_tasks_path")]
    pub tasks: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            accounts: default_accounts_path(),
            tasks: default_tasks_path(),
        }
    }
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

fn default_tasks_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

/// 加载配置
///
/// 1. 按顺序查找 config/default、../config/default、config（.toml 或 .json），找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 NEXUS__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "config"];
    'found: for name in default_names {
        for ext in ["toml", "json"] {
            if Path::new(&format!("{}.{}", name, ext)).exists() {
                builder = builder.add_source(config::File::with_name(name).required(false));
                break 'found;
            }
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!("Config file {} not found, skipping", path.display());
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("NEXUS")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

/// tasks.json 中的一次性任务
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    #[serde(default)]
    pub payload: Payload,
}

/// tasks.json 中的周期任务
#[derive(Debug, Clone, Deserialize)]
pub struct RecurrentTaskConfig {
    pub name: String,
    #[serde(default)]
    pub payload: Payload,
    pub interval_minutes: u64,
}

/// tasks.json 根
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TaskCollection {
    pub one_time_tasks: Vec<TaskConfig>,
    pub recurrent_tasks: Vec<RecurrentTaskConfig>,
}

impl TaskCollection {
    /// 转为任务列表：先一次性任务，后周期任务，各自保持文件中的顺序
    pub fn into_tasks(self) -> Result<Vec<Task>, NexusError> {
        let mut tasks: Vec<Task> = self
            .one_time_tasks
            .into_iter()
            .map(|t| Task::one_time(t.name, t.payload))
            .collect();
        for t in self.recurrent_tasks {
            let interval = Duration::from_secs(t.interval_minutes.saturating_mul(60));
            tasks.push(Task::recurrent(t.name, t.payload, interval)?);
        }
        Ok(tasks)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, NexusError> {
    let raw = std::fs::read(path).map_err(|source| NexusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| NexusError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// 读取 accounts.json（账号数组）
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, NexusError> {
    let accounts: Vec<Account> = read_json(path)?;
    tracing::info!("Loaded {} accounts from {}", accounts.len(), path.display());
    Ok(accounts)
}

/// 读取 tasks.json
pub fn load_tasks(path: &Path) -> Result<TaskCollection, NexusError> {
    let tasks: TaskCollection = read_json(path)?;
    tracing::info!(
        "Loaded {} one-time and {} recurrent tasks from {}",
        tasks.one_time_tasks.len(),
        tasks.recurrent_tasks.len(),
        path.display()
    );
    Ok(tasks)
}
