//! 账号数据（对应 accounts.json 中的一条记录）
//!
//! 加载后不可变，由所有并发执行单元以 `Arc<Account>` 共享只读。

use serde::{Deserialize, Serialize};

/// 单个账号：游戏侧凭据 + Telegram 会话信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// 游戏侧的不透明凭据串（如 `user=%7B%22id%22...`）
    #[serde(rename = "game-data")]
    pub game_data: String,
    /// 刷新会话时提交给上游的 Telegram 会话数据
    pub telegram: TelegramData,
}

impl Account {
    /// 稳定的账号标识（日志与执行记录使用）
    pub fn id(&self) -> &str {
        &self.telegram.telegram_id
    }
}

/// Telegram 会话字段，按上游接口的驼峰命名序列化
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramData {
    pub tdata_string_session: String,
    pub app_id: String,
    pub app_hash: String,
    pub telegram_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_deserialize_wire_names() {
        let raw = r#"{
            "game-data": "user=%7B%22id%22%3A1%7D",
            "telegram": {
                "tdataStringSession": "session",
                "appId": "123456",
                "appHash": "abcdef",
                "telegramId": "987654321"
            }
        }"#;
        let account: Account = serde_json::from_str(raw).unwrap();
        assert_eq!(account.game_data, "user=%7B%22id%22%3A1%7D");
        assert_eq!(account.telegram.app_hash, "abcdef");
        assert_eq!(account.id(), "987654321");
    }

    #[test]
    fn test_telegram_data_serializes_camel_case() {
        let data = TelegramData {
            tdata_string_session: "s".into(),
            app_id: "1".into(),
            app_hash: "h".into(),
            telegram_id: "42".into(),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["tdataStringSession"], "s");
        assert_eq!(value["telegramId"], "42");
    }
}
