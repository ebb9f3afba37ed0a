//! 客户端配置

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::charset::Charset;

/// 默认服务器地址
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:6379";

/// 默认连接池上限
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// 客户端配置
///
/// 所有字段都有默认值，可以从配置文件反序列化，也可以用 `with_*`
/// 方法以编程方式构造。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// 服务器地址，host:port
    pub server_address: String,
    /// 连接池上限
    pub max_connections: usize,
    /// 连接级文本编码
    pub charset: Charset,
    /// 建立 TCP 连接的超时
    pub connect_timeout: Option<Duration>,
    /// 等待单条命令响应的超时（事务内命令除外）
    pub request_timeout: Option<Duration>,
    /// 连接建立时执行 AUTH 的口令
    pub password: Option<String>,
    /// 与 `password` 配合的用户名（Redis 6 ACL）
    pub username: Option<String>,
    /// 连接建立时执行 SELECT 的数据库下标
    pub database_index: Option<u32>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            charset: Charset::default(),
            connect_timeout: None,
            request_timeout: None,
            password: None,
            username: None,
            database_index: None,
        }
    }
}

impl RedisConfig {
    pub fn new(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            ..Self::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_database_index(mut self, database_index: u32) -> Self {
        self.database_index = Some(database_index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedisConfig::default();
        assert_eq!(config.server_address, DEFAULT_SERVER_ADDRESS);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.charset, Charset::Utf8);
        assert!(config.password.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = RedisConfig::new("10.0.0.1:6380")
            .with_max_connections(4)
            .with_password("secret")
            .with_database_index(2);
        assert_eq!(config.server_address, "10.0.0.1:6380");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.database_index, Some(2));
    }

    #[test]
    fn test_deserializes_from_json() {
        let json = r#"{"server_address":"redis:6379","max_connections":3,"charset":"latin1"}"#;
        let config: RedisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server_address, "redis:6379");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.charset, Charset::Latin1);
    }
}
