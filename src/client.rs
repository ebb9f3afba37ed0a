//! 客户端门面
//!
//! 把配置、TCP 建连、连接握手（AUTH / SELECT）和连接池装配在一起。
//! 客户端亲和于单个执行器；跨核扩展通过每个执行器各建一个客户端
//! 实现。

use std::rc::Rc;

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::RedisConfig;
use crate::connection::RedisConnection;
use crate::error::RedisError;
use crate::messaging::RedisMessaging;
use crate::pool::ConnectionPool;

/// Redis 客户端
pub struct RedisClient {
    config: RedisConfig,
    pool: ConnectionPool,
}

impl RedisClient {
    /// 按默认配置连接本机
    pub fn new() -> Self {
        Self::with_config(RedisConfig::default())
    }

    pub fn with_config(config: RedisConfig) -> Self {
        let pool = ConnectionPool::new(config.max_connections);
        Self { config, pool }
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// 从池中取得一条连接；必要时新建并完成握手
    pub async fn get_connection(&self) -> Result<Rc<RedisConnection>, RedisError> {
        self.pool.acquire(|| self.open_connection()).await
    }

    /// 归还一条连接
    pub fn return_connection(&self, connection: Rc<RedisConnection>) -> Result<(), RedisError> {
        self.pool.release(connection)
    }

    /// 关闭空闲连接并拒绝后续取用
    pub fn shutdown(&self) {
        info!("shutting down Redis client for {}", self.config.server_address);
        self.pool.shutdown();
    }

    async fn open_connection(&self) -> Result<Rc<RedisConnection>, RedisError> {
        let stream = match self.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, TcpStream::connect(&self.config.server_address))
                .await
                .map_err(|_| RedisError::Timeout)??,
            None => TcpStream::connect(&self.config.server_address).await?,
        };
        // 小命令为主的流量关掉 Nagle
        stream.set_nodelay(true)?;
        debug!("connected to {}", self.config.server_address);

        let messaging = RedisMessaging::new(stream);
        let connection = RedisConnection::with_request_timeout(
            messaging,
            self.config.charset,
            self.config.request_timeout,
        );

        if let Err(cause) = self.handshake(&connection).await {
            connection.close_with(cause.clone());
            return Err(cause);
        }
        Ok(connection)
    }

    /// 新连接的握手：可选的 AUTH，随后可选的 SELECT
    async fn handshake(&self, connection: &Rc<RedisConnection>) -> Result<(), RedisError> {
        if let Some(password) = &self.config.password {
            match &self.config.username {
                Some(username) => connection.auth_with_username(username, password).await?,
                None => connection.auth(password).await?,
            }
            debug!("authenticated connection to {}", self.config.server_address);
        }
        if let Some(database_index) = self.config.database_index {
            connection.select(database_index).await?;
            debug!("selected database {}", database_index);
        }
        Ok(())
    }
}

impl Default for RedisClient {
    fn default() -> Self {
        Self::new()
    }
}
