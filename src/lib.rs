//! Redis (RESP2) 客户端驱动
//!
//! 单连接上复用大量并发请求的流水线驱动：保证 FIFO 的命令-响应配对、
//! 支持服务端事务（MULTI / EXEC / DISCARD）、暴露类型化的命令结果，
//! 并在任何失败下保证正确的连接收尾。
//!
//! # 并发模型
//!
//! 连接亲和于单个执行器：所有类型都是 `!Send`，必须运行在
//! current-thread runtime 的 `LocalSet` 上。互斥完全由单线程亲和
//! 提供，没有锁。跨核扩展的方式是每个执行器各建一个
//! [`RedisClient`]（带各自的连接池）。
//!
//! # 示例
//!
//! ```no_run
//! use redis_lite::{RedisClient, RedisConfig};
//!
//! async fn example() -> Result<(), redis_lite::RedisError> {
//!     let client = RedisClient::with_config(RedisConfig::new("127.0.0.1:6379"));
//!     let conn = client.get_connection().await?;
//!
//!     conn.set("greeting", "hello", &[]).await?;
//!     assert_eq!(conn.get("greeting").await?.as_deref(), Some("hello"));
//!
//!     // 流水线：先囤 future，再一起等
//!     let f1 = conn.incr("counter");
//!     let f2 = conn.incr("counter");
//!     let (a, b) = (f1.await?, f2.await?);
//!     assert!(b > a);
//!
//!     conn.return_to_pool()?;
//!     Ok(())
//! }
//! ```

mod charset;
mod client;
mod command;
mod commands;
mod config;
mod connection;
mod error;
mod messaging;
mod modifier;
mod parse;
mod pool;
mod protocol;
mod response;
mod types;

pub use charset::Charset;
pub use client::RedisClient;
pub use command::{Command, RedisCommand};
pub use config::{RedisConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_SERVER_ADDRESS};
pub use connection::RedisConnection;
pub use error::RedisError;
pub use messaging::{MessagingReader, MessagingWriter, RedisMessaging};
pub use modifier::{
    Aggregate, BitOperator, DistanceUnit, GeoOrigin, GeoradiusModifier, InsertPosition, LexBound,
    LexInterval, LposModifier, MigrateModifier, RestoreModifier, ScanModifier, ScoreBound,
    ScoreInterval, SetModifier, SortModifier, ZaddModifier,
};
pub use pool::ConnectionPool;
pub use protocol::{encode_command, RespDecoder, DEFAULT_MAX_FRAME_SIZE};
pub use response::RedisResponse;
pub use types::{
    Coordinate, GeoradiusResult, ListPopResult, RedisEncoding, RedisType, ScanResult,
    SetBlockingPopResult, SetPopResult,
};
