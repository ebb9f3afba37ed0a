//! 客户端错误类型
//!
//! 错误分为两大类：致命错误（传输层故障、协议解码失败、事务帧不匹配）
//! 会关闭连接并传播给所有未完成的 waiter；局部错误（服务端错误、解析
//! 不匹配、事务相关错误）只影响单条命令，连接保持可用。

use std::sync::Arc;

use thiserror::Error;

/// 客户端统一错误类型
///
/// 关闭连接时需要把同一个失败原因广播给所有未完成的 waiter，
/// 因此整个枚举实现 `Clone`（IO 错误通过 `Arc` 共享）。
#[derive(Debug, Clone, Error)]
pub enum RedisError {
    /// 传输层 IO 错误（读、写或连接建立失败），对连接是致命的
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// RESP 帧格式错误（非法前缀、非法长度等），对连接是致命的
    #[error("RESP protocol error: {0}")]
    Protocol(String),

    /// 服务端返回的错误响应（`-ERR ...`），只影响当前命令
    #[error("server error: {code} {message}")]
    Server { code: String, message: String },

    /// 响应类型与解析器期望的 RESP 形状不匹配，只影响当前命令
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// map 解析时出现重复的 key
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// EXEC 返回了 NilArray：被 WATCH 的 key 发生了变化
    #[error("transaction failed, watched keys have been changed")]
    TransactionFailed,

    /// 事务被显式 DISCARD
    #[error("transaction has been discarded")]
    TransactionDiscarded,

    /// 事务排队阶段收到了非 QUEUED 响应，整个事务被放弃
    #[error("transaction aborted: {0}")]
    TransactionAborted(Box<RedisError>),

    /// 在有未完成事务的情况下调用了 QUIT
    #[error("QUIT was called on this connection")]
    QuitCalled,

    /// 事务 API 使用错误（嵌套 MULTI、没有 MULTI 的 EXEC 等）
    #[error("transaction misuse: {0}")]
    TransactionMisuse(&'static str),

    /// EXEC 的结果数量与排队的命令数量不一致，状态机已无法配对，
    /// 对连接是致命的
    #[error("EXEC returned {received} results for {expected} queued commands")]
    FramingMismatch { expected: usize, received: usize },

    /// 对已关闭的连接提交命令
    #[error("connection is closed")]
    ConnectionClosed,

    /// 对仍在池中的连接提交命令
    #[error("connection is in pool")]
    ConnectionInPool,

    /// 连接状态不允许归还连接池
    #[error("cannot return connection to pool: {0}")]
    CannotReturnToPool(&'static str),

    /// 连接池已经关闭
    #[error("pool has been shut down")]
    PoolShutDown,

    /// 等待响应超时（waiter 仍保留在队列中，稍后被静默满足）
    #[error("request timed out")]
    Timeout,
}

impl RedisError {
    /// 致命错误会关闭连接；其余错误仅上报给对应命令的 waiter
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RedisError::Io(_) | RedisError::Protocol(_) | RedisError::FramingMismatch { .. }
        )
    }
}

impl From<std::io::Error> for RedisError {
    fn from(err: std::io::Error) -> Self {
        RedisError::Io(Arc::new(err))
    }
}
