//! RESP 响应值
//!
//! 解码器产出的响应是完全自持有的标签值，不引用输入缓冲区。
//! 数组元素保持嵌套的 `Array(Vec<RedisResponse>)` 表示，
//! 下游通过模式匹配访问器取出期望的形状。

use std::fmt;

use crate::error::RedisError;

/// 服务端响应的五种 RESP2 形状
#[derive(Debug, Clone, PartialEq)]
pub enum RedisResponse {
    /// `+OK\r\n`
    SimpleString(String),
    /// `-ERR message\r\n`，按第一个空白拆为错误码和消息
    Error { code: String, message: String },
    /// `:123\r\n`
    Integer(i64),
    /// `$5\r\nhello\r\n`
    Bulk(Vec<u8>),
    /// `$-1\r\n`
    Nil,
    /// `*2\r\n...`
    Array(Vec<RedisResponse>),
    /// `*-1\r\n`
    NilArray,
}

impl RedisResponse {
    /// 响应形状的名称，用于错误消息
    pub fn kind(&self) -> &'static str {
        match self {
            RedisResponse::SimpleString(_) => "simple string",
            RedisResponse::Error { .. } => "error",
            RedisResponse::Integer(_) => "integer",
            RedisResponse::Bulk(_) => "bulk string",
            RedisResponse::Nil => "nil",
            RedisResponse::Array(_) => "array",
            RedisResponse::NilArray => "nil array",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, RedisResponse::Nil | RedisResponse::NilArray)
    }

    /// 服务端错误响应转换为 [`RedisError::Server`]
    pub(crate) fn server_error(code: &str, message: &str) -> RedisError {
        RedisError::Server {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// 取出 bulk 字节，其它形状算作响应不匹配
    pub fn into_bytes(self) -> Result<Vec<u8>, RedisError> {
        match self {
            RedisResponse::Bulk(bytes) => Ok(bytes),
            RedisResponse::Error { code, message } => Err(Self::server_error(&code, &message)),
            other => Err(other.unexpected("bulk string")),
        }
    }

    /// 取出整数
    pub fn into_integer(self) -> Result<i64, RedisError> {
        match self {
            RedisResponse::Integer(value) => Ok(value),
            RedisResponse::Error { code, message } => Err(Self::server_error(&code, &message)),
            other => Err(other.unexpected("integer")),
        }
    }

    /// 取出数组元素
    pub fn into_array(self) -> Result<Vec<RedisResponse>, RedisError> {
        match self {
            RedisResponse::Array(items) => Ok(items),
            RedisResponse::Error { code, message } => Err(Self::server_error(&code, &message)),
            other => Err(other.unexpected("array")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> RedisError {
        RedisError::UnexpectedResponse(format!("expected {}, got {}", expected, self.kind()))
    }
}

impl fmt::Display for RedisResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedisResponse::SimpleString(s) => write!(f, "+{}", s),
            RedisResponse::Error { code, message } => write!(f, "-{} {}", code, message),
            RedisResponse::Integer(value) => write!(f, ":{}", value),
            RedisResponse::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            RedisResponse::Nil => write!(f, "(nil)"),
            RedisResponse::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            RedisResponse::NilArray => write!(f, "(nil array)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_match() {
        assert_eq!(
            RedisResponse::Bulk(b"v".to_vec()).into_bytes().unwrap(),
            b"v".to_vec()
        );
        assert_eq!(RedisResponse::Integer(7).into_integer().unwrap(), 7);
    }

    #[test]
    fn test_accessor_mismatch() {
        let err = RedisResponse::Integer(1).into_bytes().unwrap_err();
        assert!(matches!(err, RedisError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_accessor_surfaces_server_error() {
        let response = RedisResponse::Error {
            code: "WRONGTYPE".to_string(),
            message: "Operation against a key holding the wrong kind of value".to_string(),
        };
        assert!(matches!(
            response.into_integer().unwrap_err(),
            RedisError::Server { code, .. } if code == "WRONGTYPE"
        ));
    }
}
