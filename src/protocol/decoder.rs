//! RESP 响应解码器
//!
//! 可恢复的增量解码：缓冲区里的数据不足一个完整帧时返回
//! `Ok(None)`，下一个字节块到达后从头重试；只有解析出完整帧才消费
//! 缓冲区。任何格式错误（非法前缀、非法长度、除 -1 以外的负长度）
//! 都是致命的协议错误。

use bytes::{Buf, BytesMut};

use crate::error::RedisError;
use crate::response::RedisResponse;

/// 默认最大帧大小：512MB，防止恶意长度前缀耗尽内存
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// 数组元素数量上限
const MAX_ARRAY_ELEMENTS: i64 = 1024 * 1024;

/// 数组嵌套深度上限
const MAX_DEPTH: usize = 64;

/// RESP2 解码器
///
/// 解码器本身无状态，半帧数据留在调用方的缓冲区里。
#[derive(Debug, Clone)]
pub struct RespDecoder {
    max_frame_size: usize,
}

impl Default for RespDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RespDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// 尝试从缓冲区头部解出一个完整响应
    ///
    /// 成功时消费对应字节并返回 `Ok(Some(..))`；数据不足返回
    /// `Ok(None)`，缓冲区保持原样。
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<RedisResponse>, RedisError> {
        let mut pos = 0;
        match self.parse_value(buf, &mut pos, 0)? {
            Some(response) => {
                buf.advance(pos);
                Ok(Some(response))
            }
            None => {
                if buf.len() > self.max_frame_size {
                    return Err(RedisError::Protocol(format!(
                        "frame exceeds {} bytes",
                        self.max_frame_size
                    )));
                }
                Ok(None)
            }
        }
    }

    fn parse_value(
        &self,
        data: &[u8],
        pos: &mut usize,
        depth: usize,
    ) -> Result<Option<RedisResponse>, RedisError> {
        if depth > MAX_DEPTH {
            return Err(RedisError::Protocol(format!(
                "array nesting deeper than {}",
                MAX_DEPTH
            )));
        }

        let Some(line) = read_line(data, pos)? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Err(RedisError::Protocol("empty frame line".to_string()));
        }

        let prefix = line[0];
        let rest = &line[1..];
        match prefix {
            b'+' => {
                let text = std::str::from_utf8(rest)
                    .map_err(|_| RedisError::Protocol("simple string is not UTF-8".to_string()))?;
                Ok(Some(RedisResponse::SimpleString(text.to_string())))
            }
            b'-' => {
                let text = String::from_utf8_lossy(rest);
                // 第一个空白之前是错误码
                let (code, message) = match text.split_once(' ') {
                    Some((code, message)) => (code.to_string(), message.to_string()),
                    None => (text.to_string(), String::new()),
                };
                Ok(Some(RedisResponse::Error { code, message }))
            }
            b':' => {
                let value = parse_integer(rest)?;
                Ok(Some(RedisResponse::Integer(value)))
            }
            b'$' => {
                let len = parse_integer(rest)?;
                if len == -1 {
                    return Ok(Some(RedisResponse::Nil));
                }
                if len < 0 {
                    return Err(RedisError::Protocol(format!(
                        "invalid bulk string length: {}",
                        len
                    )));
                }
                let len = len as usize;
                if len > self.max_frame_size {
                    return Err(RedisError::Protocol(format!(
                        "bulk string of {} bytes exceeds frame limit",
                        len
                    )));
                }
                // 数据 + 结尾 CRLF
                if data.len() - *pos < len + 2 {
                    return Ok(None);
                }
                let bytes = data[*pos..*pos + len].to_vec();
                if &data[*pos + len..*pos + len + 2] != b"\r\n" {
                    return Err(RedisError::Protocol(
                        "bulk string is not terminated by CRLF".to_string(),
                    ));
                }
                *pos += len + 2;
                Ok(Some(RedisResponse::Bulk(bytes)))
            }
            b'*' => {
                let count = parse_integer(rest)?;
                if count == -1 {
                    return Ok(Some(RedisResponse::NilArray));
                }
                if count < 0 {
                    return Err(RedisError::Protocol(format!(
                        "invalid array length: {}",
                        count
                    )));
                }
                if count > MAX_ARRAY_ELEMENTS {
                    return Err(RedisError::Protocol(format!(
                        "array of {} elements exceeds limit",
                        count
                    )));
                }
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    match self.parse_value(data, pos, depth + 1)? {
                        Some(item) => items.push(item),
                        None => return Ok(None),
                    }
                }
                Ok(Some(RedisResponse::Array(items)))
            }
            other => Err(RedisError::Protocol(format!(
                "unknown frame prefix: 0x{:02x}",
                other
            ))),
        }
    }
}

/// 读取一行（到 CRLF 为止），不足一行返回 `None`
fn read_line<'a>(data: &'a [u8], pos: &mut usize) -> Result<Option<&'a [u8]>, RedisError> {
    let start = *pos;
    let Some(offset) = data[start..].iter().position(|&b| b == b'\n') else {
        return Ok(None);
    };
    let end = start + offset;
    if end == start || data[end - 1] != b'\r' {
        return Err(RedisError::Protocol(
            "frame line is not terminated by CRLF".to_string(),
        ));
    }
    *pos = end + 1;
    Ok(Some(&data[start..end - 1]))
}

fn parse_integer(bytes: &[u8]) -> Result<i64, RedisError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            RedisError::Protocol(format!("invalid integer: {}", String::from_utf8_lossy(bytes)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(data: &[u8]) -> Result<Option<RedisResponse>, RedisError> {
        let mut buf = BytesMut::from(data);
        RespDecoder::new().decode(&mut buf)
    }

    #[test]
    fn test_decode_simple_string() {
        let response = decode_one(b"+OK\r\n").unwrap().unwrap();
        assert_eq!(response, RedisResponse::SimpleString("OK".to_string()));
    }

    #[test]
    fn test_decode_error_splits_code() {
        let response = decode_one(b"-ERR unknown command\r\n").unwrap().unwrap();
        assert_eq!(
            response,
            RedisResponse::Error {
                code: "ERR".to_string(),
                message: "unknown command".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_error_without_message() {
        let response = decode_one(b"-OOM\r\n").unwrap().unwrap();
        assert_eq!(
            response,
            RedisResponse::Error {
                code: "OOM".to_string(),
                message: String::new(),
            }
        );
    }

    #[test]
    fn test_decode_integer() {
        assert_eq!(
            decode_one(b":-42\r\n").unwrap().unwrap(),
            RedisResponse::Integer(-42)
        );
    }

    #[test]
    fn test_decode_bulk_and_nil() {
        assert_eq!(
            decode_one(b"$5\r\nhello\r\n").unwrap().unwrap(),
            RedisResponse::Bulk(b"hello".to_vec())
        );
        assert_eq!(decode_one(b"$-1\r\n").unwrap().unwrap(), RedisResponse::Nil);
    }

    #[test]
    fn test_decode_binary_bulk() {
        // bulk 内容允许包含 CRLF，按长度读取
        assert_eq!(
            decode_one(b"$4\r\na\r\nb\r\n").unwrap().unwrap(),
            RedisResponse::Bulk(b"a\r\nb".to_vec())
        );
    }

    #[test]
    fn test_decode_nested_array() {
        let response = decode_one(b"*2\r\n*2\r\n:1\r\n:2\r\n$1\r\nx\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            response,
            RedisResponse::Array(vec![
                RedisResponse::Array(vec![RedisResponse::Integer(1), RedisResponse::Integer(2)]),
                RedisResponse::Bulk(b"x".to_vec()),
            ])
        );
    }

    #[test]
    fn test_decode_nil_array() {
        assert_eq!(
            decode_one(b"*-1\r\n").unwrap().unwrap(),
            RedisResponse::NilArray
        );
    }

    #[test]
    fn test_decode_resumes_after_short_read() {
        let decoder = RespDecoder::new();
        let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        // 半帧保持在缓冲区里
        assert_eq!(&buf[..], b"$5\r\nhel");

        buf.extend_from_slice(b"lo\r\n+OK\r\n");
        assert_eq!(
            decoder.decode(&mut buf).unwrap().unwrap(),
            RedisResponse::Bulk(b"hello".to_vec())
        );
        assert_eq!(
            decoder.decode(&mut buf).unwrap().unwrap(),
            RedisResponse::SimpleString("OK".to_string())
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_array_resumes_mid_element() {
        let decoder = RespDecoder::new();
        let mut buf = BytesMut::from(&b"*2\r\n:1\r\n"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b":2\r\n");
        assert_eq!(
            decoder.decode(&mut buf).unwrap().unwrap(),
            RedisResponse::Array(vec![RedisResponse::Integer(1), RedisResponse::Integer(2)])
        );
    }

    #[test]
    fn test_decode_unknown_prefix() {
        assert!(matches!(
            decode_one(b"?what\r\n"),
            Err(RedisError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_negative_length() {
        assert!(matches!(
            decode_one(b"$-2\r\n"),
            Err(RedisError::Protocol(_))
        ));
        assert!(matches!(
            decode_one(b"*-2\r\n"),
            Err(RedisError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_missing_crlf_after_bulk() {
        assert!(matches!(
            decode_one(b"$2\r\nabXY"),
            Err(RedisError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_frame_too_large() {
        let decoder = RespDecoder::with_max_frame_size(16);
        let mut buf = BytesMut::from(&b"$9999\r\n"[..]);
        assert!(matches!(
            decoder.decode(&mut buf),
            Err(RedisError::Protocol(_))
        ));
    }

    #[test]
    fn test_command_encoding_round_trips() {
        // 编码出去的命令解回来还是同样的操作码和参数字节
        use crate::command::{Command, RedisCommand};
        use crate::protocol::encode_command;

        let command = RedisCommand::new(Command::ClientSetname)
            .arg(vec![0x00u8, 0xff, b'\r', b'\n'])
            .arg("plain");
        let mut buf = BytesMut::new();
        encode_command(&command, &mut buf);

        let decoded = RespDecoder::new().decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        assert_eq!(
            decoded,
            RedisResponse::Array(vec![
                RedisResponse::Bulk(b"CLIENT".to_vec()),
                RedisResponse::Bulk(b"SETNAME".to_vec()),
                RedisResponse::Bulk(vec![0x00, 0xff, b'\r', b'\n']),
                RedisResponse::Bulk(b"plain".to_vec()),
            ])
        );
    }

    #[test]
    fn test_decoded_value_is_self_contained() {
        let decoder = RespDecoder::new();
        let mut buf = BytesMut::from(&b"$3\r\nabc\r\n"[..]);
        let response = decoder.decode(&mut buf).unwrap().unwrap();
        drop(buf);
        assert_eq!(response, RedisResponse::Bulk(b"abc".to_vec()));
    }
}
