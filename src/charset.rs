//! 连接级文本编码
//!
//! 类型化的字符串解析经过连接配置的编码转换；二进制变体（`*_binary`）
//! 完全绕过编码层。

use serde::{Deserialize, Serialize};

use crate::error::RedisError;

/// 连接使用的文本编码，默认 UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
}

impl Charset {
    /// 字符串编码为字节序列
    ///
    /// Latin-1 下无法映射的字符替换为 `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Latin1 => text
                .chars()
                .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
                .collect(),
        }
    }

    /// 字节序列解码为字符串，解码失败算作响应不匹配
    pub fn decode(&self, bytes: &[u8]) -> Result<String, RedisError> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| {
                RedisError::UnexpectedResponse("response is not valid UTF-8".to_string())
            }),
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_round_trip() {
        let charset = Charset::Utf8;
        let encoded = charset.encode("héllo");
        assert_eq!(charset.decode(&encoded).unwrap(), "héllo");
    }

    #[test]
    fn test_utf8_invalid_decode() {
        assert!(Charset::Utf8.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_latin1_lossy_encode() {
        assert_eq!(Charset::Latin1.encode("héllo"), b"h\xe9llo".to_vec());
        assert_eq!(Charset::Latin1.encode("日本"), b"??".to_vec());
    }

    #[test]
    fn test_latin1_decode_never_fails() {
        assert_eq!(Charset::Latin1.decode(&[0xe9]).unwrap(), "é");
    }
}
