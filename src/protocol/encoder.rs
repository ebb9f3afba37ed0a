//! RESP 命令编码器
//!
//! 命令统一编码为 bulk string 数组：`*<N>\r\n` 后接每个参数的
//! `$<len>\r\n<bytes>\r\n`。操作码按空格拆词，每个词占一个数组元素，
//! 参数保持原始二进制不做转码。

use bytes::BytesMut;

use crate::command::RedisCommand;

/// 把一条命令完整编码进输出缓冲区
///
/// 命令在任何字节上线之前整体进入缓冲区，保证线上不会出现半条命令。
pub fn encode_command(command: &RedisCommand, dst: &mut BytesMut) {
    let name = command.command().name();
    let words = name.split(' ');
    let word_count = words.clone().count();

    dst.extend_from_slice(b"*");
    dst.extend_from_slice((word_count + command.arguments().len()).to_string().as_bytes());
    dst.extend_from_slice(b"\r\n");

    for word in words {
        write_bulk(dst, word.as_bytes());
    }
    for argument in command.arguments() {
        write_bulk(dst, argument);
    }
}

fn write_bulk(dst: &mut BytesMut, bytes: &[u8]) {
    dst.extend_from_slice(b"$");
    dst.extend_from_slice(bytes.len().to_string().as_bytes());
    dst.extend_from_slice(b"\r\n");
    dst.extend_from_slice(bytes);
    dst.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn encode(command: &RedisCommand) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_command(command, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_encode_no_arguments() {
        let command = RedisCommand::new(Command::Ping);
        assert_eq!(encode(&command), b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn test_encode_with_arguments() {
        let command = RedisCommand::new(Command::Set).arg("key").arg("value");
        assert_eq!(
            encode(&command),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"
        );
    }

    #[test]
    fn test_encode_multi_word_command() {
        // 双词命令的空格是参数边界
        let command = RedisCommand::new(Command::ClientSetname).arg("worker-1");
        assert_eq!(
            encode(&command),
            b"*3\r\n$6\r\nCLIENT\r\n$7\r\nSETNAME\r\n$8\r\nworker-1\r\n"
        );
    }

    #[test]
    fn test_encode_binary_argument() {
        let command = RedisCommand::new(Command::Set)
            .arg("key")
            .arg(vec![0x00u8, 0xff, 0x0d, 0x0a]);
        assert_eq!(
            encode(&command),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$4\r\n\x00\xff\r\n\r\n"
        );
    }
}
