//! 消息层
//!
//! 把编解码器适配到一条双工字节流上，只暴露两个操作：发送一条命令、
//! 等待下一条完整响应。消息层不理解流水线和事务，这些由连接状态机
//! 负责。发送端是单生产者（连接的写任务），接收端是单消费者（连接
//! 的收取任务）。

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::command::RedisCommand;
use crate::error::RedisError;
use crate::protocol::{encode_command, RespDecoder};
use crate::response::RedisResponse;

/// 双工消息通道
pub struct RedisMessaging {
    reader: MessagingReader,
    writer: MessagingWriter,
}

impl RedisMessaging {
    /// 在一条双工字节流上建立消息层
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: MessagingReader::new(Box::new(read_half)),
            writer: MessagingWriter::new(Box::new(write_half)),
        }
    }

    /// 发送一条命令并冲刷到传输层
    pub async fn send(&mut self, command: &RedisCommand) -> Result<(), RedisError> {
        self.writer.write_command(command).await?;
        self.writer.flush().await
    }

    /// 等待下一条完整响应
    pub async fn receive(&mut self) -> Result<RedisResponse, RedisError> {
        self.reader.receive().await
    }

    /// 半关闭写方向
    pub async fn send_end_of_stream(&mut self) -> Result<(), RedisError> {
        self.writer.finish().await
    }

    /// 拆成独立的读写两半，分别交给连接的收取任务和写任务
    pub fn into_split(self) -> (MessagingReader, MessagingWriter) {
        (self.reader, self.writer)
    }
}

/// 读方向：字节块累积缓冲区加增量解码
pub struct MessagingReader {
    reader: Box<dyn AsyncRead + Unpin>,
    decoder: RespDecoder,
    buf: BytesMut,
}

impl MessagingReader {
    fn new(reader: Box<dyn AsyncRead + Unpin>) -> Self {
        Self {
            reader,
            decoder: RespDecoder::new(),
            buf: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// 读到一个完整响应为止；对端关闭算作传输错误
    pub async fn receive(&mut self) -> Result<RedisResponse, RedisError> {
        loop {
            if let Some(response) = self.decoder.decode(&mut self.buf)? {
                trace!("received response {}", response);
                return Ok(response);
            }
            let n = self.reader.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )
                .into());
            }
        }
    }
}

/// 写方向：每条命令整体编码后写出，保证命令原子性
pub struct MessagingWriter {
    writer: Box<dyn AsyncWrite + Unpin>,
    buf: BytesMut,
}

impl MessagingWriter {
    fn new(writer: Box<dyn AsyncWrite + Unpin>) -> Self {
        Self {
            writer,
            buf: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// 编码并写出一条命令，不冲刷
    pub async fn write_command(&mut self, command: &RedisCommand) -> Result<(), RedisError> {
        self.buf.clear();
        encode_command(command, &mut self.buf);
        self.writer.write_all(&self.buf).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), RedisError> {
        self.writer.flush().await?;
        Ok(())
    }

    /// 冲刷并半关闭写方向
    pub async fn finish(&mut self) -> Result<(), RedisError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_receive_single_response() {
        let stream = Builder::new().read(b"+PONG\r\n").build();
        let mut messaging = RedisMessaging::new(stream);
        let response = messaging.receive().await.unwrap();
        assert_eq!(response, RedisResponse::SimpleString("PONG".to_string()));
    }

    #[tokio::test]
    async fn test_receive_resumes_across_chunks() {
        let stream = Builder::new().read(b"$5\r\nhe").read(b"llo\r\n").build();
        let mut messaging = RedisMessaging::new(stream);
        let response = messaging.receive().await.unwrap();
        assert_eq!(response, RedisResponse::Bulk(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_receive_eof_is_transport_error() {
        let stream = Builder::new().read(b"$5\r\nhe").build();
        let mut messaging = RedisMessaging::new(stream);
        assert!(matches!(
            messaging.receive().await,
            Err(RedisError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_send_writes_full_command() {
        let stream = Builder::new()
            .write(b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n")
            .build();
        let mut messaging = RedisMessaging::new(stream);
        let command = RedisCommand::new(Command::Get).arg("key");
        messaging.send(&command).await.unwrap();
    }
}
