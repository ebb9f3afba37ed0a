//! 集成测试公共设施
//!
//! 提供一个照脚本演出的桩服务器：按步骤读入并解析客户端命令、写出
//! 预先准备的 RESP 字节、或者掐断连接。入站命令全部留档，测试结束
//! 后可以断言线上实际出现过什么。

use anyhow::{anyhow, bail, Result};
use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use redis_lite::{RedisResponse, RespDecoder};

/// 桩服务器脚本的一步
#[allow(dead_code)]
pub enum Step {
    /// 读入并解析 n 条完整的入站命令
    ExpectCommands(usize),
    /// 写出给定字节
    Write(Vec<u8>),
    /// 立刻掐断连接
    Close,
}

impl Step {
    pub fn write(bytes: &[u8]) -> Self {
        Step::Write(bytes.to_vec())
    }
}

/// 单连接桩服务器
pub struct StubServer {
    addr: SocketAddr,
    handle: JoinHandle<Result<Vec<RedisResponse>>>,
}

impl StubServer {
    /// 绑定随机端口并开始等待唯一的一条连接
    pub async fn start(script: Vec<Step>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await?;
            let decoder = RespDecoder::new();
            let mut buf = BytesMut::with_capacity(1024);
            let mut inbound = Vec::new();

            for step in script {
                match step {
                    Step::ExpectCommands(count) => {
                        for _ in 0..count {
                            loop {
                                if let Some(frame) =
                                    decoder.decode(&mut buf).map_err(|e| anyhow!("{e}"))?
                                {
                                    inbound.push(frame);
                                    break;
                                }
                                let read = stream.read_buf(&mut buf).await?;
                                if read == 0 {
                                    bail!("client closed before sending expected commands");
                                }
                            }
                        }
                    }
                    Step::Write(bytes) => {
                        stream.write_all(&bytes).await?;
                        stream.flush().await?;
                    }
                    Step::Close => {
                        drop(stream);
                        return Ok(inbound);
                    }
                }
            }
            Ok(inbound)
        });

        Ok(Self { addr, handle })
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// 等脚本演完，拿到服务器看到的全部入站命令
    pub async fn finish(self) -> Result<Vec<RedisResponse>> {
        self.handle.await?
    }
}

/// 入站命令帧转成便于断言的字符串参数列表
pub fn command_words(frame: &RedisResponse) -> Vec<String> {
    match frame {
        RedisResponse::Array(items) => items
            .iter()
            .map(|item| match item {
                RedisResponse::Bulk(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                other => format!("{}", other),
            })
            .collect(),
        other => vec![format!("{}", other)],
    }
}

/// 测试里按需打开 tracing 输出
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("redis_lite=trace")
        .with_test_writer()
        .try_init();
}
