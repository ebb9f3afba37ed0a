//! RESP2 协议编解码
//!
//! 解码器把字节块增量解析为 [`RedisResponse`]，编码器把
//! [`RedisCommand`] 编码为 `*` 数组形式的字节序列。
//! 两个方向都不持有超出半帧缓冲区的状态。

mod decoder;
mod encoder;

pub use decoder::{RespDecoder, DEFAULT_MAX_FRAME_SIZE};
pub use encoder::encode_command;
