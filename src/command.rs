//! 命令操作码表与命令值
//!
//! 操作码以大写 ASCII 名称上线；双词命令（`CLIENT SETNAME` 等）的
//! 空格是参数边界，编码时拆成两个独立的 bulk string。
//! 每个命令的参数序列由命令包装层构造，这里只负责承载。

use std::fmt;

/// 通过一张数据表定义操作码枚举和线上名称
macro_rules! commands {
    ($($variant:ident => $name:literal,)*) => {
        /// 支持的命令操作码
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Command {
            $($variant,)*
        }

        impl Command {
            /// 线上名称；双词命令内嵌一个空格
            pub fn name(self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)*
                }
            }
        }
    };
}

commands! {
    // 连接
    Auth => "AUTH",
    ClientGetname => "CLIENT GETNAME",
    ClientPause => "CLIENT PAUSE",
    ClientSetname => "CLIENT SETNAME",
    Echo => "ECHO",
    Ping => "PING",
    Quit => "QUIT",
    Select => "SELECT",
    // 服务器
    Dbsize => "DBSIZE",
    Flushall => "FLUSHALL",
    // 键空间
    Del => "DEL",
    Dump => "DUMP",
    Exists => "EXISTS",
    Expire => "EXPIRE",
    Expireat => "EXPIREAT",
    Keys => "KEYS",
    Migrate => "MIGRATE",
    Move => "MOVE",
    ObjectEncoding => "OBJECT ENCODING",
    ObjectFreq => "OBJECT FREQ",
    ObjectIdletime => "OBJECT IDLETIME",
    ObjectRefcount => "OBJECT REFCOUNT",
    Persist => "PERSIST",
    Pexpire => "PEXPIRE",
    Pexpireat => "PEXPIREAT",
    Pttl => "PTTL",
    Randomkey => "RANDOMKEY",
    Rename => "RENAME",
    Renamenx => "RENAMENX",
    Restore => "RESTORE",
    Scan => "SCAN",
    Sort => "SORT",
    Touch => "TOUCH",
    Ttl => "TTL",
    Type => "TYPE",
    Unlink => "UNLINK",
    Wait => "WAIT",
    // 字符串
    Append => "APPEND",
    Bitcount => "BITCOUNT",
    Bitop => "BITOP",
    Bitpos => "BITPOS",
    Decr => "DECR",
    Decrby => "DECRBY",
    Get => "GET",
    Getbit => "GETBIT",
    Getrange => "GETRANGE",
    Getset => "GETSET",
    Incr => "INCR",
    Incrby => "INCRBY",
    Incrbyfloat => "INCRBYFLOAT",
    Mget => "MGET",
    Mset => "MSET",
    Msetnx => "MSETNX",
    Psetex => "PSETEX",
    Set => "SET",
    Setbit => "SETBIT",
    Setex => "SETEX",
    Setnx => "SETNX",
    Setrange => "SETRANGE",
    Strlen => "STRLEN",
    // 列表
    Blpop => "BLPOP",
    Brpop => "BRPOP",
    Brpoplpush => "BRPOPLPUSH",
    Lindex => "LINDEX",
    Linsert => "LINSERT",
    Llen => "LLEN",
    Lpop => "LPOP",
    Lpos => "LPOS",
    Lpush => "LPUSH",
    Lpushx => "LPUSHX",
    Lrange => "LRANGE",
    Lrem => "LREM",
    Lset => "LSET",
    Ltrim => "LTRIM",
    Rpop => "RPOP",
    Rpoplpush => "RPOPLPUSH",
    Rpush => "RPUSH",
    Rpushx => "RPUSHX",
    // 集合
    Sadd => "SADD",
    Scard => "SCARD",
    Sdiff => "SDIFF",
    Sdiffstore => "SDIFFSTORE",
    Sinter => "SINTER",
    Sinterstore => "SINTERSTORE",
    Sismember => "SISMEMBER",
    Smembers => "SMEMBERS",
    Smove => "SMOVE",
    Spop => "SPOP",
    Srandmember => "SRANDMEMBER",
    Srem => "SREM",
    Sscan => "SSCAN",
    Sunion => "SUNION",
    Sunionstore => "SUNIONSTORE",
    // 哈希
    Hdel => "HDEL",
    Hexists => "HEXISTS",
    Hget => "HGET",
    Hgetall => "HGETALL",
    Hincrby => "HINCRBY",
    Hincrbyfloat => "HINCRBYFLOAT",
    Hkeys => "HKEYS",
    Hlen => "HLEN",
    Hmget => "HMGET",
    Hmset => "HMSET",
    Hscan => "HSCAN",
    Hset => "HSET",
    Hsetnx => "HSETNX",
    Hstrlen => "HSTRLEN",
    Hvals => "HVALS",
    // 有序集合
    Bzpopmax => "BZPOPMAX",
    Bzpopmin => "BZPOPMIN",
    Zadd => "ZADD",
    Zcard => "ZCARD",
    Zcount => "ZCOUNT",
    Zincrby => "ZINCRBY",
    Zinterstore => "ZINTERSTORE",
    Zlexcount => "ZLEXCOUNT",
    Zpopmax => "ZPOPMAX",
    Zpopmin => "ZPOPMIN",
    Zrange => "ZRANGE",
    Zrangebylex => "ZRANGEBYLEX",
    Zrangebyscore => "ZRANGEBYSCORE",
    Zrank => "ZRANK",
    Zrem => "ZREM",
    Zremrangebylex => "ZREMRANGEBYLEX",
    Zremrangebyrank => "ZREMRANGEBYRANK",
    Zremrangebyscore => "ZREMRANGEBYSCORE",
    Zrevrange => "ZREVRANGE",
    Zrevrangebylex => "ZREVRANGEBYLEX",
    Zrevrangebyscore => "ZREVRANGEBYSCORE",
    Zrevrank => "ZREVRANK",
    Zscan => "ZSCAN",
    Zscore => "ZSCORE",
    Zunionstore => "ZUNIONSTORE",
    // HyperLogLog
    Pfadd => "PFADD",
    Pfcount => "PFCOUNT",
    Pfmerge => "PFMERGE",
    // 地理位置
    Geoadd => "GEOADD",
    Geodist => "GEODIST",
    Geohash => "GEOHASH",
    Geopos => "GEOPOS",
    Georadius => "GEORADIUS",
    Georadiusbymember => "GEORADIUSBYMEMBER",
    // 事务
    Discard => "DISCARD",
    Exec => "EXEC",
    Multi => "MULTI",
    Unwatch => "UNWATCH",
    Watch => "WATCH",
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一条待发送的命令：操作码加上有序的二进制参数序列
///
/// 构造完成后不可变；参数保持原始字节，编码器不做二次转码。
#[derive(Debug, Clone, PartialEq)]
pub struct RedisCommand {
    command: Command,
    arguments: Vec<Vec<u8>>,
}

impl RedisCommand {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            arguments: Vec::new(),
        }
    }

    /// 追加一个二进制参数
    pub fn arg(mut self, argument: impl Into<Vec<u8>>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// 追加一组二进制参数
    pub fn args<I, A>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn arguments(&self) -> &[Vec<u8>] {
        &self.arguments
    }
}

impl fmt::Display for RedisCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command.name())?;
        for argument in &self.arguments {
            write!(f, " {}", String::from_utf8_lossy(argument))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_word_name() {
        assert_eq!(Command::ClientSetname.name(), "CLIENT SETNAME");
        assert_eq!(Command::ObjectEncoding.name(), "OBJECT ENCODING");
    }

    #[test]
    fn test_command_display() {
        let command = RedisCommand::new(Command::Set).arg("key").arg("value");
        assert_eq!(command.to_string(), "SET key value");
    }
}
