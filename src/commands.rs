//! 类型化命令层
//!
//! 每个命令都是一屏以内的薄包装：构造 [`RedisCommand`]、挑选解析器、
//! 经状态机入队。提交发生在调用时（返回的 future 只负责等响应），
//! 因此连续调用多个命令再一起 await 就得到流水线。
//!
//! 字符串参数经过连接编码转换；`*_binary` 变体接受并返回原始字节，
//! 完全绕过编码层。互斥修饰符组合的校验是 debug 断言。

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use crate::command::{Command, RedisCommand};
use crate::connection::RedisConnection;
use crate::error::RedisError;
use crate::modifier::{
    append_all, check_georadius_modifiers, check_migrate_modifiers, check_scan_modifiers,
    check_set_modifiers, check_sort_modifiers, check_zadd_modifiers, seconds_argument, Aggregate,
    BitOperator, GeoOrigin, GeoradiusModifier, InsertPosition, LexInterval, LposModifier,
    MigrateModifier, RestoreModifier, ScanModifier, ScoreInterval, SetModifier, SortModifier,
    DistanceUnit, ZaddModifier,
};
use crate::parse;
use crate::types::{
    Coordinate, GeoradiusResult, ListPopResult, RedisEncoding, RedisType, ScanResult,
    SetBlockingPopResult, SetPopResult,
};

fn number(value: impl ToString) -> Vec<u8> {
    value.to_string().into_bytes()
}

impl RedisConnection {
    fn text(&self, text: &str) -> Vec<u8> {
        self.charset().encode(text)
    }

    fn texts(&self, texts: &[&str]) -> Vec<Vec<u8>> {
        texts.iter().map(|text| self.text(text)).collect()
    }

    // === 连接 ===

    pub fn auth(self: &Rc<Self>, password: &str) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Auth).arg(self.text(password));
        self.send(command, parse::expect_ok)
    }

    pub fn auth_with_username(
        self: &Rc<Self>,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Auth)
            .arg(self.text(username))
            .arg(self.text(password));
        self.send(command, parse::expect_ok)
    }

    pub fn client_setname(
        self: &Rc<Self>,
        connection_name: &str,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::ClientSetname).arg(self.text(connection_name));
        self.send(command, parse::expect_ok)
    }

    pub fn client_getname(
        self: &Rc<Self>,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        self.send(RedisCommand::new(Command::ClientGetname), move |response| {
            parse::bulk_string(response, charset)
        })
    }

    pub fn client_pause(
        self: &Rc<Self>,
        pause: Duration,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::ClientPause).arg(number(pause.as_millis()));
        self.send(command, parse::expect_ok)
    }

    pub fn echo(self: &Rc<Self>, message: &str) -> impl Future<Output = Result<String, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Echo).arg(self.text(message));
        self.send(command, move |response| {
            parse::required(parse::bulk_string(response, charset)?)
        })
    }

    pub fn ping(self: &Rc<Self>) -> impl Future<Output = Result<String, RedisError>> {
        let charset = self.charset();
        self.send(RedisCommand::new(Command::Ping), move |response| {
            parse::required(parse::string(response, charset)?)
        })
    }

    pub fn ping_message(
        self: &Rc<Self>,
        message: &str,
    ) -> impl Future<Output = Result<String, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Ping).arg(self.text(message));
        self.send(command, move |response| {
            parse::required(parse::string(response, charset)?)
        })
    }

    pub fn select(self: &Rc<Self>, db_index: u32) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Select).arg(number(db_index));
        self.send(command, parse::expect_ok)
    }

    // === 服务器 ===

    pub fn dbsize(self: &Rc<Self>) -> impl Future<Output = Result<i64, RedisError>> {
        self.send(RedisCommand::new(Command::Dbsize), parse::integer)
    }

    pub fn flushall(self: &Rc<Self>, background: bool) -> impl Future<Output = Result<(), RedisError>> {
        let mut command = RedisCommand::new(Command::Flushall);
        if background {
            command = command.arg(b"ASYNC".to_vec());
        }
        self.send(command, parse::expect_ok)
    }

    // === 键空间 ===

    pub fn del(self: &Rc<Self>, keys: &[&str]) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Del).args(self.texts(keys));
        self.send(command, parse::integer)
    }

    pub fn dump(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Dump).arg(self.text(key));
        self.send(command, parse::bulk)
    }

    pub fn exists(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Exists).arg(self.text(key));
        self.send(command, parse::boolean)
    }

    /// 多 key 形式：返回存在的 key 数量（重复的 key 重复计数）
    pub fn exists_count(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Exists).args(self.texts(keys));
        self.send(command, parse::integer)
    }

    pub fn expire(
        self: &Rc<Self>,
        key: &str,
        ttl_seconds: i64,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Expire)
            .arg(self.text(key))
            .arg(number(ttl_seconds));
        self.send(command, parse::boolean)
    }

    pub fn expireat(
        self: &Rc<Self>,
        key: &str,
        unix_timestamp_seconds: i64,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Expireat)
            .arg(self.text(key))
            .arg(number(unix_timestamp_seconds));
        self.send(command, parse::boolean)
    }

    pub fn keys(
        self: &Rc<Self>,
        pattern: &str,
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Keys).arg(self.text(pattern));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    /// 迁移一个 key（或配合 `KEYS` 修饰符迁移多个）到另一个实例
    ///
    /// 解析为是否实际迁移了数据：`+OK` 为 `true`，`+NOKEY` 为 `false`。
    pub fn migrate(
        self: &Rc<Self>,
        host: &str,
        port: u16,
        key: Option<&str>,
        destination_db: u32,
        timeout: Duration,
        modifiers: &[MigrateModifier],
    ) -> impl Future<Output = Result<bool, RedisError>> {
        check_migrate_modifiers(key.is_none(), modifiers);

        let mut arguments = vec![
            self.text(host),
            number(port),
            self.text(key.unwrap_or("")),
            number(destination_db),
            number(timeout.as_millis()),
        ];
        append_all(modifiers, self.charset(), &mut arguments);
        let command = RedisCommand::new(Command::Migrate).args(arguments);
        self.send(command, parse::ok_or_nokey)
    }

    pub fn move_key(
        self: &Rc<Self>,
        key: &str,
        db_index: u32,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Move)
            .arg(self.text(key))
            .arg(number(db_index));
        self.send(command, parse::boolean)
    }

    pub fn object_encoding(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<RedisEncoding>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::ObjectEncoding).arg(self.text(key));
        self.send(command, move |response| {
            parse::object_encoding(response, charset)
        })
    }

    pub fn object_freq(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<i64>, RedisError>> {
        let command = RedisCommand::new(Command::ObjectFreq).arg(self.text(key));
        self.send(command, parse::nullable_integer)
    }

    pub fn object_idletime(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<i64>, RedisError>> {
        let command = RedisCommand::new(Command::ObjectIdletime).arg(self.text(key));
        self.send(command, parse::nullable_integer)
    }

    pub fn object_refcount(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<i64>, RedisError>> {
        let command = RedisCommand::new(Command::ObjectRefcount).arg(self.text(key));
        self.send(command, parse::nullable_integer)
    }

    pub fn persist(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Persist).arg(self.text(key));
        self.send(command, parse::boolean)
    }

    pub fn pexpire(
        self: &Rc<Self>,
        key: &str,
        ttl_millis: i64,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Pexpire)
            .arg(self.text(key))
            .arg(number(ttl_millis));
        self.send(command, parse::boolean)
    }

    pub fn pexpireat(
        self: &Rc<Self>,
        key: &str,
        unix_timestamp_millis: i64,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Pexpireat)
            .arg(self.text(key))
            .arg(number(unix_timestamp_millis));
        self.send(command, parse::boolean)
    }

    pub fn pttl(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Pttl).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn randomkey(
        self: &Rc<Self>,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        self.send(RedisCommand::new(Command::Randomkey), move |response| {
            parse::bulk_string(response, charset)
        })
    }

    pub fn rename(
        self: &Rc<Self>,
        key: &str,
        new_key: &str,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Rename)
            .arg(self.text(key))
            .arg(self.text(new_key));
        self.send(command, parse::expect_ok)
    }

    pub fn renamenx(
        self: &Rc<Self>,
        key: &str,
        new_key: &str,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Renamenx)
            .arg(self.text(key))
            .arg(self.text(new_key));
        self.send(command, parse::boolean)
    }

    pub fn restore(
        self: &Rc<Self>,
        key: &str,
        ttl_millis: u64,
        dump: impl AsRef<[u8]>,
        modifiers: &[RestoreModifier],
    ) -> impl Future<Output = Result<(), RedisError>> {
        let mut arguments = vec![
            self.text(key),
            number(ttl_millis),
            dump.as_ref().to_vec(),
        ];
        append_all(modifiers, self.charset(), &mut arguments);
        let command = RedisCommand::new(Command::Restore).args(arguments);
        self.send(command, parse::expect_ok)
    }

    pub fn scan(
        self: &Rc<Self>,
        cursor: &str,
        modifiers: &[ScanModifier],
    ) -> impl Future<Output = Result<ScanResult, RedisError>> {
        self.do_scan(Command::Scan, None, cursor, None, modifiers)
    }

    pub fn scan_of_type(
        self: &Rc<Self>,
        cursor: &str,
        key_type: RedisType,
        modifiers: &[ScanModifier],
    ) -> impl Future<Output = Result<ScanResult, RedisError>> {
        self.do_scan(Command::Scan, None, cursor, Some(key_type), modifiers)
    }

    pub fn sort(
        self: &Rc<Self>,
        key: &str,
        modifiers: &[SortModifier],
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = self.sort_command(key, modifiers, None);
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn sort_binary(
        self: &Rc<Self>,
        key: &str,
        modifiers: &[SortModifier],
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, RedisError>> {
        let command = self.sort_command(key, modifiers, None);
        self.send(command, parse::bytes_list)
    }

    /// SORT ... STORE destination：返回存入目标列表的元素数量
    pub fn sort_store(
        self: &Rc<Self>,
        key: &str,
        destination: &str,
        modifiers: &[SortModifier],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = self.sort_command(key, modifiers, Some(destination));
        self.send(command, parse::integer)
    }

    fn sort_command(
        &self,
        key: &str,
        modifiers: &[SortModifier],
        store: Option<&str>,
    ) -> RedisCommand {
        check_sort_modifiers(modifiers);

        let mut arguments = vec![self.text(key)];
        append_all(modifiers, self.charset(), &mut arguments);
        if let Some(destination) = store {
            arguments.push(b"STORE".to_vec());
            arguments.push(self.text(destination));
        }
        RedisCommand::new(Command::Sort).args(arguments)
    }

    pub fn touch(self: &Rc<Self>, keys: &[&str]) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Touch).args(self.texts(keys));
        self.send(command, parse::integer)
    }

    pub fn ttl(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Ttl).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn key_type(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<RedisType, RedisError>> {
        let command = RedisCommand::new(Command::Type).arg(self.text(key));
        self.send(command, parse::redis_type)
    }

    pub fn unlink(self: &Rc<Self>, keys: &[&str]) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Unlink).args(self.texts(keys));
        self.send(command, parse::integer)
    }

    /// 等待写入传播到指定数量的副本
    pub fn wait(
        self: &Rc<Self>,
        replicas: u32,
        timeout: Duration,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Wait)
            .arg(number(replicas))
            .arg(number(timeout.as_millis()));
        self.send(command, parse::integer)
    }

    // === 字符串 ===

    pub fn append(
        self: &Rc<Self>,
        key: &str,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Append)
            .arg(self.text(key))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::integer)
    }

    pub fn bitcount(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Bitcount).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn bitcount_range(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        end: i64,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Bitcount)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(end));
        self.send(command, parse::integer)
    }

    pub fn bitop(
        self: &Rc<Self>,
        operator: BitOperator,
        destination: &str,
        sources: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(
            operator != BitOperator::Not || sources.len() == 1,
            "BITOP NOT must be called with a single source key"
        );
        let mut arguments = vec![operator.argument().to_vec(), self.text(destination)];
        arguments.extend(self.texts(sources));
        let command = RedisCommand::new(Command::Bitop).args(arguments);
        self.send(command, parse::integer)
    }

    pub fn bitpos(
        self: &Rc<Self>,
        key: &str,
        bit: bool,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Bitpos)
            .arg(self.text(key))
            .arg(if bit { b"1".to_vec() } else { b"0".to_vec() });
        self.send(command, parse::integer)
    }

    pub fn bitpos_range(
        self: &Rc<Self>,
        key: &str,
        bit: bool,
        start: i64,
        end: Option<i64>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let mut command = RedisCommand::new(Command::Bitpos)
            .arg(self.text(key))
            .arg(if bit { b"1".to_vec() } else { b"0".to_vec() })
            .arg(number(start));
        if let Some(end) = end {
            command = command.arg(number(end));
        }
        self.send(command, parse::integer)
    }

    pub fn decr(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Decr).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn decrby(
        self: &Rc<Self>,
        key: &str,
        decrement: i64,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Decrby)
            .arg(self.text(key))
            .arg(number(decrement));
        self.send(command, parse::integer)
    }

    pub fn get(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Get).arg(self.text(key));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn get_binary(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Get).arg(self.text(key));
        self.send(command, parse::bulk)
    }

    pub fn getbit(
        self: &Rc<Self>,
        key: &str,
        offset: u64,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Getbit)
            .arg(self.text(key))
            .arg(number(offset));
        self.send(command, parse::boolean)
    }

    pub fn getrange(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        end: i64,
    ) -> impl Future<Output = Result<String, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Getrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(end));
        self.send(command, move |response| {
            parse::required(parse::bulk_string(response, charset)?)
        })
    }

    pub fn getrange_binary(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        end: i64,
    ) -> impl Future<Output = Result<Vec<u8>, RedisError>> {
        let command = RedisCommand::new(Command::Getrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(end));
        self.send(command, |response| parse::required(parse::bulk(response)?))
    }

    pub fn getset(
        self: &Rc<Self>,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Getset)
            .arg(self.text(key))
            .arg(self.text(value));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn getset_binary(
        self: &Rc<Self>,
        key: &str,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Getset)
            .arg(self.text(key))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::bulk)
    }

    pub fn incr(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Incr).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn incrby(
        self: &Rc<Self>,
        key: &str,
        increment: i64,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Incrby)
            .arg(self.text(key))
            .arg(number(increment));
        self.send(command, parse::integer)
    }

    pub fn incrbyfloat(
        self: &Rc<Self>,
        key: &str,
        increment: f64,
    ) -> impl Future<Output = Result<f64, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Incrbyfloat)
            .arg(self.text(key))
            .arg(number(increment));
        self.send(command, move |response| parse::double(response, charset))
    }

    pub fn mget(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<String>>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Mget).args(self.texts(keys));
        self.send(command, move |response| {
            parse::nullable_strings(response, charset)
        })
    }

    pub fn mget_binary(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<Vec<u8>>>, RedisError>> {
        let command = RedisCommand::new(Command::Mget).args(self.texts(keys));
        self.send(command, parse::nullable_bytes)
    }

    pub fn mset(
        self: &Rc<Self>,
        entries: &[(&str, &str)],
    ) -> impl Future<Output = Result<(), RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to set");
        let mut arguments = Vec::with_capacity(entries.len() * 2);
        for (key, value) in entries {
            arguments.push(self.text(key));
            arguments.push(self.text(value));
        }
        let command = RedisCommand::new(Command::Mset).args(arguments);
        self.send(command, parse::expect_ok)
    }

    pub fn mset_binary(
        self: &Rc<Self>,
        entries: &[(&str, &[u8])],
    ) -> impl Future<Output = Result<(), RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to set");
        let mut arguments = Vec::with_capacity(entries.len() * 2);
        for (key, value) in entries {
            arguments.push(self.text(key));
            arguments.push(value.to_vec());
        }
        let command = RedisCommand::new(Command::Mset).args(arguments);
        self.send(command, parse::expect_ok)
    }

    /// 全部 key 都不存在时才写入
    pub fn msetnx(
        self: &Rc<Self>,
        entries: &[(&str, &str)],
    ) -> impl Future<Output = Result<bool, RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to set");
        let mut arguments = Vec::with_capacity(entries.len() * 2);
        for (key, value) in entries {
            arguments.push(self.text(key));
            arguments.push(self.text(value));
        }
        let command = RedisCommand::new(Command::Msetnx).args(arguments);
        self.send(command, parse::boolean)
    }

    pub fn psetex(
        self: &Rc<Self>,
        key: &str,
        ttl_millis: u64,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Psetex)
            .arg(self.text(key))
            .arg(number(ttl_millis))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::expect_ok)
    }

    /// SET；NX/XX 未命中时解析为 `None`
    pub fn set(
        self: &Rc<Self>,
        key: &str,
        value: &str,
        modifiers: &[SetModifier],
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        self.set_binary(key, self.text(value), modifiers)
    }

    pub fn set_binary(
        self: &Rc<Self>,
        key: &str,
        value: impl AsRef<[u8]>,
        modifiers: &[SetModifier],
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        check_set_modifiers(modifiers);

        let charset = self.charset();
        let mut arguments = vec![self.text(key), value.as_ref().to_vec()];
        append_all(modifiers, charset, &mut arguments);
        let command = RedisCommand::new(Command::Set).args(arguments);
        self.send(command, move |response| parse::string(response, charset))
    }

    /// 返回指定位原来的值
    pub fn setbit(
        self: &Rc<Self>,
        key: &str,
        offset: u64,
        value: bool,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Setbit)
            .arg(self.text(key))
            .arg(number(offset))
            .arg(if value { b"1".to_vec() } else { b"0".to_vec() });
        self.send(command, parse::boolean)
    }

    pub fn setex(
        self: &Rc<Self>,
        key: &str,
        ttl_seconds: u64,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Setex)
            .arg(self.text(key))
            .arg(number(ttl_seconds))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::expect_ok)
    }

    pub fn setnx(
        self: &Rc<Self>,
        key: &str,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Setnx)
            .arg(self.text(key))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::boolean)
    }

    pub fn setrange(
        self: &Rc<Self>,
        key: &str,
        offset: u64,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Setrange)
            .arg(self.text(key))
            .arg(number(offset))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::integer)
    }

    pub fn strlen(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Strlen).arg(self.text(key));
        self.send(command, parse::integer)
    }

    // === 列表 ===

    pub fn blpop(
        self: &Rc<Self>,
        timeout: Duration,
        keys: &[&str],
    ) -> impl Future<Output = Result<Option<ListPopResult>, RedisError>> {
        let charset = self.charset();
        let mut arguments = self.texts(keys);
        arguments.push(seconds_argument(timeout));
        let command = RedisCommand::new(Command::Blpop).args(arguments);
        self.send(command, move |response| {
            parse::list_pop_result(response, charset)
        })
    }

    pub fn brpop(
        self: &Rc<Self>,
        timeout: Duration,
        keys: &[&str],
    ) -> impl Future<Output = Result<Option<ListPopResult>, RedisError>> {
        let charset = self.charset();
        let mut arguments = self.texts(keys);
        arguments.push(seconds_argument(timeout));
        let command = RedisCommand::new(Command::Brpop).args(arguments);
        self.send(command, move |response| {
            parse::list_pop_result(response, charset)
        })
    }

    pub fn brpoplpush(
        self: &Rc<Self>,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Brpoplpush)
            .arg(self.text(source))
            .arg(self.text(destination))
            .arg(seconds_argument(timeout));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn brpoplpush_binary(
        self: &Rc<Self>,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Brpoplpush)
            .arg(self.text(source))
            .arg(self.text(destination))
            .arg(seconds_argument(timeout));
        self.send(command, parse::bulk)
    }

    pub fn lindex(
        self: &Rc<Self>,
        key: &str,
        index: i64,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Lindex)
            .arg(self.text(key))
            .arg(number(index));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn lindex_binary(
        self: &Rc<Self>,
        key: &str,
        index: i64,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Lindex)
            .arg(self.text(key))
            .arg(number(index));
        self.send(command, parse::bulk)
    }

    pub fn linsert(
        self: &Rc<Self>,
        key: &str,
        position: InsertPosition,
        pivot: impl AsRef<[u8]>,
        element: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Linsert)
            .arg(self.text(key))
            .arg(position.argument().to_vec())
            .arg(pivot.as_ref().to_vec())
            .arg(element.as_ref().to_vec());
        self.send(command, parse::integer)
    }

    pub fn llen(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Llen).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn lpop(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Lpop).arg(self.text(key));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn lpop_binary(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Lpop).arg(self.text(key));
        self.send(command, parse::bulk)
    }

    pub fn lpos(
        self: &Rc<Self>,
        key: &str,
        element: impl AsRef<[u8]>,
        modifiers: &[LposModifier],
    ) -> impl Future<Output = Result<Option<i64>, RedisError>> {
        let mut arguments = vec![self.text(key), element.as_ref().to_vec()];
        append_all(modifiers, self.charset(), &mut arguments);
        let command = RedisCommand::new(Command::Lpos).args(arguments);
        self.send(command, parse::nullable_integer)
    }

    /// COUNT 形式：返回最多 `count` 个匹配位置（0 表示全部）
    pub fn lpos_count(
        self: &Rc<Self>,
        key: &str,
        element: impl AsRef<[u8]>,
        count: u64,
        modifiers: &[LposModifier],
    ) -> impl Future<Output = Result<Vec<i64>, RedisError>> {
        let mut arguments = vec![
            self.text(key),
            element.as_ref().to_vec(),
            b"COUNT".to_vec(),
            number(count),
        ];
        append_all(modifiers, self.charset(), &mut arguments);
        let command = RedisCommand::new(Command::Lpos).args(arguments);
        self.send(command, parse::integers)
    }

    pub fn lpush(
        self: &Rc<Self>,
        key: &str,
        elements: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.push_command(Command::Lpush, key, &self.texts(elements))
    }

    pub fn lpush_binary(
        self: &Rc<Self>,
        key: &str,
        elements: &[&[u8]],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let elements: Vec<Vec<u8>> = elements.iter().map(|e| e.to_vec()).collect();
        self.push_command(Command::Lpush, key, &elements)
    }

    pub fn lpushx(
        self: &Rc<Self>,
        key: &str,
        elements: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.push_command(Command::Lpushx, key, &self.texts(elements))
    }

    pub fn rpush(
        self: &Rc<Self>,
        key: &str,
        elements: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.push_command(Command::Rpush, key, &self.texts(elements))
    }

    pub fn rpush_binary(
        self: &Rc<Self>,
        key: &str,
        elements: &[&[u8]],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let elements: Vec<Vec<u8>> = elements.iter().map(|e| e.to_vec()).collect();
        self.push_command(Command::Rpush, key, &elements)
    }

    pub fn rpushx(
        self: &Rc<Self>,
        key: &str,
        elements: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.push_command(Command::Rpushx, key, &self.texts(elements))
    }

    fn push_command(
        self: &Rc<Self>,
        command: Command,
        key: &str,
        elements: &[Vec<u8>],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!elements.is_empty(), "no element to push");
        let mut arguments = vec![self.text(key)];
        arguments.extend(elements.iter().cloned());
        self.send(RedisCommand::new(command).args(arguments), parse::integer)
    }

    pub fn lrange(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Lrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn lrange_binary(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Lrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, parse::bytes_list)
    }

    pub fn lrem(
        self: &Rc<Self>,
        key: &str,
        count: i64,
        element: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Lrem)
            .arg(self.text(key))
            .arg(number(count))
            .arg(element.as_ref().to_vec());
        self.send(command, parse::integer)
    }

    pub fn lset(
        self: &Rc<Self>,
        key: &str,
        index: i64,
        element: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Lset)
            .arg(self.text(key))
            .arg(number(index))
            .arg(element.as_ref().to_vec());
        self.send(command, parse::expect_ok)
    }

    pub fn ltrim(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<(), RedisError>> {
        let command = RedisCommand::new(Command::Ltrim)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, parse::expect_ok)
    }

    pub fn rpop(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Rpop).arg(self.text(key));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn rpop_binary(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Rpop).arg(self.text(key));
        self.send(command, parse::bulk)
    }

    pub fn rpoplpush(
        self: &Rc<Self>,
        source: &str,
        destination: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Rpoplpush)
            .arg(self.text(source))
            .arg(self.text(destination));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn rpoplpush_binary(
        self: &Rc<Self>,
        source: &str,
        destination: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Rpoplpush)
            .arg(self.text(source))
            .arg(self.text(destination));
        self.send(command, parse::bulk)
    }

    // === 集合 ===

    pub fn sadd(
        self: &Rc<Self>,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!members.is_empty(), "no member to add");
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(members));
        self.send(RedisCommand::new(Command::Sadd).args(arguments), parse::integer)
    }

    pub fn sadd_binary(
        self: &Rc<Self>,
        key: &str,
        members: &[&[u8]],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!members.is_empty(), "no member to add");
        let mut arguments = vec![self.text(key)];
        arguments.extend(members.iter().map(|m| m.to_vec()));
        self.send(RedisCommand::new(Command::Sadd).args(arguments), parse::integer)
    }

    pub fn scard(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Scard).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn sdiff(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Sdiff).args(self.texts(keys));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    pub fn sdiff_binary(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<HashSet<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Sdiff).args(self.texts(keys));
        self.send(command, parse::bytes_set)
    }

    pub fn sdiffstore(
        self: &Rc<Self>,
        destination: &str,
        keys: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let mut arguments = vec![self.text(destination)];
        arguments.extend(self.texts(keys));
        self.send(
            RedisCommand::new(Command::Sdiffstore).args(arguments),
            parse::integer,
        )
    }

    pub fn sinter(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Sinter).args(self.texts(keys));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    pub fn sinterstore(
        self: &Rc<Self>,
        destination: &str,
        keys: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let mut arguments = vec![self.text(destination)];
        arguments.extend(self.texts(keys));
        self.send(
            RedisCommand::new(Command::Sinterstore).args(arguments),
            parse::integer,
        )
    }

    pub fn sismember(
        self: &Rc<Self>,
        key: &str,
        member: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Sismember)
            .arg(self.text(key))
            .arg(member.as_ref().to_vec());
        self.send(command, parse::boolean)
    }

    pub fn smembers(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Smembers).arg(self.text(key));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    pub fn smembers_binary(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<HashSet<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Smembers).arg(self.text(key));
        self.send(command, parse::bytes_set)
    }

    pub fn smove(
        self: &Rc<Self>,
        source: &str,
        destination: &str,
        member: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Smove)
            .arg(self.text(source))
            .arg(self.text(destination))
            .arg(member.as_ref().to_vec());
        self.send(command, parse::boolean)
    }

    pub fn spop(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Spop).arg(self.text(key));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn spop_count(
        self: &Rc<Self>,
        key: &str,
        count: u64,
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Spop)
            .arg(self.text(key))
            .arg(number(count));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    pub fn srandmember(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Srandmember).arg(self.text(key));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    /// 负数 `count` 允许重复返回同一成员
    pub fn srandmember_count(
        self: &Rc<Self>,
        key: &str,
        count: i64,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Srandmember)
            .arg(self.text(key))
            .arg(number(count));
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn srem(
        self: &Rc<Self>,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!members.is_empty(), "no member to remove");
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(members));
        self.send(RedisCommand::new(Command::Srem).args(arguments), parse::integer)
    }

    pub fn sscan(
        self: &Rc<Self>,
        key: &str,
        cursor: &str,
        modifiers: &[ScanModifier],
    ) -> impl Future<Output = Result<ScanResult, RedisError>> {
        self.do_scan(Command::Sscan, Some(key), cursor, None, modifiers)
    }

    pub fn sunion(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Sunion).args(self.texts(keys));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    pub fn sunionstore(
        self: &Rc<Self>,
        destination: &str,
        keys: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let mut arguments = vec![self.text(destination)];
        arguments.extend(self.texts(keys));
        self.send(
            RedisCommand::new(Command::Sunionstore).args(arguments),
            parse::integer,
        )
    }

    // === 哈希 ===

    pub fn hdel(
        self: &Rc<Self>,
        key: &str,
        fields: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!fields.is_empty(), "no field to delete");
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(fields));
        self.send(RedisCommand::new(Command::Hdel).args(arguments), parse::integer)
    }

    pub fn hexists(
        self: &Rc<Self>,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Hexists)
            .arg(self.text(key))
            .arg(self.text(field));
        self.send(command, parse::boolean)
    }

    pub fn hget(
        self: &Rc<Self>,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Hget)
            .arg(self.text(key))
            .arg(self.text(field));
        self.send(command, move |response| parse::bulk_string(response, charset))
    }

    pub fn hget_binary(
        self: &Rc<Self>,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Hget)
            .arg(self.text(key))
            .arg(self.text(field));
        self.send(command, parse::bulk)
    }

    pub fn hgetall(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<HashMap<String, String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Hgetall).arg(self.text(key));
        self.send(command, move |response| {
            parse::map(
                response,
                move |bytes| charset.decode(&bytes),
                move |bytes| charset.decode(&bytes),
            )
        })
    }

    pub fn hgetall_binary(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<HashMap<String, Vec<u8>>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Hgetall).arg(self.text(key));
        self.send(command, move |response| {
            parse::map(response, move |bytes| charset.decode(&bytes), Ok)
        })
    }

    pub fn hincrby(
        self: &Rc<Self>,
        key: &str,
        field: &str,
        increment: i64,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Hincrby)
            .arg(self.text(key))
            .arg(self.text(field))
            .arg(number(increment));
        self.send(command, parse::integer)
    }

    pub fn hincrbyfloat(
        self: &Rc<Self>,
        key: &str,
        field: &str,
        increment: f64,
    ) -> impl Future<Output = Result<f64, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Hincrbyfloat)
            .arg(self.text(key))
            .arg(self.text(field))
            .arg(number(increment));
        self.send(command, move |response| parse::double(response, charset))
    }

    pub fn hkeys(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<HashSet<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Hkeys).arg(self.text(key));
        self.send(command, move |response| {
            parse::strings_as_set(response, charset)
        })
    }

    pub fn hlen(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Hlen).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn hmget(
        self: &Rc<Self>,
        key: &str,
        fields: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<String>>, RedisError>> {
        let charset = self.charset();
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(fields));
        let command = RedisCommand::new(Command::Hmget).args(arguments);
        self.send(command, move |response| {
            parse::nullable_strings(response, charset)
        })
    }

    pub fn hmset(
        self: &Rc<Self>,
        key: &str,
        entries: &[(&str, &str)],
    ) -> impl Future<Output = Result<(), RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to set");
        let mut arguments = vec![self.text(key)];
        for (field, value) in entries {
            arguments.push(self.text(field));
            arguments.push(self.text(value));
        }
        self.send(RedisCommand::new(Command::Hmset).args(arguments), parse::expect_ok)
    }

    pub fn hscan(
        self: &Rc<Self>,
        key: &str,
        cursor: &str,
        modifiers: &[ScanModifier],
    ) -> impl Future<Output = Result<ScanResult, RedisError>> {
        self.do_scan(Command::Hscan, Some(key), cursor, None, modifiers)
    }

    /// 返回新建字段的数量
    pub fn hset(
        self: &Rc<Self>,
        key: &str,
        entries: &[(&str, &str)],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to set");
        let mut arguments = vec![self.text(key)];
        for (field, value) in entries {
            arguments.push(self.text(field));
            arguments.push(self.text(value));
        }
        self.send(RedisCommand::new(Command::Hset).args(arguments), parse::integer)
    }

    pub fn hset_binary(
        self: &Rc<Self>,
        key: &str,
        entries: &[(&str, &[u8])],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to set");
        let mut arguments = vec![self.text(key)];
        for (field, value) in entries {
            arguments.push(self.text(field));
            arguments.push(value.to_vec());
        }
        self.send(RedisCommand::new(Command::Hset).args(arguments), parse::integer)
    }

    pub fn hsetnx(
        self: &Rc<Self>,
        key: &str,
        field: &str,
        value: impl AsRef<[u8]>,
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let command = RedisCommand::new(Command::Hsetnx)
            .arg(self.text(key))
            .arg(self.text(field))
            .arg(value.as_ref().to_vec());
        self.send(command, parse::boolean)
    }

    pub fn hstrlen(
        self: &Rc<Self>,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Hstrlen)
            .arg(self.text(key))
            .arg(self.text(field));
        self.send(command, parse::integer)
    }

    pub fn hvals(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Hvals).arg(self.text(key));
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn hvals_binary(
        self: &Rc<Self>,
        key: &str,
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Hvals).arg(self.text(key));
        self.send(command, parse::bytes_list)
    }

    // === 有序集合 ===

    pub fn bzpopmin(
        self: &Rc<Self>,
        timeout: Duration,
        keys: &[&str],
    ) -> impl Future<Output = Result<Option<SetBlockingPopResult>, RedisError>> {
        let charset = self.charset();
        let mut arguments = self.texts(keys);
        arguments.push(seconds_argument(timeout));
        let command = RedisCommand::new(Command::Bzpopmin).args(arguments);
        self.send(command, move |response| {
            parse::set_blocking_pop_result(response, charset)
        })
    }

    pub fn bzpopmax(
        self: &Rc<Self>,
        timeout: Duration,
        keys: &[&str],
    ) -> impl Future<Output = Result<Option<SetBlockingPopResult>, RedisError>> {
        let charset = self.charset();
        let mut arguments = self.texts(keys);
        arguments.push(seconds_argument(timeout));
        let command = RedisCommand::new(Command::Bzpopmax).args(arguments);
        self.send(command, move |response| {
            parse::set_blocking_pop_result(response, charset)
        })
    }

    /// 条目为 (score, member)，按给定顺序上线
    pub fn zadd(
        self: &Rc<Self>,
        key: &str,
        entries: &[(f64, &str)],
        modifiers: &[ZaddModifier],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to add");
        check_zadd_modifiers(modifiers);

        let mut arguments = vec![self.text(key)];
        append_all(modifiers, self.charset(), &mut arguments);
        for (score, member) in entries {
            arguments.push(number(score));
            arguments.push(self.text(member));
        }
        self.send(RedisCommand::new(Command::Zadd).args(arguments), parse::integer)
    }

    pub fn zadd_binary(
        self: &Rc<Self>,
        key: &str,
        entries: &[(f64, &[u8])],
        modifiers: &[ZaddModifier],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!entries.is_empty(), "no entry to add");
        check_zadd_modifiers(modifiers);

        let mut arguments = vec![self.text(key)];
        append_all(modifiers, self.charset(), &mut arguments);
        for (score, member) in entries {
            arguments.push(number(score));
            arguments.push(member.to_vec());
        }
        self.send(RedisCommand::new(Command::Zadd).args(arguments), parse::integer)
    }

    /// ZADD ... INCR：按增量模式写入单个成员，返回新分数
    pub fn zadd_incr(
        self: &Rc<Self>,
        key: &str,
        score: f64,
        member: &str,
        modifiers: &[ZaddModifier],
    ) -> impl Future<Output = Result<f64, RedisError>> {
        check_zadd_modifiers(modifiers);

        let charset = self.charset();
        let mut arguments = vec![self.text(key)];
        append_all(modifiers, charset, &mut arguments);
        arguments.push(b"INCR".to_vec());
        arguments.push(number(score));
        arguments.push(self.text(member));
        self.send(RedisCommand::new(Command::Zadd).args(arguments), move |response| {
            parse::double(response, charset)
        })
    }

    pub fn zcard(self: &Rc<Self>, key: &str) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Zcard).arg(self.text(key));
        self.send(command, parse::integer)
    }

    pub fn zcount(
        self: &Rc<Self>,
        key: &str,
        interval: ScoreInterval,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Zcount)
            .arg(self.text(key))
            .arg(interval.min_argument())
            .arg(interval.max_argument());
        self.send(command, parse::integer)
    }

    pub fn zincrby(
        self: &Rc<Self>,
        key: &str,
        increment: f64,
        member: &str,
    ) -> impl Future<Output = Result<f64, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zincrby)
            .arg(self.text(key))
            .arg(number(increment))
            .arg(self.text(member));
        self.send(command, move |response| parse::double(response, charset))
    }

    pub fn zinterstore(
        self: &Rc<Self>,
        destination: &str,
        keys: &[&str],
        aggregate: Option<Aggregate>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.zstore_command(Command::Zinterstore, destination, keys, aggregate)
    }

    pub fn zunionstore(
        self: &Rc<Self>,
        destination: &str,
        keys: &[&str],
        aggregate: Option<Aggregate>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.zstore_command(Command::Zunionstore, destination, keys, aggregate)
    }

    fn zstore_command(
        self: &Rc<Self>,
        command: Command,
        destination: &str,
        keys: &[&str],
        aggregate: Option<Aggregate>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!keys.is_empty(), "no key specified");
        let mut arguments = vec![self.text(destination), number(keys.len())];
        arguments.extend(self.texts(keys));
        if let Some(aggregate) = aggregate {
            arguments.push(b"AGGREGATE".to_vec());
            arguments.push(aggregate.argument().to_vec());
        }
        self.send(RedisCommand::new(command).args(arguments), parse::integer)
    }

    /// 带权重的形式；条目为 (key, weight)
    pub fn zinterstore_weighted(
        self: &Rc<Self>,
        destination: &str,
        entries: &[(&str, f64)],
        aggregate: Option<Aggregate>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.zstore_weighted_command(Command::Zinterstore, destination, entries, aggregate)
    }

    pub fn zunionstore_weighted(
        self: &Rc<Self>,
        destination: &str,
        entries: &[(&str, f64)],
        aggregate: Option<Aggregate>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        self.zstore_weighted_command(Command::Zunionstore, destination, entries, aggregate)
    }

    fn zstore_weighted_command(
        self: &Rc<Self>,
        command: Command,
        destination: &str,
        entries: &[(&str, f64)],
        aggregate: Option<Aggregate>,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!entries.is_empty(), "no key specified");
        let mut arguments = vec![self.text(destination), number(entries.len())];
        let mut weights = Vec::with_capacity(entries.len());
        for (key, weight) in entries {
            arguments.push(self.text(key));
            weights.push(number(weight));
        }
        arguments.push(b"WEIGHTS".to_vec());
        arguments.extend(weights);
        if let Some(aggregate) = aggregate {
            arguments.push(b"AGGREGATE".to_vec());
            arguments.push(aggregate.argument().to_vec());
        }
        self.send(RedisCommand::new(command).args(arguments), parse::integer)
    }

    pub fn zlexcount(
        self: &Rc<Self>,
        key: &str,
        interval: &LexInterval,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zlexcount)
            .arg(self.text(key))
            .arg(interval.min_argument(charset))
            .arg(interval.max_argument(charset));
        self.send(command, parse::integer)
    }

    pub fn zpopmax(
        self: &Rc<Self>,
        key: &str,
        count: u64,
    ) -> impl Future<Output = Result<Option<Vec<SetPopResult>>, RedisError>> {
        self.zpop_command(Command::Zpopmax, key, count)
    }

    pub fn zpopmin(
        self: &Rc<Self>,
        key: &str,
        count: u64,
    ) -> impl Future<Output = Result<Option<Vec<SetPopResult>>, RedisError>> {
        self.zpop_command(Command::Zpopmin, key, count)
    }

    fn zpop_command(
        self: &Rc<Self>,
        command: Command,
        key: &str,
        count: u64,
    ) -> impl Future<Output = Result<Option<Vec<SetPopResult>>, RedisError>> {
        let charset = self.charset();
        let command = if count == 1 {
            RedisCommand::new(command).arg(self.text(key))
        } else {
            RedisCommand::new(command)
                .arg(self.text(key))
                .arg(number(count))
        };
        self.send(command, move |response| {
            parse::set_pop_results(response, charset)
        })
    }

    pub fn zrange(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn zrange_binary(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, RedisError>> {
        let command = RedisCommand::new(Command::Zrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, parse::bytes_list)
    }

    pub fn zrange_with_scores(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<HashMap<String, f64>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop))
            .arg(b"WITHSCORES".to_vec());
        self.send(command, move |response| {
            parse::map(
                response,
                move |bytes| charset.decode(&bytes),
                move |bytes| {
                    charset.decode(&bytes)?.parse::<f64>().map_err(|_| {
                        RedisError::UnexpectedResponse("could not parse score".to_string())
                    })
                },
            )
        })
    }

    pub fn zrangebylex(
        self: &Rc<Self>,
        key: &str,
        interval: &LexInterval,
        limit: Option<(u64, u64)>,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = self.lex_range_command(Command::Zrangebylex, key, interval, limit);
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn zrevrangebylex(
        self: &Rc<Self>,
        key: &str,
        interval: &LexInterval,
        limit: Option<(u64, u64)>,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = self.lex_range_command(Command::Zrevrangebylex, key, interval, limit);
        self.send(command, move |response| parse::strings(response, charset))
    }

    fn lex_range_command(
        &self,
        command: Command,
        key: &str,
        interval: &LexInterval,
        limit: Option<(u64, u64)>,
    ) -> RedisCommand {
        let charset = self.charset();
        let mut built = RedisCommand::new(command)
            .arg(self.text(key))
            .arg(interval.min_argument(charset))
            .arg(interval.max_argument(charset));
        if let Some((offset, count)) = limit {
            built = built.arg(b"LIMIT".to_vec()).arg(number(offset)).arg(number(count));
        }
        built
    }

    pub fn zrangebyscore(
        self: &Rc<Self>,
        key: &str,
        interval: ScoreInterval,
        limit: Option<(u64, u64)>,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = self.score_range_command(Command::Zrangebyscore, key, interval, false, limit);
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn zrangebyscore_with_scores(
        self: &Rc<Self>,
        key: &str,
        interval: ScoreInterval,
        limit: Option<(u64, u64)>,
    ) -> impl Future<Output = Result<HashMap<String, f64>, RedisError>> {
        let charset = self.charset();
        let command = self.score_range_command(Command::Zrangebyscore, key, interval, true, limit);
        self.send(command, move |response| {
            parse::map(
                response,
                move |bytes| charset.decode(&bytes),
                move |bytes| {
                    charset.decode(&bytes)?.parse::<f64>().map_err(|_| {
                        RedisError::UnexpectedResponse("could not parse score".to_string())
                    })
                },
            )
        })
    }

    pub fn zrevrangebyscore(
        self: &Rc<Self>,
        key: &str,
        interval: ScoreInterval,
        limit: Option<(u64, u64)>,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command =
            self.score_range_command(Command::Zrevrangebyscore, key, interval, false, limit);
        self.send(command, move |response| parse::strings(response, charset))
    }

    fn score_range_command(
        &self,
        command: Command,
        key: &str,
        interval: ScoreInterval,
        with_scores: bool,
        limit: Option<(u64, u64)>,
    ) -> RedisCommand {
        let mut built = RedisCommand::new(command)
            .arg(self.text(key))
            .arg(interval.min_argument())
            .arg(interval.max_argument());
        if with_scores {
            built = built.arg(b"WITHSCORES".to_vec());
        }
        if let Some((offset, count)) = limit {
            built = built.arg(b"LIMIT".to_vec()).arg(number(offset)).arg(number(count));
        }
        built
    }

    pub fn zrank(
        self: &Rc<Self>,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<Option<i64>, RedisError>> {
        let command = RedisCommand::new(Command::Zrank)
            .arg(self.text(key))
            .arg(self.text(member));
        self.send(command, parse::nullable_integer)
    }

    pub fn zrevrank(
        self: &Rc<Self>,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<Option<i64>, RedisError>> {
        let command = RedisCommand::new(Command::Zrevrank)
            .arg(self.text(key))
            .arg(self.text(member));
        self.send(command, parse::nullable_integer)
    }

    pub fn zrem(
        self: &Rc<Self>,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!members.is_empty(), "no member to remove");
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(members));
        self.send(RedisCommand::new(Command::Zrem).args(arguments), parse::integer)
    }

    pub fn zremrangebylex(
        self: &Rc<Self>,
        key: &str,
        interval: &LexInterval,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zremrangebylex)
            .arg(self.text(key))
            .arg(interval.min_argument(charset))
            .arg(interval.max_argument(charset));
        self.send(command, parse::integer)
    }

    pub fn zremrangebyrank(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Zremrangebyrank)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, parse::integer)
    }

    pub fn zremrangebyscore(
        self: &Rc<Self>,
        key: &str,
        interval: ScoreInterval,
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Zremrangebyscore)
            .arg(self.text(key))
            .arg(interval.min_argument())
            .arg(interval.max_argument());
        self.send(command, parse::integer)
    }

    pub fn zrevrange(
        self: &Rc<Self>,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<Vec<String>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zrevrange)
            .arg(self.text(key))
            .arg(number(start))
            .arg(number(stop));
        self.send(command, move |response| parse::strings(response, charset))
    }

    pub fn zscan(
        self: &Rc<Self>,
        key: &str,
        cursor: &str,
        modifiers: &[ScanModifier],
    ) -> impl Future<Output = Result<ScanResult, RedisError>> {
        self.do_scan(Command::Zscan, Some(key), cursor, None, modifiers)
    }

    pub fn zscore(
        self: &Rc<Self>,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<Option<f64>, RedisError>> {
        let charset = self.charset();
        let command = RedisCommand::new(Command::Zscore)
            .arg(self.text(key))
            .arg(self.text(member));
        self.send(command, move |response| {
            parse::nullable_double(response, charset)
        })
    }

    // === HyperLogLog ===

    pub fn pfadd(
        self: &Rc<Self>,
        key: &str,
        elements: &[&str],
    ) -> impl Future<Output = Result<bool, RedisError>> {
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(elements));
        self.send(RedisCommand::new(Command::Pfadd).args(arguments), parse::boolean)
    }

    pub fn pfcount(
        self: &Rc<Self>,
        keys: &[&str],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        let command = RedisCommand::new(Command::Pfcount).args(self.texts(keys));
        self.send(command, parse::integer)
    }

    pub fn pfmerge(
        self: &Rc<Self>,
        destination: &str,
        sources: &[&str],
    ) -> impl Future<Output = Result<(), RedisError>> {
        let mut arguments = vec![self.text(destination)];
        arguments.extend(self.texts(sources));
        self.send(RedisCommand::new(Command::Pfmerge).args(arguments), parse::expect_ok)
    }

    // === 地理位置 ===

    /// 条目为 (coordinate, member)
    pub fn geoadd(
        self: &Rc<Self>,
        key: &str,
        entries: &[(Coordinate, &str)],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        debug_assert!(!entries.is_empty(), "nothing to add");
        let mut arguments = vec![self.text(key)];
        for (coordinate, member) in entries {
            arguments.push(number(coordinate.longitude));
            arguments.push(number(coordinate.latitude));
            arguments.push(self.text(member));
        }
        self.send(RedisCommand::new(Command::Geoadd).args(arguments), parse::integer)
    }

    pub fn geodist(
        self: &Rc<Self>,
        key: &str,
        member1: &str,
        member2: &str,
        unit: Option<DistanceUnit>,
    ) -> impl Future<Output = Result<Option<f64>, RedisError>> {
        let charset = self.charset();
        let mut command = RedisCommand::new(Command::Geodist)
            .arg(self.text(key))
            .arg(self.text(member1))
            .arg(self.text(member2));
        if let Some(unit) = unit {
            command = command.arg(unit.argument().to_vec());
        }
        self.send(command, move |response| {
            parse::nullable_double(response, charset)
        })
    }

    pub fn geohash(
        self: &Rc<Self>,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<String>>, RedisError>> {
        let charset = self.charset();
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(members));
        let command = RedisCommand::new(Command::Geohash).args(arguments);
        self.send(command, move |response| {
            parse::nullable_strings(response, charset)
        })
    }

    pub fn geopos(
        self: &Rc<Self>,
        key: &str,
        members: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<Coordinate>>, RedisError>> {
        let charset = self.charset();
        let mut arguments = vec![self.text(key)];
        arguments.extend(self.texts(members));
        let command = RedisCommand::new(Command::Geopos).args(arguments);
        self.send(command, move |response| parse::coordinates(response, charset))
    }

    /// 带 STORE/STOREDIST 的形式：返回写入目标 key 的条目数
    pub fn georadius(
        self: &Rc<Self>,
        key: &str,
        origin: &GeoOrigin,
        radius: f64,
        unit: DistanceUnit,
        modifiers: &[GeoradiusModifier],
    ) -> impl Future<Output = Result<i64, RedisError>> {
        check_georadius_modifiers(false, modifiers);
        let command = self.georadius_command(key, origin, radius, unit, modifiers);
        self.send(command, parse::integer)
    }

    /// 只读形式：返回命中的成员，WITH* 修饰符决定附带哪些字段
    pub fn georadius_read(
        self: &Rc<Self>,
        key: &str,
        origin: &GeoOrigin,
        radius: f64,
        unit: DistanceUnit,
        modifiers: &[GeoradiusModifier],
    ) -> impl Future<Output = Result<Vec<GeoradiusResult>, RedisError>> {
        check_georadius_modifiers(true, modifiers);

        let charset = self.charset();
        let with_coord = modifiers.contains(&GeoradiusModifier::WithCoord);
        let with_dist = modifiers.contains(&GeoradiusModifier::WithDist);
        let with_hash = modifiers.contains(&GeoradiusModifier::WithHash);
        let command = self.georadius_command(key, origin, radius, unit, modifiers);
        self.send(command, move |response| {
            parse::georadius_results(response, charset, with_coord, with_dist, with_hash)
        })
    }

    fn georadius_command(
        &self,
        key: &str,
        origin: &GeoOrigin,
        radius: f64,
        unit: DistanceUnit,
        modifiers: &[GeoradiusModifier],
    ) -> RedisCommand {
        let mut arguments = vec![self.text(key)];
        let command = match origin {
            GeoOrigin::Coordinate(coordinate) => {
                arguments.push(number(coordinate.longitude));
                arguments.push(number(coordinate.latitude));
                Command::Georadius
            }
            GeoOrigin::Member(member) => {
                arguments.push(self.text(member));
                Command::Georadiusbymember
            }
        };
        arguments.push(number(radius));
        arguments.push(unit.argument().to_vec());
        append_all(modifiers, self.charset(), &mut arguments);
        RedisCommand::new(command).args(arguments)
    }

    // === 事务辅助命令 ===

    pub fn watch(self: &Rc<Self>, keys: &[&str]) -> impl Future<Output = Result<(), RedisError>> {
        debug_assert!(!self.in_transaction(), "WATCH inside MULTI");
        let command = RedisCommand::new(Command::Watch).args(self.texts(keys));
        self.send(command, parse::expect_ok)
    }

    pub fn unwatch(self: &Rc<Self>) -> impl Future<Output = Result<(), RedisError>> {
        self.send(RedisCommand::new(Command::Unwatch), parse::expect_ok)
    }

    // === SCAN 族公共路径 ===

    fn do_scan(
        self: &Rc<Self>,
        command: Command,
        key: Option<&str>,
        cursor: &str,
        key_type: Option<RedisType>,
        modifiers: &[ScanModifier],
    ) -> impl Future<Output = Result<ScanResult, RedisError>> {
        debug_assert!(
            !cursor.is_empty() && cursor.bytes().all(|b| b.is_ascii_digit()),
            "cursor must be a decimal string"
        );
        check_scan_modifiers(modifiers);

        let mut arguments = Vec::new();
        if let Some(key) = key {
            arguments.push(self.text(key));
        }
        arguments.push(self.text(cursor));
        if let Some(key_type) = key_type {
            arguments.push(b"TYPE".to_vec());
            arguments.push(key_type.name().as_bytes().to_vec());
        }
        append_all(modifiers, self.charset(), &mut arguments);
        self.send(RedisCommand::new(command).args(arguments), parse::scan_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RedisResponse;

    // 命令构造路径的纯函数部分在这里验证；
    // 线上行为由 tests/ 下的集成测试覆盖
    #[test]
    fn test_number_formatting() {
        assert_eq!(number(42i64), b"42".to_vec());
        assert_eq!(number(-7i64), b"-7".to_vec());
        assert_eq!(number(2.5f64), b"2.5".to_vec());
    }

    #[test]
    fn test_response_reexport_shape() {
        // 保证事务 API 暴露的原始响应类型与解析器吻合
        let response = RedisResponse::Integer(2);
        assert_eq!(parse::integer(response).unwrap(), 2);
    }
}
