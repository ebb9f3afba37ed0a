//! 命令修饰符编码
//!
//! 每个修饰符组对应命令尾部的一段可选参数序列；修饰符只负责把
//! 类型化的选项展开成参数字节，顺序由调用方保持。互斥组合的校验
//! 是 debug 断言，不在发布构建里产生开销。

use std::time::Duration;

use crate::charset::Charset;

/// 修饰符统一展开为参数序列
pub(crate) trait Modifier {
    fn append_arguments(&self, charset: Charset, arguments: &mut Vec<Vec<u8>>);
}

fn number(value: impl ToString) -> Vec<u8> {
    value.to_string().into_bytes()
}

// === SET ===

/// SET 命令的可选修饰符
#[derive(Debug, Clone, PartialEq)]
pub enum SetModifier {
    /// EX seconds
    ExpireSeconds(u64),
    /// PX milliseconds
    ExpireMillis(u64),
    /// NX：仅当 key 不存在
    IfNotExists,
    /// XX：仅当 key 已存在
    IfExists,
    /// KEEPTTL
    KeepTtl,
}

impl Modifier for SetModifier {
    fn append_arguments(&self, _charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            SetModifier::ExpireSeconds(seconds) => {
                arguments.push(b"EX".to_vec());
                arguments.push(number(seconds));
            }
            SetModifier::ExpireMillis(millis) => {
                arguments.push(b"PX".to_vec());
                arguments.push(number(millis));
            }
            SetModifier::IfNotExists => arguments.push(b"NX".to_vec()),
            SetModifier::IfExists => arguments.push(b"XX".to_vec()),
            SetModifier::KeepTtl => arguments.push(b"KEEPTTL".to_vec()),
        }
    }
}

pub(crate) fn check_set_modifiers(modifiers: &[SetModifier]) {
    debug_assert!(
        !(modifiers.contains(&SetModifier::IfNotExists)
            && modifiers.contains(&SetModifier::IfExists)),
        "NX and XX are mutually exclusive"
    );
    let expirations = modifiers
        .iter()
        .filter(|m| {
            matches!(
                m,
                SetModifier::ExpireSeconds(_) | SetModifier::ExpireMillis(_) | SetModifier::KeepTtl
            )
        })
        .count();
    debug_assert!(expirations <= 1, "conflicting expiration modifiers");
}

// === SCAN ===

/// SCAN 族命令的修饰符
#[derive(Debug, Clone, PartialEq)]
pub enum ScanModifier {
    /// MATCH pattern
    Match(String),
    /// COUNT hint
    Count(u64),
}

impl Modifier for ScanModifier {
    fn append_arguments(&self, charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            ScanModifier::Match(pattern) => {
                arguments.push(b"MATCH".to_vec());
                arguments.push(charset.encode(pattern));
            }
            ScanModifier::Count(count) => {
                arguments.push(b"COUNT".to_vec());
                arguments.push(number(count));
            }
        }
    }
}

pub(crate) fn check_scan_modifiers(modifiers: &[ScanModifier]) {
    debug_assert!(
        modifiers
            .iter()
            .filter(|m| matches!(m, ScanModifier::Match(_)))
            .count()
            <= 1,
        "multiple MATCH modifiers"
    );
    debug_assert!(
        modifiers
            .iter()
            .filter(|m| matches!(m, ScanModifier::Count(_)))
            .count()
            <= 1,
        "multiple COUNT modifiers"
    );
}

// === SORT ===

/// SORT 命令的修饰符；STORE 由专门的命令变体处理
#[derive(Debug, Clone, PartialEq)]
pub enum SortModifier {
    /// BY pattern
    By(String),
    /// LIMIT offset count
    Limit(u64, u64),
    /// GET pattern，可重复
    Get(String),
    Ascending,
    Descending,
    Alpha,
}

impl Modifier for SortModifier {
    fn append_arguments(&self, charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            SortModifier::By(pattern) => {
                arguments.push(b"BY".to_vec());
                arguments.push(charset.encode(pattern));
            }
            SortModifier::Limit(offset, count) => {
                arguments.push(b"LIMIT".to_vec());
                arguments.push(number(offset));
                arguments.push(number(count));
            }
            SortModifier::Get(pattern) => {
                arguments.push(b"GET".to_vec());
                arguments.push(charset.encode(pattern));
            }
            SortModifier::Ascending => arguments.push(b"ASC".to_vec()),
            SortModifier::Descending => arguments.push(b"DESC".to_vec()),
            SortModifier::Alpha => arguments.push(b"ALPHA".to_vec()),
        }
    }
}

pub(crate) fn check_sort_modifiers(modifiers: &[SortModifier]) {
    debug_assert!(
        !(modifiers.contains(&SortModifier::Ascending)
            && modifiers.contains(&SortModifier::Descending)),
        "ASC and DESC are mutually exclusive"
    );
}

// === MIGRATE ===

/// MIGRATE 命令的修饰符
#[derive(Debug, Clone, PartialEq)]
pub enum MigrateModifier {
    Copy,
    Replace,
    /// AUTH password
    Auth(String),
    /// KEYS key [key ...]，与单 key 形式互斥
    Keys(Vec<String>),
}

impl Modifier for MigrateModifier {
    fn append_arguments(&self, charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            MigrateModifier::Copy => arguments.push(b"COPY".to_vec()),
            MigrateModifier::Replace => arguments.push(b"REPLACE".to_vec()),
            MigrateModifier::Auth(password) => {
                arguments.push(b"AUTH".to_vec());
                arguments.push(charset.encode(password));
            }
            MigrateModifier::Keys(keys) => {
                arguments.push(b"KEYS".to_vec());
                for key in keys {
                    arguments.push(charset.encode(key));
                }
            }
        }
    }
}

pub(crate) fn check_migrate_modifiers(empty_key: bool, modifiers: &[MigrateModifier]) {
    let has_keys = modifiers
        .iter()
        .any(|m| matches!(m, MigrateModifier::Keys(_)));
    debug_assert!(
        empty_key == has_keys,
        "KEYS modifier is required exactly when no single key is given"
    );
}

// === RESTORE ===

/// RESTORE 命令的修饰符
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreModifier {
    Replace,
    AbsoluteTtl,
    /// IDLETIME seconds
    IdleTime(u64),
    /// FREQ frequency
    Frequency(u64),
}

impl Modifier for RestoreModifier {
    fn append_arguments(&self, _charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            RestoreModifier::Replace => arguments.push(b"REPLACE".to_vec()),
            RestoreModifier::AbsoluteTtl => arguments.push(b"ABSTTL".to_vec()),
            RestoreModifier::IdleTime(seconds) => {
                arguments.push(b"IDLETIME".to_vec());
                arguments.push(number(seconds));
            }
            RestoreModifier::Frequency(frequency) => {
                arguments.push(b"FREQ".to_vec());
                arguments.push(number(frequency));
            }
        }
    }
}

// === ZADD ===

/// ZADD 命令的修饰符；INCR 由专门的命令变体处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZaddModifier {
    IfNotExists,
    IfExists,
    GreaterThan,
    LessThan,
    /// CH：返回变更数量而非新增数量
    Changed,
}

impl Modifier for ZaddModifier {
    fn append_arguments(&self, _charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        let argument: &[u8] = match self {
            ZaddModifier::IfNotExists => b"NX",
            ZaddModifier::IfExists => b"XX",
            ZaddModifier::GreaterThan => b"GT",
            ZaddModifier::LessThan => b"LT",
            ZaddModifier::Changed => b"CH",
        };
        arguments.push(argument.to_vec());
    }
}

pub(crate) fn check_zadd_modifiers(modifiers: &[ZaddModifier]) {
    debug_assert!(
        !(modifiers.contains(&ZaddModifier::IfNotExists)
            && modifiers.contains(&ZaddModifier::IfExists)),
        "NX and XX are mutually exclusive"
    );
    debug_assert!(
        !(modifiers.contains(&ZaddModifier::GreaterThan)
            && modifiers.contains(&ZaddModifier::LessThan)),
        "GT and LT are mutually exclusive"
    );
}

// === LPOS ===

/// LPOS 命令的修饰符；COUNT 由带计数的命令变体处理
#[derive(Debug, Clone, PartialEq)]
pub enum LposModifier {
    /// RANK rank
    Rank(i64),
}

impl Modifier for LposModifier {
    fn append_arguments(&self, _charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            LposModifier::Rank(rank) => {
                arguments.push(b"RANK".to_vec());
                arguments.push(number(rank));
            }
        }
    }
}

// === GEORADIUS ===

/// GEORADIUS 命令的修饰符
#[derive(Debug, Clone, PartialEq)]
pub enum GeoradiusModifier {
    WithCoord,
    WithDist,
    WithHash,
    /// COUNT count
    Count(u64),
    Ascending,
    Descending,
    /// STORE key，只在非只读形式下合法
    Store(String),
    /// STOREDIST key，只在非只读形式下合法
    StoreDist(String),
}

impl GeoradiusModifier {
    pub(crate) fn is_read_only(&self) -> bool {
        !matches!(
            self,
            GeoradiusModifier::Store(_) | GeoradiusModifier::StoreDist(_)
        )
    }

    pub(crate) fn is_with(&self) -> bool {
        matches!(
            self,
            GeoradiusModifier::WithCoord | GeoradiusModifier::WithDist | GeoradiusModifier::WithHash
        )
    }
}

impl Modifier for GeoradiusModifier {
    fn append_arguments(&self, charset: Charset, arguments: &mut Vec<Vec<u8>>) {
        match self {
            GeoradiusModifier::WithCoord => arguments.push(b"WITHCOORD".to_vec()),
            GeoradiusModifier::WithDist => arguments.push(b"WITHDIST".to_vec()),
            GeoradiusModifier::WithHash => arguments.push(b"WITHHASH".to_vec()),
            GeoradiusModifier::Count(count) => {
                arguments.push(b"COUNT".to_vec());
                arguments.push(number(count));
            }
            GeoradiusModifier::Ascending => arguments.push(b"ASC".to_vec()),
            GeoradiusModifier::Descending => arguments.push(b"DESC".to_vec()),
            GeoradiusModifier::Store(key) => {
                arguments.push(b"STORE".to_vec());
                arguments.push(charset.encode(key));
            }
            GeoradiusModifier::StoreDist(key) => {
                arguments.push(b"STOREDIST".to_vec());
                arguments.push(charset.encode(key));
            }
        }
    }
}

pub(crate) fn check_georadius_modifiers(read_only: bool, modifiers: &[GeoradiusModifier]) {
    debug_assert!(
        !read_only || modifiers.iter().all(GeoradiusModifier::is_read_only),
        "STORE/STOREDIST are not allowed in the read-only form"
    );
    debug_assert!(
        read_only || modifiers.iter().all(|m| !m.is_with()),
        "WITH* modifiers are only allowed in the read-only form"
    );
}

// === 区间与其它参数类型 ===

/// ZRANGEBYSCORE / ZCOUNT 使用的分数区间端点
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegativeInfinity,
    PositiveInfinity,
    /// 闭端点
    Inclusive(f64),
    /// 开端点，编码为 `(score`
    Exclusive(f64),
}

impl ScoreBound {
    fn encode(&self) -> Vec<u8> {
        match self {
            ScoreBound::NegativeInfinity => b"-inf".to_vec(),
            ScoreBound::PositiveInfinity => b"+inf".to_vec(),
            ScoreBound::Inclusive(score) => number(score),
            ScoreBound::Exclusive(score) => format!("({}", score).into_bytes(),
        }
    }
}

/// 分数区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInterval {
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl ScoreInterval {
    pub fn new(min: ScoreBound, max: ScoreBound) -> Self {
        Self { min, max }
    }

    /// 全范围区间
    pub fn all() -> Self {
        Self::new(ScoreBound::NegativeInfinity, ScoreBound::PositiveInfinity)
    }

    pub(crate) fn min_argument(&self) -> Vec<u8> {
        self.min.encode()
    }

    pub(crate) fn max_argument(&self) -> Vec<u8> {
        self.max.encode()
    }
}

/// ZRANGEBYLEX 使用的字典序区间端点
#[derive(Debug, Clone, PartialEq)]
pub enum LexBound {
    NegativeInfinity,
    PositiveInfinity,
    /// 闭端点，编码为 `[value`
    Inclusive(String),
    /// 开端点，编码为 `(value`
    Exclusive(String),
}

impl LexBound {
    fn encode(&self, charset: Charset) -> Vec<u8> {
        match self {
            LexBound::NegativeInfinity => b"-".to_vec(),
            LexBound::PositiveInfinity => b"+".to_vec(),
            LexBound::Inclusive(value) => {
                let mut bytes = vec![b'['];
                bytes.extend_from_slice(&charset.encode(value));
                bytes
            }
            LexBound::Exclusive(value) => {
                let mut bytes = vec![b'('];
                bytes.extend_from_slice(&charset.encode(value));
                bytes
            }
        }
    }
}

/// 字典序区间
#[derive(Debug, Clone, PartialEq)]
pub struct LexInterval {
    pub min: LexBound,
    pub max: LexBound,
}

impl LexInterval {
    pub fn new(min: LexBound, max: LexBound) -> Self {
        Self { min, max }
    }

    pub fn all() -> Self {
        Self::new(LexBound::NegativeInfinity, LexBound::PositiveInfinity)
    }

    pub(crate) fn min_argument(&self, charset: Charset) -> Vec<u8> {
        self.min.encode(charset)
    }

    pub(crate) fn max_argument(&self, charset: Charset) -> Vec<u8> {
        self.max.encode(charset)
    }
}

/// BITOP 的位运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOperator {
    And,
    Or,
    Xor,
    /// NOT 只接受单个源 key
    Not,
}

impl BitOperator {
    pub(crate) fn argument(self) -> &'static [u8] {
        match self {
            BitOperator::And => b"AND",
            BitOperator::Or => b"OR",
            BitOperator::Xor => b"XOR",
            BitOperator::Not => b"NOT",
        }
    }
}

/// ZUNIONSTORE / ZINTERSTORE 的聚合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
}

impl Aggregate {
    pub(crate) fn argument(self) -> &'static [u8] {
        match self {
            Aggregate::Sum => b"SUM",
            Aggregate::Min => b"MIN",
            Aggregate::Max => b"MAX",
        }
    }
}

/// LINSERT 的插入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

impl InsertPosition {
    pub(crate) fn argument(self) -> &'static [u8] {
        match self {
            InsertPosition::Before => b"BEFORE",
            InsertPosition::After => b"AFTER",
        }
    }
}

/// GEODIST / GEORADIUS 的距离单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    pub(crate) fn argument(self) -> &'static [u8] {
        match self {
            DistanceUnit::Meters => b"m",
            DistanceUnit::Kilometers => b"km",
            DistanceUnit::Miles => b"mi",
            DistanceUnit::Feet => b"ft",
        }
    }
}

/// GEORADIUS 的圆心：坐标或已有成员（两臂和类型代替 Either）
#[derive(Debug, Clone, PartialEq)]
pub enum GeoOrigin {
    Coordinate(crate::types::Coordinate),
    Member(String),
}

/// 超时秒数编码；Redis 的阻塞命令接受小数秒
pub(crate) fn seconds_argument(timeout: Duration) -> Vec<u8> {
    let seconds = timeout.as_secs_f64();
    if seconds.fract() == 0.0 {
        number(timeout.as_secs())
    } else {
        number(seconds)
    }
}

/// 把一组修饰符展开进参数序列
pub(crate) fn append_all<M: Modifier>(
    modifiers: &[M],
    charset: Charset,
    arguments: &mut Vec<Vec<u8>>,
) {
    for modifier in modifiers {
        modifier.append_arguments(charset, arguments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments<M: Modifier>(modifier: M) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        modifier.append_arguments(Charset::Utf8, &mut out);
        out
    }

    #[test]
    fn test_set_modifier_arguments() {
        assert_eq!(
            arguments(SetModifier::ExpireSeconds(30)),
            vec![b"EX".to_vec(), b"30".to_vec()]
        );
        assert_eq!(arguments(SetModifier::KeepTtl), vec![b"KEEPTTL".to_vec()]);
    }

    #[test]
    fn test_sort_modifier_order_is_caller_defined() {
        let mut out = Vec::new();
        append_all(
            &[
                SortModifier::By("weight_*".to_string()),
                SortModifier::Limit(0, 10),
                SortModifier::Alpha,
            ],
            Charset::Utf8,
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                b"BY".to_vec(),
                b"weight_*".to_vec(),
                b"LIMIT".to_vec(),
                b"0".to_vec(),
                b"10".to_vec(),
                b"ALPHA".to_vec(),
            ]
        );
    }

    #[test]
    fn test_score_interval_arguments() {
        let interval = ScoreInterval::new(ScoreBound::Exclusive(1.5), ScoreBound::PositiveInfinity);
        assert_eq!(interval.min_argument(), b"(1.5".to_vec());
        assert_eq!(interval.max_argument(), b"+inf".to_vec());
    }

    #[test]
    fn test_lex_interval_arguments() {
        let interval = LexInterval::new(
            LexBound::Inclusive("a".to_string()),
            LexBound::Exclusive("z".to_string()),
        );
        assert_eq!(interval.min_argument(Charset::Utf8), b"[a".to_vec());
        assert_eq!(interval.max_argument(Charset::Utf8), b"(z".to_vec());
    }

    #[test]
    fn test_blocking_timeout_encoding() {
        assert_eq!(seconds_argument(Duration::from_secs(5)), b"5".to_vec());
        assert_eq!(seconds_argument(Duration::from_millis(1500)), b"1.5".to_vec());
    }
}
