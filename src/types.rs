//! 命令结果的类型化表示

use crate::charset::Charset;
use crate::error::RedisError;

/// SCAN 族命令的一页结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    cursor: String,
    elements: Vec<Vec<u8>>,
}

impl ScanResult {
    pub(crate) fn new(cursor: String, elements: Vec<Vec<u8>>) -> Self {
        Self { cursor, elements }
    }

    /// 下一次 SCAN 调用使用的游标
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// 游标回到 `0` 表示遍历完成
    pub fn is_complete(&self) -> bool {
        self.cursor == "0"
    }

    pub fn elements(&self) -> &[Vec<u8>] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Vec<u8>> {
        self.elements
    }

    /// 按连接编码解码每个元素
    pub fn elements_as_strings(&self, charset: Charset) -> Result<Vec<String>, RedisError> {
        self.elements
            .iter()
            .map(|bytes| charset.decode(bytes))
            .collect()
    }
}

/// 经纬度坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// GEORADIUS 只读形式的单条结果
///
/// 可选字段由请求里的 WITHCOORD / WITHDIST / WITHHASH 决定。
#[derive(Debug, Clone, PartialEq)]
pub struct GeoradiusResult {
    pub member: Vec<u8>,
    pub coordinate: Option<Coordinate>,
    pub distance: Option<f64>,
    pub hash: Option<i64>,
}

impl GeoradiusResult {
    pub fn member_as_string(&self, charset: Charset) -> Result<String, RedisError> {
        charset.decode(&self.member)
    }
}

/// BLPOP / BRPOP 的结果：命中的 key 和弹出的值
#[derive(Debug, Clone, PartialEq)]
pub struct ListPopResult {
    pub key: String,
    pub value: Vec<u8>,
}

/// BZPOPMIN / BZPOPMAX 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SetBlockingPopResult {
    pub key: String,
    pub value: Vec<u8>,
    pub score: f64,
}

/// ZPOPMIN / ZPOPMAX 的单条结果
#[derive(Debug, Clone, PartialEq)]
pub struct SetPopResult {
    pub value: Vec<u8>,
    pub score: f64,
}

/// TYPE 命令返回的键类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisType {
    None,
    String,
    List,
    Set,
    Zset,
    Hash,
    Stream,
}

impl RedisType {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(RedisType::None),
            "string" => Some(RedisType::String),
            "list" => Some(RedisType::List),
            "set" => Some(RedisType::Set),
            "zset" => Some(RedisType::Zset),
            "hash" => Some(RedisType::Hash),
            "stream" => Some(RedisType::Stream),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            RedisType::None => "none",
            RedisType::String => "string",
            RedisType::List => "list",
            RedisType::Set => "set",
            RedisType::Zset => "zset",
            RedisType::Hash => "hash",
            RedisType::Stream => "stream",
        }
    }
}

/// OBJECT ENCODING 返回的内部编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisEncoding {
    Raw,
    Int,
    Embstr,
    Ziplist,
    Listpack,
    Quicklist,
    Linkedlist,
    Intset,
    Hashtable,
    Skiplist,
    Stream,
}

impl RedisEncoding {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "raw" => Some(RedisEncoding::Raw),
            "int" => Some(RedisEncoding::Int),
            "embstr" => Some(RedisEncoding::Embstr),
            "ziplist" => Some(RedisEncoding::Ziplist),
            "listpack" => Some(RedisEncoding::Listpack),
            "quicklist" => Some(RedisEncoding::Quicklist),
            "linkedlist" => Some(RedisEncoding::Linkedlist),
            "intset" => Some(RedisEncoding::Intset),
            "hashtable" => Some(RedisEncoding::Hashtable),
            "skiplist" => Some(RedisEncoding::Skiplist),
            "stream" => Some(RedisEncoding::Stream),
            _ => None,
        }
    }
}
