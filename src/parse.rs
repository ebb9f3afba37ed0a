//! 类型化响应解析器
//!
//! 每个解析器都是从 [`RedisResponse`] 到类型化结果的全函数：接受的
//! 形状之外一律返回命名错误，从不 panic。服务端错误响应统一转换成
//! [`RedisError::Server`] 向上抛，由调用方决定是否致命（永远不是）。

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::charset::Charset;
use crate::error::RedisError;
use crate::response::RedisResponse;
use crate::types::{
    Coordinate, GeoradiusResult, ListPopResult, RedisEncoding, RedisType, ScanResult,
    SetBlockingPopResult, SetPopResult,
};

/// `+OK` 确认
pub fn expect_ok(response: RedisResponse) -> Result<(), RedisError> {
    let text = simple_string(response)?;
    if text == "OK" {
        Ok(())
    } else {
        Err(RedisError::UnexpectedResponse(format!(
            "expected result to be 'OK', was: {}",
            text
        )))
    }
}

/// MIGRATE 的确认：`+OK` 迁移成功，`+NOKEY` 没有找到 key
pub fn ok_or_nokey(response: RedisResponse) -> Result<bool, RedisError> {
    let text = simple_string(response)?;
    match text.as_str() {
        "OK" => Ok(true),
        "NOKEY" => Ok(false),
        other => Err(RedisError::UnexpectedResponse(format!(
            "expected 'OK' or 'NOKEY', was: {}",
            other
        ))),
    }
}

pub fn simple_string(response: RedisResponse) -> Result<String, RedisError> {
    match response {
        RedisResponse::SimpleString(text) => Ok(text),
        RedisResponse::Error { code, message } => {
            Err(RedisResponse::server_error(&code, &message))
        }
        other => Err(other.unexpected("simple string")),
    }
}

pub fn integer(response: RedisResponse) -> Result<i64, RedisError> {
    response.into_integer()
}

pub fn nullable_integer(response: RedisResponse) -> Result<Option<i64>, RedisError> {
    match response {
        RedisResponse::Nil | RedisResponse::NilArray => Ok(None),
        other => other.into_integer().map(Some),
    }
}

/// 只接受 `0` 和 `1` 的整数响应
pub fn boolean(response: RedisResponse) -> Result<bool, RedisError> {
    match response.into_integer()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RedisError::UnexpectedResponse(format!(
            "boolean must be 0 or 1, was: {}",
            other
        ))),
    }
}

/// bulk 响应；`$-1` 解析为 `None`
pub fn bulk(response: RedisResponse) -> Result<Option<Vec<u8>>, RedisError> {
    match response {
        RedisResponse::Bulk(bytes) => Ok(Some(bytes)),
        RedisResponse::Nil | RedisResponse::NilArray => Ok(None),
        RedisResponse::Error { code, message } => {
            Err(RedisResponse::server_error(&code, &message))
        }
        other => Err(other.unexpected("bulk string")),
    }
}

pub fn bulk_string(response: RedisResponse, charset: Charset) -> Result<Option<String>, RedisError> {
    bulk(response)?
        .map(|bytes| charset.decode(&bytes))
        .transpose()
}

/// simple string 或 bulk 均可，按连接编码解码
pub fn string(response: RedisResponse, charset: Charset) -> Result<Option<String>, RedisError> {
    match response {
        RedisResponse::SimpleString(text) => Ok(Some(text)),
        other => bulk_string(other, charset),
    }
}

/// 把可空结果变成必填结果
pub fn required<T>(value: Option<T>) -> Result<T, RedisError> {
    value.ok_or_else(|| {
        RedisError::UnexpectedResponse("received unexpected nil response".to_string())
    })
}

/// 数组响应：对每个元素应用元素解析器；`*-1` 解析为 `None`
///
/// 元素可空的场合（MGET 等）由元素解析器自己接受 `Nil` 表达。
pub fn array<T, F>(response: RedisResponse, element: F) -> Result<Option<Vec<T>>, RedisError>
where
    F: Fn(RedisResponse) -> Result<T, RedisError>,
{
    match response {
        RedisResponse::Array(items) => items
            .into_iter()
            .map(element)
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        RedisResponse::Nil | RedisResponse::NilArray => Ok(None),
        RedisResponse::Error { code, message } => {
            Err(RedisResponse::server_error(&code, &message))
        }
        other => Err(other.unexpected("array")),
    }
}

/// 数组响应收集为集合；重复元素静默合并
pub fn set<T, F>(response: RedisResponse, element: F) -> Result<HashSet<T>, RedisError>
where
    T: Eq + Hash,
    F: Fn(RedisResponse) -> Result<T, RedisError>,
{
    let items = required(array(response, element)?)?;
    Ok(items.into_iter().collect())
}

/// 偶数长度的数组响应按 key/value 对收集
///
/// 奇数长度是响应不匹配，重复的 key 是 [`RedisError::DuplicateField`]。
pub fn map<K, V, FK, FV>(
    response: RedisResponse,
    key_fn: FK,
    value_fn: FV,
) -> Result<HashMap<K, V>, RedisError>
where
    K: Eq + Hash,
    FK: Fn(Vec<u8>) -> Result<K, RedisError>,
    FV: Fn(Vec<u8>) -> Result<V, RedisError>,
{
    let items = required(array(response, Ok)?)?;
    if items.len() % 2 != 0 {
        return Err(RedisError::UnexpectedResponse(
            "map with uneven number of keys and values".to_string(),
        ));
    }

    let mut result = HashMap::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(key_item), Some(value_item)) = (iter.next(), iter.next()) {
        let key_bytes = key_item.into_bytes()?;
        let label = String::from_utf8_lossy(&key_bytes).into_owned();
        let key = key_fn(key_bytes)?;
        let value = value_fn(value_item.into_bytes()?)?;
        if result.insert(key, value).is_some() {
            return Err(RedisError::DuplicateField(label));
        }
    }
    Ok(result)
}

// === 常用的数组便捷形式 ===

pub fn bytes_list(response: RedisResponse) -> Result<Vec<Vec<u8>>, RedisError> {
    required(array(response, RedisResponse::into_bytes)?)
}

pub fn bytes_set(response: RedisResponse) -> Result<HashSet<Vec<u8>>, RedisError> {
    set(response, RedisResponse::into_bytes)
}

pub fn nullable_bytes(response: RedisResponse) -> Result<Vec<Option<Vec<u8>>>, RedisError> {
    required(array(response, bulk)?)
}

pub fn strings(response: RedisResponse, charset: Charset) -> Result<Vec<String>, RedisError> {
    required(array(response, |item| {
        charset.decode(&item.into_bytes()?)
    })?)
}

pub fn strings_as_set(
    response: RedisResponse,
    charset: Charset,
) -> Result<HashSet<String>, RedisError> {
    set(response, |item| charset.decode(&item.into_bytes()?))
}

pub fn nullable_strings(
    response: RedisResponse,
    charset: Charset,
) -> Result<Vec<Option<String>>, RedisError> {
    required(array(response, |item| bulk_string(item, charset))?)
}

pub fn integers(response: RedisResponse) -> Result<Vec<i64>, RedisError> {
    required(array(response, RedisResponse::into_integer)?)
}

// === 浮点数 ===

fn double_from_bytes(bytes: &[u8], charset: Charset) -> Result<f64, RedisError> {
    let text = charset.decode(bytes)?;
    text.parse::<f64>().map_err(|_| {
        RedisError::UnexpectedResponse(format!("could not parse double value: {}", text))
    })
}

/// IEEE-754 浮点数，以 bulk string 承载
pub fn double(response: RedisResponse, charset: Charset) -> Result<f64, RedisError> {
    let bytes = required(bulk(response)?)?;
    double_from_bytes(&bytes, charset)
}

pub fn nullable_double(
    response: RedisResponse,
    charset: Charset,
) -> Result<Option<f64>, RedisError> {
    bulk(response)?
        .map(|bytes| double_from_bytes(&bytes, charset))
        .transpose()
}

// === 组合解析器 ===

/// `[cursor, elements]` 形状的 SCAN 结果；游标必须是十进制字符串
pub fn scan_result(response: RedisResponse) -> Result<ScanResult, RedisError> {
    let mut items = required(array(response, Ok)?)?;
    if items.len() != 2 {
        return Err(RedisError::UnexpectedResponse(format!(
            "scan result must have 2 elements, got {}",
            items.len()
        )));
    }
    let elements = items.pop().expect("length checked");
    let cursor_bytes = items.pop().expect("length checked").into_bytes()?;
    let cursor = String::from_utf8(cursor_bytes).map_err(|_| {
        RedisError::UnexpectedResponse("scan cursor is not valid UTF-8".to_string())
    })?;
    if cursor.is_empty() || !cursor.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RedisError::UnexpectedResponse(format!(
            "received illegal cursor: {}",
            cursor
        )));
    }
    let elements = required(array(elements, RedisResponse::into_bytes)?)?;
    Ok(ScanResult::new(cursor, elements))
}

/// BLPOP / BRPOP：`[key, value]`，超时返回 `*-1` 解析为 `None`
pub fn list_pop_result(
    response: RedisResponse,
    charset: Charset,
) -> Result<Option<ListPopResult>, RedisError> {
    let Some(mut items) = array(response, Ok)? else {
        return Ok(None);
    };
    if items.len() != 2 {
        return Err(RedisError::UnexpectedResponse(format!(
            "list pop result must have 2 elements, got {}",
            items.len()
        )));
    }
    let value = items.pop().expect("length checked").into_bytes()?;
    let key = charset.decode(&items.pop().expect("length checked").into_bytes()?)?;
    Ok(Some(ListPopResult { key, value }))
}

/// BZPOPMIN / BZPOPMAX：`[key, value, score]`
pub fn set_blocking_pop_result(
    response: RedisResponse,
    charset: Charset,
) -> Result<Option<SetBlockingPopResult>, RedisError> {
    let Some(mut items) = array(response, Ok)? else {
        return Ok(None);
    };
    if items.len() != 3 {
        return Err(RedisError::UnexpectedResponse(format!(
            "blocking pop result must have 3 elements, got {}",
            items.len()
        )));
    }
    let score = double_from_bytes(&items.pop().expect("length checked").into_bytes()?, charset)?;
    let value = items.pop().expect("length checked").into_bytes()?;
    let key = charset.decode(&items.pop().expect("length checked").into_bytes()?)?;
    Ok(Some(SetBlockingPopResult { key, value, score }))
}

/// ZPOPMIN / ZPOPMAX：交替的 `[value, score, ...]` 对
pub fn set_pop_results(
    response: RedisResponse,
    charset: Charset,
) -> Result<Option<Vec<SetPopResult>>, RedisError> {
    let Some(items) = array(response, Ok)? else {
        return Ok(None);
    };
    if items.len() % 2 != 0 {
        return Err(RedisError::UnexpectedResponse(
            "pop result with uneven number of values and scores".to_string(),
        ));
    }
    let mut results = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(value), Some(score)) = (iter.next(), iter.next()) {
        results.push(SetPopResult {
            value: value.into_bytes()?,
            score: double_from_bytes(&score.into_bytes()?, charset)?,
        });
    }
    Ok(Some(results))
}

/// 单个 `[longitude, latitude]` 坐标对
fn coordinate(element: RedisResponse, charset: Charset) -> Result<Coordinate, RedisError> {
    let mut items = element.into_array()?;
    if items.len() != 2 {
        return Err(RedisError::UnexpectedResponse(format!(
            "coordinate must have 2 elements, got {}",
            items.len()
        )));
    }
    let latitude = double_from_bytes(&items.pop().expect("length checked").into_bytes()?, charset)?;
    let longitude =
        double_from_bytes(&items.pop().expect("length checked").into_bytes()?, charset)?;
    Ok(Coordinate::new(longitude, latitude))
}

/// GEOPOS：每个成员对应一个可空坐标
pub fn coordinates(
    response: RedisResponse,
    charset: Charset,
) -> Result<Vec<Option<Coordinate>>, RedisError> {
    required(array(response, |element| match element {
        RedisResponse::Nil | RedisResponse::NilArray => Ok(None),
        other => coordinate(other, charset).map(Some),
    })?)
}

/// GEORADIUS 只读形式的结果
///
/// 子数组的元素顺序固定为 member、dist、hash、coord，由请求里的
/// WITH* 修饰符决定各段是否出现；完全没有 WITH* 时服务端返回
/// 扁平的成员列表。
pub fn georadius_results(
    response: RedisResponse,
    charset: Charset,
    with_coord: bool,
    with_dist: bool,
    with_hash: bool,
) -> Result<Vec<GeoradiusResult>, RedisError> {
    let plain = !with_coord && !with_dist && !with_hash;
    let expected_len = 1 + usize::from(with_coord) + usize::from(with_dist) + usize::from(with_hash);

    required(array(response, |element| {
        if plain {
            return Ok(GeoradiusResult {
                member: element.into_bytes()?,
                coordinate: None,
                distance: None,
                hash: None,
            });
        }

        let items = element.into_array()?;
        if items.len() != expected_len {
            return Err(RedisError::UnexpectedResponse(format!(
                "georadius entry must have {} elements, got {}",
                expected_len,
                items.len()
            )));
        }
        let mut iter = items.into_iter();
        let member = iter.next().expect("length checked").into_bytes()?;
        let distance = if with_dist {
            Some(double_from_bytes(
                &iter.next().expect("length checked").into_bytes()?,
                charset,
            )?)
        } else {
            None
        };
        let hash = if with_hash {
            Some(iter.next().expect("length checked").into_integer()?)
        } else {
            None
        };
        let coord = if with_coord {
            Some(coordinate(iter.next().expect("length checked"), charset)?)
        } else {
            None
        };
        Ok(GeoradiusResult {
            member,
            coordinate: coord,
            distance,
            hash,
        })
    })?)
}

/// TYPE 命令的键类型名称
pub fn redis_type(response: RedisResponse) -> Result<RedisType, RedisError> {
    let name = simple_string(response)?;
    RedisType::from_name(&name)
        .ok_or_else(|| RedisError::UnexpectedResponse(format!("type '{}' is not known", name)))
}

/// OBJECT ENCODING 的编码名称；key 不存在时为 `None`
pub fn object_encoding(
    response: RedisResponse,
    charset: Charset,
) -> Result<Option<RedisEncoding>, RedisError> {
    let Some(name) = bulk_string(response, charset)? else {
        return Ok(None);
    };
    RedisEncoding::from_name(&name)
        .map(Some)
        .ok_or_else(|| RedisError::UnexpectedResponse(format!("encoding '{}' is not known", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk_of(text: &str) -> RedisResponse {
        RedisResponse::Bulk(text.as_bytes().to_vec())
    }

    fn server_error() -> RedisResponse {
        RedisResponse::Error {
            code: "ERR".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_expect_ok() {
        assert!(expect_ok(RedisResponse::SimpleString("OK".to_string())).is_ok());
        assert!(matches!(
            expect_ok(RedisResponse::SimpleString("KO".to_string())),
            Err(RedisError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            expect_ok(server_error()),
            Err(RedisError::Server { .. })
        ));
    }

    #[test]
    fn test_ok_or_nokey() {
        assert!(ok_or_nokey(RedisResponse::SimpleString("OK".to_string())).unwrap());
        assert!(!ok_or_nokey(RedisResponse::SimpleString("NOKEY".to_string())).unwrap());
    }

    #[test]
    fn test_boolean_totality() {
        assert!(!boolean(RedisResponse::Integer(0)).unwrap());
        assert!(boolean(RedisResponse::Integer(1)).unwrap());
        assert!(matches!(
            boolean(RedisResponse::Integer(2)),
            Err(RedisError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            boolean(RedisResponse::Nil),
            Err(RedisError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_nullable_integer() {
        assert_eq!(nullable_integer(RedisResponse::Nil).unwrap(), None);
        assert_eq!(nullable_integer(RedisResponse::Integer(5)).unwrap(), Some(5));
    }

    #[test]
    fn test_string_accepts_both_shapes() {
        let charset = Charset::Utf8;
        assert_eq!(
            string(RedisResponse::SimpleString("PONG".to_string()), charset).unwrap(),
            Some("PONG".to_string())
        );
        assert_eq!(
            string(bulk_of("value"), charset).unwrap(),
            Some("value".to_string())
        );
        assert_eq!(string(RedisResponse::Nil, charset).unwrap(), None);
        assert!(string(RedisResponse::Integer(1), charset).is_err());
    }

    #[test]
    fn test_array_nullable_elements() {
        let charset = Charset::Utf8;
        let response = RedisResponse::Array(vec![bulk_of("a"), RedisResponse::Nil]);
        assert_eq!(
            nullable_strings(response, charset).unwrap(),
            vec![Some("a".to_string()), None]
        );
    }

    #[test]
    fn test_set_merges_duplicates() {
        let response = RedisResponse::Array(vec![bulk_of("a"), bulk_of("a"), bulk_of("b")]);
        let result = strings_as_set(response, Charset::Utf8).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_map_shapes() {
        let charset = Charset::Utf8;
        let key_fn = move |bytes: Vec<u8>| charset.decode(&bytes);
        let value_fn = move |bytes: Vec<u8>| charset.decode(&bytes);

        let response = RedisResponse::Array(vec![bulk_of("f"), bulk_of("v")]);
        let result = map(response, key_fn, value_fn).unwrap();
        assert_eq!(result.get("f"), Some(&"v".to_string()));

        let odd = RedisResponse::Array(vec![bulk_of("f")]);
        assert!(matches!(
            map(odd, key_fn, value_fn),
            Err(RedisError::UnexpectedResponse(_))
        ));

        let duplicated =
            RedisResponse::Array(vec![bulk_of("f"), bulk_of("1"), bulk_of("f"), bulk_of("2")]);
        assert!(matches!(
            map(duplicated, key_fn, value_fn),
            Err(RedisError::DuplicateField(field)) if field == "f"
        ));
    }

    #[test]
    fn test_double_parsing() {
        let charset = Charset::Utf8;
        assert_eq!(double(bulk_of("3.5"), charset).unwrap(), 3.5);
        assert!(matches!(
            double(bulk_of("not-a-number"), charset),
            Err(RedisError::UnexpectedResponse(_))
        ));
        assert_eq!(nullable_double(RedisResponse::Nil, charset).unwrap(), None);
    }

    #[test]
    fn test_scan_result() {
        let response = RedisResponse::Array(vec![
            bulk_of("17"),
            RedisResponse::Array(vec![bulk_of("k1"), bulk_of("k2")]),
        ]);
        let result = scan_result(response).unwrap();
        assert_eq!(result.cursor(), "17");
        assert!(!result.is_complete());
        assert_eq!(result.elements().len(), 2);

        let bad_cursor = RedisResponse::Array(vec![
            bulk_of("abc"),
            RedisResponse::Array(vec![]),
        ]);
        assert!(matches!(
            scan_result(bad_cursor),
            Err(RedisError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_list_pop_result() {
        let charset = Charset::Utf8;
        let response = RedisResponse::Array(vec![bulk_of("queue"), bulk_of("job")]);
        let result = list_pop_result(response, charset).unwrap().unwrap();
        assert_eq!(result.key, "queue");
        assert_eq!(result.value, b"job".to_vec());
        assert_eq!(
            list_pop_result(RedisResponse::NilArray, charset).unwrap(),
            None
        );
    }

    #[test]
    fn test_georadius_plain_members() {
        let response = RedisResponse::Array(vec![bulk_of("a"), bulk_of("b")]);
        let results =
            georadius_results(response, Charset::Utf8, false, false, false).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].member, b"a".to_vec());
        assert_eq!(results[0].distance, None);
    }

    #[test]
    fn test_georadius_with_dist_and_coord() {
        let entry = RedisResponse::Array(vec![
            bulk_of("a"),
            bulk_of("0.5"),
            RedisResponse::Array(vec![bulk_of("13.361389"), bulk_of("38.115556")]),
        ]);
        let response = RedisResponse::Array(vec![entry]);
        let results = georadius_results(response, Charset::Utf8, true, true, false).unwrap();
        assert_eq!(results[0].distance, Some(0.5));
        let coordinate = results[0].coordinate.unwrap();
        assert!((coordinate.longitude - 13.361389).abs() < 1e-9);
    }

    #[test]
    fn test_redis_type() {
        assert_eq!(
            redis_type(RedisResponse::SimpleString("zset".to_string())).unwrap(),
            RedisType::Zset
        );
        assert!(matches!(
            redis_type(RedisResponse::SimpleString("tree".to_string())),
            Err(RedisError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parsers_never_panic_on_any_shape() {
        let charset = Charset::Utf8;
        let samples = [
            RedisResponse::SimpleString("OK".to_string()),
            server_error(),
            RedisResponse::Integer(42),
            bulk_of("x"),
            RedisResponse::Nil,
            RedisResponse::Array(vec![RedisResponse::Integer(1)]),
            RedisResponse::NilArray,
        ];
        for sample in samples {
            let _ = expect_ok(sample.clone());
            let _ = integer(sample.clone());
            let _ = nullable_integer(sample.clone());
            let _ = boolean(sample.clone());
            let _ = simple_string(sample.clone());
            let _ = bulk(sample.clone());
            let _ = string(sample.clone(), charset);
            let _ = bytes_list(sample.clone());
            let _ = strings_as_set(sample.clone(), charset);
            let _ = map(sample.clone(), |b| Ok(b), |b| Ok(b));
            let _ = double(sample.clone(), charset);
            let _ = scan_result(sample.clone());
            let _ = list_pop_result(sample.clone(), charset);
            let _ = set_pop_results(sample.clone(), charset);
            let _ = coordinates(sample.clone(), charset);
            let _ = georadius_results(sample, charset, true, true, true);
        }
    }
}
