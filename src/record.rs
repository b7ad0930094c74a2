//! Record model
//!
//! A record is a schema-less, string-keyed JSON document. On disk, each
//! shard holds one serialized record per line.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// One schema-less document: string keys mapping to arbitrary JSON values
pub type Record = Map<String, Value>;

/// Serialize a record to its single-line on-disk form (no trailing newline)
pub fn encode_line(record: &Record) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// Decode one stored line back into a record.
///
/// Lines that are not a JSON object are a parse failure; the caller
/// decides whether that aborts the surrounding scan.
pub fn decode_line(line: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(line)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Parse(format!(
            "stored line is not a document: {}",
            other
        ))),
    }
}

/// Default auxiliary value passed to caller callbacks when none is supplied:
/// an empty JSON object, keeping the two-argument callback contract.
pub fn empty_aux() -> Value {
    Value::Object(Map::new())
}

/// Rank used to order values of different JSON types
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values, used by the sorted query strategies.
///
/// Values of different types order by type rank (null < bool < number <
/// string < array < object). Numbers compare as f64 with NaN treated as
/// equal, strings lexicographically, arrays element-wise, objects by
/// their serialized text.
pub fn value_cmp(a: &Value, b: &Value) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xe, ye) in x.iter().zip(y.iter()) {
                let ord = value_cmp(xe, ye);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => {
            let x = serde_json::to_string(a).unwrap_or_default();
            let y = serde_json::to_string(b).unwrap_or_default();
            x.cmp(&y)
        }
        _ => unreachable!("ranks matched but variants differ"),
    }
}

/// Compare two records by a named field; a missing field sorts as null
pub fn field_cmp(a: &Record, b: &Record, field: &str) -> Ordering {
    let av = a.get(field).unwrap_or(&Value::Null);
    let bv = b.get(field).unwrap_or(&Value::Null);
    value_cmp(av, bv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let record = rec(json!({"id": 1, "name": "alice", "tags": ["a", "b"]}));
        let line = encode_line(&record).unwrap();
        assert!(!line.contains('\n'));

        let decoded = decode_line(&line).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(decode_line("42"), Err(StoreError::Parse(_))));
        assert!(matches!(decode_line("not json"), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_value_cmp_numbers() {
        assert_eq!(value_cmp(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(value_cmp(&json!(2.5), &json!(2.5)), Ordering::Equal);
        assert_eq!(value_cmp(&json!(3), &json!(2.5)), Ordering::Greater);
    }

    #[test]
    fn test_value_cmp_mixed_types_by_rank() {
        assert_eq!(value_cmp(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(value_cmp(&json!(true), &json!(0)), Ordering::Less);
        assert_eq!(value_cmp(&json!(99), &json!("a")), Ordering::Less);
    }

    #[test]
    fn test_field_cmp_missing_field_sorts_first() {
        let a = rec(json!({"name": "alice"}));
        let b = rec(json!({"name": "bob", "age": 30}));
        assert_eq!(field_cmp(&a, &b, "age"), Ordering::Less);
    }
}
