//! Sorting, filtering and truncation over records.
//!
//! Ordering rules:
//!
//! - numbers compare numerically, strings by byte order, `false < true`;
//! - values of different kinds order by kind:
//!   number < string < boolean < array < object;
//! - arrays and objects of the same kind compare by their serialized text;
//! - a missing field or `null` always sorts last, ascending or descending;
//! - sorting is stable, so ties keep insertion order.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::record::Record;

/// Parsed sort key: `field` for ascending, `-field` for descending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    /// Parses a sort key. Empty keys (and a bare `-`) mean insertion order.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let (field, descending) = match spec.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (spec, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }

    /// Compares two records by this key.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let left = present(a.get(&self.field));
        let right = present(b.get(&self.field));
        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = compare_values(l, r);
                if self.descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }
}

fn present(value: Option<&JsonValue>) -> Option<&JsonValue> {
    value.filter(|v| !v.is_null())
}

fn kind_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Number(_) => 0,
        JsonValue::String(_) => 1,
        JsonValue::Bool(_) => 2,
        JsonValue::Array(_) => 3,
        JsonValue::Object(_) => 4,
        JsonValue::Null => 5,
    }
}

/// Total order over non-null JSON values.
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x.cmp(&y);
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x.cmp(&y);
            }
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Array(_), JsonValue::Array(_)) | (JsonValue::Object(_), JsonValue::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Equality used by filters. Numbers match by value, so `1` equals `1.0`.
/// Two integers compare exactly; floats are involved only when one side is
/// a float.
pub fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            if !x.is_f64() && !y.is_f64() {
                // one negative, one above i64::MAX
                return false;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => a == b,
    }
}

/// True iff every predicate field is present on `record` with an equal value.
pub fn matches(record: &Record, predicate: &Record) -> bool {
    predicate.iter().all(|(field, expected)| {
        record
            .get(field)
            .map_or(false, |actual| values_equal(actual, expected))
    })
}

/// Sorts (stably) and truncates `records` in place.
pub fn sort_and_limit(records: &mut Vec<Record>, sort: Option<&str>, limit: Option<usize>) {
    if let Some(spec) = sort.and_then(SortSpec::parse) {
        records.sort_by(|a, b| spec.compare(a, b));
    }
    if let Some(limit) = limit {
        records.truncate(limit);
    }
}
