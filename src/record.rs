//! Schema-less record model.
//!
//! A [`Record`] is a key-ordered map of field name to JSON value. The store
//! never validates field sets: whatever the caller writes comes back on read,
//! unknown fields included. Only two fields are owned by the store itself,
//! [`ID_FIELD`] and [`CREATED_DATE_FIELD`], which are assigned once on
//! creation and never reassigned afterwards.
//!
//! # Examples
//!
//! ```rust
//! use vignan_local_core::record::{merge_patch, stamp_new, ID_FIELD};
//! use serde_json::json;
//!
//! let fields = json!({"title": "Data Structures", "credits": 4});
//! let mut course = stamp_new(fields.as_object().unwrap().clone());
//! assert!(course.contains_key(ID_FIELD));
//!
//! let patch = json!({"credits": 3});
//! merge_patch(&mut course, patch.as_object().unwrap());
//! assert_eq!(course["credits"], json!(3));
//! assert_eq!(course["title"], json!("Data Structures"));
//! ```

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// One schema-less data item.
pub type Record = Map<String, JsonValue>;

/// Store-assigned unique identifier.
pub const ID_FIELD: &str = "id";
/// Store-assigned ISO-8601 creation timestamp.
pub const CREATED_DATE_FIELD: &str = "created_date";

/// Generates an opaque record id.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC time as an ISO-8601 string with millisecond precision,
/// e.g. `2026-01-01T10:00:00.000Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns `fields` with a fresh `id` and `created_date` merged over it.
///
/// Caller-supplied values for the two reserved fields are overwritten.
pub fn stamp_new(mut fields: Record) -> Record {
    fields.insert(ID_FIELD.to_string(), JsonValue::String(new_record_id()));
    fields.insert(CREATED_DATE_FIELD.to_string(), JsonValue::String(now_iso()));
    fields
}

/// Shallow-merges `patch` into `target`.
///
/// Fields named in the patch overwrite, everything else is preserved. The
/// reserved `id` and `created_date` fields are never touched.
pub fn merge_patch(target: &mut Record, patch: &Record) {
    for (key, value) in patch {
        if key == ID_FIELD || key == CREATED_DATE_FIELD {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// The record's `id`, if it has a string one.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get(ID_FIELD).and_then(JsonValue::as_str)
}

/// Converts an arbitrary JSON value into a record, rejecting non-objects.
pub fn into_record(value: JsonValue) -> StoreResult<Record> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(StoreError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
