//! Renderable values stored in the content model.
//!
//! The set of kinds a template can render is closed: strings, numbers,
//! booleans, timestamps, sequences and nested maps (plus `Null`). Anything else
//! has to be converted explicitly, either through one of the `From` impls or
//! through [`Value::from_serialize`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Number;
use tessera_carton::CompactString;

use crate::error::ValueResult;

/// Associative container used by every scope. Ordered so that serialized
/// output is deterministic.
pub type ValueMap = BTreeMap<CompactString, Value>;

/// A template-renderable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    String(CompactString),
    Number(Number),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Sequence(Vec<Value>),
    Map(ValueMap),
}

/// Runtime kind of a [`Value`], used by typed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Null = 0,
    String = 1,
    Number = 2,
    Bool = 3,
    Timestamp = 4,
    Sequence = 5,
    Map = 6,
    /// Widest kind, accepts every value
    Any = 7,
}

impl ValueKind {
    /// Whether a value of kind `other` can be read as `self`.
    #[inline]
    pub fn accepts(self, other: ValueKind) -> bool {
        self == ValueKind::Any || self == other
    }

    pub fn to_display(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Timestamp => "timestamp",
            Self::Sequence => "sequence",
            Self::Map => "map",
            Self::Any => "any",
        }
    }
}

impl Value {
    /// Convert any serializable type into its renderable representation.
    ///
    /// Structs become maps keyed by field name, enums and newtypes follow
    /// serde's JSON data model.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> ValueResult<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Empty map value
    #[inline]
    pub fn empty_map() -> Self {
        Value::Map(ValueMap::new())
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Map(_) => ValueKind::Map,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Follow `segments` through nested maps.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        let mut value = self;
        for segment in segments {
            value = value.as_map()?.get(segment.as_ref())?;
        }
        Some(value)
    }

    /// Convert into a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Timestamp(ts) => serde_json::Value::String(format_timestamp(ts)),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(map_to_json(map)),
        }
    }
}

/// Convert a whole container into a JSON object.
pub fn map_to_json(map: &ValueMap) -> serde_json::Map<String, serde_json::Value> {
    map.iter()
        .map(|(key, value)| (key.to_string(), value.to_json()))
        .collect()
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Get the map stored under `key`, replacing whatever else is there.
///
/// A missing key gets a fresh empty map. A non-map value is discarded.
pub fn ensure_map<'a>(map: &'a mut ValueMap, key: &str) -> &'a mut ValueMap {
    let slot = map
        .entry(CompactString::new(key))
        .or_insert_with(Value::empty_map);
    if !slot.is_map() {
        *slot = Value::empty_map();
    }
    match slot {
        Value::Map(nested) => nested,
        _ => unreachable!("slot holds a map"),
    }
}

/// Remove the value `segments` addresses. A non-map met on the way is
/// removed in its place, and maps left empty are pruned.
pub fn remove_path<S: AsRef<str>>(map: &mut ValueMap, segments: &[S]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let key = first.as_ref();
    if rest.is_empty() {
        map.remove(key);
        return;
    }

    let emptied = match map.get_mut(key) {
        Some(Value::Map(nested)) => {
            remove_path(nested, rest);
            nested.is_empty()
        }
        Some(_) => true,
        None => false,
    };
    if emptied {
        map.remove(key);
    }
}

/// Deep merge where `incoming` wins on conflicts. Nested maps merge key by key.
pub fn overlay(target: &mut ValueMap, incoming: ValueMap) {
    for (key, value) in incoming {
        match target.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                (Value::Map(existing), Value::Map(nested)) => overlay(existing, nested),
                (existing, value) => *existing = value,
            },
        }
    }
}

/// Deep merge where `target` wins on conflicts; `source` only fills gaps.
pub fn fill_gaps(target: &mut ValueMap, source: &ValueMap) {
    for (key, value) in source {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), value.clone());
            }
            Some(Value::Map(existing)) => {
                if let Value::Map(nested) = value {
                    fill_gaps(existing, nested);
                }
            }
            Some(_) => {}
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Number(n) => n.serialize(serializer),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key.as_str(), value)?;
                }
                out.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(CompactString::from(s)),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (CompactString::from(key), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(CompactString::new(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(CompactString::from(value))
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Types that can be read back out of the model with a kind check.
pub trait FromValue: Sized {
    /// Kind a stored value must have to be read as `Self`.
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const KIND: ValueKind = ValueKind::Any;

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromValue for CompactString {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(CompactString::new)
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const KIND: ValueKind = ValueKind::Number;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

impl FromValue for u64 {
    const KIND: ValueKind = ValueKind::Number;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const KIND: ValueKind = ValueKind::Number;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::Sequence;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Sequence(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl FromValue for ValueMap {
    const KIND: ValueKind = ValueKind::Map;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_map().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ValueMap {
        match Value::from(value) {
            Value::Map(map) => map,
            other => panic!("expected a map, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_of_each_variant() {
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::from(3).kind(), ValueKind::Number);
        assert_eq!(Value::from(2.5).kind(), ValueKind::Number);
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::from(vec![1, 2]).kind(), ValueKind::Sequence);
        assert_eq!(Value::empty_map().kind(), ValueKind::Map);
        assert_eq!(Value::Null.kind(), ValueKind::Null);
    }

    #[test]
    fn test_any_accepts_everything() {
        assert!(ValueKind::Any.accepts(ValueKind::Map));
        assert!(ValueKind::Any.accepts(ValueKind::String));
        assert!(ValueKind::String.accepts(ValueKind::String));
        assert!(!ValueKind::String.accepts(ValueKind::Number));
        assert!(!ValueKind::Map.accepts(ValueKind::Any));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
    }

    #[test]
    fn test_from_serialize_struct_becomes_map() {
        #[derive(Serialize)]
        struct Author {
            name: &'static str,
            books: u32,
        }

        let value = Value::from_serialize(&Author {
            name: "Le Guin",
            books: 23,
        })
        .unwrap();
        assert_eq!(value, Value::Map(map(json!({"name": "Le Guin", "books": 23}))));
    }

    #[test]
    fn test_lookup_nested() {
        let value = Value::Map(map(json!({"a": {"b": {"c": 1}}})));
        assert_eq!(value.lookup(&["a", "b", "c"]), Some(&Value::from(1)));
        assert_eq!(value.lookup(&["a", "x"]), None);
        assert_eq!(value.lookup(&["a", "b", "c", "d"]), None);
    }

    #[test]
    fn test_ensure_map_replaces_scalar() {
        let mut container = map(json!({"a": 5}));
        ensure_map(&mut container, "a").insert("b".into(), Value::from("x"));
        assert_eq!(container, map(json!({"a": {"b": "x"}})));
    }

    #[test]
    fn test_remove_path_prunes_empty_maps() {
        let mut container = map(json!({"x": {"y": 1}, "keep": true}));
        remove_path(&mut container, &["x", "y"]);
        assert_eq!(container, map(json!({"keep": true})));

        let mut container = map(json!({"x": {"y": 1, "z": 2}}));
        remove_path(&mut container, &["x", "y"]);
        assert_eq!(container, map(json!({"x": {"z": 2}})));
    }

    #[test]
    fn test_remove_path_drops_scalar_prefix() {
        let mut container = map(json!({"a": 5}));
        remove_path(&mut container, &["a", "b"]);
        assert!(container.is_empty());

        let mut container = map(json!({"a": {"c": 1}}));
        remove_path(&mut container, &["a", "b", "c"]);
        assert_eq!(container, map(json!({"a": {"c": 1}})));
    }

    #[test]
    fn test_overlay_incoming_wins() {
        let mut target = map(json!({"a": {"x": 1, "y": 2}, "b": 1}));
        overlay(&mut target, map(json!({"a": {"y": 3, "z": 4}, "b": [1]})));
        assert_eq!(
            target,
            map(json!({"a": {"x": 1, "y": 3, "z": 4}, "b": [1]}))
        );
    }

    #[test]
    fn test_fill_gaps_existing_wins() {
        let mut target = map(json!({"a": {"y": 3}, "b": "near"}));
        fill_gaps(
            &mut target,
            &map(json!({"a": {"x": 1, "y": 2}, "b": "far", "c": [1, 2]})),
        );
        assert_eq!(
            target,
            map(json!({"a": {"x": 1, "y": 3}, "b": "near", "c": [1, 2]}))
        );
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2016, 10, 6, 12, 30, 0).unwrap();
        let value = Value::from(ts);
        assert_eq!(value.to_json(), json!("2016-10-06T12:30:00Z"));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            "\"2016-10-06T12:30:00Z\""
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(
            Value::Map(map(json!({"b": [1, "two"], "a": null}))).to_string(),
            r#"{"a":null,"b":[1,"two"]}"#
        );
    }

    #[test]
    fn test_from_value_checks_variant() {
        assert_eq!(i64::from_value(&Value::from(7)), Some(7));
        assert_eq!(i64::from_value(&Value::from("7")), None);
        assert_eq!(f64::from_value(&Value::from(7)), Some(7.0));
        assert_eq!(
            String::from_value(&Value::from("hello")),
            Some("hello".to_string())
        );
        assert_eq!(bool::from_value(&Value::Null), None);
    }
}
