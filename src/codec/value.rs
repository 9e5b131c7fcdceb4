//! Polymorphic glue values.
//!
//! A [`Value`] tree owns all of its children, so dropping the root releases
//! the whole tree exactly once, whether it came out of a complete or an
//! aborted parse.

use serde::{Deserialize, Serialize};

/// Wire type ids shared by values and parameter descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlueType {
    None,
    Bool,
    IntRange,
    FloatRange,
    Str,
    Enum,
    Proxy,
    Seq,
    Rec,
}

impl GlueType {
    /// Highest valid type id.
    pub const LAST: u32 = 8;

    /// Numeric id used on the wire.
    pub const fn id(self) -> u32 {
        match self {
            GlueType::None => 0,
            GlueType::Bool => 1,
            GlueType::IntRange => 2,
            GlueType::FloatRange => 3,
            GlueType::Str => 4,
            GlueType::Enum => 5,
            GlueType::Proxy => 6,
            GlueType::Seq => 7,
            GlueType::Rec => 8,
        }
    }

    /// Look up a wire id. Ids above [`GlueType::LAST`] are unknown.
    pub fn from_id(id: u64) -> Option<Self> {
        let ty = match id {
            0 => GlueType::None,
            1 => GlueType::Bool,
            2 => GlueType::IntRange,
            3 => GlueType::FloatRange,
            4 => GlueType::Str,
            5 => GlueType::Enum,
            6 => GlueType::Proxy,
            7 => GlueType::Seq,
            8 => GlueType::Rec,
            _ => return None,
        };
        Some(ty)
    }
}

/// A value crossing the glue boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(Option<String>),
    Enum { type_name: String, index: u32 },
    /// Object handle; `0` is the null handle
    Proxy(u64),
    Seq(Vec<Value>),
    Rec(Record),
}

impl Value {
    /// Convenience constructor for a non-null string.
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Some(s.into()))
    }

    /// Convenience constructor for an enum value.
    pub fn enumeration(type_name: impl Into<String>, index: u32) -> Self {
        Value::Enum {
            type_name: type_name.into(),
            index,
        }
    }

    /// The wire type of this value.
    pub fn glue_type(&self) -> GlueType {
        match self {
            Value::None => GlueType::None,
            Value::Bool(_) => GlueType::Bool,
            Value::Int(_) => GlueType::IntRange,
            Value::Float(_) => GlueType::FloatRange,
            Value::Str(_) => GlueType::Str,
            Value::Enum { .. } => GlueType::Enum,
            Value::Proxy(_) => GlueType::Proxy,
            Value::Seq(_) => GlueType::Seq,
            Value::Rec(_) => GlueType::Rec,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Object handle carried by a `Proxy` (or a non-negative `Int`).
    pub fn as_proxy(&self) -> Option<u64> {
        match self {
            Value::Proxy(p) => Some(*p),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_rec(&self) -> Option<&Record> {
        match self {
            Value::Rec(rec) => Some(rec),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Some(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<Record> for Value {
    fn from(rec: Record) -> Self {
        Value::Rec(rec)
    }
}

/// Ordered named fields with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, Value)>", into = "Vec<(String, Value)>")]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing field of the same name is replaced in place.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style [`Record::set`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl From<Vec<(String, Value)>> for Record {
    fn from(fields: Vec<(String, Value)>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<Record> for Vec<(String, Value)> {
    fn from(rec: Record) -> Self {
        rec.fields
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut rec = Record::new();
        for (name, value) in iter {
            rec.set(name, value);
        }
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ids_roundtrip() {
        for id in 0..=u64::from(GlueType::LAST) {
            let ty = GlueType::from_id(id).unwrap();
            assert_eq!(u64::from(ty.id()), id);
        }
        assert_eq!(GlueType::from_id(9), None);
    }

    #[test]
    fn test_glue_type_of_values() {
        assert_eq!(Value::None.glue_type(), GlueType::None);
        assert_eq!(Value::from(3).glue_type(), GlueType::IntRange);
        assert_eq!(Value::from(1.5).glue_type(), GlueType::FloatRange);
        assert_eq!(Value::Str(None).glue_type(), GlueType::Str);
        assert_eq!(Value::enumeration("Color", 1).glue_type(), GlueType::Enum);
        assert_eq!(Value::Seq(vec![]).glue_type(), GlueType::Seq);
        assert_eq!(Value::Rec(Record::new()).glue_type(), GlueType::Rec);
    }

    #[test]
    fn test_record_set_replaces_in_place() {
        let mut rec = Record::new().with("a", Value::from(1)).with("b", Value::from(2));
        rec.set("a", Value::from(10));
        assert_eq!(rec.len(), 2);
        let names: Vec<&str> = rec.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(rec.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_record_from_duplicates_keeps_unique_names() {
        let rec: Record = vec![
            ("x".to_string(), Value::from(1)),
            ("x".to_string(), Value::from(2)),
        ]
        .into();
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_as_proxy() {
        assert_eq!(Value::Proxy(7).as_proxy(), Some(7));
        assert_eq!(Value::Int(7).as_proxy(), Some(7));
        assert_eq!(Value::Int(-1).as_proxy(), None);
        assert_eq!(Value::string("7").as_proxy(), None);
    }

    #[test]
    fn test_json_shape() {
        let v = Value::Seq(vec![Value::from(1), Value::Str(None)]);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "seq", "value": [{"type": "int", "value": 1}, {"type": "str", "value": null}]})
        );
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_json_record() {
        let v = Value::Rec(Record::new().with("n", Value::None));
        let text = serde_json::to_string(&v).unwrap();
        assert_eq!(text, r#"{"type":"rec","value":[["n",{"type":"none"}]]}"#);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v);
    }
}
