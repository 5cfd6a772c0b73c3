use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Represents a number that can preserve distinction between I64, U64, and F64 for round-tripping.
/// The backend treats integer ids and order indexes differently from measured quantities.
#[derive(Debug, Clone, PartialEq)]
pub enum ExNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl ExNumber {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ExNumber::I64(v) => Some(*v),
            ExNumber::U64(v) => i64::try_from(*v).ok(),
            ExNumber::F64(_) => None,
        }
    }

    /// Shortest text form used inside edit entries.
    pub fn to_edit_string(&self) -> String {
        match self {
            ExNumber::I64(v) => v.to_string(),
            ExNumber::U64(v) => v.to_string(),
            ExNumber::F64(v) => {
                if !v.is_finite() {
                    return statics::EN_EMPTY.to_string();
                }
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    // Integral floats edit as "12", not "12.0".
                    return format!("{}", *v as i64);
                }
                let mut buf = ryu::Buffer::new();
                buf.format_finite(*v).to_string()
            }
        }
    }
}

impl Serialize for ExNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExNumber::I64(v) => serializer.serialize_i64(*v),
            ExNumber::U64(v) => serializer.serialize_u64(*v),
            ExNumber::F64(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for ExNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumberVisitor;

        impl<'de> de::Visitor<'de> for NumberVisitor {
            type Value = ExNumber;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ExNumber::I64(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ExNumber::U64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ExNumber::F64(v))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

/// Represents one value of a backend record.
/// Objects keep the key order the backend sent so edit surfaces stay stable.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExValue {
    #[default]
    Null,
    Bool(bool),
    Number(ExNumber),
    String(String),
    Array(Vec<ExValue>),
    Object(IndexMap<String, ExValue>),
}

impl ExValue {
    pub fn as_object(&self) -> Option<&IndexMap<String, ExValue>> {
        match self {
            ExValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, ExValue>> {
        match self {
            ExValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ExValue]> {
        match self {
            ExValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ExValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ExValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ExValue::Null)
    }

    pub fn parse_json5(text: &str) -> anyhow::Result<ExValue> {
        Ok(json5::from_str::<ExValue>(text)?)
    }

    /// Render a value the way edit entries hold it.
    /// Nested structures are carried as compact JSON text at the edit boundary.
    pub fn to_edit_string(&self) -> String {
        match self {
            ExValue::Null => statics::EN_EMPTY.to_string(),
            ExValue::Bool(v) => v.to_string(),
            ExValue::Number(n) => n.to_edit_string(),
            ExValue::String(s) => s.clone(),
            ExValue::Array(_) | ExValue::Object(_) => self.to_json_compact(),
        }
    }

    pub fn to_json_compact(&self) -> String {
        serde_json::Value::from(self).to_string()
    }
}

impl From<&str> for ExValue {
    fn from(v: &str) -> Self {
        ExValue::String(v.to_owned())
    }
}

impl From<String> for ExValue {
    fn from(v: String) -> Self {
        ExValue::String(v)
    }
}

impl From<i64> for ExValue {
    fn from(v: i64) -> Self {
        ExValue::Number(ExNumber::I64(v))
    }
}

impl From<f64> for ExValue {
    fn from(v: f64) -> Self {
        ExValue::Number(ExNumber::F64(v))
    }
}

impl From<IndexMap<String, ExValue>> for ExValue {
    fn from(map: IndexMap<String, ExValue>) -> Self {
        ExValue::Object(map)
    }
}

impl From<serde_json::Value> for ExValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ExValue::Null,
            serde_json::Value::Bool(b) => ExValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    ExValue::Number(ExNumber::I64(v))
                } else if let Some(v) = n.as_u64() {
                    ExValue::Number(ExNumber::U64(v))
                } else {
                    ExValue::Number(ExNumber::F64(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => ExValue::String(s),
            serde_json::Value::Array(values) => {
                ExValue::Array(values.into_iter().map(ExValue::from).collect())
            }
            serde_json::Value::Object(map) => ExValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ExValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&ExValue> for serde_json::Value {
    fn from(value: &ExValue) -> Self {
        match value {
            ExValue::Null => serde_json::Value::Null,
            ExValue::Bool(b) => serde_json::Value::Bool(*b),
            ExValue::Number(ExNumber::I64(v)) => serde_json::Value::from(*v),
            ExValue::Number(ExNumber::U64(v)) => serde_json::Value::from(*v),
            // JSON has no NaN/Infinity; the backend receives null for those.
            ExValue::Number(ExNumber::F64(v)) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ExValue::String(s) => serde_json::Value::String(s.clone()),
            ExValue::Array(values) => {
                serde_json::Value::Array(values.iter().map(serde_json::Value::from).collect())
            }
            ExValue::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for ExValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExValue::Null => serializer.serialize_unit(),
            ExValue::Bool(v) => serializer.serialize_bool(*v),
            ExValue::Number(n) => n.serialize(serializer),
            ExValue::String(s) => serializer.serialize_str(s),
            ExValue::Array(values) => values.serialize(serializer),
            ExValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ExValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = ExValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ExValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ExValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ExValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ExValue::Number(ExNumber::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ExValue::Number(ExNumber::U64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ExValue::Number(ExNumber::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ExValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ExValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<ExValue>()? {
                    values.push(value);
                }
                Ok(ExValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, ExValue>()? {
                    values.insert(key, value);
                }
                Ok(ExValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
