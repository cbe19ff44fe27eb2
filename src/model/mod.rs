use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod city;
pub mod message;
pub mod review;
pub mod trip;
pub mod user;

pub use city::NewCity;
pub use message::Message;
pub use review::{NewReview, ReviewRecord};
pub use trip::{NewTrip, TripRecord};
pub use user::{UserIdentity, UserProfile};

/// A document as handed out by the store: a backend-assigned id plus an
/// untyped JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Document {
            id: id.into(),
            data,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.as_object().and_then(|map| map.get(field))
    }

    /// The body as a field map. A missing (`null`) body reads as an empty
    /// map, anything else that is not an object is a structural error.
    pub fn fields(&self) -> Result<Map<String, Value>, DecodeError> {
        match &self.data {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(Map::new()),
            other => Err(DecodeError::NotAMap {
                id: self.id.clone(),
                kind: kind_of(other),
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("document {id} is a {kind}, expected a map")]
    NotAMap { id: String, kind: &'static str },
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Seconds/nanoseconds pair in the shape the document store uses for
/// timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        let now = Utc::now();
        Timestamp {
            seconds: now.timestamp(),
            nanoseconds: now.timestamp_subsec_nanos(),
        }
    }

    pub fn to_value(self) -> Value {
        serde_json::json!({ "seconds": self.seconds, "nanoseconds": self.nanoseconds })
    }
}

/// One document field, decoded into the variants the normalizers care about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Text(&'a str),
    Integer(i64),
    Float(f64),
    Timestamp(i64),
    Other,
}

impl<'a> FieldValue<'a> {
    pub fn decode(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Other
                }
            }
            Some(Value::Object(map)) => timestamp_seconds(map)
                .map(FieldValue::Timestamp)
                .unwrap_or(FieldValue::Other),
            Some(_) => FieldValue::Other,
        }
    }

    pub fn text(self) -> Option<&'a str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer, or the seconds of a timestamp.
    pub fn epoch_seconds(self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) | FieldValue::Timestamp(i) => Some(i),
            _ => None,
        }
    }

    /// Any number, or a string that parses as one.
    pub fn coordinate(self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(f),
            FieldValue::Integer(i) => Some(i as f64),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Numbers truncated toward zero. Strings do not count.
    pub fn whole_number(self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(i),
            FieldValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            _ => None,
        }
    }
}

// Accepts both `{seconds, nanoseconds}` and the `_seconds` form the admin SDKs
// serialize to.
fn timestamp_seconds(map: &Map<String, Value>) -> Option<i64> {
    map.get("seconds")
        .or_else(|| map.get("_seconds"))
        .and_then(Value::as_i64)
}

pub fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    FieldValue::decode(fields.get(name)).text().map(str::to_string)
}
