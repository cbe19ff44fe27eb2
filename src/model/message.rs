use serde::Serialize;
use serde_json::{json, Value};

use super::{string_field, Document, FieldValue};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub message: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub from_name: String,
}

impl Message {
    pub fn new(from: &str, to: &str, text: &str, timestamp: i64) -> Self {
        Message {
            from: from.to_string(),
            to: to.to_string(),
            message: text.to_string(),
            timestamp,
            from_name: String::new(),
        }
    }

    pub fn from_document(doc: &Document) -> Self {
        let fields = match doc.data.as_object() {
            Some(fields) => fields,
            None => return Message::default(),
        };
        Message {
            from: string_field(fields, "from").unwrap_or_default(),
            to: string_field(fields, "to").unwrap_or_default(),
            message: string_field(fields, "message").unwrap_or_default(),
            timestamp: FieldValue::decode(fields.get("timestamp"))
                .whole_number()
                .unwrap_or(0),
            from_name: String::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "from": self.from,
            "to": self.to,
            "message": self.message,
            "timestamp": self.timestamp,
        })
    }

    /// Two deliveries of the same message share sender and timestamp.
    pub fn same_as(&self, other: &Message) -> bool {
        self.timestamp == other.timestamp && self.from == other.from
    }
}
