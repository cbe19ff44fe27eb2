use serde::Serialize;
use serde_json::{json, Value};

use super::{string_field, Document};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UserIdentity {
    /// Author label used on reviews.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
}

impl UserProfile {
    /// New profile for a fresh account, named after the email's local part.
    pub fn for_signup(user_id: &str, email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email);
        UserProfile {
            user_id: user_id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn from_document(doc: &Document) -> Self {
        let fields = doc.data.as_object();
        let field = |name: &str| {
            fields
                .and_then(|map| string_field(map, name))
                .unwrap_or_default()
        };
        UserProfile {
            user_id: field("userId").trim().to_string(),
            name: field("name"),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ "userId": self.user_id, "name": self.name })
    }
}
