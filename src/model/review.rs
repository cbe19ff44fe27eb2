use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{string_field, Document, FieldValue, Timestamp, UserIdentity};

pub const STAR_SLOTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewRecord {
    /// Position in the inline array, or the sub-collection document id.
    pub id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub rating: i64,
    pub comment: String,
}

impl ReviewRecord {
    /// An entry of the trip's inline `reviews` array. Entries that are not
    /// maps still produce a record, with every field defaulted.
    pub fn from_inline(index: usize, entry: &Value) -> Self {
        let empty = Map::new();
        let fields = entry.as_object().unwrap_or(&empty);
        ReviewRecord {
            id: index.to_string(),
            user_id: string_field(fields, "userId"),
            username: string_field(fields, "username")
                .or_else(|| string_field(fields, "userEmail")),
            rating: rating(fields),
            comment: string_field(fields, "description")
                .or_else(|| string_field(fields, "comment"))
                .unwrap_or_default(),
        }
    }

    pub fn from_subcollection(doc: &Document) -> Self {
        let empty = Map::new();
        let fields = doc.data.as_object().unwrap_or(&empty);
        ReviewRecord {
            id: doc.id.clone(),
            user_id: string_field(fields, "userId"),
            username: string_field(fields, "userEmail"),
            rating: rating(fields),
            comment: string_field(fields, "comment").unwrap_or_default(),
        }
    }

    /// Filled/outline state of each star. Always five slots, whatever the
    /// stored rating.
    pub fn stars(&self) -> [bool; STAR_SLOTS] {
        let mut slots = [false; STAR_SLOTS];
        for (idx, slot) in slots.iter_mut().enumerate() {
            *slot = (idx as i64) < self.rating;
        }
        slots
    }

    pub fn star_line(&self) -> String {
        self.stars()
            .iter()
            .map(|filled| if *filled { '★' } else { '☆' })
            .collect()
    }
}

fn rating(fields: &Map<String, Value>) -> i64 {
    FieldValue::decode(fields.get("rating"))
        .whole_number()
        .unwrap_or(0)
}

/// A review as posted from the detail screen, stored inline on the trip.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub username: String,
    pub user_id: String,
    pub comment: String,
    pub rating: i64,
    pub timestamp: Timestamp,
}

impl NewReview {
    pub fn by(user: &UserIdentity, rating: i64, comment: &str) -> Self {
        NewReview {
            username: user.label().to_string(),
            user_id: user.id.clone(),
            comment: comment.to_string(),
            rating,
            timestamp: Timestamp::now(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "username": self.username,
            "userId": self.user_id,
            "description": self.comment,
            "rating": self.rating,
            "timestamp": self.timestamp.to_value(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_prefers_description_and_username() {
        let r = ReviewRecord::from_inline(
            2,
            &json!({
                "description": "lovely",
                "comment": "ignored",
                "username": "ann",
                "userEmail": "ann@example.com",
                "userId": "u1",
                "rating": 4
            }),
        );
        assert_eq!(r.id, "2");
        assert_eq!(r.comment, "lovely");
        assert_eq!(r.username.as_deref(), Some("ann"));
        assert_eq!(r.user_id.as_deref(), Some("u1"));
        assert_eq!(r.rating, 4);
    }

    #[test]
    fn inline_falls_back_to_comment_and_email() {
        let r = ReviewRecord::from_inline(0, &json!({"comment": "ok", "userEmail": "b@x"}));
        assert_eq!(r.comment, "ok");
        assert_eq!(r.username.as_deref(), Some("b@x"));
        assert_eq!(r.rating, 0);
    }

    #[test]
    fn non_numeric_rating_defaults_to_zero() {
        let r = ReviewRecord::from_inline(0, &json!({"rating": "five"}));
        assert_eq!(r.rating, 0);
        let r = ReviewRecord::from_inline(0, &json!("not a map"));
        assert_eq!(r, ReviewRecord { id: "0".to_string(), ..Default::default() });
    }

    #[test]
    fn subcollection_fields() {
        let doc = Document::new(
            "abc",
            json!({"comment": "fine", "userEmail": "c@x", "userId": "u3", "rating": 3.9}),
        );
        let r = ReviewRecord::from_subcollection(&doc);
        assert_eq!(r.id, "abc");
        assert_eq!(r.comment, "fine");
        assert_eq!(r.username.as_deref(), Some("c@x"));
        assert_eq!(r.rating, 3);
    }

    #[test]
    fn stars_always_five_slots() {
        let mut r = ReviewRecord::default();
        r.rating = 2;
        assert_eq!(r.stars(), [true, true, false, false, false]);
        r.rating = 9;
        assert_eq!(r.stars(), [true; 5]);
        r.rating = -1;
        assert_eq!(r.star_line(), "☆☆☆☆☆");
    }
}
