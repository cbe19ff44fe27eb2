use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::distance::Coordinates;

use super::{string_field, DecodeError, Document, FieldValue, Timestamp};

/// A recommendable location. Built from loosely typed documents by
/// [`TripRecord::from_fields`], which never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripRecord {
    pub id: String,
    pub title: String,
    pub city: String,
    pub country: String,
    pub description: String,
    pub image: String,
    pub date_added: Option<i64>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TripRecord {
    pub fn from_fields(id: &str, fields: &Map<String, Value>) -> Self {
        let text = |name: &str| string_field(fields, name).unwrap_or_default();
        TripRecord {
            id: id.to_string(),
            title: text("title"),
            city: text("city"),
            country: text("country"),
            description: text("description"),
            image: text("image"),
            date_added: FieldValue::decode(fields.get("dateAdded")).epoch_seconds(),
            category: string_field(fields, "category"),
            latitude: FieldValue::decode(fields.get("latitude")).coordinate(),
            longitude: FieldValue::decode(fields.get("longitude")).coordinate(),
        }
    }

    /// Normalizes a stored document. Only a body that is not map-shaped at
    /// all is rejected.
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self::from_fields(&doc.id, &doc.fields()?))
    }

    /// Both coordinates, or nothing: a half-located trip is not mappable.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

/// Normalizes a whole snapshot, dropping documents that are structurally
/// unusable without failing the batch.
pub fn normalize_all<'a, I>(docs: I) -> Vec<TripRecord>
where
    I: IntoIterator<Item = &'a Document>,
{
    docs.into_iter()
        .filter_map(|doc| match TripRecord::from_document(doc) {
            Ok(trip) => Some(trip),
            Err(why) => {
                log::debug!("Skipping trip document: {}", why);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub title: String,
    pub city: String,
    pub country: String,
    pub category: String,
    pub description: String,
    pub image: String,
    pub position: Coordinates,
}

impl NewTrip {
    pub fn to_document(&self, date_added: Timestamp) -> Value {
        json!({
            "title": self.title,
            "city": self.city,
            "country": self.country,
            "description": self.description,
            "image": self.image,
            "category": self.category,
            "latitude": self.position.lat,
            "longitude": self.position.lng,
            "dateAdded": date_added.to_value(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trip(data: Value) -> TripRecord {
        TripRecord::from_document(&Document::new("t1", data)).unwrap()
    }

    #[test]
    fn mixed_coordinate_types() {
        let t = trip(json!({"latitude": "45.2", "longitude": 10}));
        assert_eq!(t.latitude, Some(45.2));
        assert_eq!(t.longitude, Some(10.0));
        assert_eq!(t.coordinates(), Some(Coordinates::new(45.2, 10.0)));
    }

    #[test]
    fn missing_latitude_stays_missing() {
        let t = trip(json!({"longitude": 4.4}));
        assert_eq!(t.latitude, None);
        assert_eq!(t.longitude, Some(4.4));
        assert_eq!(t.coordinates(), None);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let t = trip(json!({
            "title": 12,
            "city": "Ghent",
            "category": false,
            "latitude": "abc",
            "longitude": [1],
            "dateAdded": "yesterday"
        }));
        assert_eq!(t.title, "");
        assert_eq!(t.city, "Ghent");
        assert_eq!(t.category, None);
        assert_eq!(t.latitude, None);
        assert_eq!(t.longitude, None);
        assert_eq!(t.date_added, None);
    }

    #[test]
    fn date_added_from_integer_or_timestamp() {
        assert_eq!(trip(json!({"dateAdded": 1700000000})).date_added, Some(1700000000));
        assert_eq!(
            trip(json!({"dateAdded": {"seconds": 1700000001, "nanoseconds": 9}})).date_added,
            Some(1700000001)
        );
        assert_eq!(trip(json!({"dateAdded": 1.5})).date_added, None);
    }

    #[test]
    fn null_body_yields_defaults() {
        let t = trip(Value::Null);
        assert_eq!(t.id, "t1");
        assert_eq!(t, TripRecord { id: "t1".to_string(), ..Default::default() });
    }

    #[test]
    fn batch_skips_non_maps() {
        let docs = vec![
            Document::new("a", json!({"city": "Paris"})),
            Document::new("b", json!("garbage")),
            Document::new("c", json!({"city": "Ghent"})),
        ];
        let trips = normalize_all(&docs);
        let ids: Vec<&str> = trips.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
