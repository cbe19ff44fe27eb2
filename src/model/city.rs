use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::CityTripError;

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCity {
    pub name: String,
    pub category: String,
    pub country: String,
    pub location: String,
    pub description: String,
    /// ISO-8601, defaults to the time the form was opened.
    pub date_added: String,
}

impl NewCity {
    pub fn opened_at(now: DateTime<Utc>) -> Self {
        NewCity {
            date_added: now.format(ISO_FORMAT).to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CityTripError> {
        if self.name.trim().is_empty() || self.country.trim().is_empty() {
            return Err(CityTripError::Validation(
                "Please provide at least name and country".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "category": self.category,
            "country": self.country,
            "dateAdded": self.date_added,
            "description": self.description,
            "location": self.location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_date_is_iso() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(NewCity::opened_at(now).date_added, "2024-03-09T14:05:07Z");
    }

    #[test]
    fn name_and_country_required() {
        let mut city = NewCity::default();
        city.name = "Antwerp".to_string();
        assert!(city.validate().is_err());
        city.country = "Belgium".to_string();
        assert!(city.validate().is_ok());
    }
}
