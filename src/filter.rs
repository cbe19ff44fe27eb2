use std::collections::BTreeSet;

use crate::model::TripRecord;

/// Filter value meaning "no filter on this dimension".
pub const ALL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub city: String,
    pub country: String,
}

impl Default for FilterSelection {
    fn default() -> Self {
        FilterSelection {
            city: ALL.to_string(),
            country: ALL.to_string(),
        }
    }
}

impl FilterSelection {
    pub fn new(city: Option<&str>, country: Option<&str>) -> Self {
        FilterSelection {
            city: city.unwrap_or(ALL).to_string(),
            country: country.unwrap_or(ALL).to_string(),
        }
    }

    pub fn matches(&self, trip: &TripRecord) -> bool {
        (self.city == ALL || trip.city == self.city)
            && (self.country == ALL || trip.country == self.country)
    }

    pub fn city_label(&self) -> &str {
        city_label(&self.city)
    }

    pub fn country_label(&self) -> &str {
        country_label(&self.country)
    }
}

pub fn filter(trips: &[TripRecord], selection: &FilterSelection) -> Vec<TripRecord> {
    trips
        .iter()
        .filter(|trip| selection.matches(trip))
        .cloned()
        .collect()
}

/// `All` followed by the distinct, non-blank cities of `trips` and
/// `extra_cities`, sorted.
pub fn city_options(trips: &[TripRecord], extra_cities: &[String]) -> Vec<String> {
    options(
        trips
            .iter()
            .map(|trip| trip.city.as_str())
            .chain(extra_cities.iter().map(String::as_str)),
    )
}

pub fn country_options(trips: &[TripRecord]) -> Vec<String> {
    options(trips.iter().map(|trip| trip.country.as_str()))
}

fn options<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let distinct: BTreeSet<&str> = values.filter(|v| !v.trim().is_empty()).collect();
    std::iter::once(ALL)
        .chain(distinct)
        .map(str::to_string)
        .collect()
}

pub fn city_label(option: &str) -> &str {
    if option == ALL {
        "All cities"
    } else {
        option
    }
}

pub fn country_label(option: &str) -> &str {
    if option == ALL {
        "All countries"
    } else {
        option
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: &str, city: &str, country: &str) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<TripRecord> {
        vec![
            trip("1", "Ghent", "Belgium"),
            trip("2", "Paris", "France"),
            trip("3", "Ghent", "Belgium"),
            trip("4", "", "  "),
        ]
    }

    #[test]
    fn sentinel_is_identity() {
        let trips = sample();
        assert_eq!(filter(&trips, &FilterSelection::default()), trips);
    }

    #[test]
    fn city_filter_keeps_order() {
        let visible = filter(&sample(), &FilterSelection::new(Some("Ghent"), None));
        let ids: Vec<&str> = visible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let selection = FilterSelection::new(None, Some("Belgium"));
        let once = filter(&sample(), &selection);
        assert_eq!(filter(&once, &selection), once);
    }

    #[test]
    fn exact_match_only() {
        assert!(filter(&sample(), &FilterSelection::new(Some("ghent"), None)).is_empty());
        assert!(filter(&sample(), &FilterSelection::new(Some("Gh"), None)).is_empty());
    }

    #[test]
    fn both_dimensions_must_match() {
        let selection = FilterSelection::new(Some("Ghent"), Some("France"));
        assert!(filter(&sample(), &selection).is_empty());
    }

    #[test]
    fn options_are_distinct_sorted_and_prefixed() {
        let extra = vec!["Antwerp".to_string(), "Paris".to_string(), " ".to_string()];
        assert_eq!(city_options(&sample(), &extra), vec!["All", "Antwerp", "Ghent", "Paris"]);
        assert_eq!(country_options(&sample()), vec!["All", "Belgium", "France"]);
        assert_eq!(country_options(&[]), vec!["All"]);
    }

    #[test]
    fn labels() {
        let selection = FilterSelection::default();
        assert_eq!(selection.city_label(), "All cities");
        assert_eq!(selection.country_label(), "All countries");
        assert_eq!(city_label("Ghent"), "Ghent");
    }
}
