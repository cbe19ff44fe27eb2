use citytrip::filter::{filter, FilterSelection, ALL};
use citytrip::model::trip::normalize_all;
use citytrip::model::Document;
use serde_json::json;

fn trips() -> Vec<Document> {
    vec![
        Document::new("a", json!({"title": "Grote Markt", "city": "Antwerp", "country": "Belgium"})),
        Document::new("b", json!({"title": "Eiffel Tower", "city": "Paris", "country": "France"})),
        Document::new("c", json!("not a trip")),
        Document::new("d", json!({"title": "Zoo", "city": "Antwerp", "country": "Belgium"})),
        Document::new("e", json!({"title": "Belfry", "city": "antwerp", "country": "Belgium"})),
        Document::new("f", json!(null)),
    ]
}

#[test]
fn normalize_keeps_every_map_in_order() {
    let records = normalize_all(&trips());
    let ids: Vec<&str> = records.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "d", "e", "f"]);
    assert_eq!(records[2].title, "Zoo");
    assert_eq!(records[4].title, "");
}

#[test]
fn all_all_is_identity() {
    let records = normalize_all(&trips());
    assert_eq!(filter(&records, &FilterSelection::default()), records);
    assert_eq!(filter(&records, &FilterSelection::new(None, None)), records);
}

#[test]
fn selection_is_exact_and_idempotent() {
    let records = normalize_all(&trips());
    let selection = FilterSelection::new(Some("Antwerp"), Some("Belgium"));

    let once = filter(&records, &selection);
    let ids: Vec<&str> = once.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "d"]);
    assert_eq!(filter(&once, &selection), once);

    let city_only = FilterSelection::new(Some("Paris"), Some(ALL));
    assert_eq!(filter(&records, &city_only).len(), 1);
    assert!(filter(&records, &FilterSelection::new(Some("Paris"), Some("Belgium"))).is_empty());
}
