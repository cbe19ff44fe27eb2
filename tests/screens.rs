use std::sync::Arc;

use citytrip::distance::Coordinates;
use citytrip::model::{TripRecord, UserIdentity};
use citytrip::services::location::FixedLocation;
use citytrip::services::storage::MemoryBlobStore;
use citytrip::services::{reviews_path, DocumentStore, MemoryStore, MESSAGES, TRIPS, USERS};
use citytrip::session::detail::DEFAULT_RATING;
use citytrip::session::inbox::UNKNOWN_SENDER;
use citytrip::session::{Inbox, Notice, TripDetail, TripForm};
use citytrip::CityTripError;
use serde_json::json;

fn bea() -> UserIdentity {
    UserIdentity {
        id: "u2".to_string(),
        display_name: None,
        email: Some("bea@example.com".to_string()),
    }
}

#[tokio::test]
async fn posting_a_review_needs_a_user() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(
            TRIPS,
            "t1",
            json!({"title": "MAS", "latitude": 51.2289, "longitude": 4.4048}),
        )
        .await;
    store
        .insert(&reviews_path("t1"), "r1", json!({"comment": "great view", "rating": 5}))
        .await;

    let mut detail = TripDetail::open(store.clone(), "t1").await.unwrap();
    assert_eq!(detail.reviews().len(), 1);
    assert_eq!(detail.rating(), DEFAULT_RATING);

    detail.set_rating(2);
    detail.set_comment("crowded");
    assert!(!detail.post_review(None).await);
    assert_eq!(
        detail.take_notices(),
        vec![Notice::Failure("Login required to post a review".to_string())]
    );
    assert_eq!(detail.comment(), "crowded");

    assert!(detail.post_review(Some(&bea())).await);
    assert_eq!(
        detail.take_notices(),
        vec![Notice::Info("Review posted".to_string())]
    );
    assert_eq!(detail.comment(), "");
    assert_eq!(detail.rating(), DEFAULT_RATING);

    // the inline array now exists and takes precedence
    assert_eq!(detail.reviews().len(), 1);
    let review = &detail.reviews()[0];
    assert_eq!(review.comment, "crowded");
    assert_eq!(review.username.as_deref(), Some("bea@example.com"));
    assert_eq!(review.rating, 2);
}

#[tokio::test]
async fn live_detail_reloads_reviews_and_releases_on_drop() {
    let store = Arc::new(MemoryStore::new());
    store.insert(TRIPS, "t1", json!({"title": "MAS"})).await;
    let anonymous = UserIdentity {
        id: "u9".to_string(),
        display_name: None,
        email: None,
    };

    let mut detail = TripDetail::open(store.clone(), "t1").await.unwrap();
    detail.attach().await.unwrap();
    assert!(detail.next_update().await);
    assert!(detail.reviews().is_empty());
    assert_eq!(store.active_listeners(), 1);

    detail.set_comment("quiet on mondays");
    assert!(detail.post_review(Some(&anonymous)).await);
    // while attached, the listener delivers the change
    assert!(detail.reviews().is_empty());

    assert!(detail.next_update().await);
    assert_eq!(detail.reviews().len(), 1);
    assert_eq!(detail.reviews()[0].username.as_deref(), Some("Anonymous"));
    assert_eq!(detail.reviews()[0].comment, "quiet on mondays");

    drop(detail);
    assert_eq!(store.active_listeners(), 0);
}

#[tokio::test]
async fn detached_detail_stops_listening() {
    let store = Arc::new(MemoryStore::new());
    store.insert(TRIPS, "t1", json!({"title": "MAS"})).await;

    let mut detail = TripDetail::open(store.clone(), "t1").await.unwrap();
    detail.attach().await.unwrap();
    assert_eq!(store.active_listeners(), 1);
    detail.detach();
    assert_eq!(store.active_listeners(), 0);
    assert!(!detail.next_update().await);
}

#[tokio::test]
async fn detail_of_malformed_trip() {
    let store = Arc::new(MemoryStore::new());
    store.insert(TRIPS, "t1", json!(["not", "a", "trip"])).await;
    let result = TripDetail::open(store, "t1").await;
    assert!(matches!(result, Err(CityTripError::Decode(_))));
}

#[tokio::test]
async fn detail_of_missing_trip() {
    let store = Arc::new(MemoryStore::new());
    let result = TripDetail::open(store, "nope").await;
    assert!(matches!(result, Err(CityTripError::TripNotFound(id)) if id == "nope"));
}

#[tokio::test]
async fn detail_distance() {
    let store = Arc::new(MemoryStore::new());
    let trip = TripRecord {
        id: "t1".to_string(),
        latitude: Some(51.0),
        longitude: Some(4.0),
        ..Default::default()
    };
    let mut detail = TripDetail::new(store, trip);
    assert_eq!(detail.distance_label(), None);
    detail
        .locate(&FixedLocation::at(Coordinates::new(51.0, 4.0)))
        .await;
    assert_eq!(detail.distance_label().as_deref(), Some("0 m"));
    detail.locate(&FixedLocation::denied()).await;
    assert_eq!(detail.distance_label(), None);
}

fn form() -> TripForm {
    TripForm {
        title: "Zoo".to_string(),
        city: "Antwerp".to_string(),
        country: "Belgium".to_string(),
        category: "Animals".to_string(),
        description: "Elephants".to_string(),
        picked_image: Some(vec![0xff, 0xd8, 0xff]),
        ..Default::default()
    }
}

#[tokio::test]
async fn saving_a_trip_uploads_the_picked_image() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    let here = FixedLocation::at(Coordinates::new(51.2166, 4.4208));

    let id = form().save(&store, &blobs, &here).await.unwrap();

    let doc = store.get(TRIPS, &id).await.unwrap().unwrap();
    let image = doc.get("image").and_then(|v| v.as_str()).unwrap();
    let path = image.strip_prefix("memory://").unwrap();
    assert!(path.starts_with("citytrips_images/"));
    assert!(path.ends_with(".jpg"));
    assert_eq!(blobs.get(path), Some(vec![0xff, 0xd8, 0xff]));

    let trip = TripRecord::from_document(&doc).unwrap();
    assert_eq!(trip.title, "Zoo");
    assert_eq!(trip.category.as_deref(), Some("Animals"));
    assert_eq!(trip.coordinates(), Some(Coordinates::new(51.2166, 4.4208)));
    assert!(trip.date_added.is_some());
}

#[tokio::test]
async fn saving_a_trip_without_position_stores_nothing() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();

    let denied = form().save(&store, &blobs, &FixedLocation::denied()).await;
    assert!(matches!(denied, Err(CityTripError::LocationPermission())));

    let unknown = form().save(&store, &blobs, &FixedLocation::unknown()).await;
    assert!(matches!(unknown, Err(CityTripError::LocationUnavailable())));

    assert!(store.list(TRIPS).await.unwrap().is_empty());
}

#[tokio::test]
async fn inbox_names_senders_and_skips_repeats() {
    let store = Arc::new(MemoryStore::new());
    store.insert(USERS, "p1", json!({"userId": "u2", "name": "bea"})).await;
    store
        .insert(MESSAGES, "m1", json!({"from": "u2", "to": "me", "message": "hi", "timestamp": 1000}))
        .await;
    store
        .insert(MESSAGES, "m2", json!({"from": "ghost", "to": "me", "message": "boo", "timestamp": 2000}))
        .await;
    store
        .insert(MESSAGES, "m3", json!({"from": "me", "to": "u2", "message": "hey", "timestamp": 3000}))
        .await;

    let mut inbox = Inbox::new(store.clone(), "me");
    inbox.attach().await.unwrap();
    assert!(inbox.next_update().await);

    let received: Vec<(&str, &str)> = inbox
        .received()
        .iter()
        .map(|m| (m.from_name.as_str(), m.message.as_str()))
        .collect();
    assert_eq!(received, vec![("bea", "hi"), (UNKNOWN_SENDER, "boo")]);

    // a new message re-delivers the whole inbox
    store
        .insert(MESSAGES, "m4", json!({"from": "u2", "to": "me", "message": "again", "timestamp": 4000}))
        .await;
    assert!(inbox.next_update().await);
    assert_eq!(inbox.received().len(), 3);

    inbox.detach();
    assert_eq!(store.active_listeners(), 0);
}

#[tokio::test]
async fn sent_messages_land_in_the_store() {
    let store = Arc::new(MemoryStore::new());
    let mut inbox = Inbox::new(store.clone(), "me");
    assert!(inbox.send("u2", "see you at the station").await);
    assert!(inbox.take_notices().is_empty());

    let sent = store.query_eq(MESSAGES, "to", "u2").await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].get("from"), Some(&json!("me")));
    assert_eq!(sent[0].get("message"), Some(&json!("see you at the station")));
}
