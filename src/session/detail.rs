use std::sync::Arc;

use log::*;

use crate::distance::{format_distance, Coordinates};
use crate::model::{NewReview, ReviewRecord, TripRecord, UserIdentity};
use crate::reviews;
use crate::services::location::{resolve_position, LocationProvider};
use crate::services::subscription::DocumentSubscription;
use crate::services::{DocumentStore, StoreError, TRIPS};
use crate::CityTripError;

use super::{Notice, Notices};

pub const DEFAULT_RATING: i64 = 4;

pub struct TripDetail {
    store: Arc<dyn DocumentStore>,
    trip: TripRecord,
    reviews: Vec<ReviewRecord>,
    user_position: Option<Coordinates>,
    rating: i64,
    comment: String,
    subscription: Option<DocumentSubscription>,
    notices: Notices,
}

impl TripDetail {
    pub fn new(store: Arc<dyn DocumentStore>, trip: TripRecord) -> Self {
        TripDetail {
            store,
            trip,
            reviews: Vec::new(),
            user_position: None,
            rating: DEFAULT_RATING,
            comment: String::new(),
            subscription: None,
            notices: Notices::default(),
        }
    }

    pub async fn open(store: Arc<dyn DocumentStore>, trip_id: &str) -> Result<Self, CityTripError> {
        let doc = store
            .get(TRIPS, trip_id)
            .await?
            .ok_or_else(|| CityTripError::TripNotFound(trip_id.to_string()))?;
        let trip = TripRecord::from_document(&doc)?;
        let mut detail = TripDetail::new(store.clone(), trip);
        match reviews::reviews_for(store.as_ref(), &doc).await {
            Ok(reviews) => detail.reviews = reviews,
            Err(why) => warn!("Failed to load reviews of {}: {}", trip_id, why),
        }
        Ok(detail)
    }

    pub fn trip(&self) -> &TripRecord {
        &self.trip
    }

    pub fn reviews(&self) -> &[ReviewRecord] {
        &self.reviews
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub async fn locate(&mut self, provider: &dyn LocationProvider) {
        self.user_position = resolve_position(provider).await;
    }

    pub fn set_user_position(&mut self, position: Option<Coordinates>) {
        self.user_position = position;
    }

    pub fn distance_label(&self) -> Option<String> {
        let user = self.user_position?;
        let target = self.trip.coordinates()?;
        Some(format_distance(user.distance_to(&target)))
    }

    pub fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
    }

    pub async fn reload_reviews(&mut self) {
        match reviews::load_reviews(self.store.as_ref(), &self.trip.id).await {
            Ok(reviews) => self.reviews = reviews,
            Err(why) => warn!("Failed to load reviews from document: {}", why),
        }
    }

    /// Listens to the trip document; each change reloads the reviews.
    pub async fn attach(&mut self) -> Result<(), StoreError> {
        let subscription = self.store.subscribe_document(TRIPS, &self.trip.id).await?;
        self.subscription = Some(subscription);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub async fn next_update(&mut self) -> bool {
        let update = match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        };
        match update {
            Some(Ok(Some(doc))) => {
                match reviews::reviews_for(self.store.as_ref(), &doc).await {
                    Ok(reviews) => self.reviews = reviews,
                    Err(why) => warn!("Failed to load subcollection reviews: {}", why),
                }
                true
            }
            Some(Ok(None)) => {
                self.reviews.clear();
                true
            }
            Some(Err(why)) => {
                warn!("Failed to load reviews from document: {}", why);
                true
            }
            None => {
                self.subscription = None;
                false
            }
        }
    }

    /// Posts the drafted review as `user`. On success the form resets.
    pub async fn post_review(&mut self, user: Option<&UserIdentity>) -> bool {
        let user = match user {
            Some(user) => user,
            None => {
                self.notices.failure("Login required to post a review");
                return false;
            }
        };
        let review = NewReview::by(user, self.rating, &self.comment);
        match reviews::post_review(self.store.as_ref(), &self.trip.id, &review).await {
            Ok(path) => {
                debug!("Review on {} stored via {:?}.", self.trip.id, path);
                self.notices.info("Review posted");
                self.comment.clear();
                self.rating = DEFAULT_RATING;
                if self.subscription.is_none() {
                    self.reload_reviews().await;
                }
                true
            }
            Err(why) => {
                self.notices.failure(format!("Failed: {}", why));
                false
            }
        }
    }
}
