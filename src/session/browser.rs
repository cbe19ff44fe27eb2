use std::collections::BTreeSet;
use std::sync::Arc;

use log::*;

use crate::distance::{format_distance, Coordinates};
use crate::filter::{self, FilterSelection};
use crate::model::{trip::normalize_all, Document, TripRecord};
use crate::services::subscription::CollectionSubscription;
use crate::services::{DocumentStore, Query, StoreError, CITIES, TRIPS};

use super::{Notice, Notices};

pub struct TripBrowser {
    store: Arc<dyn DocumentStore>,
    all_trips: Vec<TripRecord>,
    visible: Vec<TripRecord>,
    city_names: Vec<String>,
    selection: FilterSelection,
    user_position: Option<Coordinates>,
    subscription: Option<CollectionSubscription>,
    refreshing: bool,
    notices: Notices,
}

impl TripBrowser {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        TripBrowser {
            store,
            all_trips: Vec::new(),
            visible: Vec::new(),
            city_names: Vec::new(),
            selection: FilterSelection::default(),
            user_position: None,
            subscription: None,
            refreshing: false,
            notices: Notices::default(),
        }
    }

    pub fn all_trips(&self) -> &[TripRecord] {
        &self.all_trips
    }

    pub fn visible(&self) -> &[TripRecord] {
        &self.visible
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn city_options(&self) -> Vec<String> {
        filter::city_options(&self.all_trips, &self.city_names)
    }

    pub fn country_options(&self) -> Vec<String> {
        filter::country_options(&self.all_trips)
    }

    pub fn select_city(&mut self, city: &str) {
        self.selection.city = city.to_string();
        self.apply_filter();
    }

    pub fn select_country(&mut self, country: &str) {
        self.selection.country = country.to_string();
        self.apply_filter();
    }

    pub fn set_user_position(&mut self, position: Option<Coordinates>) {
        self.user_position = position;
    }

    pub fn distance_label(&self, trip: &TripRecord) -> Option<String> {
        let user = self.user_position?;
        let target = trip.coordinates()?;
        Some(format_distance(user.distance_to(&target)))
    }

    fn apply_filter(&mut self) {
        self.visible = filter::filter(&self.all_trips, &self.selection);
    }

    pub fn replace_trips(&mut self, docs: &[Document]) {
        self.all_trips = normalize_all(docs);
        self.apply_filter();
        debug!(
            "Showing {} of {} trips.",
            self.visible.len(),
            self.all_trips.len()
        );
    }

    pub async fn refresh(&mut self) {
        self.refreshing = true;
        match self.store.list(TRIPS).await {
            Ok(docs) => {
                self.replace_trips(&docs);
                self.fetch_city_names().await;
            }
            Err(why) => {
                warn!("Manual fetch failed from {}: {}", TRIPS, why);
                self.notices.failure(format!("Failed to refresh {}", TRIPS));
            }
        }
        self.refreshing = false;
    }

    /// Extra city names for the city filter, taken from the `cities`
    /// collection.
    pub async fn fetch_city_names(&mut self) {
        match self.store.list(CITIES).await {
            Ok(docs) => {
                let names: BTreeSet<String> = docs
                    .iter()
                    .filter_map(|doc| doc.get("name").and_then(|v| v.as_str()))
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect();
                self.city_names = names.into_iter().collect();
            }
            Err(why) => warn!("Failed to fetch city names: {}", why),
        }
    }

    pub async fn fetch_fallback(&mut self) {
        debug!("Attempting fallback read from '{}'", CITIES);
        match self.store.list(CITIES).await {
            Ok(docs) => {
                self.replace_trips(&docs);
                self.notices
                    .info(format!("Loaded fallback collection '{}'", CITIES));
            }
            Err(why) => {
                warn!("Fallback fetch failed: {}", why);
                self.notices.failure("Failed to load city data");
            }
        }
    }

    /// Starts listening to the trip collection. The listener lives until
    /// [`TripBrowser::detach`] or until the browser is dropped.
    pub async fn attach(&mut self) -> Result<(), StoreError> {
        let subscription = self.store.subscribe(&Query::collection(TRIPS)).await?;
        self.subscription = Some(subscription);
        Ok(())
    }

    pub fn detach(&mut self) {
        if self.subscription.take().is_some() {
            debug!("Stopped listening to {}.", TRIPS);
        }
    }

    pub async fn next_update(&mut self) -> bool {
        let update = match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        };
        match update {
            Some(update) => {
                self.handle_update(update).await;
                true
            }
            None => {
                self.subscription = None;
                false
            }
        }
    }

    pub async fn drain_updates(&mut self) {
        loop {
            let update = match self.subscription.as_mut() {
                Some(subscription) => subscription.try_next(),
                None => None,
            };
            match update {
                Some(update) => self.handle_update(update).await,
                None => break,
            }
        }
    }

    pub async fn handle_update(&mut self, update: Result<Vec<Document>, StoreError>) {
        match update {
            Ok(docs) => self.replace_trips(&docs),
            Err(why) if why.is_permission_denied() => {
                warn!(
                    "Permission denied on '{}'; attempting fallback to '{}'.",
                    TRIPS, CITIES
                );
                self.fetch_fallback().await;
            }
            Err(why) => {
                self.notices
                    .failure(format!("Failed to listen for {}: {}", TRIPS, why));
            }
        }
    }
}
