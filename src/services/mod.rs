pub mod auth;
pub mod database;
pub mod geocoding;
pub mod location;
pub mod memory;
pub mod storage;
pub mod subscription;

pub use database::{DocumentStore, Query, StoreError, SupabaseService};
pub use memory::MemoryStore;
pub use subscription::Subscription;

pub const TRIPS: &str = "citytrips";
pub const CITIES: &str = "cities";
pub const USERS: &str = "users";
pub const MESSAGES: &str = "messages";
pub const REVIEWS: &str = "reviews";

pub fn reviews_path(trip_id: &str) -> String {
    format!("{}/{}/{}", TRIPS, trip_id, REVIEWS)
}
