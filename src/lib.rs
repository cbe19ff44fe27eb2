use thiserror::Error;

pub mod commands;
pub mod config;
pub mod distance;
pub mod filter;
pub mod map;
pub mod model;
pub mod reviews;
pub mod services;
pub mod session;

pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CityTripError {
    #[error("Trip {0} not found.")]
    TripNotFound(String),
    #[error("Location not found.")]
    LocationNotFound(),
    #[error("Couldn't get location.")]
    LocationUnavailable(),
    #[error("Location permission required.")]
    LocationPermission(),
    #[error("Location failed: {0}")]
    LocationFailed(String),
    #[error("Login required.")]
    LoginRequired(),
    #[error("{0}")]
    Validation(String),
    #[error("Upload failed: {0}")]
    UploadFailed(String),
    #[error("{0}")]
    Auth(String),
    #[error(transparent)]
    Decode(#[from] model::DecodeError),
    #[error(transparent)]
    Store(#[from] services::database::StoreError),
}
