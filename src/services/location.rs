use std::sync::Arc;

use async_trait::async_trait;
use log::*;

use crate::{distance::Coordinates, CityTripError, GenericError};

use super::geocoding::GeocodingService;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn has_permission(&self) -> bool;
    async fn last_known(&self) -> Result<Option<Coordinates>, GenericError>;
    async fn current(&self) -> Result<Option<Coordinates>, GenericError>;
}

/// Last-known position, else a fresh fix.
pub async fn locate(provider: &dyn LocationProvider) -> Result<Coordinates, CityTripError> {
    if !provider.has_permission() {
        return Err(CityTripError::LocationPermission());
    }
    let failed = |why: GenericError| CityTripError::LocationFailed(why.to_string());
    if let Some(position) = provider.last_known().await.map_err(failed)? {
        return Ok(position);
    }
    provider
        .current()
        .await
        .map_err(failed)?
        .ok_or(CityTripError::LocationUnavailable())
}

/// Like [`locate`], but any failure just means "no position".
pub async fn resolve_position(provider: &dyn LocationProvider) -> Option<Coordinates> {
    match locate(provider).await {
        Ok(position) => Some(position),
        Err(why) => {
            warn!("Couldn't determine current position: {}", why);
            None
        }
    }
}

/// A position known up front, e.g. passed on the command line.
pub struct FixedLocation {
    position: Option<Coordinates>,
    granted: bool,
}

impl FixedLocation {
    pub fn at(position: Coordinates) -> Self {
        FixedLocation {
            position: Some(position),
            granted: true,
        }
    }

    pub fn unknown() -> Self {
        FixedLocation {
            position: None,
            granted: true,
        }
    }

    pub fn denied() -> Self {
        FixedLocation {
            position: None,
            granted: false,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    fn has_permission(&self) -> bool {
        self.granted
    }

    async fn last_known(&self) -> Result<Option<Coordinates>, GenericError> {
        Ok(self.position)
    }

    async fn current(&self) -> Result<Option<Coordinates>, GenericError> {
        Ok(self.position)
    }
}

/// Position of a named place, looked up on demand. Has no cached fix.
pub struct GeocodedLocation {
    place: String,
    geocoder: Arc<dyn GeocodingService>,
}

impl GeocodedLocation {
    pub fn new(place: &str, geocoder: Arc<dyn GeocodingService>) -> Self {
        GeocodedLocation {
            place: place.to_string(),
            geocoder,
        }
    }
}

#[async_trait]
impl LocationProvider for GeocodedLocation {
    fn has_permission(&self) -> bool {
        true
    }

    async fn last_known(&self) -> Result<Option<Coordinates>, GenericError> {
        Ok(None)
    }

    async fn current(&self) -> Result<Option<Coordinates>, GenericError> {
        let position = self.geocoder.geocode(&self.place).await?;
        debug!("Geocoded '{}' to {}.", self.place, position);
        Ok(Some(position))
    }
}
