use log::*;

use crate::model::{NewTrip, Timestamp};
use crate::services::location::{locate, LocationProvider};
use crate::services::storage::{image_path, BlobStore};
use crate::services::{DocumentStore, TRIPS};
use crate::CityTripError;

/// "Save current location as trip".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripForm {
    pub title: String,
    pub city: String,
    pub country: String,
    pub category: String,
    pub description: String,
    pub image_url: String,
    pub picked_image: Option<Vec<u8>>,
}

impl TripForm {
    pub fn validate(&self) -> Result<(), CityTripError> {
        let blank = |s: &String| s.trim().is_empty();
        if blank(&self.title) || blank(&self.city) || blank(&self.country) || blank(&self.category)
        {
            return Err(CityTripError::Validation(
                "Please fill in title, city, country and category".to_string(),
            ));
        }
        if self.picked_image.is_none() && blank(&self.image_url) {
            return Err(CityTripError::Validation(
                "Pick a photo or paste an image URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates, pins the trip to the user's position, uploads a picked
    /// image and stores the trip. Returns the new trip's id.
    pub async fn save(
        &self,
        store: &dyn DocumentStore,
        blobs: &dyn BlobStore,
        location: &dyn LocationProvider,
    ) -> Result<String, CityTripError> {
        self.validate()?;
        let position = locate(location).await?;

        let image = match &self.picked_image {
            Some(bytes) => {
                let path = image_path();
                blobs
                    .upload(&path, bytes.clone())
                    .await
                    .map_err(|why| CityTripError::UploadFailed(why.to_string()))?
            }
            None => self.image_url.trim().to_string(),
        };

        let trip = NewTrip {
            title: self.title.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            image,
            position,
        };
        let id = store.add(TRIPS, trip.to_document(Timestamp::now())).await?;
        info!("CityTrip saved as {}.", id);
        Ok(id)
    }
}
