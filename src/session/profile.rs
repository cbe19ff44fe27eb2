use log::*;

use crate::model::NewCity;
use crate::services::{DocumentStore, CITIES};
use crate::CityTripError;

pub async fn add_city(store: &dyn DocumentStore, city: &NewCity) -> Result<String, CityTripError> {
    city.validate()?;
    let id = store.add(CITIES, city.to_value()).await?;
    info!("City added as {}.", id);
    Ok(id)
}
