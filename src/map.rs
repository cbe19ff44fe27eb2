use serde::Serialize;

use crate::distance::{format_distance, Coordinates};
use crate::model::TripRecord;

pub const CITY_ZOOM: f64 = 12.0;
pub const WORLD_ZOOM: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub trip_id: String,
    pub title: String,
    pub position: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

/// Where the map camera should go once markers are placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Camera {
    Centered { center: Coordinates, zoom: f64 },
    World { zoom: f64 },
    Fit(BoundingBox),
}

pub fn markers(trips: &[TripRecord]) -> Vec<Marker> {
    trips
        .iter()
        .filter_map(|trip| {
            trip.coordinates().map(|position| Marker {
                trip_id: trip.id.clone(),
                title: trip.title.clone(),
                position,
            })
        })
        .collect()
}

pub fn fit_camera(markers: &[Marker], user: Option<Coordinates>) -> Camera {
    match markers {
        [] => match user {
            Some(center) => Camera::Centered {
                center,
                zoom: CITY_ZOOM,
            },
            None => Camera::World { zoom: WORLD_ZOOM },
        },
        [only] => Camera::Centered {
            center: only.position,
            zoom: CITY_ZOOM,
        },
        many => {
            let mut bounds = BoundingBox {
                north: f64::NEG_INFINITY,
                east: f64::NEG_INFINITY,
                south: f64::INFINITY,
                west: f64::INFINITY,
            };
            for marker in many {
                bounds.north = bounds.north.max(marker.position.lat);
                bounds.south = bounds.south.min(marker.position.lat);
                bounds.east = bounds.east.max(marker.position.lng);
                bounds.west = bounds.west.min(marker.position.lng);
            }
            Camera::Fit(bounds)
        }
    }
}

pub fn marker_notice(marker: &Marker, user: Option<Coordinates>) -> String {
    match user {
        Some(user) => format!(
            "Distance to {}: {}",
            marker.title,
            format_distance(user.distance_to(&marker.position))
        ),
        None => "Location data unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(id: &str, lat: Option<f64>, lng: Option<f64>) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            title: format!("Trip {}", id),
            latitude: lat,
            longitude: lng,
            ..Default::default()
        }
    }

    #[test]
    fn half_located_trips_get_no_marker() {
        let trips = vec![
            located("a", Some(51.0), Some(4.0)),
            located("b", Some(51.0), None),
            located("c", None, None),
        ];
        let markers = markers(&trips);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].trip_id, "a");
    }

    #[test]
    fn camera_without_markers() {
        let user = Coordinates::new(51.2, 4.4);
        assert_eq!(
            fit_camera(&[], Some(user)),
            Camera::Centered { center: user, zoom: CITY_ZOOM }
        );
        assert_eq!(fit_camera(&[], None), Camera::World { zoom: WORLD_ZOOM });
    }

    #[test]
    fn camera_fits_all_markers() {
        let trips = vec![
            located("a", Some(51.0), Some(4.0)),
            located("b", Some(48.8), Some(2.3)),
            located("c", Some(52.3), Some(4.9)),
        ];
        assert_eq!(
            fit_camera(&markers(&trips), None),
            Camera::Fit(BoundingBox { north: 52.3, east: 4.9, south: 48.8, west: 2.3 })
        );
        let single = markers(&trips[..1]);
        assert_eq!(
            fit_camera(&single, None),
            Camera::Centered { center: Coordinates::new(51.0, 4.0), zoom: CITY_ZOOM }
        );
    }

    #[test]
    fn tap_notice() {
        let marker = &markers(&[located("a", Some(51.0), Some(4.0))])[0];
        assert_eq!(marker_notice(marker, None), "Location data unavailable");
        assert_eq!(
            marker_notice(marker, Some(Coordinates::new(51.0, 4.0))),
            "Distance to Trip a: 0 m"
        );
    }
}
