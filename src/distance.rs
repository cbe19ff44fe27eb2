use derive_more::Display;
use serde::Serialize;

use crate::CityTripError;

// WGS-84 ellipsoid
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const SEMI_MINOR_AXIS: f64 = 6_356_752.314_245;
const FLATTENING: f64 = (SEMI_MAJOR_AXIS - SEMI_MINOR_AXIS) / SEMI_MAJOR_AXIS;

const MAX_ITERATIONS: usize = 20;
const CONVERGENCE: f64 = 1.0e-12;

const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

#[derive(Debug, Display, Clone, Copy, PartialEq, Serialize)]
#[display(fmt = "{},{}", lat, lng)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinates { lat, lng }
    }

    /// Parses `"lat,lng"`.
    pub fn parse(text: &str) -> Result<Self, CityTripError> {
        let invalid = || CityTripError::Validation(format!("Invalid coordinates: {}", text));
        let (lat, lng) = text.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let lng = lng.trim().parse::<f64>().map_err(|_| invalid())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid());
        }
        Ok(Coordinates { lat, lng })
    }

    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Geodesic distance in meters on the WGS-84 ellipsoid (Vincenty inverse).
/// Falls back to the haversine distance for the nearly antipodal pairs the
/// iteration does not converge on.
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    vincenty(lat1, lng1, lat2, lng2).unwrap_or_else(|| haversine(lat1, lng1, lat2, lng2))
}

fn vincenty(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Option<f64> {
    let l = (lng2 - lng1).to_radians();
    let u1 = ((1.0 - FLATTENING) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - FLATTENING) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = FLATTENING / 16.0 * cos_sq_alpha * (4.0 + FLATTENING * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * FLATTENING
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha
                * (SEMI_MAJOR_AXIS.powi(2) - SEMI_MINOR_AXIS.powi(2))
                / SEMI_MINOR_AXIS.powi(2);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
            return Some(SEMI_MINOR_AXIS * a * (sigma - delta_sigma));
        }
    }
    None
}

fn haversine(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// `"1.5 km"` from 1000 m upwards, whole meters below.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn format_boundaries() {
        assert_eq!(format_distance(1500.0), "1.5 km");
        assert_eq!(format_distance(999.0), "999 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(0.0), "0 m");
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance(51.2194, 4.4025, 51.2194, 4.4025), 0.0);
    }

    #[test]
    fn antwerp_to_ghent() {
        // roughly 51 km as the crow flies
        let d = distance(51.2194, 4.4025, 51.0543, 3.7174);
        assert!((50_000.0..52_500.0).contains(&d), "got {}", d);
    }

    #[test]
    fn one_degree_of_latitude_at_equator() {
        assert_float_absolute_eq!(distance(0.0, 0.0, 1.0, 0.0), 110_574.4, 2.0);
    }

    #[test]
    fn nearly_antipodal_points() {
        let d = distance(0.0, 0.0, 0.5, 179.7);
        assert!(d > 19_000_000.0 && d < 20_100_000.0, "got {}", d);
    }

    #[test]
    fn parse_coordinates() {
        assert_eq!(Coordinates::parse("51.2, 4.4").unwrap(), Coordinates::new(51.2, 4.4));
        assert!(Coordinates::parse("51.2").is_err());
        assert!(Coordinates::parse("91,0").is_err());
        assert_eq!(Coordinates::new(1.5, 2.0).to_string(), "1.5,2");
    }
}
