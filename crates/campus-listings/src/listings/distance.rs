//! Great-circle distance in miles.

use super::domain::Coordinate;

/// Mean Earth radius used by the listing search, in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Name under which [`haversine_miles`] is registered as a SQL scalar function.
pub const SQL_FUNCTION_NAME: &str = "distance_miles";

/// Haversine distance between two points given in decimal degrees.
pub fn haversine_miles(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push antipodal inputs a hair past 1.0.
    2.0 * EARTH_RADIUS_MILES * half_chord.clamp(0.0, 1.0).sqrt().asin()
}

/// Adapter for the SQL function signature `(lat1, lon1, lat2, lon2)` where any argument may be NULL.
pub fn distance_from_parts(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
) -> Option<f64> {
    let from = Coordinate::from_parts(lat1, lon1)?;
    let to = Coordinate::from_parts(lat2, lon2)?;
    Some(haversine_miles(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).expect("valid coordinate")
    }

    #[test]
    fn identical_points_are_zero_miles_apart() {
        let uw = point(47.655548, -122.303200);
        assert_eq!(haversine_miles(uw, uw), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_sixty_nine_miles() {
        let miles = haversine_miles(point(0.0, 0.0), point(1.0, 0.0));
        assert!((miles - 69.09).abs() < 0.01, "got {miles}");
    }

    #[test]
    fn seattle_to_portland_is_roughly_145_miles() {
        let seattle = point(47.6062, -122.3321);
        let portland = point(45.5152, -122.6784);
        let miles = haversine_miles(seattle, portland);
        assert!((140.0..150.0).contains(&miles), "got {miles}");
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let miles = haversine_miles(point(0.0, 0.0), point(0.0, 180.0));
        assert!(miles.is_finite());
        assert!((miles - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(47.661475, -122.312543);
        let b = point(47.6097, -122.3183);
        assert!((haversine_miles(a, b) - haversine_miles(b, a)).abs() < 1e-9);
    }

    #[test]
    fn missing_coordinate_yields_absent_distance() {
        assert_eq!(
            distance_from_parts(Some(47.6), None, Some(47.6), Some(-122.3)),
            None
        );
        assert_eq!(
            distance_from_parts(Some(47.6), Some(-122.3), Some(47.6), Some(-122.3)),
            Some(0.0)
        );
    }
}
