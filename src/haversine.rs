//! Great-circle distance between two longitude/latitude points.

/// Earth radius, in kilometers, expected by the reference data sets.
pub const EARTH_RADIUS_KM: f64 = 6372.8;

/// Haversine distance between `(x0, y0)` and `(x1, y1)`, where `x` is
/// longitude and `y` is latitude, both in degrees.
pub fn reference_haversine(x0: f64, y0: f64, x1: f64, y1: f64, earth_radius: f64) -> f64 {
    let lat1 = y0;
    let lat2 = y1;
    let lon1 = x0;
    let lon2 = x1;

    let d_lat = radians_from_degrees(lat2 - lat1);
    let d_lon = radians_from_degrees(lon2 - lon1);
    let lat1 = radians_from_degrees(lat1);
    let lat2 = radians_from_degrees(lat2);

    let a = square((d_lat / 2.0).sin()) + lat1.cos() * lat2.cos() * square((d_lon / 2.0).sin());
    let c = 2.0 * a.sqrt().asin();

    earth_radius * c
}

fn square(n: f64) -> f64 {
    n * n
}

fn radians_from_degrees(degrees: f64) -> f64 {
    0.017_453_292_519_943_295 * degrees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(
            reference_haversine(12.5, -7.0, 12.5, -7.0, EARTH_RADIUS_KM),
            0.0
        );
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let distance = reference_haversine(0.0, 0.0, 0.0, 1.0, EARTH_RADIUS_KM);
        assert!(
            (distance - 111.2).abs() < 0.1,
            "expected ~111.2 km, got {}",
            distance
        );
    }

    #[test]
    fn test_symmetry() {
        let forward = reference_haversine(10.0, 20.0, -30.0, 45.0, EARTH_RADIUS_KM);
        let backward = reference_haversine(-30.0, 45.0, 10.0, 20.0, EARTH_RADIUS_KM);
        assert!((forward - backward).abs() < 1e-9);
    }
}
