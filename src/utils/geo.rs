/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_sf_to_oakland() {
        // San Francisco downtown
        let sf = (37.7749, -122.4194);
        // Oakland downtown
        let oakland = (37.8044, -122.2712);

        let distance = haversine_distance(sf.0, sf.1, oakland.0, oakland.1);
        // Should be approximately 13-14 km
        assert!(distance > 10.0 && distance < 20.0);
    }

    #[test]
    fn test_haversine_zero_distance() {
        let here = (37.7749, -122.4194);
        let distance = haversine_distance(here.0, here.1, here.0, here.1);
        assert!(distance < 1e-9);
    }
}
