//! Geographic <-> local Cartesian coordinate transforms.
//!
//! The pipeline works in a local frame measured in kilometres from a fixed
//! geographic center. Both directions must use the exact `center` and
//! `degree2km` recorded in the resolved configuration — mixing centers
//! between the forward and inverse transform silently corrupts locations.

/// Project geographic coordinates into the local Cartesian frame.
///
/// Returns `(x_km, y_km, z_km)`. Elevation is in metres above sea level;
/// the local z axis points down into the earth in kilometres, so a station
/// at +1200 m elevation sits at z = -1.2 km.
pub fn forward(
    longitude: f64,
    latitude: f64,
    elevation_m: f64,
    center: (f64, f64),
    degree2km: f64,
) -> (f64, f64, f64) {
    let x_km = (longitude - center.0) * degree2km;
    let y_km = (latitude - center.1) * degree2km;
    let z_km = -elevation_m / 1e3;
    (x_km, y_km, z_km)
}

/// Invert the local frame back to geographic coordinates for reporting.
///
/// Returns `(longitude, latitude, depth_m)`. Note the inverse reports
/// *depth* in metres (positive down), not elevation.
pub fn inverse(
    x_km: f64,
    y_km: f64,
    z_km: f64,
    center: (f64, f64),
    degree2km: f64,
) -> (f64, f64, f64) {
    let longitude = x_km / degree2km + center.0;
    let latitude = y_km / degree2km + center.1;
    let depth_m = z_km * 1e3;
    (longitude, latitude, depth_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: (f64, f64) = (-155.32, 19.39);
    const DEGREE2KM: f64 = 112.195;

    #[test]
    fn test_forward_at_center() {
        let (x, y, z) = forward(CENTER.0, CENTER.1, 0.0, CENTER, DEGREE2KM);
        assert!(x.abs() < 1e-12);
        assert!(y.abs() < 1e-12);
        assert!(z.abs() < 1e-12);
    }

    #[test]
    fn test_elevation_sign_convention() {
        // A station 1200 m above sea level sits at z = -1.2 km.
        let (_, _, z) = forward(CENTER.0, CENTER.1, 1200.0, CENTER, DEGREE2KM);
        assert!((z + 1.2).abs() < 1e-12);

        // An event at z = +5 km reports a depth of 5000 m.
        let (_, _, depth_m) = inverse(0.0, 0.0, 5.0, CENTER, DEGREE2KM);
        assert!((depth_m - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (-155.0, 19.5, 0.0),
            (-154.2, 20.1, 2300.0),
            (-156.9, 18.7, -50.0),
        ];
        for (lon, lat, elev) in cases {
            let (x, y, z) = forward(lon, lat, elev, CENTER, DEGREE2KM);
            let (lon2, lat2, depth_m) = inverse(x, y, z, CENTER, DEGREE2KM);
            assert!((lon2 - lon).abs() < 1e-9, "lon round trip for {lon}");
            assert!((lat2 - lat).abs() < 1e-9, "lat round trip for {lat}");
            assert!((depth_m + elev).abs() < 1e-9, "depth/elev round trip for {elev}");
        }
    }
}
