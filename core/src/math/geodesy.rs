//! WGS84 ellipsoid helpers used to turn grid cells into ground distances and
//! true ground areas.

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Mean Earth radius used by the transverse-Mercator scale approximation.
pub const MEAN_RADIUS: f64 = 6_371_008.8;
/// UTM central-meridian scale factor.
pub const UTM_K0: f64 = 0.9996;
/// UTM false easting in metres.
pub const UTM_FALSE_EASTING: f64 = 500_000.0;

fn eccentricity_squared() -> f64 {
    WGS84_F * (2.0 - WGS84_F)
}

/// Meridional radius of curvature at `lat_deg`.
pub fn meridional_radius(lat_deg: f64) -> f64 {
    let e2 = eccentricity_squared();
    let s = lat_deg.to_radians().sin();
    WGS84_A * (1.0 - e2) / (1.0 - e2 * s * s).powf(1.5)
}

/// Prime-vertical radius of curvature at `lat_deg`.
pub fn prime_vertical_radius(lat_deg: f64) -> f64 {
    let e2 = eccentricity_squared();
    let s = lat_deg.to_radians().sin();
    WGS84_A / (1.0 - e2 * s * s).sqrt()
}

/// Ground length of one degree of longitude along the parallel `lat_deg`.
pub fn metres_per_degree_lon(lat_deg: f64) -> f64 {
    prime_vertical_radius(lat_deg) * lat_deg.to_radians().cos() * std::f64::consts::PI / 180.0
}

/// Ground length of one degree of latitude at `lat_deg`.
pub fn metres_per_degree_lat(lat_deg: f64) -> f64 {
    meridional_radius(lat_deg) * std::f64::consts::PI / 180.0
}

fn authalic_q(lat_deg: f64) -> f64 {
    let e2 = eccentricity_squared();
    let e = e2.sqrt();
    let s = lat_deg.to_radians().sin();
    s / (1.0 - e2 * s * s) + (1.0 / (2.0 * e)) * ((1.0 + e * s) / (1.0 - e * s)).ln()
}

/// Ellipsoidal area in square metres of the quadrangle spanning `lon_span_deg`
/// of longitude between latitudes `lat_a` and `lat_b`.
pub fn quadrangle_area(lon_span_deg: f64, lat_a: f64, lat_b: f64) -> f64 {
    let b2 = WGS84_A * WGS84_A * (1.0 - eccentricity_squared());
    let lat_a = lat_a.clamp(-90.0, 90.0);
    let lat_b = lat_b.clamp(-90.0, 90.0);
    0.5 * b2 * lon_span_deg.abs().to_radians() * (authalic_q(lat_b) - authalic_q(lat_a)).abs()
}

/// Transverse-Mercator point scale factor at a UTM easting.
pub fn utm_scale_factor(easting: f64) -> f64 {
    let x = (easting - UTM_FALSE_EASTING) / UTM_K0;
    UTM_K0 * (1.0 + x * x / (2.0 * MEAN_RADIUS * MEAN_RADIUS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_lengths_match_reference_values() {
        assert!((metres_per_degree_lon(0.0) - 111_319.49).abs() < 0.1);
        assert!((metres_per_degree_lat(0.0) - 110_574.3).abs() < 0.5);
        assert!(metres_per_degree_lon(60.0) < metres_per_degree_lon(5.0));
    }

    #[test]
    fn quadrangle_area_sums_to_ellipsoid_surface() {
        let total = quadrangle_area(360.0, -90.0, 90.0);
        // WGS84 surface area.
        assert!((total - 5.100_656_217e14).abs() / total < 1e-6);
    }

    #[test]
    fn quadrangle_area_shrinks_towards_poles() {
        let equator = quadrangle_area(1.0, 0.0, 1.0);
        let arctic = quadrangle_area(1.0, 70.0, 71.0);
        assert!(arctic < equator * 0.4);
        assert_eq!(quadrangle_area(1.0, 3.0, 3.0), 0.0);
    }

    #[test]
    fn utm_scale_factor_grows_away_from_central_meridian() {
        assert!((utm_scale_factor(UTM_FALSE_EASTING) - UTM_K0).abs() < 1e-12);
        let edge = utm_scale_factor(UTM_FALSE_EASTING + 300_000.0);
        assert!(edge > 1.0 && edge < 1.002);
    }
}
