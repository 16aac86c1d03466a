use ::geo::{Distance, Haversine, Point};

use crate::db::models::service_request::GeoPoint;

/// Great-circle distance in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let from = Point::new(a.lng, a.lat);
    let to = Point::new(b.lng, b.lat);
    Haversine::distance(from, to) / 1000.0
}

pub fn is_valid(point: GeoPoint) -> bool {
    point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng)
}

/// Address string stored when the customer shares a device location but types no address.
pub fn describe(point: GeoPoint) -> String {
    format!("Lat: {:.6}, Lng: {:.6}", point.lat, point.lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_distance() {
        let p = GeoPoint { lat: 48.1, lng: 11.5 };
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint { lat: 0.0, lng: 0.0 };
        let b = GeoPoint { lat: 1.0, lng: 0.0 };
        let d = distance_km(a, b);
        assert!((d - 111.2).abs() < 0.5, "got {d}");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(is_valid(GeoPoint { lat: -90.0, lng: 180.0 }));
        assert!(!is_valid(GeoPoint { lat: 90.5, lng: 0.0 }));
        assert!(!is_valid(GeoPoint { lat: 0.0, lng: f64::NAN }));
    }

    #[test]
    fn describe_uses_six_decimals() {
        let text = describe(GeoPoint { lat: 12.9715987, lng: 77.5945627 });
        assert_eq!(text, "Lat: 12.971599, Lng: 77.594563");
    }
}
