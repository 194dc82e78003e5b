use crate::error::AdmissionError;
use crate::model::geofence::Geofence;

/// Earth radius in meters, as used by the Haversine formula.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated WGS84 coordinate. Constructing one is the only coordinate
/// check in the admission path; everything downstream trusts it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, AdmissionError> {
        if lat.is_nan() || lng.is_nan() {
            return Err(AdmissionError::InvalidCoordinate("coordinate is NaN".into()));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AdmissionError::InvalidCoordinate(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AdmissionError::InvalidCoordinate(format!(
                "longitude {lng} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lng })
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Result of checking one punch location against the active zones.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceVerdict {
    pub within: bool,
    pub zone_name: Option<String>,
    /// Distance to the nearest zone edge when outside all zones, for
    /// "how far outside" reporting. None when no zones are configured.
    pub distance_outside_m: Option<f64>,
}

impl GeofenceVerdict {
    /// Verdict for punches submitted without a location at all.
    pub fn no_location() -> Self {
        Self { within: false, zone_name: None, distance_outside_m: None }
    }
}

/// Match a point against active zones in iteration order (the configured
/// priority). The first zone containing the point wins.
pub fn evaluate(point: GeoPoint, zones: &[Geofence]) -> Result<GeofenceVerdict, AdmissionError> {
    let mut nearest_outside: Option<f64> = None;

    for zone in zones.iter().filter(|z| z.active) {
        if zone.radius_meters <= 0.0 {
            return Err(AdmissionError::InvalidGeofence(format!(
                "zone '{}' has non-positive radius {}",
                zone.name, zone.radius_meters
            )));
        }
        let center = GeoPoint::new(zone.center_lat, zone.center_lng)
            .map_err(|_| AdmissionError::InvalidGeofence(format!("zone '{}' has an invalid center", zone.name)))?;
        let distance = haversine_distance(point, center);

        if distance <= zone.radius_meters {
            return Ok(GeofenceVerdict {
                within: true,
                zone_name: Some(zone.name.clone()),
                distance_outside_m: None,
            });
        }

        let outside_by = distance - zone.radius_meters;
        nearest_outside = Some(match nearest_outside {
            Some(best) if best <= outside_by => best,
            _ => outside_by,
        });
    }

    Ok(GeofenceVerdict { within: false, zone_name: None, distance_outside_m: nearest_outside })
}

/// Human-readable distance, "500m" below a kilometer, "2.8km" above.
pub fn format_distance(meters: f64) -> String {
    let rounded = meters.round();
    if rounded < 1000.0 {
        format!("{rounded:.0}m")
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}
