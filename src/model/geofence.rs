use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A circular authorized-punch zone. Treated as immutable during a
/// validation pass; zone administration lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Geofence {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Headquarters")]
    pub name: String,

    #[schema(example = -23.5505)]
    pub center_lat: f64,
    #[schema(example = -46.6333)]
    pub center_lng: f64,

    /// Must be > 0; enforced when zones are loaded.
    #[schema(example = 150.0)]
    pub radius_meters: f64,

    pub active: bool,
}
