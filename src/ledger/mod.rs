pub mod admission;
pub mod geofence;
pub mod pairing;
pub mod reconcile;
pub mod sequence;
pub mod stamp;
pub mod store;
