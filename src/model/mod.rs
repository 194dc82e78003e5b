pub mod consolidated;
pub mod employee;
pub mod geofence;
pub mod punch;
