pub mod punch;
pub mod timesheet;
