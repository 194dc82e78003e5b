use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    /// Duplicate-suppression window between any two punches of one
    /// employee, in seconds.
    pub punch_cooldown_secs: i64,

    /// Bounded wait on the NSR counter row lock before the submission
    /// gives up and retries fresh.
    pub nsr_lock_timeout_ms: u64,
    pub nsr_max_retries: u32,

    /// Hard geofence enforcement: reject punches outside every active
    /// zone instead of recording the verdict as advisory.
    pub enforce_geofence: bool,

    /// Per-employee budget inside a batch reconciliation run.
    pub reconcile_timeout_ms: u64,

    // Rate limiting
    pub rate_punch_per_min: u32,
    pub rate_timesheet_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            punch_cooldown_secs: env::var("PUNCH_COOLDOWN_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),

            nsr_lock_timeout_ms: env::var("NSR_LOCK_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap(),
            nsr_max_retries: env::var("NSR_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap(),

            enforce_geofence: env::var("ENFORCE_GEOFENCE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap(),

            reconcile_timeout_ms: env::var("RECONCILE_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap(),

            rate_punch_per_min: env::var("RATE_PUNCH_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
            rate_timesheet_per_min: env::var("RATE_TIMESHEET_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
