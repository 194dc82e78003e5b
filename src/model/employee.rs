use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The slice of the employee record the ledger cares about. Profile
/// administration (names, departments, hiring) is a separate system.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeProfile {
    #[schema(example = 1001)]
    pub id: u64,

    #[schema(example = 8.0)]
    pub expected_hours_daily: f64,

    /// Running balances, mutated only by the reconciliation engine and
    /// only through atomic in-place delta updates.
    #[schema(example = 12.5)]
    pub extra_hours_balance: f64,
    #[schema(example = 3.0)]
    pub owed_hours_balance: f64,

    pub active: bool,
}
