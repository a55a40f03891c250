use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Level 1 grants the full panel; level 3 is the installer-only view.
pub const ADMIN_LEVEL: i64 = 1;

/// Levels that can be assigned through the technician endpoint. The
/// admin level is only ever created by the initial setup flow.
pub const CREATABLE_LEVELS: [i64; 3] = [3, 4, 5];

/// Passwords go through the same trim/upper-case normalization as the
/// other text fields and are stored as-is. Carried over from the system
/// this replaces; a latent weakness, not something to build on.
pub fn normalize_password(value: &str) -> String {
    value.trim().to_uppercase()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technician {
    pub name: String,
    pub username: String,
    pub password: String,
    pub level: i64,
    pub created_at: DateTime<Utc>,
}
