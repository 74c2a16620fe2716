use serde::{Deserialize, Serialize};

use super::role::Role;

/// Wallet summary embedded in the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileWallet {
    pub id: u64,
    /// Decimal balance, kept as the backend's string representation
    pub balance: String,
}

/// `data` of `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub wallet: Option<ProfileWallet>,
}
