use serde::{Deserialize, Serialize};

/// `data` of a successful login or registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID
    pub id: u64,
    /// Username
    pub username: String,
    /// JWT access token for subsequent API calls
    pub token: String,
}

impl std::fmt::Debug for UserResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserResponse")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
