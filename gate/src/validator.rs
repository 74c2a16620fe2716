//! Session validation against the wallet backend.

use async_trait::async_trait;
use wallet_link::{UserProfile, WalletLinkClient};

/// Outcome of checking a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The backend accepted the token and returned the profile.
    Valid(UserProfile),
    /// The backend answered and refused the token.
    Rejected { status: Option<u16>, message: String },
    /// The backend could not be reached or answered garbage.
    Unreachable(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Checks a session token. The gate calls this at most once per request.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Validation;
}

/// Validates tokens with `GET /users/me` through wallet-link.
#[derive(Debug, Clone)]
pub struct LinkSessionValidator {
    client: WalletLinkClient,
}

impl LinkSessionValidator {
    pub fn new(client: WalletLinkClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionValidator for LinkSessionValidator {
    async fn validate(&self, token: &str) -> Validation {
        match self.client.me(token).await {
            Ok(profile) => Validation::Valid(profile),
            Err(e) if e.is_rejection() => Validation::Rejected {
                status: e.status(),
                message: e.to_string(),
            },
            Err(e) => Validation::Unreachable(e.to_string()),
        }
    }
}
