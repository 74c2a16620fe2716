use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    Credit,
    Debit,
}

impl MutationType {
    /// "incoming" for credits, "outgoing" for debits.
    pub fn direction(&self) -> &'static str {
        match self {
            MutationType::Credit => "incoming",
            MutationType::Debit => "outgoing",
        }
    }
}

/// One entry of the wallet mutation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMutationResponse {
    pub id: u64,
    pub wallet_id: u64,
    pub transaction_id: u64,
    #[serde(rename = "type")]
    pub mutation_type: MutationType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub created_at: String,
}

/// Paginated `data` of `GET /wallet-mutations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMutationListResponse {
    pub mutations: Vec<WalletMutationResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}
