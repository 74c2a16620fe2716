use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `data` of `GET /wallets/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub id: u64,
    pub user_id: u64,
    pub balance: Decimal,
}
