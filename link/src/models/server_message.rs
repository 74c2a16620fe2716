use serde::{Deserialize, Serialize};

use super::transaction::TransactionType;
use super::wallet_mutation::MutationType;

/// Realtime frames pushed by the backend over the wallet channel.
///
/// Every frame is `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Balance of a wallet changed
    WalletUpdate(WalletUpdatePayload),

    /// A transaction involving the user completed
    Transaction(TransactionPayload),
}

impl ServerMessage {
    /// Frame tags this client understands.
    pub const KNOWN_TYPES: [&'static str; 2] = ["wallet_update", "transaction"];

    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::WalletUpdate(_) => "wallet_update",
            ServerMessage::Transaction(_) => "transaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletUpdatePayload {
    pub wallet_id: u64,
    /// Balance after the mutation, decimal as string
    pub new_balance: String,
    pub mutation_type: MutationType,
    /// Mutation amount, decimal as string
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub transaction_id: u64,
    pub transaction_type: TransactionType,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<u64>,
    pub to_user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by_user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
