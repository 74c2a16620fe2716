//! Data models for the wallet-link client library.
//!
//! Request and response bodies of the wallet backend API and the realtime
//! frames pushed over the wallet channel.

pub mod api_envelope;
pub mod channel_options;
pub mod login_request;
pub mod role;
pub mod server_message;
pub mod transaction;
pub mod user_profile;
pub mod user_response;
pub mod wallet_mutation;
pub mod wallet_response;


pub(crate) use api_envelope::ErrorEnvelope;

pub use api_envelope::ApiEnvelope;
pub use channel_options::ChannelOptions;
pub use login_request::LoginRequest;
pub use role::Role;
pub use server_message::{ServerMessage, TransactionPayload, WalletUpdatePayload};
pub use transaction::{
    TopUpRequest, TransactionListResponse, TransactionResponse, TransactionStatus,
    TransactionType, TransferRequest,
};
pub use user_profile::{ProfileWallet, UserProfile};
pub use user_response::UserResponse;
pub use wallet_mutation::{MutationType, WalletMutationListResponse, WalletMutationResponse};
pub use wallet_response::WalletResponse;
