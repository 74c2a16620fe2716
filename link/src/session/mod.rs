//! Session state and its durable mirror.

pub mod persistence;
pub mod store;

pub use persistence::{
    FileSessionPersistence, MemorySessionPersistence, PersistedSession, SessionPersistence,
};
pub use store::{AuthState, ClearHook, Identity, Session, SessionStore, WalletSnapshot};
