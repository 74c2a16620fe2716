//! In-memory session state shared by the API client, the realtime channel
//! and page code.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::persistence::{PersistedSession, SessionPersistence};
use crate::models::{Role, UserProfile};

/// Who the session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    /// Unknown until `/users/me` has been fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Identity {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            role: None,
        }
    }
}

/// Last known state of the user's wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub id: u64,
    /// Decimal balance as sent by the backend
    pub balance: String,
}

/// A live session. Identity and wallet can only exist alongside a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Option<Identity>,
    pub wallet: Option<WalletSnapshot>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .field("wallet", &self.wallet)
            .finish()
    }
}

/// Authenticated signal, derived from the presence of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Callback run after a session has been cleared.
pub type ClearHook = Arc<dyn Fn() + Send + Sync>;

/// Holds the current session.
///
/// All mutations take the write lock, re-read the current session and only
/// then write, so a late event can never bring back a cleared session.
///
/// The durable mirror is written after the write lock is released. Each
/// mirrored change takes a revision number under the lock, and a write for
/// an older revision than the last one stored is skipped.
pub struct SessionStore {
    session: RwLock<Option<Session>>,
    auth_tx: watch::Sender<AuthState>,
    clear_hooks: RwLock<Vec<ClearHook>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
    revision: AtomicU64,
    mirrored_revision: Mutex<u64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store without a durable mirror.
    pub fn new() -> Self {
        let (auth_tx, _) = watch::channel(AuthState::Anonymous);
        Self {
            session: RwLock::new(None),
            auth_tx,
            clear_hooks: RwLock::new(Vec::new()),
            persistence: None,
            revision: AtomicU64::new(0),
            mirrored_revision: Mutex::new(0),
        }
    }

    /// A store mirrored to `persistence`.
    pub fn with_persistence(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            persistence: Some(persistence),
            ..Self::new()
        }
    }

    /// Restore token and identity from the durable mirror.
    ///
    /// Does nothing if a session is already present. Returns whether a
    /// session was restored.
    pub fn hydrate(&self) -> bool {
        let Some(persistence) = &self.persistence else {
            return false;
        };

        let stored = match persistence.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("[SESSION] Failed to load persisted session: {}", e);
                return false;
            },
        };

        let mut guard = self.session.write();
        if guard.is_some() {
            return false;
        }
        *guard = Some(Session {
            token: stored.token,
            identity: stored.identity,
            wallet: None,
        });
        drop(guard);

        log::debug!("[SESSION] Session restored from persistence");
        self.publish(AuthState::Authenticated);
        true
    }

    /// Start a session after login, registration or profile fetch.
    pub fn set_session(&self, token: String, identity: Identity, wallet: Option<WalletSnapshot>) {
        let session = Session {
            token,
            identity: Some(identity),
            wallet,
        };
        let mut guard = self.session.write();
        let pending = self.stage_mirror(Some(&session));
        *guard = Some(session);
        drop(guard);
        self.write_mirror(pending);

        log::debug!("[SESSION] Session established");
        self.publish(AuthState::Authenticated);
    }

    /// Record a token whose identity is not yet known.
    ///
    /// Keeps the existing identity and wallet when the token is unchanged.
    pub fn set_token(&self, token: String) {
        let mut guard = self.session.write();
        let session = match guard.take() {
            Some(existing) if existing.token == token => existing,
            _ => Session {
                token,
                identity: None,
                wallet: None,
            },
        };
        let pending = self.stage_mirror(Some(&session));
        *guard = Some(session);
        drop(guard);
        self.write_mirror(pending);

        self.publish(AuthState::Authenticated);
    }

    /// Replace identity and wallet with a freshly fetched profile.
    ///
    /// Applies only while `token` is still the current token, so a profile
    /// fetched for a session that has since been cleared or replaced is
    /// dropped. Returns whether it applied.
    pub fn set_profile(&self, token: &str, profile: &UserProfile) -> bool {
        let mut guard = self.session.write();
        let Some(session) = guard.as_mut().filter(|s| s.token == token) else {
            log::debug!("[SESSION] Dropping profile for a stale token");
            return false;
        };

        session.identity = Some(Identity {
            id: profile.id,
            username: profile.username.clone(),
            role: Some(profile.role),
        });
        session.wallet = profile.wallet.as_ref().map(|w| WalletSnapshot {
            id: w.id,
            balance: w.balance.clone(),
        });
        let pending = self.stage_mirror(Some(&*session));
        drop(guard);
        self.write_mirror(pending);
        true
    }

    /// Set the wallet balance from a realtime update.
    ///
    /// No-op unless the session's wallet id equals `wallet_id`. Returns
    /// whether it applied.
    pub fn apply_wallet_delta(&self, wallet_id: u64, new_balance: &str) -> bool {
        let mut guard = self.session.write();
        match guard.as_mut().and_then(|s| s.wallet.as_mut()) {
            Some(wallet) if wallet.id == wallet_id => {
                wallet.balance = new_balance.to_string();
                true
            },
            _ => false,
        }
    }

    /// Drop the session, the durable mirror, and run the clear hooks.
    ///
    /// Idempotent. Returns whether a session was present.
    pub fn clear_session(&self) -> bool {
        let (had_session, pending) = {
            let mut guard = self.session.write();
            let had_session = guard.take().is_some();
            (had_session, self.stage_mirror(None))
        };
        self.write_mirror(pending);

        if had_session {
            log::debug!("[SESSION] Session cleared");
        }
        self.publish(AuthState::Anonymous);

        let hooks: Vec<ClearHook> = self.clear_hooks.read().clone();
        for hook in hooks {
            hook();
        }
        had_session
    }

    /// Register a callback run after every [`clear_session`](Self::clear_session).
    pub fn on_clear(&self, hook: ClearHook) {
        self.clear_hooks.write().push(hook);
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.token.clone())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.read().as_ref().and_then(|s| s.identity.clone())
    }

    pub fn wallet(&self) -> Option<WalletSnapshot> {
        self.session.read().as_ref().and_then(|s| s.wallet.clone())
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Watch the authenticated signal.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        *self.auth_tx.borrow()
    }

    fn publish(&self, state: AuthState) {
        self.auth_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    // Must be called with the write lock held; the revision order is the
    // lock order.
    fn stage_mirror(&self, session: Option<&Session>) -> Option<PendingMirror> {
        self.persistence.as_ref()?;
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        Some(PendingMirror {
            revision,
            session: session.map(|s| PersistedSession {
                token: s.token.clone(),
                identity: s.identity.clone(),
            }),
        })
    }

    // Called after the write lock is released.
    fn write_mirror(&self, pending: Option<PendingMirror>) {
        let (Some(persistence), Some(pending)) = (&self.persistence, pending) else {
            return;
        };

        let mut mirrored = self.mirrored_revision.lock();
        if pending.revision <= *mirrored {
            log::debug!("[SESSION] Skipping superseded mirror write");
            return;
        }
        *mirrored = pending.revision;

        let result = match &pending.session {
            Some(session) => persistence.save(session),
            None => persistence.clear(),
        };
        if let Err(e) = result {
            log::warn!("[SESSION] Failed to update persisted session: {}", e);
        }
    }
}

/// A mirror write staged under the session lock.
struct PendingMirror {
    revision: u64,
    session: Option<PersistedSession>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.session.read())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileWallet;
    use crate::session::MemorySessionPersistence;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn alice() -> Identity {
        Identity::new(7, "alice")
    }

    fn wallet(id: u64, balance: &str) -> WalletSnapshot {
        WalletSnapshot {
            id,
            balance: balance.to_string(),
        }
    }

    fn profile(wallet_id: u64, balance: &str) -> UserProfile {
        UserProfile {
            id: 7,
            username: "alice".to_string(),
            role: Role::User,
            wallet: Some(ProfileWallet {
                id: wallet_id,
                balance: balance.to_string(),
            }),
        }
    }

    #[test]
    fn test_set_session_authenticates() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated());

        store.set_session("t1".to_string(), alice(), None);

        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("t1"));
        assert_eq!(store.identity().unwrap().id, 7);
        assert_eq!(store.auth_state(), AuthState::Authenticated);
    }

    #[test]
    fn test_wallet_delta_applies_only_to_own_wallet() {
        let store = SessionStore::new();
        store.set_session("t1".to_string(), alice(), Some(wallet(3, "100.00")));

        assert!(!store.apply_wallet_delta(9, "999.00"));
        assert_eq!(store.wallet().unwrap().balance, "100.00");

        assert!(store.apply_wallet_delta(3, "150.00"));
        assert_eq!(store.wallet().unwrap().balance, "150.00");
    }

    #[test]
    fn test_wallet_delta_without_session_is_noop() {
        let store = SessionStore::new();
        assert!(!store.apply_wallet_delta(3, "150.00"));
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let store = SessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        store.on_clear(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.set_session("t1".to_string(), alice(), Some(wallet(3, "100.00")));
        assert!(store.clear_session());
        let after_first = store.snapshot();
        assert!(!store.clear_session());

        assert_eq!(store.snapshot(), after_first);
        assert!(!store.is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_resurrection_after_clear() {
        let store = SessionStore::new();
        store.set_session("t1".to_string(), alice(), Some(wallet(3, "100.00")));
        store.clear_session();

        assert!(!store.apply_wallet_delta(3, "150.00"));
        assert!(!store.set_profile("t1", &profile(3, "150.00")));
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_set_profile_fills_role_and_wallet() {
        let store = SessionStore::new();
        store.set_token("t1".to_string());
        assert!(store.identity().is_none());

        assert!(store.set_profile("t1", &profile(3, "100.00")));

        let identity = store.identity().unwrap();
        assert_eq!(identity.role, Some(Role::User));
        assert_eq!(store.wallet(), Some(wallet(3, "100.00")));
    }

    #[test]
    fn test_set_profile_ignores_replaced_token() {
        let store = SessionStore::new();
        store.set_token("t1".to_string());
        store.set_token("t2".to_string());

        assert!(!store.set_profile("t1", &profile(3, "100.00")));
        assert!(store.identity().is_none());
    }

    #[test]
    fn test_subscribe_sees_transitions() {
        let store = SessionStore::new();
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), AuthState::Anonymous);

        store.set_session("t1".to_string(), alice(), None);
        assert_eq!(*rx.borrow(), AuthState::Authenticated);

        store.clear_session();
        assert_eq!(*rx.borrow(), AuthState::Anonymous);
    }

    /// Records whether the session lock was free during each mirror write.
    #[derive(Default)]
    struct LockCheckingPersistence {
        store: std::sync::OnceLock<std::sync::Weak<SessionStore>>,
        lock_free: Mutex<Vec<bool>>,
    }

    impl LockCheckingPersistence {
        fn record(&self) {
            let free = self
                .store
                .get()
                .and_then(|weak| weak.upgrade())
                .map(|store| store.session.try_write().is_some())
                .unwrap_or(false);
            self.lock_free.lock().push(free);
        }
    }

    impl SessionPersistence for LockCheckingPersistence {
        fn load(&self) -> crate::error::Result<Option<PersistedSession>> {
            Ok(None)
        }

        fn save(&self, _session: &PersistedSession) -> crate::error::Result<()> {
            self.record();
            Ok(())
        }

        fn clear(&self) -> crate::error::Result<()> {
            self.record();
            Ok(())
        }
    }

    #[test]
    fn test_mirror_writes_happen_outside_the_session_lock() {
        let persistence = Arc::new(LockCheckingPersistence::default());
        let store = Arc::new(SessionStore::with_persistence(persistence.clone()));
        persistence.store.set(Arc::downgrade(&store)).ok();

        store.set_session("t1".to_string(), alice(), None);
        assert!(store.set_profile("t1", &profile(3, "100.00")));
        store.clear_session();

        assert_eq!(persistence.lock_free.lock().as_slice(), [true, true, true]);
    }

    #[test]
    fn test_superseded_mirror_write_is_skipped() {
        let persistence = Arc::new(MemorySessionPersistence::new());
        let store = SessionStore::with_persistence(persistence.clone());

        let stale = {
            let mut guard = store.session.write();
            let session = Session {
                token: "t1".to_string(),
                identity: None,
                wallet: None,
            };
            let pending = store.stage_mirror(Some(&session));
            *guard = Some(session);
            pending
        };
        store.clear_session();
        store.write_mirror(stale);

        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn test_persistence_mirror_and_hydrate() {
        let persistence = Arc::new(MemorySessionPersistence::new());
        let store = SessionStore::with_persistence(persistence.clone());
        store.set_session("t1".to_string(), alice(), Some(wallet(3, "100.00")));

        let saved = persistence.load().unwrap().unwrap();
        assert_eq!(saved.token, "t1");
        assert_eq!(saved.identity, Some(alice()));

        let restored = SessionStore::with_persistence(persistence.clone());
        assert!(restored.hydrate());
        assert_eq!(restored.token().as_deref(), Some("t1"));
        assert!(restored.wallet().is_none());

        restored.clear_session();
        assert!(persistence.load().unwrap().is_none());
    }
}
