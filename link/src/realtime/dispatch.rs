//! Decoding and routing of realtime frames.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::models::{ServerMessage, TransactionPayload, WalletUpdatePayload};
use crate::notify::{format_idr_str, NotificationSink, Toast};
use crate::session::SessionStore;

/// Title of the native notification raised for transactions.
pub const TRANSACTION_NOTIFICATION_TITLE: &str = "New Transaction";

/// What happened to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Balance written to the session store
    WalletApplied,
    /// Update for a wallet other than the session's
    WalletIgnored,
    TransactionNotified,
    /// Not JSON, or a known type with a bad payload
    Malformed,
    /// Unrecognized `type`
    Unknown(String),
}

/// Applies decoded frames to the session store and notification sink.
#[derive(Clone)]
pub struct EventDispatcher {
    session: Arc<SessionStore>,
    notifier: Arc<dyn NotificationSink>,
}

impl EventDispatcher {
    pub fn new(session: Arc<SessionStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { session, notifier }
    }

    pub fn dispatch(&self, raw: &str) -> DispatchOutcome {
        let value: JsonValue = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[REALTIME] Dropping unparseable frame: {}", e);
                return DispatchOutcome::Malformed;
            },
        };

        let kind = match value.get("type").and_then(JsonValue::as_str) {
            Some(kind) => kind.to_string(),
            None => {
                log::warn!("[REALTIME] Dropping frame without a type");
                return DispatchOutcome::Malformed;
            },
        };
        if !ServerMessage::KNOWN_TYPES.contains(&kind.as_str()) {
            log::debug!("[REALTIME] Ignoring frame of unknown type '{}'", kind);
            return DispatchOutcome::Unknown(kind);
        }

        match serde_json::from_value::<ServerMessage>(value) {
            Ok(ServerMessage::WalletUpdate(payload)) => self.on_wallet_update(payload),
            Ok(ServerMessage::Transaction(payload)) => self.on_transaction(payload),
            Err(e) => {
                log::warn!("[REALTIME] Dropping malformed '{}' frame: {}", kind, e);
                DispatchOutcome::Malformed
            },
        }
    }

    fn on_wallet_update(&self, payload: WalletUpdatePayload) -> DispatchOutcome {
        if !self.session.apply_wallet_delta(payload.wallet_id, &payload.new_balance) {
            log::debug!("[REALTIME] Ignoring update for wallet {}", payload.wallet_id);
            return DispatchOutcome::WalletIgnored;
        }

        self.notifier.toast(Toast::info(format!(
            "Balance updated: {} {}",
            payload.mutation_type.direction(),
            format_idr_str(&payload.amount)
        )));
        DispatchOutcome::WalletApplied
    }

    fn on_transaction(&self, payload: TransactionPayload) -> DispatchOutcome {
        let label = payload.transaction_type.label();
        let amount = format_idr_str(&payload.amount);

        if self.notifier.native_permission_granted() {
            self.notifier.native(
                TRANSACTION_NOTIFICATION_TITLE,
                &format!("{} of {} succeeded", label, amount),
            );
        } else {
            self.notifier
                .toast(Toast::success(format!("Transaction {} succeeded: {}", label, amount)));
        }
        DispatchOutcome::TransactionNotified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastLevel;
    use crate::session::{Identity, WalletSnapshot};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        native_granted: bool,
        natives: Mutex<Vec<(String, String)>>,
        toasts: Mutex<Vec<Toast>>,
    }

    impl NotificationSink for RecordingSink {
        fn native_permission_granted(&self) -> bool {
            self.native_granted
        }

        fn native(&self, title: &str, body: &str) {
            self.natives.lock().push((title.to_string(), body.to_string()));
        }

        fn toast(&self, toast: Toast) {
            self.toasts.lock().push(toast);
        }
    }

    fn setup(native_granted: bool) -> (EventDispatcher, Arc<SessionStore>, Arc<RecordingSink>) {
        let session = Arc::new(SessionStore::new());
        session.set_session(
            "t1".to_string(),
            Identity::new(7, "alice"),
            Some(WalletSnapshot {
                id: 3,
                balance: "100.00".to_string(),
            }),
        );
        let sink = Arc::new(RecordingSink {
            native_granted,
            ..Default::default()
        });
        let dispatcher = EventDispatcher::new(session.clone(), sink.clone());
        (dispatcher, session, sink)
    }

    fn wallet_update(wallet_id: u64) -> String {
        serde_json::json!({
            "type": "wallet_update",
            "payload": {
                "wallet_id": wallet_id,
                "new_balance": "150.00",
                "mutation_type": "credit",
                "amount": "50000"
            }
        })
        .to_string()
    }

    #[test]
    fn test_wallet_update_for_own_wallet() {
        let (dispatcher, session, sink) = setup(false);

        assert_eq!(dispatcher.dispatch(&wallet_update(3)), DispatchOutcome::WalletApplied);
        assert_eq!(session.wallet().unwrap().balance, "150.00");

        let toasts = sink.toasts.lock();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Info);
        assert_eq!(toasts[0].message, "Balance updated: incoming Rp 50.000,00");
    }

    #[test]
    fn test_wallet_update_for_foreign_wallet() {
        let (dispatcher, session, sink) = setup(false);

        assert_eq!(dispatcher.dispatch(&wallet_update(9)), DispatchOutcome::WalletIgnored);
        assert_eq!(session.wallet().unwrap().balance, "100.00");
        assert!(sink.toasts.lock().is_empty());
    }

    #[test]
    fn test_transaction_uses_native_when_permitted() {
        let (dispatcher, session, sink) = setup(true);
        let before = session.snapshot();
        let raw = r#"{"type":"transaction","payload":{"transaction_id":11,"transaction_type":"transfer","amount":"25000","to_user_id":7}}"#;

        assert_eq!(dispatcher.dispatch(raw), DispatchOutcome::TransactionNotified);
        assert_eq!(
            *sink.natives.lock(),
            vec![(
                "New Transaction".to_string(),
                "Transfer of Rp 25.000,00 succeeded".to_string()
            )]
        );
        assert!(sink.toasts.lock().is_empty());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_transaction_falls_back_to_toast() {
        let (dispatcher, _session, sink) = setup(false);
        let raw = r#"{"type":"transaction","payload":{"transaction_id":11,"transaction_type":"top_up","amount":"50000","to_user_id":7}}"#;

        dispatcher.dispatch(raw);
        let toasts = sink.toasts.lock();
        assert_eq!(toasts[0], Toast::success("Transaction Top Up succeeded: Rp 50.000,00"));
    }

    #[test]
    fn test_malformed_and_unknown_frames() {
        let (dispatcher, session, sink) = setup(false);
        let before = session.snapshot();

        assert_eq!(dispatcher.dispatch("not json"), DispatchOutcome::Malformed);
        assert_eq!(dispatcher.dispatch(r#"{"payload":{}}"#), DispatchOutcome::Malformed);
        assert_eq!(
            dispatcher.dispatch(r#"{"type":"wallet_update","payload":{"wallet_id":"x"}}"#),
            DispatchOutcome::Malformed
        );
        assert_eq!(
            dispatcher.dispatch(r#"{"type":"heartbeat"}"#),
            DispatchOutcome::Unknown("heartbeat".to_string())
        );

        assert_eq!(session.snapshot(), before);
        assert!(sink.toasts.lock().is_empty());
    }
}
