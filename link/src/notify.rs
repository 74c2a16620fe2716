//! User-facing notifications raised by realtime events.
//!
//! The realtime channel never talks to a UI directly; it hands toasts and
//! native notifications to a [`NotificationSink`].

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
}

/// In-app notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }
}

/// Receiver of notifications.
pub trait NotificationSink: Send + Sync {
    /// Whether the user allowed OS-level notifications.
    fn native_permission_granted(&self) -> bool {
        false
    }

    /// Show an OS-level notification.
    fn native(&self, title: &str, body: &str);

    /// Show an in-app toast.
    fn toast(&self, toast: Toast);
}

/// Sink that writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn native(&self, title: &str, body: &str) {
        log::info!("[NOTIFY] {}: {}", title, body);
    }

    fn toast(&self, toast: Toast) {
        log::info!("[NOTIFY] {:?}: {}", toast.level, toast.message);
    }
}

/// Format an amount as Indonesian Rupiah, e.g. `Rp 50.000,00`.
pub fn format_idr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit);
    }

    format!("{}Rp {},{}", sign, grouped, fraction)
}

/// Format a decimal string from the backend; unparseable input is shown as is.
pub fn format_idr_str(raw: &str) -> String {
    match Decimal::from_str(raw.trim()) {
        Ok(amount) => format_idr(amount),
        Err(_) => format!("Rp {}", raw),
    }
}
