//! Route classification and route registration.

use actix_web::web;

use crate::config::GateSettings;
use crate::handlers;

/// How the gate treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Needs a session; anonymous visitors are sent to the login route.
    Protected,
    /// Login and signup pages; signed-in visitors are sent to the landing route.
    AuthOnly,
    Public,
}

/// Prefix tables for protected and auth-only paths.
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected: Vec<String>,
    auth_only: Vec<String>,
}

impl RouteTable {
    pub fn new<P, A>(protected: P, auth_only: A) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(normalize_prefix).collect(),
            auth_only: auth_only.into_iter().map(normalize_prefix).collect(),
        }
    }

    pub fn from_settings(settings: &GateSettings) -> Self {
        Self::new(
            settings.protected_routes.iter().cloned(),
            settings.auth_routes.iter().cloned(),
        )
    }

    /// Classify a request path. A prefix matches the path itself and
    /// anything below it (`/wallet`, `/wallet/topup`) but not siblings
    /// sharing the same leading characters (`/wallets`).
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.protected.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::Protected
        } else if self.auth_only.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Public
        }
    }
}

fn normalize_prefix(prefix: impl Into<String>) -> String {
    let prefix = prefix.into();
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Register the gate's page routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::root))
        .route("/healthz", web::get().to(handlers::health))
        .route("/{tail:.*}", web::get().to(handlers::page_data));
}
