// Session cookie helpers
//
// The wallet backend issues the JWT in a single cookie (`jwt` by default).
// The gate only ever reads it or expires it.

use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;

use crate::config::GateSettings;

/// Default cookie name for the session token
pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Configuration for the session cookie
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    /// Whether to set the Secure flag (should be true behind HTTPS)
    pub secure: bool,
    /// Cookie path (default: "/")
    pub path: String,
    pub same_site: SameSite,
    /// Domain (None = current domain)
    pub domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            secure: false,
            path: "/".to_string(),
            same_site: SameSite::Lax,
            domain: None,
        }
    }
}

impl CookieConfig {
    pub fn from_settings(settings: &GateSettings) -> Self {
        Self {
            name: settings.cookie_name.clone(),
            secure: settings.cookie_secure,
            path: settings.cookie_path.clone(),
            ..Default::default()
        }
    }
}

/// Create a cookie that expires the session cookie in the browser.
pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.name.clone(), "")
        .path(config.path.clone())
        .secure(config.secure)
        .same_site(config.same_site)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .finish();

    if let Some(ref domain) = config.domain {
        cookie.set_domain(domain.clone());
    }

    cookie
}

/// Read the session token from the request cookies.
///
/// An empty cookie value counts as no token.
pub fn extract_session_token(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
}
