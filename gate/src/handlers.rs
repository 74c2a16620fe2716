//! Page handlers behind the gate.

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use wallet_link::UserProfile;

use crate::cookie::extract_session_token;
use crate::middleware::{GatePolicy, RequestIdentity};

/// Page payload handed to the renderer.
#[derive(Debug, Serialize)]
pub struct PageData<'a> {
    pub path: &'a str,
    pub user: Option<&'a UserProfile>,
}

/// `GET /` sends visitors with a session cookie to the landing page and
/// everyone else to the login page. A cookie the gate just rejected counts
/// as absent.
pub async fn root(
    req: HttpRequest,
    identity: RequestIdentity,
    policy: web::Data<GatePolicy>,
) -> HttpResponse {
    let has_session = !identity.cookie_cleared()
        && extract_session_token(&req, &policy.cookie.name).is_some();
    let target = if has_session {
        &policy.landing_route
    } else {
        &policy.login_route
    };

    HttpResponse::Found()
        .insert_header((header::LOCATION, target.as_str()))
        .finish()
}

/// Any other page: the path plus the user validated by the gate.
pub async fn page_data(req: HttpRequest, identity: RequestIdentity) -> HttpResponse {
    HttpResponse::Ok().json(PageData {
        path: req.path(),
        user: identity.user(),
    })
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
