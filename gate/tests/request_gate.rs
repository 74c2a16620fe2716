use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use wallet_gate::{routes, GatePolicy, RequestGate, SessionValidator, Validation};
use wallet_link::{ProfileWallet, Role, UserProfile};

/// Answers from a token table; unknown tokens are rejected with 401.
#[derive(Default)]
struct FakeValidator {
    profiles: HashMap<String, UserProfile>,
    unreachable: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeValidator {
    fn with_user(token: &str, profile: UserProfile) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(token.to_string(), profile);
        Self {
            profiles,
            ..Default::default()
        }
    }

    fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionValidator for FakeValidator {
    async fn validate(&self, token: &str) -> Validation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(token.to_string());
        if self.unreachable {
            return Validation::Unreachable("connection refused".to_string());
        }
        match self.profiles.get(token) {
            Some(profile) => Validation::Valid(profile.clone()),
            None => Validation::Rejected {
                status: Some(401),
                message: "Unauthorized".to_string(),
            },
        }
    }
}

fn alice() -> UserProfile {
    UserProfile {
        id: 7,
        username: "alice".to_string(),
        role: Role::User,
        wallet: Some(ProfileWallet {
            id: 3,
            balance: "100.00".to_string(),
        }),
    }
}

macro_rules! gated_app {
    ($validator:expr) => {{
        let policy = Arc::new(GatePolicy::default());
        let validator: Arc<dyn SessionValidator> = $validator;
        test::init_service(
            App::new()
                .wrap(RequestGate::new(policy.clone(), validator))
                .app_data(web::Data::from(policy))
                .configure(routes::configure),
        )
        .await
    }};
}

fn location(res: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn removal_cookie_set(res: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> bool {
    res.response()
        .cookies()
        .any(|c| c.name() == "jwt" && c.value().is_empty())
}

#[actix_web::test]
async fn test_protected_route_without_cookie_redirects_to_login() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get().uri("/history").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert_eq!(validator.calls(), 0);
}

#[actix_web::test]
async fn test_empty_cookie_counts_as_no_session() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/wallet")
        .cookie(Cookie::new("jwt", ""))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert_eq!(validator.calls(), 0);
}

#[actix_web::test]
async fn test_signed_in_user_on_login_goes_to_wallet_with_one_validation() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/login")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/wallet");
    assert!(!removal_cookie_set(&res));
    assert_eq!(validator.calls(), 1);
}

#[actix_web::test]
async fn test_rejected_token_on_signup_renders_and_clears_cookie() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/signup")
        .cookie(Cookie::new("jwt", "expired"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(removal_cookie_set(&res));
    assert_eq!(validator.calls(), 1);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["path"], "/signup");
    assert!(body["user"].is_null());
}

#[actix_web::test]
async fn test_valid_session_on_protected_route_exposes_user_and_disables_cache() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/wallet")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(res.headers().get(header::PRAGMA).unwrap(), "no-cache");
    assert!(!removal_cookie_set(&res));
    assert_eq!(validator.calls(), 1);
    assert_eq!(validator.seen.lock().as_slice(), ["t1".to_string()]);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["wallet"]["id"], 3);
}

#[actix_web::test]
async fn test_unauthorized_during_gate_clears_session_on_protected_route() {
    let validator = Arc::new(FakeValidator::default());
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/profile")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(removal_cookie_set(&res));
    assert_eq!(
        res.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store, no-cache, must-revalidate"
    );

    let body: Value = test::read_body_json(res).await;
    assert!(body["user"].is_null());
}

#[actix_web::test]
async fn test_unreachable_backend_clears_cookie() {
    let validator = Arc::new(FakeValidator::unreachable());
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/login")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(removal_cookie_set(&res));
}

#[actix_web::test]
async fn test_identity_does_not_leak_between_requests() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let signed_in = test::TestRequest::get()
        .uri("/about")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, signed_in).await;
    assert_eq!(body["user"]["id"], 7);

    let anonymous = test::TestRequest::get().uri("/about").to_request();
    let res = test::call_service(&app, anonymous).await;
    assert!(res.headers().get(header::CACHE_CONTROL).is_none());
    let body: Value = test::read_body_json(res).await;
    assert!(body["user"].is_null());
    assert_eq!(validator.calls(), 1);
}

#[actix_web::test]
async fn test_root_redirects_by_cookie() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let anonymous = test::TestRequest::get().uri("/").to_request();
    let res = test::call_service(&app, anonymous).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");

    let signed_in = test::TestRequest::get()
        .uri("/")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let res = test::call_service(&app, signed_in).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/wallet");
}

#[actix_web::test]
async fn test_root_with_rejected_cookie_goes_straight_to_login() {
    let validator = Arc::new(FakeValidator::with_user("t1", alice()));
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(Cookie::new("jwt", "stale"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert!(removal_cookie_set(&res));
    assert_eq!(validator.calls(), 1);
}

#[actix_web::test]
async fn test_root_with_unreachable_backend_goes_to_login() {
    let validator = Arc::new(FakeValidator::unreachable());
    let app = gated_app!(validator.clone());

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(Cookie::new("jwt", "t1"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(location(&res), "/login");
    assert!(removal_cookie_set(&res));
}
