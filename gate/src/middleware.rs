//! Request gate middleware.
//!
//! Runs before every page handler: reads the session cookie, classifies the
//! path, validates the token at most once against the backend and either
//! redirects or lets the request through with a per-request identity.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::{middleware, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use log::{debug, warn};
use wallet_link::UserProfile;

use crate::config::GateSettings;
use crate::cookie::{extract_session_token, removal_cookie, CookieConfig};
use crate::routes::{RouteClass, RouteTable};
use crate::validator::{SessionValidator, Validation};

/// Cache directives for responses on protected routes.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Create the request logger middleware
pub fn request_logger() -> middleware::Logger {
    middleware::Logger::default()
}

/// Route tables, cookie settings and redirect targets used by the gate.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub routes: RouteTable,
    pub cookie: CookieConfig,
    pub login_route: String,
    pub landing_route: String,
}

impl GatePolicy {
    pub fn from_settings(settings: &GateSettings) -> Self {
        Self {
            routes: RouteTable::from_settings(settings),
            cookie: CookieConfig::from_settings(settings),
            login_route: settings.login_route.clone(),
            landing_route: settings.landing_route.clone(),
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from_settings(&GateSettings::default())
    }
}

/// The validated user for the current request, if any.
///
/// A fresh, empty value is inserted into the request extensions before the
/// gate does anything else, so one request never sees another's user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    user: Option<UserProfile>,
    cookie_cleared: bool,
}

impl RequestIdentity {
    pub fn new(user: Option<UserProfile>) -> Self {
        Self {
            user,
            cookie_cleared: false,
        }
    }

    /// The gate rejected the session cookie and expires it on this response.
    pub fn with_cookie_cleared(mut self, cleared: bool) -> Self {
        self.cookie_cleared = cleared;
        self
    }

    /// Handlers must treat the request as carrying no session cookie.
    pub fn cookie_cleared(&self) -> bool {
        self.cookie_cleared
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl FromRequest for RequestIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<RequestIdentity>()
            .cloned()
            .unwrap_or_default()))
    }
}

/// What happens to the request after the gate ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateFlow {
    /// Continue to the page handler.
    Render,
    /// Answer with `302 Found` to the given location.
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub route: RouteClass,
    pub flow: GateFlow,
    pub identity: Option<UserProfile>,
    /// Expire the session cookie on the response.
    pub clear_cookie: bool,
}

impl GateDecision {
    fn render(route: RouteClass, identity: Option<UserProfile>, clear_cookie: bool) -> Self {
        Self {
            route,
            flow: GateFlow::Render,
            identity,
            clear_cookie,
        }
    }

    fn redirect(route: RouteClass, location: &str, identity: Option<UserProfile>) -> Self {
        Self {
            route,
            flow: GateFlow::Redirect(location.to_string()),
            identity,
            clear_cookie: false,
        }
    }
}

/// Decide what to do with a request for `path` carrying `token`.
///
/// The validator is called at most once.
pub async fn evaluate(
    policy: &GatePolicy,
    validator: &dyn SessionValidator,
    path: &str,
    token: Option<&str>,
) -> GateDecision {
    let route = policy.routes.classify(path);

    let Some(token) = token else {
        if route == RouteClass::Protected {
            debug!("[GATE] No session for protected path {}, redirecting", path);
            return GateDecision::redirect(route, &policy.login_route, None);
        }
        return GateDecision::render(route, None, false);
    };

    match validator.validate(token).await {
        Validation::Valid(profile) => {
            if route == RouteClass::AuthOnly {
                debug!("[GATE] Signed-in user on {}, redirecting", path);
                GateDecision::redirect(route, &policy.landing_route, Some(profile))
            } else {
                GateDecision::render(route, Some(profile), false)
            }
        },
        Validation::Rejected { status, message } => {
            debug!(
                "[GATE] Session rejected on {} (status {:?}): {}",
                path, status, message
            );
            GateDecision::render(route, None, true)
        },
        Validation::Unreachable(err) => {
            warn!("[GATE] Could not validate session on {}: {}", path, err);
            GateDecision::render(route, None, true)
        },
    }
}

/// Request gate middleware factory.
#[derive(Clone)]
pub struct RequestGate {
    policy: Arc<GatePolicy>,
    validator: Arc<dyn SessionValidator>,
}

impl RequestGate {
    pub fn new(policy: Arc<GatePolicy>, validator: Arc<dyn SessionValidator>) -> Self {
        Self { policy, validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestGateMiddleware {
            service: Rc::new(service),
            policy: self.policy.clone(),
            validator: self.validator.clone(),
        }))
    }
}

pub struct RequestGateMiddleware<S> {
    service: Rc<S>,
    policy: Arc<GatePolicy>,
    validator: Arc<dyn SessionValidator>,
}

impl<S, B> Service<ServiceRequest> for RequestGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let policy = self.policy.clone();
        let validator = self.validator.clone();

        Box::pin(async move {
            req.extensions_mut().insert(RequestIdentity::default());

            let token = extract_session_token(req.request(), &policy.cookie.name);
            let path = req.path().to_string();
            let decision =
                evaluate(&policy, validator.as_ref(), &path, token.as_deref()).await;

            if let GateFlow::Redirect(location) = &decision.flow {
                let response = HttpResponse::Found()
                    .insert_header((header::LOCATION, location.as_str()))
                    .finish();
                return Ok(req.into_response(response).map_into_right_body());
            }

            req.extensions_mut().insert(
                RequestIdentity::new(decision.identity.clone())
                    .with_cookie_cleared(decision.clear_cookie),
            );

            let mut res = service.call(req).await?;

            if decision.clear_cookie {
                res.response_mut()
                    .add_cookie(&removal_cookie(&policy.cookie))
                    .map_err(actix_web::error::ErrorInternalServerError)?;
            }

            if decision.route == RouteClass::Protected {
                let headers = res.headers_mut();
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
                headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
            }

            Ok(res.map_into_left_body())
        })
    }
}
