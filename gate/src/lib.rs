//! # wallet-gate
//!
//! Server-side request gate for the wallet web app. Every navigation passes
//! through [`RequestGate`], which checks the session cookie against the
//! wallet backend before the page handler runs.

pub mod config;
pub mod cookie;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod validator;

pub use config::ServerConfig;
pub use error::GateError;
pub use middleware::{evaluate, GateDecision, GateFlow, GatePolicy, RequestGate, RequestIdentity};
pub use routes::{RouteClass, RouteTable};
pub use validator::{LinkSessionValidator, SessionValidator, Validation};
