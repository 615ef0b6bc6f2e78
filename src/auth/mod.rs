//! Accounts and sessions.
//!
//! `registry` owns account creation and lookup, `session` owns login and
//! token rotation, and `handlers` exposes both over HTTP. `password` and
//! `token` are the shared primitives underneath.

pub mod handlers;
pub mod password;
pub mod registry;
pub mod session;
pub mod token;

pub use registry::UserRegistry;
pub use session::{LoginRequest, SessionManager};
