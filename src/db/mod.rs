//! Credential store adapter.
//!
//! The trait in [`store`] is the only persistence surface the rest of the
//! crate sees; [`postgres`] and [`memory`] are interchangeable behind it.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use models::{Session, User};
pub use postgres::PgStore;
pub use store::CredentialStore;
