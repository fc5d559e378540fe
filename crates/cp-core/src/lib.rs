//! commonplace/crates/cp-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Commonplace.

pub mod models;
pub mod traits;
pub mod error;
pub mod session;
pub mod authz;

// Re-exporting for easier access in other crates
pub use models::*;
pub use traits::*;
pub use error::*;
pub use session::SessionContext;
