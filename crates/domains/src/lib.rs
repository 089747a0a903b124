//! alumni-hub/crates/domains/src/lib.rs
//!
//! Domain models, authorization, counter rules and the ports every adapter
//! implements. No I/O happens in this crate.

pub mod authz;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod paging;
pub mod ports;

pub use authz::*;
pub use errors::*;
pub use models::*;
pub use paging::*;
pub use ports::*;
