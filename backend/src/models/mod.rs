//! Database models for the Fuel Depot Management Platform
//!
//! Re-exports models from the shared crate; row types owned by a single
//! service live next to that service.

pub use shared::models::*;
