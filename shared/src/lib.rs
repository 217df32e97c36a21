//! Shared types and domain logic for the Fuel Depot Management Platform
//!
//! This crate contains the pure parts of the system shared between the
//! backend server and the operator tools: domain models, the petroleum
//! temperature-compensation calculator, reporting-period segmentation,
//! and validation helpers. No I/O lives here.

pub mod models;
pub mod periods;
pub mod petroleum;
pub mod types;
pub mod validation;

pub use models::*;
pub use periods::*;
pub use petroleum::*;
pub use types::*;
pub use validation::*;
