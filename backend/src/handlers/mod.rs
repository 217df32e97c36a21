//! HTTP handlers for the Fuel Depot Management Platform

pub mod closing;
pub mod health;
pub mod inventory;
pub mod loss_config;
pub mod petroleum;

pub use closing::*;
pub use health::*;
pub use inventory::*;
pub use loss_config::*;
pub use petroleum::*;
