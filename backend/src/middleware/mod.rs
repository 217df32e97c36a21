//! HTTP middleware for the Fuel Depot Management Platform

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
