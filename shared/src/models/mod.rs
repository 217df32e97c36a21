//! Domain models shared between the backend and operator tools

pub mod closing;
pub mod shift;

pub use closing::*;
pub use shift::*;
