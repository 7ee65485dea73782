//! # cw-core
//!
//! Domain models, error taxonomy, and port traits for the Classwall
//! policy core. Plugins implement the ports; `cw-services` consumes them.

pub mod error;
pub mod models;
pub mod traits;

pub use error::{AppError, Result};
