//! Foundation module - Core utilities and types
//!
//! - Math type aliases over `nalgebra`
//! - Logging initialization

pub mod logging;
pub mod math;
