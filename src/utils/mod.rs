//! Utility functions module
//!
//! This module contains output formatting, HTTP client construction,
//! network error classification and small helpers.

pub mod format;
pub mod helpers;
pub mod network;

pub use format::*;
pub use helpers::*;
pub use network::*;
