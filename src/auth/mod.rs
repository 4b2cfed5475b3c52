//! Session and identity module
//!
//! This module exposes the identity of the logged-in user to the
//! configuration sync code. The actual login flow lives outside this crate.

pub mod provider;

pub use provider::*;
