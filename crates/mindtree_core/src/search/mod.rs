//! Topic lookup entry points.
//!
//! # Responsibility
//! - Resolve titles to topic keys and walk topic trees depth-first.

pub mod lookup;
