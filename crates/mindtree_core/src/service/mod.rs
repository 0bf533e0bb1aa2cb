//! Sheet editing services.
//!
//! # Responsibility
//! - Expose the chainable editor used by callers and by the mapper to build
//!   and reshape topic trees.
//!
//! # Invariants
//! - Every structural change goes through `TopicMut`, which keeps tree shape,
//!   parent links and the identifier index consistent.

pub mod editor;
