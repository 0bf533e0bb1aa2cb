//! Mind-map document model.
//!
//! # Responsibility
//! - Define identifiers, topics, sheets and workbooks.
//! - Keep tree shape, parent links and the identifier index in one arena
//!   per sheet.
//!
//! # Invariants
//! - Every sheet owns exactly one central topic.
//! - Identifiers are unique within one sheet.

pub mod id;
pub mod sheet;
pub mod topic;
pub mod workbook;
