//! Core engine of the mind-map toolkit: topic trees, their editor, and the
//! conversions between trees, flat records and the canonical document.

pub mod codec;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod search;
pub mod service;

pub use codec::{load_file, read_workbook, save_file, write_archive, write_workbook, CodecError};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use mapper::{
    FieldMapping, FlatRecord, IdRewrite, MapperError, MapperResult, Record, SchemaMapper,
    SequentialIds,
};
pub use model::id::{
    IdAllocator, RandomIdAllocator, SequentialIdAllocator, TopicId, TopicKey, ORDINARY_ID_LEN,
};
pub use model::sheet::{Position, Sheet, DEFAULT_SHEET_TITLE};
pub use model::topic::{Branch, NodeIndex, ParentLink, StructureClass, Topic};
pub use model::workbook::Workbook;
pub use service::editor::{AddMode, EditError, Inserted, TopicMut};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
