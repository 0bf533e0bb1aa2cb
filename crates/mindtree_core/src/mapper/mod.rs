//! Schema mapper: topic trees <-> flat parent-linked records.
//!
//! # Responsibility
//! - Rebuild a sheet from records whose field names are configurable.
//! - Flatten a sheet back into records, optionally rewriting identifiers.
//!
//! # Invariants
//! - Loaded topics always receive fresh identifiers from the allocator.
//! - A mapper holds no per-call state and may be reused across threads.

pub mod error;
pub mod load;
pub mod mapping;
pub mod record;
pub mod save;

pub use error::{MapperError, MapperResult};
pub use mapping::{Facet, FieldMapping, MappingError, RootEmission};
pub use record::FlatRecord;
pub use save::{IdRewrite, Record, SequentialIds};

use crate::model::id::{IdAllocator, RandomIdAllocator};
use std::sync::Arc;

/// Field mapping plus the allocator that numbers loaded topics.
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    mapping: FieldMapping,
    allocator: Arc<dyn IdAllocator>,
}

impl SchemaMapper {
    /// # Errors
    /// - The mapping fails [`FieldMapping::validate`].
    pub fn new(mapping: FieldMapping) -> MapperResult<Self> {
        Self::with_allocator(mapping, Arc::new(RandomIdAllocator))
    }

    pub fn with_allocator(
        mapping: FieldMapping,
        allocator: Arc<dyn IdAllocator>,
    ) -> MapperResult<Self> {
        mapping.validate()?;
        Ok(Self { mapping, allocator })
    }

    /// Builds a mapper from `(facet key, field spec)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> MapperResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::new(FieldMapping::from_pairs(pairs)?)
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }
}

impl Default for SchemaMapper {
    fn default() -> Self {
        Self {
            mapping: FieldMapping::default(),
            allocator: Arc::new(RandomIdAllocator),
        }
    }
}
