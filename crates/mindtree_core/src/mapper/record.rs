//! Flat record view consumed by the mapper.

use serde_json::{Map, Value};

/// Read access to one flat record by field name.
///
/// Implemented for JSON objects; callers with their own record shapes can
/// implement it directly instead of going through JSON.
pub trait FlatRecord {
    /// Value stored under `name`, if any.
    fn field(&self, name: &str) -> Option<&Value>;
}

impl FlatRecord for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl FlatRecord for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(name))
    }
}

impl<R: FlatRecord + ?Sized> FlatRecord for &R {
    fn field(&self, name: &str) -> Option<&Value> {
        (**self).field(name)
    }
}
