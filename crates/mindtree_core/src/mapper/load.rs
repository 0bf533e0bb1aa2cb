//! Flat records -> sheet.
//!
//! # Invariants
//! - Records arrive parent-before-child; a parent reference to an id not seen
//!   earlier is rejected, never guessed.
//! - Exactly one record is the central topic: the first with `is_root` true
//!   or with an empty parent field.
//! - Topic identifiers are regenerated; external ids live only in the
//!   translation table for the duration of the call.

use crate::mapper::error::{MapperError, MapperResult};
use crate::mapper::mapping::FieldMapping;
use crate::mapper::record::FlatRecord;
use crate::mapper::SchemaMapper;
use crate::model::sheet::{Sheet, DEFAULT_SHEET_TITLE};
use crate::model::topic::{Branch, NodeIndex, StructureClass};
use crate::model::workbook::Workbook;
use crate::service::editor::AddMode;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

impl SchemaMapper {
    /// Builds one sheet from records in parent-before-child order.
    ///
    /// # Errors
    /// - Missing id/title fields, wrong field shapes, repeated ids, a second
    ///   central topic, a child before the central topic, or a parent id not
    ///   seen in an earlier record.
    pub fn load_records<R: FlatRecord>(&self, records: &[R]) -> MapperResult<Sheet> {
        if records.is_empty() {
            return Err(MapperError::Empty);
        }

        let mut sheet: Option<Sheet> = None;
        let mut translated: HashMap<String, NodeIndex> = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let fields = RecordFields::read(record, &self.mapping, position)?;
            if translated.contains_key(&fields.id) {
                return Err(MapperError::DuplicateId {
                    position,
                    id: fields.id,
                });
            }

            let index = if fields.is_root || fields.parent.is_empty() {
                if sheet.is_some() {
                    return Err(MapperError::DuplicateRoot { position });
                }
                let created = Sheet::with_allocator(
                    DEFAULT_SHEET_TITLE,
                    fields.title.as_str(),
                    StructureClass::default(),
                    Arc::clone(&self.allocator),
                );
                let central = created.central();
                sheet = Some(created);
                central
            } else {
                let target = sheet
                    .as_mut()
                    .ok_or(MapperError::MissingRoot { position })?;
                let parent = *translated.get(&fields.parent).ok_or_else(|| {
                    MapperError::UnknownParent {
                        position,
                        parent: fields.parent.clone(),
                    }
                })?;
                target
                    .edit_index(parent)
                    .try_add(&fields.title, AddMode::Sub)?
                    .created
            };

            if let Some(target) = sheet.as_mut() {
                let handle = target
                    .edit_index(index)
                    .add_labels(fields.labels)
                    .add_notes(&fields.notes)
                    .add_href(&fields.href);
                if fields.branch == Branch::Folded {
                    handle.folded(false);
                }
            }
            translated.insert(fields.id, index);
        }

        let mut sheet = sheet.ok_or(MapperError::MissingRoot { position: 0 })?;
        let central = sheet.central();
        sheet.set_cursor(central);
        info!(
            "event=records_loaded module=mapper status=ok records={} topics={}",
            records.len(),
            sheet.topic_count()
        );
        Ok(sheet)
    }

    /// Builds one sheet from a JSON array of record objects.
    pub fn load_json(&self, data: impl AsRef<[u8]>) -> MapperResult<Sheet> {
        let values: Vec<Value> = serde_json::from_slice(data.as_ref())?;
        self.load_values(values)
    }

    /// Builds one sheet from any serializable record type.
    ///
    /// Field names come from the type's serde representation.
    pub fn load_typed<T: Serialize>(&self, records: &[T]) -> MapperResult<Sheet> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.load_values(values)
    }

    /// Reads a JSON array whose elements are record arrays, one per sheet.
    pub fn load_workbook<R: Read>(&self, reader: R) -> MapperResult<Workbook> {
        let sheets: Vec<Vec<Value>> = serde_json::from_reader(reader)?;
        let mut workbook = Workbook::new();
        for values in sheets {
            workbook.push(self.load_values(values)?);
        }
        Ok(workbook)
    }

    fn load_values(&self, values: Vec<Value>) -> MapperResult<Sheet> {
        if let Some(position) = values.iter().position(|value| !value.is_object()) {
            return Err(MapperError::NotAnObject { position });
        }
        self.load_records(&values)
    }
}

/// Facet values of one record, already shape-checked.
struct RecordFields {
    id: String,
    title: String,
    parent: String,
    is_root: bool,
    labels: Vec<String>,
    notes: String,
    branch: Branch,
    href: String,
}

impl RecordFields {
    fn read<R: FlatRecord + ?Sized>(
        record: &R,
        mapping: &FieldMapping,
        position: usize,
    ) -> MapperResult<Self> {
        let reader = FieldReader { record, position };
        let is_root = match mapping.is_root.as_deref() {
            Some(field) => reader.flag(field)?,
            None => false,
        };
        Ok(Self {
            id: reader.identifier(&mapping.id)?.ok_or_else(|| reader.missing(&mapping.id))?,
            title: reader.text(&mapping.title)?.ok_or_else(|| reader.missing(&mapping.title))?,
            parent: reader.identifier(&mapping.parent_id)?.unwrap_or_default(),
            is_root,
            labels: reader.labels(&mapping.labels)?,
            notes: reader.text(&mapping.notes)?.unwrap_or_default(),
            branch: Branch::parse(&reader.text(&mapping.branch)?.unwrap_or_default()),
            href: reader.text(&mapping.href)?.unwrap_or_default(),
        })
    }
}

struct FieldReader<'r, R: ?Sized> {
    record: &'r R,
    position: usize,
}

impl<R: FlatRecord + ?Sized> FieldReader<'_, R> {
    fn present(&self, field: &str) -> Option<&Value> {
        self.record.field(field).filter(|value| !value.is_null())
    }

    fn missing(&self, field: &str) -> MapperError {
        MapperError::MissingField {
            position: self.position,
            field: field.to_string(),
        }
    }

    fn wrong_shape(&self, field: &str, expected: &'static str) -> MapperError {
        MapperError::WrongShape {
            position: self.position,
            field: field.to_string(),
            expected,
        }
    }

    fn text(&self, field: &str) -> MapperResult<Option<String>> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.wrong_shape(field, "a string")),
        }
    }

    /// Identifiers may also be written as JSON numbers.
    fn identifier(&self, field: &str) -> MapperResult<Option<String>> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(Value::Number(value)) => Ok(Some(value.to_string())),
            Some(_) => Err(self.wrong_shape(field, "a string or number")),
        }
    }

    fn flag(&self, field: &str) -> MapperResult<bool> {
        match self.present(field) {
            None => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => Err(self.wrong_shape(field, "a boolean")),
        }
    }

    fn labels(&self, field: &str) -> MapperResult<Vec<String>> {
        let Some(value) = self.present(field) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(self.wrong_shape(field, "an array of strings"));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(label) => Ok(label.clone()),
                _ => Err(self.wrong_shape(field, "an array of strings")),
            })
            .collect()
    }
}
