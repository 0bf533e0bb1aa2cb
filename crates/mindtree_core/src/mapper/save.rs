//! Sheet -> flat records.
//!
//! # Invariants
//! - Records are emitted in pre-order, so every parent precedes its children.
//! - Each topic's exported id is computed once; children reference the
//!   parent's exported id, rewritten or not.
//! - Every record carries the notes, branch, href and labels fields, with
//!   empty values when the topic has none.

use crate::mapper::error::{MapperError, MapperResult};
use crate::mapper::mapping::RootEmission;
use crate::mapper::SchemaMapper;
use crate::model::id::TopicId;
use crate::model::sheet::Sheet;
use crate::model::topic::ParentLink;
use crate::model::workbook::Workbook;
use log::info;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;

/// One exported record: field name -> value, in emission order.
pub type Record = Map<String, Value>;

/// Replaces topic identifiers on export.
///
/// Called once per topic. Implementations must return distinct values for
/// distinct topics or the parent references become ambiguous.
pub trait IdRewrite {
    fn rewrite(&mut self, id: &TopicId) -> String;
}

impl<F> IdRewrite for F
where
    F: FnMut(&TopicId) -> String,
{
    fn rewrite(&mut self, id: &TopicId) -> String {
        self(id)
    }
}

/// Numbers topics `"1"`, `"2"`, ... in emission order.
///
/// The counter is shared by every sheet saved through the same value, so a
/// workbook export keeps numbers unique across sheets.
#[derive(Debug, Default)]
pub struct SequentialIds {
    assigned: HashMap<TopicId, String>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdRewrite for SequentialIds {
    fn rewrite(&mut self, id: &TopicId) -> String {
        let next = self.assigned.len() + 1;
        self.assigned
            .entry(id.clone())
            .or_insert_with(|| next.to_string())
            .clone()
    }
}

impl SchemaMapper {
    /// Flattens `sheet` into records, optionally rewriting identifiers.
    ///
    /// # Errors
    /// - `MissingCentral` when the sheet's central topic is not live.
    /// - `DanglingParent` when a topic's parent cannot be resolved.
    pub fn save_records(
        &self,
        sheet: &Sheet,
        rewrite: Option<&mut dyn IdRewrite>,
    ) -> MapperResult<Vec<Record>> {
        self.collect(sheet, rewrite)
    }

    /// [`SchemaMapper::save_records`] encoded as a JSON array string.
    pub fn save_string(
        &self,
        sheet: &Sheet,
        rewrite: Option<&mut dyn IdRewrite>,
    ) -> MapperResult<String> {
        let records = self.collect(sheet, rewrite)?;
        Ok(serde_json::to_string(&records)?)
    }

    /// [`SchemaMapper::save_records`] encoded as JSON bytes.
    pub fn save_bytes(
        &self,
        sheet: &Sheet,
        rewrite: Option<&mut dyn IdRewrite>,
    ) -> MapperResult<Vec<u8>> {
        let records = self.collect(sheet, rewrite)?;
        Ok(serde_json::to_vec(&records)?)
    }

    /// [`SchemaMapper::save_records`] decoded into a caller-supplied record type.
    pub fn save_typed<T: DeserializeOwned>(
        &self,
        sheet: &Sheet,
        rewrite: Option<&mut dyn IdRewrite>,
    ) -> MapperResult<Vec<T>> {
        self.collect(sheet, rewrite)?
            .into_iter()
            .map(|record| {
                serde_json::from_value(Value::Object(record)).map_err(MapperError::from)
            })
            .collect()
    }

    /// Writes a JSON array holding one record array per sheet.
    pub fn save_workbook<W: Write>(
        &self,
        mut writer: W,
        workbook: &Workbook,
        mut rewrite: Option<&mut dyn IdRewrite>,
    ) -> MapperResult<()> {
        writer.write_all(b"[")?;
        for (position, sheet) in workbook.sheets().iter().enumerate() {
            if position > 0 {
                writer.write_all(b",")?;
            }
            let records = self.collect(sheet, rewrite.as_deref_mut())?;
            serde_json::to_writer(&mut writer, &records)?;
        }
        writer.write_all(b"]")?;
        writer.flush()?;
        info!(
            "event=workbook_saved module=mapper status=ok sheets={}",
            workbook.len()
        );
        Ok(())
    }

    fn collect<'r>(
        &self,
        sheet: &Sheet,
        mut rewrite: Option<&mut (dyn IdRewrite + 'r)>,
    ) -> MapperResult<Vec<Record>> {
        if sheet.topic(sheet.central()).is_none() {
            return Err(MapperError::MissingCentral);
        }

        let mapping = &self.mapping;
        let mut exported: HashMap<TopicId, String> =
            HashMap::with_capacity(sheet.topic_count());
        let mut records = Vec::with_capacity(sheet.topic_count());

        sheet.range(|_, topic| -> MapperResult<()> {
            let id = match rewrite.as_deref_mut() {
                Some(rewrite) => rewrite.rewrite(topic.id()),
                None => topic.id().to_string(),
            };

            let mut record = Record::new();
            record.insert(mapping.id.clone(), Value::String(id.clone()));
            record.insert(mapping.title.clone(), Value::String(topic.title().to_string()));
            match topic.parent() {
                ParentLink::Sheet => {
                    if mapping.emit_empty_parent {
                        record.insert(mapping.parent_id.clone(), Value::String(String::new()));
                    }
                    if let Some(field) = &mapping.is_root {
                        if mapping.root_emission != RootEmission::Never {
                            record.insert(field.clone(), Value::Bool(true));
                        }
                    }
                }
                ParentLink::Topic(parent) => {
                    let parent_id = sheet
                        .topic(parent)
                        .and_then(|parent| exported.get(parent.id()))
                        .ok_or_else(|| MapperError::DanglingParent(topic.id().clone()))?;
                    record.insert(mapping.parent_id.clone(), Value::String(parent_id.clone()));
                    if let Some(field) = &mapping.is_root {
                        if mapping.root_emission == RootEmission::Every {
                            record.insert(field.clone(), Value::Bool(false));
                        }
                    }
                }
            }
            record.insert(
                mapping.notes.clone(),
                Value::String(topic.notes().unwrap_or_default().to_string()),
            );
            record.insert(
                mapping.branch.clone(),
                Value::String(topic.branch().as_str().to_string()),
            );
            record.insert(
                mapping.href.clone(),
                Value::String(topic.href().unwrap_or_default().to_string()),
            );
            let labels = topic.labels().iter().cloned().map(Value::String).collect();
            record.insert(mapping.labels.clone(), Value::Array(labels));

            exported.insert(topic.id().clone(), id);
            records.push(record);
            Ok(())
        })?;

        Ok(records)
    }
}
