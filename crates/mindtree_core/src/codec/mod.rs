//! Canonical document codec.
//!
//! # Responsibility
//! - Decode the canonical document into a workbook, whether it arrives as a
//!   zip archive or a bare stream, in the JSON or the XML dialect.
//! - Encode a workbook as the JSON dialect, bare or archived.
//!
//! # Invariants
//! - Sources are tried in a fixed order: archived `content.json`, archived
//!   `content.xml`, bare JSON, bare XML. The first one that parses wins;
//!   when none does, reading fails with `Unreadable`.
//! - Every decoded sheet satisfies the sheet invariants: identifiers that are
//!   not ordinary, or repeat inside one sheet, are replaced on load.
//! - Sheets without a central topic are dropped; a document with no usable
//!   sheet is an error, never an empty workbook.

pub mod canonical;
pub mod xml;

use crate::codec::canonical::{ChildrenDoc, NotesDoc, PlainDoc, SheetDoc, TopicDoc};
use crate::model::id::{IdAllocator, RandomIdAllocator};
use crate::model::sheet::Sheet;
use crate::model::topic::{Branch, NodeIndex, ParentLink};
use crate::model::workbook::Workbook;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Archive entry holding the JSON dialect.
pub const CONTENT_JSON: &str = "content.json";
/// Archive entry holding the XML dialect.
pub const CONTENT_XML: &str = "content.xml";
/// File extension that selects archive framing in [`save_file`].
pub const ARCHIVE_EXTENSION: &str = "xmind";

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from reading or writing the canonical document.
#[derive(Debug)]
pub enum CodecError {
    /// Document decodes but holds no sheet with a central topic, or a
    /// workbook to write has no sheets.
    Empty,
    /// No archived or bare source parses as either dialect.
    Unreadable,
    Json(serde_json::Error),
    Archive(zip::result::ZipError),
    Io(std::io::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "workbook has no sheets"),
            Self::Unreadable => write!(
                f,
                "not a canonical document: no archived {CONTENT_JSON} or {CONTENT_XML}, \
                 and the stream is neither JSON nor XML of the expected shape"
            ),
            Self::Json(err) => write!(f, "malformed canonical document: {err}"),
            Self::Archive(err) => write!(f, "archive error: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty | Self::Unreadable => None,
            Self::Json(err) => Some(err),
            Self::Archive(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<zip::result::ZipError> for CodecError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Archive(value)
    }
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Where a decoded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    ArchivedJson,
    ArchivedXml,
    Json,
    Xml,
}

impl SourceFormat {
    fn as_str(&self) -> &'static str {
        match self {
            Self::ArchivedJson => "archived_json",
            Self::ArchivedXml => "archived_xml",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

/// Decodes a workbook using the default identifier allocator.
pub fn read_workbook<R: Read>(reader: R) -> CodecResult<Workbook> {
    read_workbook_with(reader, Arc::new(RandomIdAllocator))
}

/// Decodes a workbook; replacement identifiers come from `allocator`.
///
/// # Errors
/// - `Unreadable` when no source parses.
/// - `Empty` when the parsed document has no sheet with a central topic.
pub fn read_workbook_with<R: Read>(
    mut reader: R,
    allocator: Arc<dyn IdAllocator>,
) -> CodecResult<Workbook> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let (format, docs) = decode_docs(&bytes)?;

    let total = docs.len();
    let mut workbook = Workbook::new();
    for doc in docs {
        if let Some(sheet) = decode_sheet(doc, &allocator) {
            workbook.push(sheet);
        }
    }
    if workbook.is_empty() {
        return Err(CodecError::Empty);
    }
    if workbook.len() < total {
        warn!(
            "event=sheets_skipped module=codec status=degraded skipped={}",
            total - workbook.len()
        );
    }
    info!(
        "event=workbook_read module=codec status=ok format={} sheets={}",
        format.as_str(),
        workbook.len()
    );
    Ok(workbook)
}

/// Finds the first source in `bytes` that parses, in the fixed order.
fn decode_docs(bytes: &[u8]) -> CodecResult<(SourceFormat, Vec<SheetDoc>)> {
    match ZipArchive::new(Cursor::new(bytes)) {
        Ok(mut archive) => {
            let archived = archive_entry(&mut archive, CONTENT_JSON).and_then(|data| parse_json(&data));
            if let Some(docs) = archived {
                return Ok((SourceFormat::ArchivedJson, docs));
            }
            let archived = archive_entry(&mut archive, CONTENT_XML).and_then(|data| parse_xml(&data));
            if let Some(docs) = archived {
                return Ok((SourceFormat::ArchivedXml, docs));
            }
        }
        Err(err) => debug!(
            "event=source_rejected module=codec status=skipped format=archive reason={}",
            err
        ),
    }
    if let Some(docs) = parse_json(bytes) {
        return Ok((SourceFormat::Json, docs));
    }
    if let Some(docs) = parse_xml(bytes) {
        return Ok((SourceFormat::Xml, docs));
    }
    warn!(
        "event=workbook_read module=codec status=error reason=unreadable bytes={}",
        bytes.len()
    );
    Err(CodecError::Unreadable)
}

fn archive_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(err) => {
            debug!(
                "event=source_rejected module=codec status=skipped format=archive entry={} reason={}",
                name, err
            );
            return None;
        }
    };
    let mut data = Vec::new();
    match entry.read_to_end(&mut data) {
        Ok(_) => Some(data),
        Err(err) => {
            debug!(
                "event=source_rejected module=codec status=skipped format=archive entry={} reason={}",
                name, err
            );
            None
        }
    }
}

fn parse_json(bytes: &[u8]) -> Option<Vec<SheetDoc>> {
    serde_json::from_slice(bytes)
        .map_err(|err| {
            debug!(
                "event=source_rejected module=codec status=skipped format=json reason={}",
                err
            )
        })
        .ok()
}

fn parse_xml(bytes: &[u8]) -> Option<Vec<SheetDoc>> {
    xml::parse_sheets(bytes)
        .map_err(|err| {
            debug!(
                "event=source_rejected module=codec status=skipped format=xml reason={}",
                err
            )
        })
        .ok()
}

/// Encodes every sheet of `workbook` as one bare JSON array.
pub fn write_workbook<W: Write>(mut writer: W, workbook: &Workbook) -> CodecResult<()> {
    let docs = encode_docs(workbook)?;
    serde_json::to_writer(&mut writer, &docs)?;
    writer.flush()?;
    info!(
        "event=workbook_written module=codec status=ok format={} sheets={}",
        SourceFormat::Json.as_str(),
        workbook.len()
    );
    Ok(())
}

/// Encodes `workbook` as a zip archive holding a single `content.json`.
pub fn write_archive<W: Write + Seek>(writer: W, workbook: &Workbook) -> CodecResult<()> {
    let docs = encode_docs(workbook)?;
    let mut archive = ZipWriter::new(writer);
    archive.start_file(CONTENT_JSON, SimpleFileOptions::default())?;
    serde_json::to_writer(&mut archive, &docs)?;
    archive.finish()?.flush()?;
    info!(
        "event=workbook_written module=codec status=ok format={} sheets={}",
        SourceFormat::ArchivedJson.as_str(),
        workbook.len()
    );
    Ok(())
}

pub fn load_file(path: impl AsRef<Path>) -> CodecResult<Workbook> {
    let file = File::open(path.as_ref())?;
    read_workbook(BufReader::new(file))
}

/// Writes `workbook` to `path`, replacing any existing file.
///
/// A `.xmind` path gets an archive; any other path gets bare JSON.
pub fn save_file(path: impl AsRef<Path>, workbook: &Workbook) -> CodecResult<()> {
    if workbook.is_empty() {
        return Err(CodecError::Empty);
    }
    let path = path.as_ref();
    let file = File::create(path)?;
    let archived = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
    if archived {
        write_archive(BufWriter::new(file), workbook)
    } else {
        write_workbook(BufWriter::new(file), workbook)
    }
}

fn encode_docs(workbook: &Workbook) -> CodecResult<Vec<SheetDoc>> {
    if workbook.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(workbook.sheets().iter().map(encode_sheet).collect())
}

fn decode_sheet(doc: SheetDoc, allocator: &Arc<dyn IdAllocator>) -> Option<Sheet> {
    let mut root = doc.root_topic?;
    let sheet_id = if doc.id.as_str().is_empty() {
        allocator.next_id()
    } else {
        doc.id
    };
    let central_id = if root.id.is_ordinary() {
        root.id.clone()
    } else {
        allocator.next_id()
    };
    let mut sheet = Sheet::assemble(
        sheet_id,
        doc.title,
        central_id,
        std::mem::take(&mut root.title),
        root.structure_class.take().unwrap_or_default(),
        Arc::clone(allocator),
    );
    let central = sheet.central();
    let mut pending = root
        .take_children()
        .into_iter()
        .rev()
        .map(|child| (central, child))
        .collect::<Vec<_>>();
    apply_payload(&mut sheet, central, root);

    while let Some((parent, mut child)) = pending.pop() {
        let id = if child.id.is_ordinary() && !sheet.contains(&child.id) {
            child.id.clone()
        } else {
            sheet.allocate_id()
        };
        let title = std::mem::take(&mut child.title);
        let index = sheet.insert_topic(id, title, ParentLink::Topic(parent));
        if let Some(parent) = sheet.topic_mut(parent) {
            parent.children.push(index);
        }
        pending.extend(
            child
                .take_children()
                .into_iter()
                .rev()
                .map(|grandchild| (index, grandchild)),
        );
        apply_payload(&mut sheet, index, child);
    }
    Some(sheet)
}

fn apply_payload(sheet: &mut Sheet, index: NodeIndex, doc: TopicDoc) {
    let notes = doc.notes_text().to_string();
    let Some(topic) = sheet.topic_mut(index) else {
        return;
    };
    topic.labels = doc.labels;
    topic.notes = Some(notes).filter(|notes| !notes.is_empty());
    topic.href = Some(doc.href).filter(|href| !href.is_empty());
    topic.branch = Branch::parse(&doc.branch);
}

fn encode_sheet(sheet: &Sheet) -> SheetDoc {
    SheetDoc {
        id: sheet.id().clone(),
        title: sheet.title().to_string(),
        root_topic: encode_topic(sheet, sheet.central()),
    }
}

fn encode_topic(sheet: &Sheet, index: NodeIndex) -> Option<TopicDoc> {
    let topic = sheet.topic(index)?;
    let attached = topic
        .children()
        .iter()
        .filter_map(|child| encode_topic(sheet, *child))
        .collect::<Vec<_>>();
    Some(TopicDoc {
        id: topic.id().clone(),
        title: topic.title().to_string(),
        structure_class: topic.structure_class().cloned(),
        children: (!attached.is_empty()).then_some(ChildrenDoc { attached }),
        labels: topic.labels().to_vec(),
        notes: topic.notes().map(|content| NotesDoc {
            plain: PlainDoc {
                content: content.to_string(),
            },
        }),
        branch: topic.branch().as_str().to_string(),
        href: topic.href().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        read_workbook_with, write_archive, write_workbook, CodecError, CONTENT_JSON, CONTENT_XML,
    };
    use crate::model::id::SequentialIdAllocator;
    use crate::model::sheet::Sheet;
    use crate::model::workbook::Workbook;
    use serde_json::json;
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const XML_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xmap-content xmlns="urn:xmind:xmap:xmlns:content:2.0">
  <sheet id="s"><title>from xml</title>
    <topic id="c"><title>center</title>
      <children><topics type="attached">
        <topic id="a"><title>A</title></topic>
      </topics></children>
    </topic>
  </sheet>
</xmap-content>"#;

    fn read_bytes(bytes: &[u8]) -> Result<Workbook, CodecError> {
        read_workbook_with(bytes, Arc::new(SequentialIdAllocator::new(1)))
    }

    fn read(value: serde_json::Value) -> Result<Workbook, CodecError> {
        read_bytes(&serde_json::to_vec(&value).unwrap())
    }

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn json_document(title: &str) -> Vec<u8> {
        serde_json::to_vec(&json!([{
            "id": "s",
            "title": title,
            "rootTopic": {"title": "center"}
        }]))
        .unwrap()
    }

    fn first_sheet_title(workbook: &Workbook) -> &str {
        workbook.sheet(0).unwrap().title()
    }

    #[test]
    fn short_and_repeated_ids_are_replaced() {
        let workbook = read(json!([{
            "id": "s",
            "title": "one",
            "rootTopic": {
                "id": "c",
                "title": "center",
                "children": {"attached": [
                    {"id": "aaaaaaaaaaaaaaaaaaaaaaaaaa", "title": "A"},
                    {"id": "aaaaaaaaaaaaaaaaaaaaaaaaaa", "title": "B"}
                ]}
            }
        }]))
        .unwrap();

        let sheet = workbook.sheet(0).unwrap();
        assert_eq!(sheet.topic_count(), 3);
        let central = sheet.topic(sheet.central()).unwrap();
        assert!(central.id().is_ordinary());
        let titles = central
            .children()
            .iter()
            .map(|child| sheet.topic(*child).unwrap().title().to_string())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["A", "B"]);
        assert!(sheet.ids().all(|id| id.is_ordinary()));
    }

    #[test]
    fn sheets_without_central_topic_are_skipped() {
        let workbook = read(json!([
            {"id": "s1", "title": "empty"},
            {"id": "s2", "title": "full", "rootTopic": {"title": "center"}}
        ]))
        .unwrap();
        assert_eq!(workbook.len(), 1);
        assert_eq!(workbook.sheet(0).unwrap().title(), "full");
    }

    #[test]
    fn document_without_usable_sheets_is_rejected() {
        assert!(matches!(read(json!([])), Err(CodecError::Empty)));
        assert!(matches!(
            read(json!([{"id": "s", "title": "t"}])),
            Err(CodecError::Empty)
        ));
        assert!(matches!(
            read(json!({"id": "s"})),
            Err(CodecError::Unreadable)
        ));
        assert!(matches!(
            read_bytes(b"not a document"),
            Err(CodecError::Unreadable)
        ));
        assert!(matches!(read_bytes(b""), Err(CodecError::Unreadable)));
    }

    #[test]
    fn archived_json_is_preferred_over_archived_xml() {
        let json = json_document("from json");
        let bytes = archive(&[
            (CONTENT_XML, XML_DOCUMENT.as_bytes()),
            (CONTENT_JSON, json.as_slice()),
        ]);
        let workbook = read_bytes(&bytes).unwrap();
        assert_eq!(first_sheet_title(&workbook), "from json");
    }

    #[test]
    fn archived_xml_is_used_when_json_entry_is_missing_or_broken() {
        let only_xml = archive(&[(CONTENT_XML, XML_DOCUMENT.as_bytes())]);
        let workbook = read_bytes(&only_xml).unwrap();
        assert_eq!(first_sheet_title(&workbook), "from xml");
        let sheet = workbook.sheet(0).unwrap();
        assert_eq!(sheet.topic_count(), 2);

        let broken_json = archive(&[
            (CONTENT_JSON, b"{".as_slice()),
            (CONTENT_XML, XML_DOCUMENT.as_bytes()),
        ]);
        assert_eq!(first_sheet_title(&read_bytes(&broken_json).unwrap()), "from xml");
    }

    #[test]
    fn archive_without_content_entries_is_unreadable() {
        let bytes = archive(&[("meta.xml", b"<meta/>".as_slice())]);
        assert!(matches!(read_bytes(&bytes), Err(CodecError::Unreadable)));
    }

    #[test]
    fn bare_xml_is_the_last_fallback() {
        let workbook = read_bytes(XML_DOCUMENT.as_bytes()).unwrap();
        assert_eq!(first_sheet_title(&workbook), "from xml");
        let sheet = workbook.sheet(0).unwrap();
        let central = sheet.topic(sheet.central()).unwrap();
        assert_eq!(central.title(), "center");
        assert!(sheet.ids().all(|id| id.is_ordinary()));
    }

    #[test]
    fn written_archive_holds_json_entry_and_reads_back() {
        let mut sheet = Sheet::new("plan", "center");
        sheet.central_mut().add("A");
        let workbook = Workbook::from(vec![sheet]);

        let mut bytes = Cursor::new(Vec::new());
        write_archive(&mut bytes, &workbook).unwrap();
        let bytes = bytes.into_inner();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.len(), 1);
        assert!(archive.by_name(CONTENT_JSON).is_ok());

        let back = read_bytes(&bytes).unwrap();
        assert_eq!(first_sheet_title(&back), "plan");
        assert_eq!(back.sheet(0).unwrap().topic_count(), 2);
        assert!(matches!(
            write_archive(Cursor::new(Vec::new()), &Workbook::new()),
            Err(CodecError::Empty)
        ));
    }

    #[test]
    fn written_document_keeps_nesting_and_payload() {
        let mut sheet = Sheet::new("plan", "center");
        sheet
            .central_mut()
            .add("A")
            .on_title("A")
            .add_notes("note")
            .add_labels(["x"])
            .folded(false)
            .add("A1");

        let mut bytes = Vec::new();
        write_workbook(&mut bytes, &Workbook::from(vec![sheet])).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let root = &value[0]["rootTopic"];
        assert_eq!(root["title"], "center");
        assert_eq!(root["structureClass"], "org.xmind.ui.logic.right");
        let a = &root["children"]["attached"][0];
        assert_eq!(a["title"], "A");
        assert_eq!(a["notes"]["plain"]["content"], "note");
        assert_eq!(a["labels"], json!(["x"]));
        assert_eq!(a["branch"], "folded");
        assert_eq!(a["children"]["attached"][0]["title"], "A1");
        assert!(a["children"]["attached"][0].get("children").is_none());
    }
}
