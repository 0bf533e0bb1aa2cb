//! XML dialect of the canonical document.
//!
//! # Responsibility
//! - Decode `xmap-content > sheet > topic` documents into the same sheet
//!   shapes the JSON dialect produces.
//!
//! # Invariants
//! - Only `topics` groups typed `attached` (or untyped) contribute children.
//! - Element and attribute names are matched by local name, so prefixed
//!   attributes such as `xlink:href` resolve to `href`.

use crate::codec::canonical::{ChildrenDoc, NotesDoc, PlainDoc, SheetDoc, TopicDoc};
use crate::model::topic::StructureClass;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ROOT_ELEMENT: &str = "xmap-content";
const ATTACHED: &str = "attached";

#[derive(Debug)]
pub enum XmlError {
    Encoding(std::str::Utf8Error),
    Syntax(quick_xml::Error),
    Attribute(AttrError),
    /// The input ends before the root element closes, or has none.
    Truncated,
    /// The root element is not `xmap-content`.
    UnexpectedRoot(String),
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(err) => write!(f, "document is not UTF-8: {err}"),
            Self::Syntax(err) => write!(f, "malformed XML: {err}"),
            Self::Attribute(err) => write!(f, "malformed XML attribute: {err}"),
            Self::Truncated => write!(f, "XML document has no complete root element"),
            Self::UnexpectedRoot(name) => {
                write!(f, "root element is `{name}`, expected `{ROOT_ELEMENT}`")
            }
        }
    }
}

impl Error for XmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            Self::Syntax(err) => Some(err),
            Self::Attribute(err) => Some(err),
            Self::Truncated | Self::UnexpectedRoot(_) => None,
        }
    }
}

impl From<quick_xml::Error> for XmlError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Syntax(value)
    }
}

impl From<AttrError> for XmlError {
    fn from(value: AttrError) -> Self {
        Self::Attribute(value)
    }
}

/// Decodes the sheets of an XML canonical document.
pub fn parse_sheets(bytes: &[u8]) -> Result<Vec<SheetDoc>, XmlError> {
    let text = std::str::from_utf8(bytes).map_err(XmlError::Encoding)?;
    let root = parse_tree(text)?;
    if root.name != ROOT_ELEMENT {
        return Err(XmlError::UnexpectedRoot(root.name));
    }
    Ok(root
        .children
        .into_iter()
        .filter(|child| child.name == "sheet")
        .map(sheet_doc)
        .collect())
}

/// Owned element tree; text of mixed content is concatenated.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn take_child(&mut self, name: &str) -> Option<Element> {
        let position = self.children.iter().position(|child| child.name == name)?;
        Some(self.children.remove(position))
    }
}

fn parse_tree(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut open: Vec<Element> = Vec::new();

    loop {
        let closed = match reader.read_event()? {
            Event::Start(start) => {
                open.push(Element::open(&start)?);
                continue;
            }
            Event::Empty(start) => Element::open(&start)?,
            Event::End(_) => open.pop().ok_or(XmlError::Truncated)?,
            Event::Text(content) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&content.unescape()?);
                }
                continue;
            }
            Event::CData(content) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&content));
                }
                continue;
            }
            Event::Eof => return Err(XmlError::Truncated),
            _ => continue,
        };
        match open.last_mut() {
            Some(parent) => parent.children.push(closed),
            None => return Ok(closed),
        }
    }
}

fn sheet_doc(mut sheet: Element) -> SheetDoc {
    SheetDoc {
        id: sheet.attribute("id").unwrap_or_default().into(),
        title: sheet
            .take_child("title")
            .map(|title| title.text)
            .unwrap_or_default(),
        root_topic: sheet.take_child("topic").map(topic_doc),
    }
}

fn topic_doc(mut topic: Element) -> TopicDoc {
    let attached = topic
        .take_child("children")
        .map(|children| {
            children
                .children
                .into_iter()
                .filter(|group| {
                    group.name == "topics"
                        && group.attribute("type").map_or(true, |kind| kind == ATTACHED)
                })
                .flat_map(|group| group.children)
                .filter(|child| child.name == "topic")
                .map(topic_doc)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let labels = topic
        .take_child("labels")
        .map(|labels| {
            labels
                .children
                .into_iter()
                .filter(|label| label.name == "label")
                .map(|label| label.text)
                .collect()
        })
        .unwrap_or_default();
    let notes = topic
        .take_child("notes")
        .and_then(|mut notes| notes.take_child("plain"))
        .map(|mut plain| {
            let content = match plain.take_child("content") {
                Some(content) => content.text,
                None => plain.text,
            };
            NotesDoc {
                plain: PlainDoc { content },
            }
        });

    TopicDoc {
        id: topic.attribute("id").unwrap_or_default().into(),
        title: topic
            .take_child("title")
            .map(|title| title.text)
            .unwrap_or_default(),
        structure_class: topic
            .attribute("structure-class")
            .filter(|class| !class.is_empty())
            .map(|class| StructureClass::new(class.to_string())),
        children: (!attached.is_empty()).then_some(ChildrenDoc { attached }),
        labels,
        notes,
        branch: topic.attribute("branch").unwrap_or_default().to_string(),
        href: topic.attribute("href").unwrap_or_default().to_string(),
    }
}
