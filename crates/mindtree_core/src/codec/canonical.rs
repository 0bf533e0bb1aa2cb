//! Serde shapes of the canonical JSON document: an array of sheets, each
//! wrapping one recursively nested topic.

use crate::model::id::TopicId;
use crate::model::topic::StructureClass;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDoc {
    #[serde(default)]
    pub id: TopicId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_topic: Option<TopicDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDoc {
    #[serde(default)]
    pub id: TopicId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_class: Option<StructureClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<ChildrenDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NotesDoc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub href: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildrenDoc {
    #[serde(default)]
    pub attached: Vec<TopicDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesDoc {
    #[serde(default)]
    pub plain: PlainDoc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlainDoc {
    #[serde(default)]
    pub content: String,
}

impl TopicDoc {
    pub fn notes_text(&self) -> &str {
        self.notes
            .as_ref()
            .map(|notes| notes.plain.content.as_str())
            .unwrap_or_default()
    }

    /// Takes the attached children, leaving none behind.
    pub fn take_children(&mut self) -> Vec<TopicDoc> {
        self.children
            .take()
            .map(|children| children.attached)
            .unwrap_or_default()
    }
}
