//! Topic node model.
//!
//! # Responsibility
//! - Define the payload of one mind-map topic and its structural links.
//!
//! # Invariants
//! - `children` order is the display order of siblings.
//! - `parent` is `ParentLink::Sheet` only for the central topic.
//! - `structure_class` is meaningful only on the central topic.

use crate::model::id::TopicId;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// Generational handle of a topic inside its sheet's arena.
///
/// A handle outlives the topic it names only as a stale value: lookups with a
/// stale handle return `None` instead of reaching a recycled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

/// Back-reference from a topic to whatever owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    /// Owned by the sheet wrapper (central topic).
    Sheet,
    /// Owned by another topic's child list.
    Topic(NodeIndex),
}

/// Fold state of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Branch {
    #[default]
    Expanded,
    Folded,
}

impl Branch {
    const FOLDED: &'static str = "folded";

    /// Wire form: `"folded"` or the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expanded => "",
            Self::Folded => Self::FOLDED,
        }
    }

    /// Parses the wire form. Anything but `"folded"` means expanded.
    pub fn parse(value: &str) -> Self {
        if value == Self::FOLDED {
            Self::Folded
        } else {
            Self::Expanded
        }
    }
}

/// Layout-style annotation of a central topic, consumed by renderers only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureClass(Cow<'static, str>);

impl StructureClass {
    pub const MAP_UNBALANCED: Self = Self::named("org.xmind.ui.map.unbalanced");
    pub const MAP: Self = Self::named("org.xmind.ui.map");
    pub const MAP_CLOCKWISE: Self = Self::named("org.xmind.ui.map.clockwise");
    pub const MAP_ANTICLOCKWISE: Self = Self::named("org.xmind.ui.map.anticlockwise");
    pub const ORG_CHART_DOWN: Self = Self::named("org.xmind.ui.org-chart.down");
    pub const ORG_CHART_UP: Self = Self::named("org.xmind.ui.org-chart.up");
    pub const TREE_RIGHT: Self = Self::named("org.xmind.ui.tree.right");
    pub const TREE_LEFT: Self = Self::named("org.xmind.ui.tree.left");
    pub const LOGIC_RIGHT: Self = Self::named("org.xmind.ui.logic.right");
    pub const LOGIC_LEFT: Self = Self::named("org.xmind.ui.logic.left");
    pub const TIMELINE_HORIZONTAL: Self = Self::named("org.xmind.ui.timeline.horizontal");
    pub const TIMELINE_VERTICAL: Self = Self::named("org.xmind.ui.timeline.vertical");
    pub const FISHBONE_LEFT_HEADED: Self = Self::named("org.xmind.ui.fishbone.leftHeaded");
    pub const FISHBONE_RIGHT_HEADED: Self = Self::named("org.xmind.ui.fishbone.rightHeaded");
    pub const SPREADSHEET: Self = Self::named("org.xmind.ui.spreadsheet");
    pub const SPREADSHEET_COLUMN: Self = Self::named("org.xmind.ui.spreadsheet.column");

    const fn named(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Wraps an arbitrary class string, e.g. one read from a file.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StructureClass {
    fn default() -> Self {
        Self::LOGIC_RIGHT
    }
}

impl Display for StructureClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One mind-map topic.
///
/// Fields are read through accessors; structural links are maintained by the
/// owning [`Sheet`](crate::model::sheet::Sheet) and its editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub(crate) id: TopicId,
    pub(crate) title: String,
    pub(crate) labels: Vec<String>,
    pub(crate) notes: Option<String>,
    pub(crate) href: Option<String>,
    pub(crate) branch: Branch,
    pub(crate) structure_class: Option<StructureClass>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) parent: ParentLink,
}

impl Topic {
    pub(crate) fn new(id: TopicId, title: String, parent: ParentLink) -> Self {
        Self {
            id,
            title,
            labels: Vec::new(),
            notes: None,
            href: None,
            branch: Branch::Expanded,
            structure_class: None,
            children: Vec::new(),
            parent,
        }
    }

    pub fn id(&self) -> &TopicId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn is_folded(&self) -> bool {
        self.branch == Branch::Folded
    }

    /// Set only on the central topic.
    pub fn structure_class(&self) -> Option<&StructureClass> {
        self.structure_class.as_ref()
    }

    /// Child handles in display order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn parent(&self) -> ParentLink {
        self.parent
    }
}
