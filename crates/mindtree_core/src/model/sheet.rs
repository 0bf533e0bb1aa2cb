//! Sheet arena and resource index.
//!
//! # Responsibility
//! - Own every topic of one mind-map canvas in a generational arena.
//! - Keep the identifier index, the central topic and the navigation cursor.
//!
//! # Invariants
//! - Every live topic has exactly one entry in `index`; removed topics have
//!   none, and their arena slots reject stale handles.
//! - `central` and `cursor` always name live topics.
//! - A sheet is created together with its central topic and never loses it.

use crate::model::id::{IdAllocator, RandomIdAllocator, TopicId, TopicKey};
use crate::model::topic::{NodeIndex, ParentLink, StructureClass, Topic};
use std::collections::HashMap;
use std::sync::Arc;

/// Sheet title used when a sheet is built from flat records.
pub const DEFAULT_SHEET_TITLE: &str = "sheet";

/// Resolved target of a [`TopicKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The sheet wrapper.
    Root,
    /// A live topic.
    Topic(NodeIndex),
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    topic: Option<Topic>,
}

/// One mind-map canvas: a title plus exactly one topic tree.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub(crate) id: TopicId,
    pub(crate) title: String,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    index: HashMap<TopicId, NodeIndex>,
    pub(crate) central: NodeIndex,
    pub(crate) cursor: NodeIndex,
    auto_title_counter: u64,
    allocator: Arc<dyn IdAllocator>,
}

impl Sheet {
    /// Creates a sheet whose central topic uses the default layout class.
    pub fn new(sheet_title: impl Into<String>, central_title: impl Into<String>) -> Self {
        Self::with_structure(sheet_title, central_title, StructureClass::default())
    }

    /// Creates a sheet with an explicit central-topic layout class.
    pub fn with_structure(
        sheet_title: impl Into<String>,
        central_title: impl Into<String>,
        structure_class: StructureClass,
    ) -> Self {
        Self::with_allocator(
            sheet_title,
            central_title,
            structure_class,
            Arc::new(RandomIdAllocator),
        )
    }

    /// Creates a sheet drawing every identifier from `allocator`.
    pub fn with_allocator(
        sheet_title: impl Into<String>,
        central_title: impl Into<String>,
        structure_class: StructureClass,
        allocator: Arc<dyn IdAllocator>,
    ) -> Self {
        let sheet_id = allocator.next_id();
        let central_id = allocator.next_id();
        Self::assemble(
            sheet_id,
            sheet_title.into(),
            central_id,
            central_title.into(),
            structure_class,
            allocator,
        )
    }

    pub(crate) fn assemble(
        sheet_id: TopicId,
        sheet_title: String,
        central_id: TopicId,
        central_title: String,
        structure_class: StructureClass,
        allocator: Arc<dyn IdAllocator>,
    ) -> Self {
        let central = NodeIndex {
            slot: 0,
            generation: 0,
        };
        let mut topic = Topic::new(central_id.clone(), central_title, ParentLink::Sheet);
        topic.structure_class = Some(structure_class);

        let mut index = HashMap::new();
        index.insert(central_id, central);

        Self {
            id: sheet_id,
            title: sheet_title,
            slots: vec![Slot {
                generation: 0,
                topic: Some(topic),
            }],
            free_slots: Vec::new(),
            index,
            central,
            cursor: central,
            auto_title_counter: 0,
            allocator,
        }
    }

    /// Identifier of the sheet wrapper (never a topic id).
    pub fn id(&self) -> &TopicId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Handle of the central topic.
    pub fn central(&self) -> NodeIndex {
        self.central
    }

    /// Handle of the last-touched topic.
    pub fn cursor(&self) -> NodeIndex {
        self.cursor
    }

    /// Layout class of the central topic.
    pub fn structure_class(&self) -> Option<&StructureClass> {
        self.topic(self.central)
            .and_then(|topic| topic.structure_class.as_ref())
    }

    /// Number of live topics, central topic included.
    pub fn topic_count(&self) -> usize {
        self.index.len()
    }

    pub fn topic(&self, index: NodeIndex) -> Option<&Topic> {
        self.slots
            .get(index.slot as usize)
            .filter(|slot| slot.generation == index.generation)
            .and_then(|slot| slot.topic.as_ref())
    }

    pub fn topic_by_id(&self, id: &TopicId) -> Option<&Topic> {
        self.index_of(id).and_then(|index| self.topic(index))
    }

    pub fn index_of(&self, id: &TopicId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.index.contains_key(id)
    }

    /// Identifiers of every live topic, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &TopicId> {
        self.index.keys()
    }

    /// Resolves a key to a position; `None` for unknown identifiers.
    pub fn resolve(&self, key: &TopicKey) -> Option<Position> {
        match key {
            TopicKey::Root => Some(Position::Root),
            TopicKey::Central => Some(Position::Topic(self.central)),
            TopicKey::Cursor => Some(Position::Topic(self.cursor)),
            TopicKey::Ordinary(id) => self.index_of(id).map(Position::Topic),
        }
    }

    /// Parent topic of `index`; `None` for the central topic and stale handles.
    pub fn parent_of(&self, index: NodeIndex) -> Option<NodeIndex> {
        match self.topic(index)?.parent {
            ParentLink::Topic(parent) => Some(parent),
            ParentLink::Sheet => None,
        }
    }

    /// Returns whether `ancestor` lies on the parent chain of `index`.
    pub fn is_ancestor(&self, ancestor: NodeIndex, index: NodeIndex) -> bool {
        let mut remaining = self.index.len();
        let mut current = self.parent_of(index);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if remaining == 0 {
                return false;
            }
            remaining -= 1;
            current = self.parent_of(parent);
        }
        false
    }

    /// Updates sheet title, central title and layout class.
    ///
    /// Empty titles and `None` leave the current value untouched.
    pub fn update_sheet(
        &mut self,
        sheet_title: &str,
        central_title: &str,
        structure_class: Option<StructureClass>,
    ) {
        if !sheet_title.is_empty() {
            self.title = sheet_title.to_string();
        }
        let central = self.central;
        if let Some(topic) = self.topic_mut(central) {
            if !central_title.is_empty() {
                topic.title = central_title.to_string();
            }
            if let Some(structure_class) = structure_class {
                topic.structure_class = Some(structure_class);
            }
        }
    }

    pub(crate) fn topic_mut(&mut self, index: NodeIndex) -> Option<&mut Topic> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|slot| slot.generation == index.generation)
            .and_then(|slot| slot.topic.as_mut())
    }

    pub(crate) fn set_cursor(&mut self, index: NodeIndex) {
        if self.topic(index).is_some() {
            self.cursor = index;
        }
    }

    /// Draws identifiers until one is unused in this sheet.
    pub(crate) fn allocate_id(&self) -> TopicId {
        loop {
            let id = self.allocator.next_id();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    pub(crate) fn allocator(&self) -> Arc<dyn IdAllocator> {
        Arc::clone(&self.allocator)
    }

    /// Produces `"Topic {n}"` from the sheet-private counter.
    pub(crate) fn next_auto_title(&mut self) -> String {
        self.auto_title_counter += 1;
        format!("Topic {}", self.auto_title_counter)
    }

    /// Stores a detached topic and registers it in the index.
    ///
    /// The caller links it into its parent's child list.
    pub(crate) fn insert_topic(
        &mut self,
        id: TopicId,
        title: String,
        parent: ParentLink,
    ) -> NodeIndex {
        let topic = Topic::new(id.clone(), title, parent);
        let index = match self.free_slots.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.topic = Some(topic);
                NodeIndex {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    topic: Some(topic),
                });
                NodeIndex {
                    slot,
                    generation: 0,
                }
            }
        };
        self.index.insert(id, index);
        index
    }

    /// Position of `child` in the child list of `parent`.
    pub(crate) fn child_position(&self, parent: NodeIndex, child: NodeIndex) -> Option<usize> {
        self.topic(parent)?
            .children
            .iter()
            .position(|candidate| *candidate == child)
    }

    /// Drops `root` and all of its descendants from arena and index.
    ///
    /// Returns the number of index entries removed. The caller unlinks `root`
    /// from its parent beforehand.
    pub(crate) fn purge_subtree(&mut self, root: NodeIndex) -> usize {
        let mut purged = 0;
        let mut pending = vec![root];
        while let Some(index) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(index.slot as usize)
                .filter(|slot| slot.generation == index.generation)
            else {
                continue;
            };
            let Some(topic) = slot.topic.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free_slots.push(index.slot);
            if self.index.remove(&topic.id).is_some() {
                purged += 1;
            }
            pending.extend(topic.children);
        }
        purged
    }
}
