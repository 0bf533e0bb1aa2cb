//! Topic editor: navigation and structural edits on one sheet.
//!
//! # Responsibility
//! - Provide the chainable edit handle (`TopicMut`) over a sheet.
//! - Implement insert (four placements), move, cascading remove and
//!   navigation while keeping tree shape, parent links and index in sync.
//!
//! # Invariants
//! - Fluent methods never fail: a refused edit is logged at `debug` and the
//!   handle comes back unchanged. `try_*` variants report the refusal.
//! - Move never makes a topic its own ancestor.
//! - After a successful remove, handle and cursor sit on the central topic.

use crate::model::id::{TopicId, TopicKey};
use crate::model::sheet::{Position, Sheet};
use crate::model::topic::{Branch, NodeIndex, ParentLink, StructureClass, Topic};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Placement of an inserted or moved topic relative to the current topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddMode {
    /// Append as last child of the current topic.
    #[default]
    Sub,
    /// Insert as sibling immediately before the current topic.
    Before,
    /// Insert as sibling immediately after the current topic.
    After,
    /// Insert a new parent between the current topic and its parent.
    /// Not valid for moves, which fall back to `Sub`.
    ParentInsert,
}

/// Reasons an edit was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Handle sits on the sheet wrapper, which has no insertable position.
    RootPosition,
    /// Handle names a topic that is no longer live.
    StalePosition,
    /// A reserved key was given where a real topic is required.
    SentinelTarget(TopicKey),
    /// Identifier is not present in the sheet index.
    TopicNotFound(TopicId),
    /// The central topic cannot be moved, removed or given siblings.
    CentralTopic,
    /// Move target is the current topic or one of its ancestors.
    CycleDetected { target: TopicId, anchor: TopicId },
    /// Topic is not listed under its recorded parent.
    Detached(TopicId),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootPosition => write!(f, "sheet root has no insertable position"),
            Self::StalePosition => write!(f, "edit handle points at a removed topic"),
            Self::SentinelTarget(key) => write!(f, "reserved key {key:?} cannot be edited"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::CentralTopic => write!(f, "central topic has no parent topic"),
            Self::CycleDetected { target, anchor } => write!(
                f,
                "move would create cycle: topic {target} under its descendant {anchor}"
            ),
            Self::Detached(id) => write!(f, "topic {id} is missing from its parent's children"),
        }
    }
}

impl Error for EditError {}

/// Outcome of a successful insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// The newly created topic (the wrapper for `ParentInsert`).
    pub created: NodeIndex,
    /// The topic the handle still points at.
    pub current: NodeIndex,
}

/// Chainable edit handle: one sheet plus the position being edited.
pub struct TopicMut<'s> {
    sheet: &'s mut Sheet,
    at: Position,
}

impl Sheet {
    /// Returns an edit handle on the central topic.
    pub fn central_mut(&mut self) -> TopicMut<'_> {
        let central = self.central;
        TopicMut {
            sheet: self,
            at: Position::Topic(central),
        }
    }

    /// Navigates to `key` (see [`TopicMut::on`]) and returns the handle.
    pub fn edit(&mut self, key: impl Into<TopicKey>) -> TopicMut<'_> {
        self.central_mut().on(key)
    }

    /// Returns a handle on `index`, or on the cursor when `index` is stale.
    pub fn edit_index(&mut self, index: NodeIndex) -> TopicMut<'_> {
        let at = if self.topic(index).is_some() {
            self.set_cursor(index);
            index
        } else {
            self.cursor
        };
        TopicMut {
            sheet: self,
            at: Position::Topic(at),
        }
    }
}

impl<'s> TopicMut<'s> {
    pub fn position(&self) -> Position {
        self.at
    }

    pub fn index(&self) -> Option<NodeIndex> {
        match self.at {
            Position::Topic(index) => Some(index),
            Position::Root => None,
        }
    }

    /// Topic under the handle; `None` at the sheet root.
    pub fn topic(&self) -> Option<&Topic> {
        self.index().and_then(|index| self.sheet.topic(index))
    }

    pub fn id(&self) -> Option<&TopicId> {
        self.topic().map(Topic::id)
    }

    pub fn title(&self) -> Option<&str> {
        self.topic().map(Topic::title)
    }

    pub fn is_central(&self) -> bool {
        self.at == Position::Topic(self.sheet.central)
    }

    pub fn is_root(&self) -> bool {
        self.at == Position::Root
    }

    pub fn sheet(&self) -> &Sheet {
        &*self.sheet
    }

    /// Switches to `key` and records it as the cursor.
    ///
    /// Unknown identifiers fall back to the current cursor topic.
    pub fn on(mut self, key: impl Into<TopicKey>) -> Self {
        let key = key.into();
        match self.sheet.resolve(&key) {
            Some(Position::Topic(index)) => {
                self.sheet.set_cursor(index);
                self.at = Position::Topic(index);
            }
            Some(Position::Root) => self.at = Position::Root,
            None => {
                debug!("event=navigate_fallback module=editor key={key:?}");
                self.at = Position::Topic(self.sheet.cursor);
            }
        }
        self
    }

    pub fn on_central(self) -> Self {
        self.on(TopicKey::Central)
    }

    /// Switches to the first topic titled `title` (see [`TopicMut::cid`]).
    pub fn on_title(self, title: &str) -> Self {
        let key = self.cid(title);
        self.on(key)
    }

    /// Moves the handle to the parent topic.
    ///
    /// Returns `None` at the central topic and at the sheet root.
    pub fn parent(self) -> Option<Self> {
        let parent = self.sheet.parent_of(self.index()?)?;
        Some(Self {
            sheet: self.sheet,
            at: Position::Topic(parent),
        })
    }

    /// Parent of the topic named by `key`; `None` for central or unknown keys.
    pub fn parent_of(&self, key: impl Into<TopicKey>) -> Option<NodeIndex> {
        match self.sheet.resolve(&key.into())? {
            Position::Topic(index) => self.sheet.parent_of(index),
            Position::Root => None,
        }
    }

    /// Appends a child titled `title`. An empty title becomes `"Topic {n}"`.
    pub fn add(self, title: &str) -> Self {
        self.add_with(title, AddMode::Sub)
    }

    pub fn add_with(mut self, title: &str, mode: AddMode) -> Self {
        if let Err(err) = self.try_add(title, mode) {
            debug!("event=edit_refused module=editor op=add reason=\"{err}\"");
        }
        self
    }

    /// Inserts a topic and reports where it went.
    ///
    /// At the central topic every mode acts as `Sub`. With `ParentInsert` a
    /// new topic takes the current topic's place under its parent and adopts
    /// the current topic as its only child. The current topic keeps its
    /// identifier, title, payload and children; the handle and the cursor stay
    /// on it.
    pub fn try_add(&mut self, title: &str, mode: AddMode) -> Result<Inserted, EditError> {
        let current = self.require_topic()?;
        let mode = if current == self.sheet.central {
            AddMode::Sub
        } else {
            mode
        };

        let created = match mode {
            AddMode::Sub => {
                let created = self.create_topic(title, current);
                self.link_child(current, created, None);
                created
            }
            AddMode::Before | AddMode::After => {
                let (parent, position) = self.sibling_slot(current)?;
                let created = self.create_topic(title, parent);
                let at = if mode == AddMode::After {
                    position + 1
                } else {
                    position
                };
                self.link_child(parent, created, Some(at));
                created
            }
            AddMode::ParentInsert => {
                let (parent, position) = self.sibling_slot(current)?;
                let created = self.create_topic(title, parent);
                if let Some(parent_topic) = self.sheet.topic_mut(parent) {
                    parent_topic.children[position] = created;
                }
                self.link_child(created, current, None);
                if let Some(topic) = self.sheet.topic_mut(current) {
                    topic.parent = ParentLink::Topic(created);
                }
                self.sheet.set_cursor(current);
                created
            }
        };

        Ok(Inserted { created, current })
    }

    /// Moves the topic `target` to the last child slot of the current topic.
    pub fn move_topic(self, target: impl Into<TopicKey>) -> Self {
        self.move_with(target, AddMode::Sub)
    }

    pub fn move_with(mut self, target: impl Into<TopicKey>, mode: AddMode) -> Self {
        if let Err(err) = self.try_move(target, mode) {
            debug!("event=edit_refused module=editor op=move reason=\"{err}\"");
        }
        self
    }

    /// Moves `target` with its subtree next to or under the current topic.
    ///
    /// `ParentInsert` is treated as `Sub`. Identifier and subtree of the
    /// moved topic are unchanged; the cursor is not touched.
    pub fn try_move(
        &mut self,
        target: impl Into<TopicKey>,
        mode: AddMode,
    ) -> Result<(), EditError> {
        let current = self.require_topic()?;
        let target = match target.into() {
            TopicKey::Ordinary(id) => id,
            other => return Err(EditError::SentinelTarget(other)),
        };
        let source = self
            .sheet
            .index_of(&target)
            .ok_or_else(|| EditError::TopicNotFound(target.clone()))?;

        if source == current || self.sheet.is_ancestor(source, current) {
            let anchor = self
                .sheet
                .topic(current)
                .map(|topic| topic.id.clone())
                .ok_or(EditError::StalePosition)?;
            return Err(EditError::CycleDetected { target, anchor });
        }

        let old_parent = self
            .sheet
            .parent_of(source)
            .ok_or(EditError::CentralTopic)?;
        let old_position = self
            .sheet
            .child_position(old_parent, source)
            .ok_or_else(|| EditError::Detached(target.clone()))?;

        let mode = match mode {
            _ if current == self.sheet.central => AddMode::Sub,
            AddMode::ParentInsert => AddMode::Sub,
            other => other,
        };
        let (new_parent, insert_at) = match mode {
            AddMode::Before | AddMode::After => {
                let (anchor_parent, anchor_position) = self.sibling_slot(current)?;
                let shifted = anchor_parent == old_parent && old_position < anchor_position;
                let anchor_position = if shifted {
                    anchor_position - 1
                } else {
                    anchor_position
                };
                let at = if mode == AddMode::After {
                    anchor_position + 1
                } else {
                    anchor_position
                };
                (anchor_parent, Some(at))
            }
            _ => (current, None),
        };

        if let Some(parent_topic) = self.sheet.topic_mut(old_parent) {
            parent_topic.children.remove(old_position);
        }
        self.link_child(new_parent, source, insert_at);
        if let Some(topic) = self.sheet.topic_mut(source) {
            topic.parent = ParentLink::Topic(new_parent);
        }
        Ok(())
    }

    /// Removes the first topic titled `title` together with its subtree.
    pub fn remove(self, title: &str) -> Self {
        let key = self.cid(title);
        self.remove_by_id(key)
    }

    pub fn remove_by_id(mut self, target: impl Into<TopicKey>) -> Self {
        if let Err(err) = self.try_remove_by_id(target) {
            debug!("event=edit_refused module=editor op=remove reason=\"{err}\"");
        }
        self
    }

    /// Removes `target` and every descendant from tree and index.
    ///
    /// Returns the number of index entries dropped. On success the handle
    /// and the cursor move to the central topic.
    pub fn try_remove_by_id(&mut self, target: impl Into<TopicKey>) -> Result<usize, EditError> {
        let target = match target.into() {
            TopicKey::Ordinary(id) => id,
            other => return Err(EditError::SentinelTarget(other)),
        };
        let index = self
            .sheet
            .index_of(&target)
            .ok_or_else(|| EditError::TopicNotFound(target.clone()))?;
        let parent = self
            .sheet
            .parent_of(index)
            .ok_or(EditError::CentralTopic)?;
        let position = self
            .sheet
            .child_position(parent, index)
            .ok_or_else(|| EditError::Detached(target.clone()))?;

        if let Some(parent_topic) = self.sheet.topic_mut(parent) {
            parent_topic.children.remove(position);
        }
        let purged = self.sheet.purge_subtree(index);

        let central = self.sheet.central;
        self.sheet.set_cursor(central);
        self.at = Position::Topic(central);
        debug!("event=topic_removed module=editor id={target} purged={purged}");
        Ok(purged)
    }

    pub fn set_title(self, title: &str) -> Self {
        let title = title.to_string();
        self.with_current(|topic| topic.title = title)
    }

    /// Replaces the labels. An empty list leaves existing labels in place.
    pub fn add_labels<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(Into::into).collect::<Vec<_>>();
        if labels.is_empty() {
            return self;
        }
        self.with_current(|topic| topic.labels = labels)
    }

    /// Sets plain-text notes. Empty text is ignored.
    pub fn add_notes(self, notes: &str) -> Self {
        if notes.is_empty() {
            return self;
        }
        let notes = notes.to_string();
        self.with_current(|topic| topic.notes = Some(notes))
    }

    /// Sets the hyperlink (web URL, `file:` path or `xmind:#<id>`).
    /// Empty text is ignored.
    pub fn add_href(self, href: &str) -> Self {
        if href.is_empty() {
            return self;
        }
        let href = href.to_string();
        self.with_current(|topic| topic.href = Some(href))
    }

    /// Folds the current topic, or its whole subtree when `all` is set.
    pub fn folded(self, all: bool) -> Self {
        self.set_branch(Branch::Folded, all)
    }

    /// Expands the current topic, or its whole subtree when `all` is set.
    pub fn unfolded(self, all: bool) -> Self {
        self.set_branch(Branch::Expanded, all)
    }

    /// See [`Sheet::update_sheet`]; usable from any handle of the sheet.
    pub fn update_sheet(
        self,
        sheet_title: &str,
        central_title: &str,
        structure_class: Option<StructureClass>,
    ) -> Self {
        self.sheet
            .update_sheet(sheet_title, central_title, structure_class);
        self
    }

    fn require_topic(&self) -> Result<NodeIndex, EditError> {
        match self.at {
            Position::Root => Err(EditError::RootPosition),
            Position::Topic(index) if self.sheet.topic(index).is_some() => Ok(index),
            Position::Topic(_) => Err(EditError::StalePosition),
        }
    }

    /// Parent of `current` and its position among the parent's children.
    fn sibling_slot(&self, current: NodeIndex) -> Result<(NodeIndex, usize), EditError> {
        let topic = self
            .sheet
            .topic(current)
            .ok_or(EditError::StalePosition)?;
        let ParentLink::Topic(parent) = topic.parent else {
            return Err(EditError::CentralTopic);
        };
        let position = self
            .sheet
            .child_position(parent, current)
            .ok_or_else(|| EditError::Detached(topic.id.clone()))?;
        Ok((parent, position))
    }

    fn create_topic(&mut self, title: &str, parent: NodeIndex) -> NodeIndex {
        let title = if title.is_empty() {
            self.sheet.next_auto_title()
        } else {
            title.to_string()
        };
        let id = self.sheet.allocate_id();
        self.sheet
            .insert_topic(id, title, ParentLink::Topic(parent))
    }

    fn link_child(&mut self, parent: NodeIndex, child: NodeIndex, at: Option<usize>) {
        if let Some(parent_topic) = self.sheet.topic_mut(parent) {
            match at {
                Some(position) if position < parent_topic.children.len() => {
                    parent_topic.children.insert(position, child)
                }
                _ => parent_topic.children.push(child),
            }
        }
    }

    fn with_current(self, apply: impl FnOnce(&mut Topic)) -> Self {
        if let Some(index) = self.index() {
            if let Some(topic) = self.sheet.topic_mut(index) {
                apply(topic);
            }
        }
        self
    }

    fn set_branch(self, branch: Branch, all: bool) -> Self {
        let Some(index) = self.index() else {
            return self;
        };
        let mut pending = vec![index];
        while let Some(next) = pending.pop() {
            let Some(topic) = self.sheet.topic_mut(next) else {
                continue;
            };
            topic.branch = branch;
            if all {
                pending.extend(topic.children.iter().copied());
            }
        }
        self
    }
}
