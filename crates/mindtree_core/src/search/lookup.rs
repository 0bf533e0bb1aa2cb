//! Title lookup and depth-first traversal.
//!
//! # Responsibility
//! - Walk a topic tree in pre-order (children before later siblings).
//! - Resolve titles to identifiers, searching the current subtree first and
//!   the whole sheet second.
//!
//! # Invariants
//! - Depth starts at 1 for the walk's starting topic.
//! - Duplicate titles resolve to the first pre-order match. Which topic that
//!   is depends on sibling order, so callers relying on unique titles must
//!   keep titles unique themselves.

use crate::model::id::{TopicId, TopicKey};
use crate::model::sheet::{Position, Sheet};
use crate::model::topic::{NodeIndex, Topic};
use crate::service::editor::TopicMut;
use std::convert::Infallible;

impl Sheet {
    /// Walks every topic from the central topic down.
    ///
    /// The first `Err` returned by `visit` stops the walk and is returned.
    pub fn range<E, F>(&self, visit: F) -> Result<(), E>
    where
        F: FnMut(usize, &Topic) -> Result<(), E>,
    {
        self.range_from(self.central, visit)
    }

    /// Walks the subtree rooted at `start`. A stale `start` visits nothing.
    pub fn range_from<E, F>(&self, start: NodeIndex, mut visit: F) -> Result<(), E>
    where
        F: FnMut(usize, &Topic) -> Result<(), E>,
    {
        let mut pending = vec![(1_usize, start)];
        while let Some((depth, index)) = pending.pop() {
            let Some(topic) = self.topic(index) else {
                continue;
            };
            visit(depth, topic)?;
            pending.extend(topic.children.iter().rev().map(|child| (depth + 1, *child)));
        }
        Ok(())
    }

    /// First topic titled `title`, searched under `start` then under the
    /// central topic.
    ///
    /// An empty title yields `TopicKey::Central`; no match yields
    /// `TopicKey::Cursor`.
    pub fn cid_from(&self, start: Position, title: &str) -> TopicKey {
        if title.is_empty() {
            return TopicKey::Central;
        }
        self.search_scopes(start)
            .into_iter()
            .find_map(|scope| self.first_match(scope, title))
            .map(TopicKey::Ordinary)
            .unwrap_or(TopicKey::Cursor)
    }

    /// All topics titled `title`, from the first scope that has any.
    ///
    /// Fallbacks match [`Sheet::cid_from`], each as a one-element list.
    pub fn cids_from(&self, start: Position, title: &str) -> Vec<TopicKey> {
        if title.is_empty() {
            return vec![TopicKey::Central];
        }
        for scope in self.search_scopes(start) {
            let mut matches = Vec::new();
            let _ = self.range_from(scope, |_, topic| {
                if topic.title == title {
                    matches.push(TopicKey::Ordinary(topic.id.clone()));
                }
                Ok::<(), Infallible>(())
            });
            if !matches.is_empty() {
                return matches;
            }
        }
        vec![TopicKey::Cursor]
    }

    fn search_scopes(&self, start: Position) -> Vec<NodeIndex> {
        match start {
            Position::Topic(index) if index != self.central => vec![index, self.central],
            _ => vec![self.central],
        }
    }

    fn first_match(&self, scope: NodeIndex, title: &str) -> Option<TopicId> {
        let found = self.range_from(scope, |_, topic| {
            if topic.title == title {
                Err(topic.id.clone())
            } else {
                Ok(())
            }
        });
        found.err()
    }
}

impl TopicMut<'_> {
    /// First topic titled `title`, preferring the subtree of this handle.
    pub fn cid(&self, title: &str) -> TopicKey {
        self.sheet().cid_from(self.position(), title)
    }

    /// Every topic titled `title`, preferring the subtree of this handle.
    pub fn cids(&self, title: &str) -> Vec<TopicKey> {
        self.sheet().cids_from(self.position(), title)
    }

    /// Walks the subtree of this handle (the whole tree from the root).
    pub fn range<E, F>(&self, visit: F) -> Result<(), E>
    where
        F: FnMut(usize, &Topic) -> Result<(), E>,
    {
        let start = self.index().unwrap_or(self.sheet().central());
        self.sheet().range_from(start, visit)
    }
}
