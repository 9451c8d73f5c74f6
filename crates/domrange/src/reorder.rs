//! Reordering members and resolving where content goes
//!
//! Every physical placement asks [`Document::insertion_point`] for the node
//! to insert before. The answer always comes from the live tree: external
//! code may have shuffled nodes since the last operation, so a position
//! remembered from earlier means nothing.

use dom::NodeId;

use crate::document::Document;
use crate::error::{DomRangeError, Result};
use crate::range::RangeMut;
use crate::types::{Key, Member, RangeId};

impl Document {
    /// Node that content placed "before `before`" in range `id` must be
    /// inserted in front of
    ///
    /// - a node member still under the range's parent: that node
    /// - a range member: refreshed first, then its start marker if it is
    ///   still under the range's parent
    /// - no target, or a target that left the parent: the end marker, after
    ///   refreshing the range if the end marker itself has drifted away
    pub(crate) fn insertion_point(&mut self, id: RangeId, before: Option<&Key>) -> Result<NodeId> {
        let parent = self.live_parent(id)?;

        if let Some(key) = before {
            let member = self
                .data(id)?
                .members
                .get(key)
                .copied()
                .ok_or_else(|| DomRangeError::UnknownKey(key.clone()))?;

            match member {
                Member::Node(node) => {
                    if parent.is_some() && self.dom.parent_id(node)? == parent {
                        return Ok(node);
                    }
                }
                Member::Range(range) => {
                    self.refresh_range(range)?;
                    if parent.is_some() && self.live_parent(range)? == parent {
                        return Ok(self.data(range)?.start);
                    }
                }
            }
            tracing::debug!(range = %id, %key, "insertion target left the range, using end marker");
        }

        let end = self.data(id)?.end;
        if self.dom.parent_id(end)? != parent {
            self.refresh_range(id)?;
        }
        Ok(end)
    }
}

impl RangeMut<'_> {
    /// Move member `key` in front of member `before`, or to the end
    ///
    /// A nested range travels as its whole live span, foreign nodes
    /// between its markers included. Nothing moves physically if the
    /// member already sits right before the target.
    pub fn move_before(&mut self, key: impl Into<Key>, before: Option<Key>) -> Result<()> {
        let key = key.into();
        let member = self
            .get(&key)
            .ok_or_else(|| DomRangeError::UnknownKey(key.clone()))?;
        self.check_before(before.as_ref())?;
        if before.as_ref() == Some(&key) {
            return Ok(());
        }

        let mut reference = self.doc.insertion_point(self.id, before.as_ref())?;
        if let Member::Range(range) = member {
            self.doc.refresh_range(range)?;
        }
        let mut nodes = self.doc.member_nodes(member)?;
        if nodes.contains(&reference) {
            // the span swallowed a sibling; putting the whole range in
            // order separates them again
            self.doc.refresh_range(self.id)?;
            reference = self.doc.insertion_point(self.id, before.as_ref())?;
            nodes = self.doc.member_nodes(member)?;
            if nodes.contains(&reference) {
                tracing::warn!(range = %self.id, %key, "insertion point lies inside the member, not moving");
                return Ok(());
            }
        }
        let in_place = match nodes.last() {
            Some(&last) => self.doc.dom.next_sibling(last)? == Some(reference),
            None => true,
        };
        if !in_place {
            self.doc.move_nodes_before(&nodes, reference)?;
        }

        let data = self.doc.data_mut(self.id)?;
        data.order.retain(|k| k != &key);
        data.insert_key(key.clone(), before.as_ref());

        tracing::debug!(range = %self.id, %key, ?before, moved = !in_place, "moved member");
        Ok(())
    }
}
