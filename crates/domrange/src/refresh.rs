//! Reconciliation of a range's physical layout with its logical order
//!
//! External code can move member nodes around, markers included. Refresh
//! computes the layout the range should have (its markers and, through
//! nested ranges, every member still under the range's parent) and walks
//! it with a cursor, pulling each node in right after the previous one.
//! Nodes move one at a time, so a nested span can never swallow the
//! cursor. End markers only have to come somewhere after the cursor;
//! whatever lies in between is foreign and floats.
//!
//! Membership never changes here. Members that left the parent stay
//! members until `prune`.

use dom::NodeId;

use crate::document::Document;
use crate::error::Result;
use crate::range::RangeMut;
use crate::types::{Key, Marker, Member, RangeId};

impl Document {
    pub(crate) fn refresh_range(&mut self, id: RangeId) -> Result<()> {
        let Some(parent) = self.live_parent(id)? else {
            // markers are off the tree; nested ranges are still tidied in place
            for (_, member) in self.data(id)?.ordered() {
                if let Member::Range(range) = member {
                    self.refresh_range(range)?;
                }
            }
            return Ok(());
        };

        let mut layout = Vec::new();
        self.layout(id, parent, &mut layout)?;

        let mut nodes = layout.into_iter();
        let Some(mut cursor) = nodes.next() else {
            return Ok(());
        };
        let mut moved = 0usize;
        for node in nodes {
            let next = self.dom.next_sibling(cursor)?;
            if next != Some(node) && !(self.is_end(node) && self.follows(cursor, node)?) {
                self.dom.insert_before(parent, node, next)?;
                moved += 1;
            }
            cursor = node;
        }

        if moved > 0 {
            tracing::trace!(range = %id, moved, "refreshed range");
        }
        Ok(())
    }

    /// Nodes of `id` in the order they belong under `parent`
    ///
    /// Nested ranges whose markers live under another parent are refreshed
    /// where they are instead.
    fn layout(&mut self, id: RangeId, parent: NodeId, out: &mut Vec<NodeId>) -> Result<()> {
        let (start, end) = {
            let data = self.data(id)?;
            (data.start, data.end)
        };
        out.push(start);
        for (key, member) in self.data(id)?.ordered() {
            if self.member_parent(member)? != Some(parent) {
                tracing::trace!(range = %id, %key, "member left the parent, skipping");
                if let Member::Range(range) = member {
                    self.refresh_range(range)?;
                }
                continue;
            }
            match member {
                Member::Node(node) => out.push(node),
                Member::Range(range) => self.layout(range, parent, out)?,
            }
        }
        out.push(end);
        Ok(())
    }

    fn is_end(&self, node: NodeId) -> bool {
        matches!(self.marker(node), Some((_, Marker::End)))
    }

    /// Members of `id` whose content is no longer under the range's parent
    fn escaped(&self, id: RangeId, parent: NodeId) -> Result<Vec<(Key, Member)>> {
        let mut escaped = Vec::new();
        for (key, member) in self.data(id)?.ordered() {
            if self.member_parent(member)? != Some(parent) {
                escaped.push((key, member));
            }
        }
        Ok(escaped)
    }
}

impl RangeMut<'_> {
    /// Put members back between the markers in logical order
    ///
    /// Nested ranges are put in order along the way. Foreign nodes between
    /// the markers are left where they are and drift towards the end.
    pub fn refresh(&mut self) -> Result<()> {
        self.doc.refresh_range(self.id)
    }

    /// Forget members whose content was moved out of the range's parent by
    /// someone else, returning their keys in logical order
    ///
    /// The content itself is not touched.
    pub fn prune(&mut self) -> Result<Vec<Key>> {
        let Some(parent) = self.parent_node()? else {
            return Ok(Vec::new());
        };

        let escaped = self.doc.escaped(self.id, parent)?;
        let mut keys = Vec::with_capacity(escaped.len());
        for (key, member) in escaped {
            self.doc.data_mut(self.id)?.remove_key(&key);
            match member {
                Member::Node(node) => {
                    if self.doc.owner(node) == Some(self.id) {
                        self.doc.owners.remove(&node);
                    }
                }
                Member::Range(range) => self.doc.data_mut(range)?.parent = None,
            }
            tracing::debug!(range = %self.id, %key, "pruned member");
            keys.push(key);
        }
        Ok(keys)
    }
}
