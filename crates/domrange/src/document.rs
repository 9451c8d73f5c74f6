//! Document - owner of the node arena and every range living in it
//!
//! Ranges and the nodes they manage reference each other constantly, so
//! neither owns the other. Both live here, addressed by index:
//!
//! ```text
//! Document ─┬─ DomArena            NodeId  → DomNode
//!           ├─ ranges: Vec         RangeId → RangeData (markers, members, order)
//!           └─ owners: side table  NodeId  → RangeId   (members and markers)
//! ```
//!
//! A range's own `parent` field is the only link between ranges. Both it
//! and `owners` are lookups, not ownership.

use ahash::AHashMap;
use dom::{utils, DomArena, DomSerializer, NodeId, NodeType, SerializerConfig};

use crate::error::{DomRangeError, Result};
use crate::range::RangeMut;
use crate::types::{Key, Marker, Member, RangeId};

/// Configuration for a document
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub node_capacity: usize,
    pub range_capacity: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            node_capacity: 1024,
            range_capacity: 64,
        }
    }
}

/// Bookkeeping for one range
#[derive(Debug)]
pub(crate) struct RangeData {
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) members: AHashMap<Key, Member>,
    /// Logical order. Physical order agrees with it after a refresh.
    pub(crate) order: Vec<Key>,
    next_auto: u32,
    /// Range holding this one as a member
    pub(crate) parent: Option<RangeId>,
}

impl RangeData {
    fn new(start: NodeId, end: NodeId) -> Self {
        Self {
            start,
            end,
            members: AHashMap::new(),
            order: Vec::new(),
            next_auto: 1,
            parent: None,
        }
    }

    pub(crate) fn next_key(&mut self) -> Key {
        let key = Key::Auto(self.next_auto);
        self.next_auto += 1;
        key
    }

    pub(crate) fn insert_key(&mut self, key: Key, before: Option<&Key>) {
        let index = before
            .and_then(|before| self.order.iter().position(|k| k == before))
            .unwrap_or(self.order.len());
        self.order.insert(index, key);
    }

    pub(crate) fn remove_key(&mut self, key: &Key) -> Option<Member> {
        let member = self.members.remove(key)?;
        self.order.retain(|k| k != key);
        Some(member)
    }

    /// Members in logical order
    pub(crate) fn ordered(&self) -> Vec<(Key, Member)> {
        self.order
            .iter()
            .filter_map(|key| self.members.get(key).map(|&m| (key.clone(), m)))
            .collect()
    }
}

/// A live node tree plus the ranges tracking spans of it
pub struct Document {
    config: DocumentConfig,
    pub(crate) dom: DomArena,
    pub(crate) ranges: Vec<RangeData>,
    pub(crate) owners: AHashMap<NodeId, RangeId>,
}

impl Document {
    /// Create new document with default config
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Create document with custom config
    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            dom: DomArena::with_capacity(config.node_capacity),
            ranges: Vec::with_capacity(config.range_capacity),
            owners: AHashMap::with_capacity(config.node_capacity),
            config,
        }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Get reference to internal arena
    pub fn dom(&self) -> &DomArena {
        &self.dom
    }

    /// Get mutable reference to internal arena
    ///
    /// Mutations made through here bypass every range. That is allowed;
    /// ranges tolerate it and `refresh` puts their members back in order.
    pub fn dom_mut(&mut self) -> &mut DomArena {
        &mut self.dom
    }

    /// Create an empty range whose adjacent markers sit in a fresh fragment
    pub fn create_range(&mut self) -> Result<RangeId> {
        let id = RangeId(self.ranges.len() as u32);
        let fragment = self.dom.create_fragment();
        let start = self.dom.create_text("");
        let end = self.dom.create_text("");
        self.dom.append_child(fragment, start)?;
        self.dom.append_child(fragment, end)?;

        self.owners.insert(start, id);
        self.owners.insert(end, id);
        self.ranges.push(RangeData::new(start, end));

        tracing::trace!(range = %id, start, end, "created range");
        Ok(id)
    }

    /// Create a range together with the host object that owns it
    pub fn create_host<H, F>(&mut self, build: F) -> Result<H>
    where
        F: FnOnce(RangeId) -> H,
    {
        Ok(build(self.create_range()?))
    }

    /// Operate on a range
    pub fn range(&mut self, id: RangeId) -> Result<RangeMut<'_>> {
        self.data(id)?;
        Ok(RangeMut::new(self, id))
    }

    /// Range a member node or marker belongs to
    pub fn owner(&self, node: NodeId) -> Option<RangeId> {
        self.owners.get(&node).copied()
    }

    /// If `node` is a range boundary, which range and which end
    pub fn marker(&self, node: NodeId) -> Option<(RangeId, Marker)> {
        let id = self.owner(node)?;
        let data = self.ranges.get(id.index())?;
        if data.start == node {
            Some((id, Marker::Start))
        } else if data.end == node {
            Some((id, Marker::End))
        } else {
            None
        }
    }

    /// Range holding `id` as a member, if any
    pub fn parent_range(&self, id: RangeId) -> Result<Option<RangeId>> {
        Ok(self.data(id)?.parent)
    }

    /// Markup dump of everything between a range's markers, markers shown
    /// as `""`
    pub fn outer_markup(&self, id: RangeId) -> Result<String> {
        let serializer = DomSerializer::with_config(SerializerConfig {
            show_empty_text: true,
            ..SerializerConfig::default()
        });
        Ok(serializer.serialize_nodes(&self.dom, &self.span(id)?)?)
    }

    /// Text of everything between a range's markers, one space between nodes
    pub fn text_content(&self, id: RangeId) -> Result<String> {
        let mut parts = Vec::new();
        for node in self.span(id)? {
            let text = utils::get_text_content(&self.dom, node)?;
            if !text.is_empty() {
                parts.push(text);
            }
        }
        Ok(parts.join(" "))
    }

    pub(crate) fn data(&self, id: RangeId) -> Result<&RangeData> {
        self.ranges
            .get(id.index())
            .ok_or(DomRangeError::RangeNotFound(id))
    }

    pub(crate) fn data_mut(&mut self, id: RangeId) -> Result<&mut RangeData> {
        self.ranges
            .get_mut(id.index())
            .ok_or(DomRangeError::RangeNotFound(id))
    }

    /// Live parent of the start marker. Never cached: ranges change parent
    /// when they are added somewhere.
    pub(crate) fn live_parent(&self, id: RangeId) -> Result<Option<NodeId>> {
        Ok(self.dom.parent_id(self.data(id)?.start)?)
    }

    /// Live parent of a member's content
    pub(crate) fn member_parent(&self, member: Member) -> Result<Option<NodeId>> {
        match member {
            Member::Node(node) => Ok(self.dom.parent_id(node)?),
            Member::Range(range) => self.live_parent(range),
        }
    }

    /// Every node from start to end marker, inclusive, as currently laid out
    ///
    /// Foreign nodes between the markers are part of the span. If the end
    /// marker cannot be reached the span is just the two markers.
    pub(crate) fn span(&self, id: RangeId) -> Result<Vec<NodeId>> {
        let data = self.data(id)?;
        let (start, end) = (data.start, data.end);
        let mut nodes = vec![start];
        let mut current = start;
        while current != end {
            match self.dom.next_sibling(current)? {
                Some(next) => {
                    nodes.push(next);
                    current = next;
                }
                None => {
                    tracing::warn!(range = %id, "end marker not reachable from start marker");
                    return Ok(vec![start, end]);
                }
            }
        }
        Ok(nodes)
    }

    /// Physical nodes making up a member, as currently laid out
    pub(crate) fn member_nodes(&self, member: Member) -> Result<Vec<NodeId>> {
        match member {
            Member::Node(node) => Ok(vec![node]),
            Member::Range(range) => self.span(range),
        }
    }

    /// Whether `target` is a later sibling of `from`
    pub(crate) fn follows(&self, from: NodeId, target: NodeId) -> Result<bool> {
        let mut current = self.dom.next_sibling(from)?;
        while let Some(node) = current {
            if node == target {
                return Ok(true);
            }
            current = self.dom.next_sibling(node)?;
        }
        Ok(false)
    }

    /// Insert a contiguous run of nodes under `parent` before `reference`
    pub(crate) fn insert_nodes(
        &mut self,
        parent: NodeId,
        nodes: &[NodeId],
        reference: Option<NodeId>,
    ) -> Result<()> {
        if let Some(reference) = reference {
            if nodes.contains(&reference) {
                tracing::warn!(
                    reference,
                    "insertion point lies inside the nodes being moved, skipping"
                );
                return Ok(());
            }
        }
        for &node in nodes {
            self.dom.insert_before(parent, node, reference)?;
        }
        Ok(())
    }

    /// Move nodes before `reference`, wherever `reference` lives right now
    pub(crate) fn move_nodes_before(&mut self, nodes: &[NodeId], reference: NodeId) -> Result<()> {
        match self.dom.parent_id(reference)? {
            Some(parent) => self.insert_nodes(parent, nodes, Some(reference)),
            None => {
                tracing::debug!(reference, "insertion point is detached, nothing to move");
                Ok(())
            }
        }
    }

    /// Lift a range's span out into a fresh fragment
    pub(crate) fn lift(&mut self, id: RangeId) -> Result<()> {
        let nodes = self.span(id)?;
        let fragment = self.dom.create_fragment();
        self.insert_nodes(fragment, &nodes, None)
    }

    pub(crate) fn key_of(&self, owner: RangeId, member: Member) -> Result<Option<Key>> {
        Ok(self
            .data(owner)?
            .members
            .iter()
            .find(|(_, m)| **m == member)
            .map(|(key, _)| key.clone()))
    }

    /// Reject content that cannot become a member of `id`
    pub(crate) fn check_adoptable(&self, id: RangeId, member: Member) -> Result<()> {
        let invalid = |reason: String| Err(DomRangeError::InvalidMember(reason));
        match member {
            Member::Node(node) => {
                let node_type = self.dom.get(node)?.node_type;
                if !matches!(
                    node_type,
                    NodeType::Element | NodeType::Text | NodeType::Comment
                ) {
                    return invalid(format!("node {} is a {}", node, node_type.name()));
                }
                if let Some((range, _)) = self.marker(node) {
                    return invalid(format!("node {} is a marker of {}", node, range));
                }
                if self.owner(node) == Some(id) {
                    return invalid(format!("node {} is already a member of {}", node, id));
                }
                if let Some(parent) = self.live_parent(id)? {
                    if self.dom.contains(node, parent)? {
                        return invalid(format!("node {} contains {}", node, id));
                    }
                }
            }
            Member::Range(range) => {
                let mut current = Some(id);
                while let Some(ancestor) = current {
                    if ancestor == range {
                        return invalid(format!("{} cannot be nested inside itself", range));
                    }
                    current = self.data(ancestor)?.parent;
                }
                if self.data(range)?.parent == Some(id) {
                    return invalid(format!("{} is already a member of {}", range, id));
                }
                let (start, end) = {
                    let data = self.data(id)?;
                    (data.start, data.end)
                };
                let parent = self.live_parent(id)?;
                for node in self.span(range)? {
                    if node == start || node == end {
                        return invalid(format!("{} surrounds the markers of {}", range, id));
                    }
                    if let Some(parent) = parent {
                        if self.dom.contains(node, parent)? {
                            return invalid(format!("{} contains {}", range, id));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Drop `member` from whichever range currently holds it
    pub(crate) fn release(&mut self, member: Member) -> Result<()> {
        let previous = match member {
            Member::Node(node) => self.owner(node),
            Member::Range(range) => self.data(range)?.parent,
        };
        let Some(previous) = previous else {
            return Ok(());
        };

        if let Some(key) = self.key_of(previous, member)? {
            self.data_mut(previous)?.remove_key(&key);
            tracing::debug!(range = %previous, %key, "released member");
        }
        match member {
            Member::Node(node) => {
                self.owners.remove(&node);
            }
            Member::Range(range) => self.data_mut(range)?.parent = None,
        }
        Ok(())
    }

    /// Make `member` a member of `id` under `key`, physically placing it
    /// before `before` (or at the end)
    pub(crate) fn adopt(
        &mut self,
        id: RangeId,
        key: Option<Key>,
        member: Member,
        before: Option<&Key>,
    ) -> Result<Key> {
        let reference = self.insertion_point(id, before)?;
        if let Member::Range(range) = member {
            self.refresh_range(range)?;
        }
        let nodes = self.member_nodes(member)?;
        if nodes.contains(&reference) {
            return Err(DomRangeError::InvalidMember(format!(
                "{:?} surrounds its own insertion point",
                member
            )));
        }
        self.move_nodes_before(&nodes, reference)?;
        self.release(member)?;

        match member {
            Member::Node(node) => {
                self.owners.insert(node, id);
            }
            Member::Range(range) => self.data_mut(range)?.parent = Some(id),
        }

        let data = self.data_mut(id)?;
        let key = key.unwrap_or_else(|| data.next_key());
        data.insert_key(key.clone(), before);
        data.members.insert(key.clone(), member);

        tracing::debug!(range = %id, %key, ?member, "added member");
        Ok(key)
    }

    /// Undo the back-references of a member that was just removed from `id`
    /// and take its content out of the tree
    pub(crate) fn discard(&mut self, id: RangeId, member: Member) -> Result<()> {
        let parent = self.live_parent(id)?;
        let in_place = parent.is_some() && self.member_parent(member)? == parent;

        match member {
            Member::Node(node) => {
                if self.owner(node) == Some(id) {
                    self.owners.remove(&node);
                }
                if in_place {
                    self.dom.detach(node)?;
                }
            }
            Member::Range(range) => {
                self.data_mut(range)?.parent = None;
                if in_place {
                    self.refresh_range(range)?;
                    self.lift(range)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
