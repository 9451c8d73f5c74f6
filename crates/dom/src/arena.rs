//! Arena-based live DOM tree
//!
//! ## Linus Philosophy Applied
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! This arena eliminates:
//! - Rc/Arc overhead (16 bytes per pointer)
//! - Ownership cycles between parents and children
//! - GC pressure (single Vec allocation)
//!
//! Nodes are never freed. Removing a node only detaches it, so a `NodeId`
//! stays valid for the lifetime of the arena.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Sibling queries always read the parent's current child list. There are
//! no cached `next_sibling` pointers to go stale when something else
//! rearranges the tree.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    fn alloc(&mut self, node_type: NodeType, node_name: String, node_value: &str) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        let mut node = DomNode::new(node_id, node_type, node_name);
        node.node_value = node_value.to_string();
        self.nodes.push(node);
        node_id
    }

    /// Create a detached element. Tag names are stored uppercase, like HTML.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeType::Element, tag.to_uppercase(), "")
    }

    /// Create a detached text node
    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.alloc(NodeType::Text, "#text".to_string(), value)
    }

    pub fn create_comment(&mut self, value: &str) -> NodeId {
        self.alloc(NodeType::Comment, "#comment".to_string(), value)
    }

    /// Create an off-screen container
    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeType::DocumentFragment, "#document-fragment".to_string(), "")
    }

    pub fn create_document(&mut self) -> NodeId {
        self.alloc(NodeType::Document, "#document".to_string(), "")
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        self.get_mut(node_id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current parent of a node
    pub fn parent_id(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent_id)
    }

    /// Children of a node, in document order
    pub fn children_ids(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(node_id)?.children_ids)
    }

    pub fn first_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.children_ids.first().copied())
    }

    pub fn last_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.children_ids.last().copied())
    }

    /// Position of a node among its parent's children
    fn index_in_parent(&self, node_id: NodeId) -> Result<Option<(NodeId, usize)>> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(None);
        };
        let index = self
            .get(parent_id)?
            .children_ids
            .iter()
            .position(|&child| child == node_id)
            .ok_or(DomError::NotAChild {
                parent: parent_id,
                child: node_id,
            })?;
        Ok(Some((parent_id, index)))
    }

    pub fn next_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        match self.index_in_parent(node_id)? {
            Some((parent_id, index)) => {
                Ok(self.get(parent_id)?.children_ids.get(index + 1).copied())
            }
            None => Ok(None),
        }
    }

    pub fn previous_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        match self.index_in_parent(node_id)? {
            Some((_, 0)) | None => Ok(None),
            Some((parent_id, index)) => {
                Ok(self.get(parent_id)?.children_ids.get(index - 1).copied())
            }
        }
    }

    /// Whether `node_id` is `ancestor_id` or lies somewhere beneath it
    pub fn contains(&self, ancestor_id: NodeId, node_id: NodeId) -> Result<bool> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == ancestor_id {
                return Ok(true);
            }
            current = self.get(id)?.parent_id;
        }
        Ok(false)
    }

    /// Insert `node_id` into `parent_id` before `reference`, or append when
    /// `reference` is `None`. The node is first removed from wherever it
    /// currently lives, like `Node.insertBefore`.
    pub fn insert_before(
        &mut self,
        parent_id: NodeId,
        node_id: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let parent_type = self.get(parent_id)?.node_type;
        if !parent_type.is_container() {
            return Err(DomError::InvalidNodeType {
                expected: "Element, Document or DocumentFragment".to_string(),
                actual: parent_type.name().to_string(),
            });
        }
        if self.contains(node_id, parent_id)? {
            return Err(DomError::HierarchyRequest {
                parent: parent_id,
                child: node_id,
            });
        }
        if let Some(reference) = reference {
            if self.get(reference)?.parent_id != Some(parent_id) {
                return Err(DomError::NotAChild {
                    parent: parent_id,
                    child: reference,
                });
            }
            if reference == node_id {
                return Ok(());
            }
        }

        self.detach(node_id)?;

        let parent = self.get_mut(parent_id)?;
        let index = match reference {
            Some(reference) => parent
                .children_ids
                .iter()
                .position(|&child| child == reference)
                .ok_or(DomError::NotAChild {
                    parent: parent_id,
                    child: reference,
                })?,
            None => parent.children_ids.len(),
        };
        parent.children_ids.insert(index, node_id);
        self.get_mut(node_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    pub fn append_child(&mut self, parent_id: NodeId, node_id: NodeId) -> Result<()> {
        self.insert_before(parent_id, node_id, None)
    }

    /// Remove `node_id` from `parent_id`, failing if it is not a child there
    pub fn remove_child(&mut self, parent_id: NodeId, node_id: NodeId) -> Result<()> {
        if self.get(node_id)?.parent_id != Some(parent_id) {
            return Err(DomError::NotAChild {
                parent: parent_id,
                child: node_id,
            });
        }
        self.detach(node_id)
    }

    /// Remove a node from its parent, if it has one
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        if let Some((parent_id, index)) = self.index_in_parent(node_id)? {
            self.get_mut(parent_id)?.children_ids.remove(index);
            self.get_mut(node_id)?.parent_id = None;
        }
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// This is the "good taste" version - no special cases for leaf nodes
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Find nodes matching predicate
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .filter(|&node| predicate(node))
            .map(|node| node.node_id)
            .collect()
    }

    /// Find first node matching predicate
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .find(|&node| predicate(node))
            .map(|node| node.node_id)
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.node_name.eq_ignore_ascii_case(tag))
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_element() && node.attr("id") == Some(id))
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
