//! Range operations: membership, removal, queries, attach/detach
//!
//! A range is bounded by two empty text markers that always share a parent.
//! Everything the range owns sits between them, in logical order:
//!
//! ```text
//! parent: … start [member] [sub.start … sub.end] [member] end …
//! ```
//!
//! Reordering lives in `reorder`, reconciliation in `refresh`.

use dom::NodeId;

use crate::document::{Document, RangeData};
use crate::error::{DomRangeError, Result};
use crate::types::{Key, Member, RangeId};

/// Mutable view of one range inside a [`Document`]
pub struct RangeMut<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) id: RangeId,
}

impl<'a> RangeMut<'a> {
    pub(crate) fn new(doc: &'a mut Document, id: RangeId) -> Self {
        Self { doc, id }
    }

    /// Ids are checked when the view is created and ranges are never freed
    pub(crate) fn data(&self) -> &RangeData {
        &self.doc.ranges[self.id.index()]
    }

    pub fn id(&self) -> RangeId {
        self.id
    }

    pub fn start_node(&self) -> NodeId {
        self.data().start
    }

    pub fn end_node(&self) -> NodeId {
        self.data().end
    }

    /// Current parent of the markers, read live
    pub fn parent_node(&self) -> Result<Option<NodeId>> {
        self.doc.live_parent(self.id)
    }

    /// Add a node, range or host as a member
    ///
    /// Without a key an auto key is generated. Without `before` the member
    /// goes at the end. Content owned by another range is taken away from it.
    pub fn add(
        &mut self,
        key: Option<Key>,
        member: impl Into<Member>,
        before: Option<Key>,
    ) -> Result<Key> {
        let member = member.into();
        if let Some(key) = &key {
            if self.data().members.contains_key(key) {
                return Err(DomRangeError::DuplicateKey(key.clone()));
            }
        }
        self.check_before(before.as_ref())?;
        self.doc.check_adoptable(self.id, member)?;

        self.doc.adopt(self.id, key, member, before.as_ref())
    }

    /// Add a sequence of nodes, in order, each under an auto key
    pub fn add_nodes(&mut self, nodes: &[NodeId], before: Option<Key>) -> Result<Vec<Key>> {
        self.check_before(before.as_ref())?;
        for (i, &node) in nodes.iter().enumerate() {
            if nodes[..i].contains(&node) {
                return Err(DomRangeError::InvalidMember(format!(
                    "node {} appears twice",
                    node
                )));
            }
            self.doc.check_adoptable(self.id, Member::Node(node))?;
        }

        nodes
            .iter()
            .map(|&node| {
                self.doc
                    .adopt(self.id, None, Member::Node(node), before.as_ref())
            })
            .collect()
    }

    pub(crate) fn check_before(&self, before: Option<&Key>) -> Result<()> {
        match before {
            Some(key) if !self.data().members.contains_key(key) => {
                Err(DomRangeError::UnknownKey(key.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Remove a member and take its content out of the tree
    ///
    /// A removed subrange keeps its own members and ends up in a fresh
    /// fragment, ready to be added somewhere else.
    pub fn remove(&mut self, key: impl Into<Key>) -> Result<Member> {
        let key = key.into();
        let member = self
            .doc
            .data_mut(self.id)?
            .remove_key(&key)
            .ok_or_else(|| DomRangeError::UnknownKey(key.clone()))?;

        self.doc.discard(self.id, member)?;
        tracing::debug!(range = %self.id, %key, "removed member");
        Ok(member)
    }

    /// Remove every member, and any foreign node between the markers
    pub fn remove_all(&mut self) -> Result<()> {
        let keys = self.data().order.clone();
        for key in keys {
            self.remove(key)?;
        }

        let Some(parent) = self.parent_node()? else {
            return Ok(());
        };
        let (start, end) = (self.start_node(), self.end_node());
        let nodes = self.doc.span(self.id)?;
        for &node in &nodes[1..nodes.len() - 1] {
            self.doc.dom.detach(node)?;
        }
        if self.doc.dom.next_sibling(start)? != Some(end) {
            let anchor = self.doc.dom.next_sibling(start)?;
            self.doc.dom.insert_before(parent, end, anchor)?;
        }
        Ok(())
    }

    /// Member stored under `key`, if any
    pub fn get(&self, key: impl Into<Key>) -> Option<Member> {
        self.data().members.get(&key.into()).copied()
    }

    /// Keys in logical order
    pub fn keys(&self) -> Vec<Key> {
        self.data().order.clone()
    }

    pub fn len(&self) -> usize {
        self.data().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().members.is_empty()
    }

    /// Visit direct members in logical order. Nested ranges are handed to
    /// `on_range` as a whole, not descended into.
    pub fn each_member<N, R>(&self, mut on_node: N, mut on_range: R)
    where
        N: FnMut(NodeId),
        R: FnMut(RangeId),
    {
        for (_, member) in self.data().ordered() {
            match member {
                Member::Node(node) => on_node(node),
                Member::Range(range) => on_range(range),
            }
        }
    }

    /// Every physical node from start to end marker inclusive, nested
    /// markers and foreign nodes included. Diagnostic; does not refresh.
    pub fn get_nodes(&self) -> Result<Vec<NodeId>> {
        self.doc.span(self.id)
    }

    /// Put the range's whole span under `parent`, before `before` or at the
    /// end. A range held by another range is released from it first.
    pub fn attach_to(&mut self, parent: NodeId, before: Option<NodeId>) -> Result<()> {
        self.doc.release(Member::Range(self.id))?;
        self.doc.refresh_range(self.id)?;
        let nodes = self.doc.span(self.id)?;
        self.doc.insert_nodes(parent, &nodes, before)?;
        tracing::debug!(range = %self.id, parent, "attached range");
        Ok(())
    }

    /// Take the range out of the tree into a fresh fragment, removing it
    /// from its parent range if it has one
    pub fn detach(&mut self) -> Result<()> {
        let member = Member::Range(self.id);
        let parent = self.data().parent;
        if let Some(owner) = parent {
            if let Some(key) = self.doc.key_of(owner, member)? {
                self.doc.range(owner)?.remove(key)?;
                return Ok(());
            }
        }

        self.doc.data_mut(self.id)?.parent = None;
        self.doc.refresh_range(self.id)?;
        self.doc.lift(self.id)?;
        tracing::debug!(range = %self.id, "detached range");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{comp, element, init_tracing, spell};

    #[test]
    fn test_basic() -> Result<()> {
        init_tracing();
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let (r_start, r_end) = {
            let range = doc.range(r)?;
            (range.start_node(), range.end_node())
        };

        // add a node
        let div = doc.dom_mut().create_element("div");
        doc.range(r)?.add(None, div, None)?;

        assert_eq!(doc.range(r)?.len(), 1);
        assert_eq!(doc.dom().previous_sibling(div)?, Some(r_start));
        assert_eq!(doc.dom().next_sibling(div)?, Some(r_end));
        assert_eq!(doc.owner(div), Some(r));

        // add a subrange
        let s = doc.create_range()?;
        let span = doc.dom_mut().create_element("span");
        doc.range(s)?.add(None, span, None)?;
        doc.range(r)?.add(None, s, None)?;
        assert_eq!(doc.range(r)?.len(), 2);
        assert_eq!(doc.parent_range(s)?, Some(r));

        // rStart, DIV, sStart, SPAN, sEnd, rEnd
        let (s_start, s_end) = {
            let range = doc.range(s)?;
            (range.start_node(), range.end_node())
        };
        assert_eq!(doc.dom().previous_sibling(span)?, Some(s_start));
        assert_eq!(doc.dom().next_sibling(span)?, Some(s_end));
        assert_eq!(doc.dom().next_sibling(s_end)?, Some(r_end));
        assert_eq!(doc.dom().previous_sibling(s_start)?, Some(div));
        assert_eq!(doc.owner(span), Some(s));
        assert_eq!(doc.range(r)?.get_nodes()?.len(), 6);

        let mut nodes = Vec::new();
        let mut ranges = Vec::new();
        doc.range(r)?
            .each_member(|node| nodes.push(node), |range| ranges.push(range));
        assert_eq!(nodes, vec![div]);
        assert_eq!(ranges, vec![s]);

        // detaching the subrange goes through its parent range
        doc.range(s)?.detach()?;
        assert_eq!(doc.dom().next_sibling(r_start)?, Some(div));
        assert_eq!(doc.dom().previous_sibling(r_end)?, Some(div));
        assert_eq!(doc.range(r)?.len(), 1);
        assert_eq!(doc.parent_range(s)?, None);
        assert_eq!(doc.range(s)?.get_nodes()?, vec![s_start, span, s_end]);

        doc.range(r)?.remove_all()?;
        assert_eq!(doc.dom().next_sibling(r_start)?, Some(r_end));
        assert!(doc.range(r)?.is_empty());
        assert_eq!(doc.owner(div), None);
        assert_eq!(doc.dom().parent_id(div)?, None);
        Ok(())
    }

    #[test]
    fn test_auto_keys_are_sequential() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let a = doc.dom_mut().create_element("a");
        let b = doc.dom_mut().create_element("b");
        let c = doc.dom_mut().create_element("c");

        let mut range = doc.range(r)?;
        assert_eq!(range.add(None, a, None)?, Key::Auto(1));
        assert_eq!(range.add(Some("b".into()), b, None)?, Key::from("b"));
        assert_eq!(range.add(None, c, None)?, Key::Auto(2));
        assert_eq!(range.get(&Key::Auto(2)), Some(Member::Node(c)));
        assert_eq!(range.keys(), vec![Key::Auto(1), "b".into(), Key::Auto(2)]);
        Ok(())
    }

    #[test]
    fn test_add_then_remove_restores_state() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let x = element(&mut doc, "div", "X");
        let y = element(&mut doc, "div", "Y");
        doc.range(r)?.add(Some("X".into()), x, None)?;
        let parent = doc.range(r)?.parent_node()?.unwrap();
        let before = spell(&doc, parent, &[]);

        doc.range(r)?.add(Some("Y".into()), y, Some("X".into()))?;
        assert_eq!(spell(&doc, parent, &[]), "(YX)");

        let removed = doc.range(r)?.remove("Y")?;
        assert_eq!(removed, Member::Node(y));
        assert_eq!(spell(&doc, parent, &[]), before);
        assert_eq!(doc.range(r)?.len(), 1);
        assert_eq!(doc.range(r)?.get("Y"), None);
        Ok(())
    }

    #[test]
    fn test_add_nodes_keeps_order() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let b = element(&mut doc, "b", "B");
        doc.range(r)?.add(Some("B".into()), b, None)?;
        let one = element(&mut doc, "a", "1");
        let two = element(&mut doc, "a", "2");

        let keys = doc.range(r)?.add_nodes(&[one, two], Some("B".into()))?;

        let parent = doc.range(r)?.parent_node()?.unwrap();
        assert_eq!(spell(&doc, parent, &[]), "(12B)");
        assert_eq!(keys, vec![Key::Auto(1), Key::Auto(2)]);
        assert_eq!(
            doc.range(r)?.keys(),
            vec![Key::Auto(1), Key::Auto(2), "B".into()]
        );
        assert!(doc.range(r)?.add_nodes(&[], None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_key_errors() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let a = doc.dom_mut().create_element("a");
        let b = doc.dom_mut().create_element("b");
        doc.range(r)?.add(Some("A".into()), a, None)?;

        let mut range = doc.range(r)?;
        assert!(matches!(
            range.remove("nope"),
            Err(DomRangeError::UnknownKey(Key::Named(k))) if k == "nope"
        ));
        assert!(matches!(
            range.add(Some("A".into()), b, None),
            Err(DomRangeError::DuplicateKey(_))
        ));
        assert!(matches!(
            range.add(None, b, Some("nope".into())),
            Err(DomRangeError::UnknownKey(_))
        ));
        assert!(matches!(
            range.add_nodes(&[b], Some("nope".into())),
            Err(DomRangeError::UnknownKey(_))
        ));
        // failed adds leave nothing behind
        assert_eq!(range.len(), 1);
        assert_eq!(doc.dom().parent_id(b)?, None);
        Ok(())
    }

    #[test]
    fn test_invalid_members() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let s = doc.create_range()?;
        let a = doc.dom_mut().create_element("a");
        let fragment = doc.dom_mut().create_fragment();
        doc.range(r)?.add(Some("s".into()), s, None)?;
        doc.range(r)?.add(Some("a".into()), a, None)?;
        let s_start = doc.range(s)?.start_node();

        let invalid = |result: Result<Key>| matches!(result, Err(DomRangeError::InvalidMember(_)));
        assert!(invalid(doc.range(r)?.add(None, r, None)));
        assert!(invalid(doc.range(s)?.add(None, r, None)));
        assert!(invalid(doc.range(r)?.add(None, s, None)));
        assert!(invalid(doc.range(r)?.add(None, a, None)));
        assert!(invalid(doc.range(r)?.add(None, s_start, None)));
        assert!(invalid(doc.range(r)?.add(None, fragment, None)));
        assert!(matches!(
            doc.range(r)?.add_nodes(&[fragment], None),
            Err(DomRangeError::InvalidMember(_))
        ));
        let b = doc.dom_mut().create_element("b");
        assert!(matches!(
            doc.range(r)?.add_nodes(&[b, b], None),
            Err(DomRangeError::InvalidMember(_))
        ));
        assert_eq!(doc.range(r)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_node_containing_the_range_is_rejected() -> Result<()> {
        let mut doc = Document::new();
        let body = doc.dom_mut().create_element("body");
        let r = doc.create_range()?;
        doc.range(r)?.attach_to(body, None)?;

        assert!(matches!(
            doc.range(r)?.add(None, body, None),
            Err(DomRangeError::InvalidMember(_))
        ));
        Ok(())
    }

    #[test]
    fn test_add_reparents_range() -> Result<()> {
        let mut doc = Document::new();
        let r1 = doc.create_range()?;
        let r2 = doc.create_range()?;
        let s = comp(&mut doc);
        let x = element(&mut doc, "div", "X");
        doc.range(s.dom)?.add(Some("X".into()), x, None)?;

        doc.range(r1)?.add(Some("s".into()), &s, None)?;
        let p1 = doc.range(r1)?.parent_node()?.unwrap();
        assert_eq!(spell(&doc, p1, &[]), "((X))");

        doc.range(r2)?.add(Some("t".into()), &s, None)?;
        let p2 = doc.range(r2)?.parent_node()?.unwrap();
        assert_eq!(spell(&doc, p1, &[]), "()");
        assert_eq!(spell(&doc, p2, &[]), "((X))");
        assert_eq!(doc.range(r1)?.get("s"), None);
        assert_eq!(doc.range(r2)?.get("t"), Some(Member::Range(s.dom)));
        assert_eq!(doc.parent_range(s.dom)?, Some(r2));
        assert_eq!(doc.range(s.dom)?.parent_node()?, Some(p2));
        Ok(())
    }

    #[test]
    fn test_add_takes_node_from_other_range() -> Result<()> {
        let mut doc = Document::new();
        let r1 = doc.create_range()?;
        let r2 = doc.create_range()?;
        let x = element(&mut doc, "div", "X");
        doc.range(r1)?.add(Some("X".into()), x, None)?;

        doc.range(r2)?.add(Some("X".into()), x, None)?;

        assert!(doc.range(r1)?.is_empty());
        assert_eq!(doc.owner(x), Some(r2));
        Ok(())
    }

    #[test]
    fn test_removed_subrange_stays_usable() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let s = comp(&mut doc);
        let x = element(&mut doc, "div", "X");
        doc.range(s.dom)?.add(Some("X".into()), x, None)?;
        doc.range(r)?.add(Some("s".into()), &s, None)?;

        doc.range(r)?.remove("s")?;
        let parent = doc.range(r)?.parent_node()?.unwrap();
        assert_eq!(spell(&doc, parent, &[]), "()");
        assert_eq!(doc.range(s.dom)?.len(), 1);
        let s_parent = doc.range(s.dom)?.parent_node()?.unwrap();
        assert_ne!(s_parent, parent);
        assert_eq!(spell(&doc, s_parent, &[]), "(X)");

        // and can come back
        doc.range(r)?.add(Some("s".into()), &s, None)?;
        assert_eq!(spell(&doc, parent, &[]), "((X))");
        Ok(())
    }

    #[test]
    fn test_remove_all_clears_foreign_nodes() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let a = element(&mut doc, "a", "A");
        let stray = element(&mut doc, "i", "S");
        doc.range(r)?.add(None, a, None)?;
        let parent = doc.range(r)?.parent_node()?.unwrap();
        doc.dom_mut().insert_before(parent, stray, Some(a))?;
        assert_eq!(spell(&doc, parent, &[]), "(SA)");

        doc.range(r)?.remove_all()?;

        assert_eq!(spell(&doc, parent, &[]), "()");
        assert_eq!(doc.dom().parent_id(stray)?, None);
        Ok(())
    }

    #[test]
    fn test_remove_all_repairs_misplaced_end() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let a = element(&mut doc, "a", "A");
        doc.range(r)?.add(None, a, None)?;
        let parent = doc.range(r)?.parent_node()?.unwrap();
        let start = doc.range(r)?.start_node();
        let end = doc.range(r)?.end_node();
        // end ends up in front of start
        doc.dom_mut().insert_before(parent, end, Some(start))?;

        doc.range(r)?.remove_all()?;

        assert_eq!(spell(&doc, parent, &[]), "()");
        Ok(())
    }

    #[test]
    fn test_remove_ignores_externally_removed_content() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let a = element(&mut doc, "a", "A");
        let elsewhere = doc.dom_mut().create_element("div");
        doc.range(r)?.add(Some("A".into()), a, None)?;
        doc.dom_mut().append_child(elsewhere, a)?;

        doc.range(r)?.remove("A")?;

        assert_eq!(doc.dom().parent_id(a)?, Some(elsewhere));
        assert_eq!(doc.owner(a), None);
        Ok(())
    }

    #[test]
    fn test_attach_to_real_tree() -> Result<()> {
        let mut doc = Document::new();
        let body = doc.dom_mut().create_element("body");
        let footer = element(&mut doc, "footer", "F");
        doc.dom_mut().append_child(body, footer)?;
        let r = doc.create_range()?;
        let x = element(&mut doc, "div", "X");
        doc.range(r)?.add(None, x, None)?;

        doc.range(r)?.attach_to(body, Some(footer))?;

        assert_eq!(doc.range(r)?.parent_node()?, Some(body));
        assert_eq!(spell(&doc, body, &[]), "(X)F");

        doc.range(r)?.detach()?;
        assert_eq!(spell(&doc, body, &[]), "F");
        let parent = doc.range(r)?.parent_node()?.unwrap();
        assert_eq!(spell(&doc, parent, &[]), "(X)");
        Ok(())
    }

    #[test]
    fn test_attach_releases_from_parent_range() -> Result<()> {
        let mut doc = Document::new();
        let body = doc.dom_mut().create_element("body");
        let r = doc.create_range()?;
        let s = doc.create_range()?;
        doc.range(r)?.add(Some("s".into()), s, None)?;

        doc.range(s)?.attach_to(body, None)?;

        assert!(doc.range(r)?.is_empty());
        assert_eq!(doc.parent_range(s)?, None);
        assert_eq!(spell(&doc, body, &[]), "()");
        Ok(())
    }

    #[test]
    fn test_failed_add_keeps_previous_membership() -> Result<()> {
        let mut doc = Document::new();
        let p = doc.create_range()?;
        let s = comp(&mut doc);
        let w = element(&mut doc, "div", "W");
        doc.range(s.dom)?.add(Some("W".into()), w, None)?;
        doc.range(p)?.add(Some("s".into()), &s, None)?;

        // r lives inside W, which s holds
        let r = doc.create_range()?;
        doc.range(r)?.attach_to(w, None)?;
        assert!(matches!(
            doc.range(r)?.add(Some("s".into()), &s, None),
            Err(DomRangeError::InvalidMember(_))
        ));

        // r's markers sit between s's markers
        let q = doc.create_range()?;
        let s_parent = doc.range(s.dom)?.parent_node()?.unwrap();
        doc.range(q)?.attach_to(s_parent, Some(w))?;
        assert!(matches!(
            doc.range(q)?.add(Some("s".into()), &s, None),
            Err(DomRangeError::InvalidMember(_))
        ));

        assert_eq!(doc.range(p)?.get("s"), Some(Member::Range(s.dom)));
        assert_eq!(doc.parent_range(s.dom)?, Some(p));
        assert!(doc.range(r)?.is_empty());
        assert!(doc.range(q)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_get_nodes_with_unreachable_end() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let a = element(&mut doc, "a", "A");
        doc.range(r)?.add(None, a, None)?;
        let (start, end) = {
            let range = doc.range(r)?;
            (range.start_node(), range.end_node())
        };
        assert_eq!(doc.range(r)?.get_nodes()?, vec![start, a, end]);

        let elsewhere = doc.dom_mut().create_element("div");
        doc.dom_mut().append_child(elsewhere, end)?;

        assert_eq!(doc.range(r)?.get_nodes()?, vec![start, end]);
        Ok(())
    }

    #[test]
    fn test_comment_and_text_members() -> Result<()> {
        let mut doc = Document::new();
        let r = doc.create_range()?;
        let note = doc.dom_mut().create_comment("note");
        let text = doc.dom_mut().create_text("hello");
        let a = doc.dom_mut().create_element("a");
        doc.range(r)?.add(Some("note".into()), note, None)?;
        doc.range(r)?.add(Some("text".into()), text, None)?;
        doc.range(r)?.add(Some("a".into()), a, Some("note".into()))?;

        let parent = doc.range(r)?.parent_node()?.unwrap();
        assert_eq!(spell(&doc, parent, &[]), "(A--)");
        assert_eq!(doc.dom().get(note)?.tag_name(), None);
        assert_eq!(doc.dom().get(a)?.tag_name(), Some("A"));
        assert!(doc.outer_markup(r)?.contains("<!--note-->"));

        doc.range(r)?.remove("note")?;
        assert_eq!(spell(&doc, parent, &[]), "(A-)");
        Ok(())
    }
}
