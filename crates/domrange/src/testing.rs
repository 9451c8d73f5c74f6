//! Test helpers

use dom::NodeId;

use crate::document::Document;
use crate::types::{Marker, RangeHost, RangeId};

/// Minimal host object owning a range
pub(crate) struct Comp {
    pub(crate) dom: RangeId,
}

impl RangeHost for Comp {
    fn dom(&self) -> RangeId {
        self.dom
    }
}

pub(crate) fn comp(doc: &mut Document) -> Comp {
    doc.create_host(|dom| Comp { dom }).unwrap()
}

/// Element with an `id` attribute, so `spell` prints it by name
pub(crate) fn element(doc: &mut Document, tag: &str, id: &str) -> NodeId {
    let node = doc.dom_mut().create_element(tag);
    doc.dom_mut().set_attr(node, "id", id).unwrap();
    node
}

/// One character (or id) per child of `parent`
///
/// Markers print as their range's label pair, `()` when unlabeled.
/// Elements print their id or tag name, anything else prints `-`.
pub(crate) fn spell(doc: &Document, parent: NodeId, labels: &[(RangeId, &str)]) -> String {
    let mut out = String::new();
    for &child in doc.dom().children_ids(parent).unwrap() {
        if let Some((range, marker)) = doc.marker(child) {
            let pair = labels
                .iter()
                .find(|(id, _)| *id == range)
                .map(|(_, pair)| *pair)
                .unwrap_or("()");
            let mut chars = pair.chars();
            let c = match marker {
                Marker::Start => chars.next(),
                Marker::End => chars.nth(1),
            };
            out.push(c.unwrap());
            continue;
        }
        let node = doc.dom().get(child).unwrap();
        match node.tag_name() {
            Some(tag) => out.push_str(node.attr("id").unwrap_or(tag)),
            None => out.push('-'),
        }
    }
    out
}

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
