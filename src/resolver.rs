//! `$ref` resolution for schema documents.
//!
//! Resolution replaces every [`Reference::Pointer`] with a [`Reference::Link`] to the
//! concrete node it names. Links are arena ids, so a schema that references one of its
//! own ancestors resolves to a finite graph with a cycle instead of an infinite tree.

use crate::error::Result;
use crate::schema::{NodeId, Reference, SchemaDocument};
use log::debug;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::ops::Deref;

/// A schema document in which no node carries an unresolved pointer
#[derive(Debug, Clone)]
pub struct DereferencedDocument(SchemaDocument);

impl DereferencedDocument {
    /// Hand the arena back; resolving it again is a no-op
    pub fn into_document(self) -> SchemaDocument {
        self.0
    }

    /// The node a reference node was linked to, if `id` is one
    pub fn link_target(&self, id: NodeId) -> Option<NodeId> {
        match self.0.node(id).reference {
            Some(Reference::Link(target)) => Some(target),
            _ => None,
        }
    }
}

impl Deref for DereferencedDocument {
    type Target = SchemaDocument;

    fn deref(&self) -> &SchemaDocument {
        &self.0
    }
}

/// Resolve every internal reference of `document`.
///
/// Chains of references are followed to their final concrete node. A chain that loops
/// back on itself links to the node where the loop closes, so `{"$ref": "#"}` becomes a
/// node linking to itself.
///
/// # Errors
///
/// Returns [`Error::DanglingReference`](crate::error::Error::DanglingReference) when a
/// pointer cannot be located in the document. Nothing is rewritten in that case.
pub fn resolve(mut document: SchemaDocument) -> Result<DereferencedDocument> {
    // Locating a pointer may load new nodes, which may carry references of their own,
    // so walk the arena by index until it stops growing.
    let mut immediate: HashMap<NodeId, NodeId> = HashMap::new();
    let mut index = 0;
    while index < document.len() {
        let id = NodeId::new(index);
        match document.node(id).reference.clone() {
            Some(Reference::Pointer(pointer)) => {
                let target = document.locate(&pointer)?;
                debug!("{} -> {} ({})", document.node(id).pointer, pointer, target);
                immediate.insert(id, target);
            }
            Some(Reference::Link(target)) => {
                immediate.insert(id, target);
            }
            None => {}
        }
        index += 1;
    }

    let links: Vec<(NodeId, NodeId)> = immediate
        .keys()
        .map(|&id| (id, follow_chain(id, &immediate)))
        .collect();
    for (id, target) in &links {
        document.node_mut(*id).reference = Some(Reference::Link(*target));
    }

    debug!(
        "Resolved {} references in schema document {}",
        links.len(),
        document.root_id()
    );
    Ok(DereferencedDocument(document))
}

/// Parse and resolve a raw schema value in one step
pub fn dereference(value: &Value) -> Result<DereferencedDocument> {
    resolve(SchemaDocument::from_value(value)?)
}

fn follow_chain(start: NodeId, immediate: &HashMap<NodeId, NodeId>) -> NodeId {
    let mut seen = HashSet::from([start]);
    let mut current = immediate[&start];
    while let Some(&next) = immediate.get(&current) {
        if !seen.insert(current) {
            return current;
        }
        current = next;
    }
    current
}
