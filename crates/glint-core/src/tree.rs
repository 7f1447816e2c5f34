//! The live UI tree behind the mounter.
//!
//! [`UiTree`] is the seam between the rendering core and whatever actually
//! owns the visual nodes. The style-merge and listener-binding methods are
//! the same surfaces the animation toolkit drives; collaborators go through
//! them and never call back into the scheduler or hooks. [`MemoryTree`] is
//! the in-process reference backend used by the tests and the demo app.

use std::fmt::Write as _;

use crate::collections::Map;
use crate::error::CoreError;
use crate::vnode::{Event, EventHandler, StyleBag};

pub type NodeId = usize;

/// Mutable handle to a live UI tree. Nodes are created detached and only
/// become visible once appended under an attached parent, which is what lets
/// the mounter build a whole subtree before committing it.
pub trait UiTree {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), CoreError>;

    /// Style-application surface: merge `entries` into the node's visual
    /// style, overwriting keys that are already present.
    fn merge_style(&mut self, id: NodeId, entries: &StyleBag) -> Result<(), CoreError>;

    /// Event-binding surface: attach a named listener to a live node.
    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), CoreError>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CoreError>;

    /// Swaps `new` into `old`'s position and discards `old`'s subtree.
    fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<(), CoreError>;

    fn clear_children(&mut self, id: NodeId) -> Result<(), CoreError>;
    fn remove_subtree(&mut self, id: NodeId) -> Result<(), CoreError>;

    /// Resolves a mount target registered under `name`.
    fn resolve_container(&self, name: &str) -> Option<NodeId>;
}

enum MemoryNodeKind {
    Element { tag: String },
    Text { text: String },
    Container { name: String },
}

struct MemoryNode {
    kind: MemoryNodeKind,
    attributes: Vec<(String, String)>,
    style: StyleBag,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            style: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// In-memory reference backend with named containers.
#[derive(Default)]
pub struct MemoryTree {
    nodes: Vec<Option<MemoryNode>>,
    containers: Map<String, NodeId>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a root container addressable from [`UiTree::resolve_container`].
    pub fn register_container(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = self.push(MemoryNode::new(MemoryNodeKind::Container {
            name: name.clone(),
        }));
        self.containers.insert(name, id);
        id
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, CoreError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(CoreError::NodeMissing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, CoreError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(CoreError::NodeMissing { id })
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>, CoreError> {
        Ok(self.node(id)?.children.clone())
    }

    pub fn tag_of(&self, id: NodeId) -> Result<Option<&str>, CoreError> {
        Ok(match &self.node(id)?.kind {
            MemoryNodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        })
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Result<Option<&str>, CoreError> {
        Ok(self
            .node(id)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str()))
    }

    pub fn style_of(&self, id: NodeId, key: &str) -> Result<Option<&str>, CoreError> {
        Ok(self
            .node(id)?
            .style
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str()))
    }

    /// Concatenated text of every text leaf under `id`, depth-first.
    pub fn text_content(&self, id: NodeId) -> Result<String, CoreError> {
        let mut out = String::new();
        self.collect_text(id, &mut out)?;
        Ok(out)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<(), CoreError> {
        let node = self.node(id)?;
        if let MemoryNodeKind::Text { text } = &node.kind {
            out.push_str(text);
        }
        for child in node.children.clone() {
            self.collect_text(child, out)?;
        }
        Ok(())
    }

    /// Depth-first search for the first element with `tag` under `root`.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        let node = self.nodes.get(root)?.as_ref()?;
        if matches!(&node.kind, MemoryNodeKind::Element { tag: t } if t == tag) {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|&child| self.find_by_tag(child, tag))
    }

    /// Fires every listener bound for `event` on `id`, in binding order.
    /// Listener lists are snapshotted first, so handlers may re-render the
    /// tree out from under the node they were bound to.
    pub fn dispatch(&mut self, id: NodeId, event: &str) -> Result<usize, CoreError> {
        let handlers: Vec<EventHandler> = self
            .node(id)?
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, handler)| handler.clone())
            .collect();
        let payload = Event::new(event);
        for handler in &handlers {
            handler.invoke(&payload);
        }
        Ok(handlers.len())
    }

    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.nodes.get(id).and_then(Option::as_ref) {
            Some(node) => {
                match &node.kind {
                    MemoryNodeKind::Element { tag } => {
                        let _ = write!(output, "{indent}[{id}] <{tag}>");
                        for (name, value) in &node.attributes {
                            let _ = write!(output, " {name}={value:?}");
                        }
                        output.push('\n');
                    }
                    MemoryNodeKind::Text { text } => {
                        let _ = writeln!(output, "{indent}[{id}] {text:?}");
                    }
                    MemoryNodeKind::Container { name } => {
                        let _ = writeln!(output, "{indent}[{id}] #{name}");
                    }
                }
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            None => {
                let _ = writeln!(output, "{indent}[{id}] (missing)");
            }
        }
    }

    fn detach_from_parent(&mut self, id: NodeId) -> Result<(), CoreError> {
        if let Some(parent) = self.node(id)?.parent {
            let parent_node = self.node_mut(parent)?;
            parent_node.children.retain(|&child| child != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn remove_recursive(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id).and_then(Option::take) {
            Some(node) => node.children,
            None => return,
        };
        for child in children {
            self.remove_recursive(child);
        }
    }
}

impl UiTree for MemoryTree {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(MemoryNode::new(MemoryNodeKind::Element {
            tag: tag.to_owned(),
        }))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(MemoryNode::new(MemoryNodeKind::Text {
            text: text.to_owned(),
        }))
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), CoreError> {
        let node = self.node_mut(id)?;
        if matches!(node.kind, MemoryNodeKind::Text { .. }) {
            return Err(CoreError::InvalidTarget {
                id,
                expected: "an element",
            });
        }
        if let Some(entry) = node.attributes.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value.to_owned();
        } else {
            node.attributes.push((name.to_owned(), value.to_owned()));
        }
        Ok(())
    }

    fn merge_style(&mut self, id: NodeId, entries: &StyleBag) -> Result<(), CoreError> {
        let node = self.node_mut(id)?;
        for (key, value) in entries {
            if let Some(entry) = node.style.iter_mut().find(|(k, _)| k == key) {
                entry.1 = value.clone();
            } else {
                node.style.push((key.clone(), value.clone()));
            }
        }
        Ok(())
    }

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), CoreError> {
        self.node_mut(id)?
            .listeners
            .push((event.to_owned(), handler));
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CoreError> {
        self.node(child)?;
        let parent_node = self.node_mut(parent)?;
        if matches!(parent_node.kind, MemoryNodeKind::Text { .. }) {
            return Err(CoreError::InvalidTarget {
                id: parent,
                expected: "a parent node",
            });
        }
        parent_node.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<(), CoreError> {
        let parent = self
            .node(old)?
            .parent
            .ok_or(CoreError::InvalidTarget {
                id: old,
                expected: "an attached node",
            })?;
        let parent_node = self.node_mut(parent)?;
        let position = parent_node
            .children
            .iter()
            .position(|&child| child == old)
            .ok_or(CoreError::NodeMissing { id: old })?;
        parent_node.children[position] = new;
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(old)?.parent = None;
        self.remove_recursive(old);
        Ok(())
    }

    fn clear_children(&mut self, id: NodeId) -> Result<(), CoreError> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            self.remove_recursive(child);
        }
        Ok(())
    }

    fn remove_subtree(&mut self, id: NodeId) -> Result<(), CoreError> {
        self.node(id)?;
        self.detach_from_parent(id)?;
        self.remove_recursive(id);
        Ok(())
    }

    fn resolve_container(&self, name: &str) -> Option<NodeId> {
        self.containers.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_node_swaps_position_and_discards_old_subtree() {
        let mut tree = MemoryTree::new();
        let root = tree.register_container("root");
        let old = tree.create_element("div");
        let old_text = tree.create_text("before");
        tree.append_child(old, old_text).unwrap();
        tree.append_child(root, old).unwrap();

        let new = tree.create_element("div");
        let new_text = tree.create_text("after");
        tree.append_child(new, new_text).unwrap();
        tree.replace_node(old, new).unwrap();

        assert_eq!(tree.children_of(root).unwrap(), vec![new]);
        assert_eq!(tree.text_content(root).unwrap(), "after");
        assert!(matches!(
            tree.text_content(old),
            Err(CoreError::NodeMissing { .. })
        ));
    }

    #[test]
    fn merge_style_overwrites_existing_keys() {
        let mut tree = MemoryTree::new();
        let id = tree.create_element("div");
        let first: StyleBag = vec![
            ("color".to_owned(), "red".to_owned()),
            ("margin".to_owned(), "4px".to_owned()),
        ];
        let second: StyleBag = vec![("color".to_owned(), "blue".to_owned())];
        tree.merge_style(id, &first).unwrap();
        tree.merge_style(id, &second).unwrap();
        assert_eq!(tree.style_of(id, "color").unwrap(), Some("blue"));
        assert_eq!(tree.style_of(id, "margin").unwrap(), Some("4px"));
    }

    #[test]
    fn attributes_reject_text_targets() {
        let mut tree = MemoryTree::new();
        let text = tree.create_text("hi");
        assert!(matches!(
            tree.set_attribute(text, "id", "x"),
            Err(CoreError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn dispatch_fires_listeners_in_binding_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut tree = MemoryTree::new();
        let id = tree.create_element("button");
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let first = order.clone();
        let second = order.clone();
        tree.add_listener(id, "click", EventHandler::new(move |_| first.borrow_mut().push("a")))
            .unwrap();
        tree.add_listener(id, "click", EventHandler::new(move |_| second.borrow_mut().push("b")))
            .unwrap();
        let fired = tree.dispatch(id, "click").unwrap();
        assert_eq!(fired, 2);
        assert_eq!(*order.borrow(), ["a", "b"]);
    }
}
