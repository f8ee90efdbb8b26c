//! Arena-backed mutable document tree.
//!
//! The host-tree abstraction the engine works against: element and text
//! nodes, child enumeration, insertion and removal, attributes and classes,
//! plus a journal of [`Mutation`] records that stands in for a mutation
//! observer subscription. Node slots are never reused, so a stale [`NodeId`]
//! held across a splice is detectable via [`Tree::is_alive`] rather than
//! aliasing a different node.

use smol_str::SmolStr;

/// Element names treated as line/paragraph breaks when merging runs.
const BREAK_TAGS: &[&str] = &["br"];

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    /// Pre-rendered markup handed back by the renderer. Serialized verbatim;
    /// the engine never looks inside it.
    Fragment(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: SmolStr,
    attrs: Vec<(SmolStr, String)>,
}

impl ElementData {
    fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        match self.attrs.iter_mut().find(|(key, _)| key == "class") {
            Some((_, list)) if !list.is_empty() => {
                list.push(' ');
                list.push_str(class);
            }
            Some((_, list)) => list.push_str(class),
            None => self.attrs.push((SmolStr::new_static("class"), class.to_string())),
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    alive: bool,
}

/// One tree-mutation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Children were inserted into or removed from this node.
    ChildrenChanged(NodeId),
    /// This text node's content changed.
    TextChanged(NodeId),
}

impl Mutation {
    /// The node a scan should start from for this record.
    pub fn target(self) -> NodeId {
        match self {
            Mutation::ChildrenChanged(id) | Mutation::TextChanged(id) => id,
        }
    }
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    journal: Vec<Mutation>,
    journal_paused: bool,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty document: a lone `body` element.
    pub fn new() -> Self {
        let root_node = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(ElementData::new("body")),
            alive: true,
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
            journal: Vec::new(),
            journal_paused: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
            alive: true,
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<SmolStr>) -> NodeId {
        self.push_node(NodeKind::Element(ElementData::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    /// Create a detached verbatim-markup node.
    pub fn create_fragment(&mut self, markup: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Fragment(markup.into()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Break elements (`<br>`) separate lines but still belong to a run.
    pub fn is_break(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|el| BREAK_TAGS.contains(&el.name.as_str()))
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).alive
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Position of `id` among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// True if `ancestor` is `id` or any node above it.
    pub fn is_in_subtree(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == ancestor {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    /// Walks `id` and its ancestors, returning true if any element matches.
    pub fn ancestor_or_self_matches(
        &self,
        id: NodeId,
        mut pred: impl FnMut(&ElementData) -> bool,
    ) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if let Some(el) = self.element(node)
                && pred(el)
            {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    fn record(&mut self, mutation: Mutation) {
        if !self.journal_paused {
            self.journal.push(mutation);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child must be detached");
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
        self.record(Mutation::ChildrenChanged(parent));
    }

    /// Detach `id` from its parent and mark its whole subtree dead.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
            self.record(Mutation::ChildrenChanged(parent));
        }
        self.mark_dead(id);
    }

    fn mark_dead(&mut self, id: NodeId) {
        self.node_mut(id).alive = false;
        let children = self.node(id).children.clone();
        for child in children {
            self.mark_dead(child);
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(content) => *content = text.into(),
            other => panic!("set_text on non-text node: {other:?}"),
        }
        self.record(Mutation::TextChanged(id));
    }

    /// Drain the mutation journal. Each call returns one batch.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    /// Run `f` with mutation recording suspended. The reconciler splices
    /// under this so its own edits are not re-observed as new content.
    pub fn with_journal_paused<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let was_paused = self.journal_paused;
        self.journal_paused = true;
        let out = f(self);
        self.journal_paused = was_paused;
        out
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(self.root, &mut out);
        out
    }

    /// Serialize one node and its subtree.
    pub fn html_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => {
                out.push_str(&html_escape::encode_text(text));
            }
            NodeKind::Fragment(markup) => out.push_str(markup),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (key, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                if self.is_break(id) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }

    /// Text-bearing leaves under `root`, in document order, skipping any
    /// subtree rejected by `skip`.
    pub fn text_leaves_where(
        &self,
        root: NodeId,
        skip: &mut impl FnMut(&ElementData) -> bool,
    ) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        self.collect_text_leaves(root, skip, &mut leaves);
        leaves
    }

    fn collect_text_leaves(
        &self,
        id: NodeId,
        skip: &mut impl FnMut(&ElementData) -> bool,
        leaves: &mut Vec<NodeId>,
    ) {
        match &self.node(id).kind {
            NodeKind::Text(_) => leaves.push(id),
            NodeKind::Fragment(_) => {}
            NodeKind::Element(el) => {
                if skip(el) {
                    return;
                }
                for &child in self.children(id) {
                    self.collect_text_leaves(child, skip, leaves);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_serializes() {
        let mut tree = Tree::new();
        let p = tree.create_element("p");
        let text = tree.create_text("a < b & c");
        tree.append_child(tree.root(), p);
        tree.append_child(p, text);
        let br = tree.create_element("br");
        tree.append_child(p, br);
        assert_eq!(tree.to_html(), "<body><p>a &lt; b &amp; c<br /></p></body>");
    }

    #[test]
    fn journal_records_inserts_removals_and_edits() {
        let mut tree = Tree::new();
        let p = tree.create_element("p");
        let text = tree.create_text("hi");
        tree.append_child(tree.root(), p);
        tree.append_child(p, text);
        tree.set_text(text, "bye");
        tree.remove(p);
        let records = tree.take_mutations();
        assert_eq!(
            records,
            vec![
                Mutation::ChildrenChanged(tree.root()),
                Mutation::ChildrenChanged(p),
                Mutation::TextChanged(text),
                Mutation::ChildrenChanged(tree.root()),
            ]
        );
        assert!(tree.take_mutations().is_empty());
    }

    #[test]
    fn paused_journal_swallows_records() {
        let mut tree = Tree::new();
        let p = tree.create_element("p");
        tree.with_journal_paused(|t| {
            let root = t.root();
            t.append_child(root, p);
        });
        assert!(tree.take_mutations().is_empty());
    }

    #[test]
    fn removal_kills_the_subtree() {
        let mut tree = Tree::new();
        let p = tree.create_element("p");
        let text = tree.create_text("hi");
        tree.append_child(tree.root(), p);
        tree.append_child(p, text);
        tree.remove(p);
        assert!(!tree.is_alive(p));
        assert!(!tree.is_alive(text));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn classes_and_attrs() {
        let mut tree = Tree::new();
        let span = tree.create_element("span");
        let el = tree.element_mut(span).unwrap();
        el.add_class("math");
        el.add_class("math-inline");
        el.set_attr("data-x", "1");
        el.set_attr("data-x", "2");
        let el = tree.element(span).unwrap();
        assert!(el.has_class("math"));
        assert!(el.has_class("math-inline"));
        assert!(!el.has_class("math-in"));
        assert_eq!(el.attr("data-x"), Some("2"));
    }

    #[test]
    fn text_leaf_walk_skips_subtrees() {
        let mut tree = Tree::new();
        let p = tree.create_element("p");
        let a = tree.create_text("a");
        let code = tree.create_element("code");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        tree.append_child(tree.root(), p);
        tree.append_child(p, a);
        tree.append_child(p, code);
        tree.append_child(code, b);
        tree.append_child(p, c);
        let leaves = tree.text_leaves_where(tree.root(), &mut |el| el.name == "code");
        assert_eq!(leaves, vec![a, c]);
    }
}
