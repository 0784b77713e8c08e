//! Arena-backed search tree.
//!
//! Nodes live in a single `Vec` owned by [`Tree`] and refer to each other by
//! [`NodeId`]. Children are owned through the arena; the parent link is a plain
//! index and never keeps anything alive.

/// Index of a node inside a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The node a tree is created with.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One candidate state of the artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Full accumulated content at this point.
    pub state: String,
    /// Content this node added relative to its parent (empty for root).
    pub increment: String,
    /// Back reference for upward walks. `None` for the tree root.
    pub parent: Option<NodeId>,
    /// Children in creation order.
    pub children: Vec<NodeId>,
    /// Number of backpropagations through this node.
    pub visits: u32,
    /// Sum of all scores backpropagated through this node.
    pub value: f64,
    /// External evidence handed to the generation oracle. Read-only to the search.
    pub annotations: Vec<String>,
}

impl Node {
    pub fn new(state: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            state: state.into(),
            increment: String::new(),
            parent,
            children: Vec::new(),
            visits: 0,
            value: 0.0,
            annotations: Vec::new(),
        }
    }

    pub fn with_increment(mut self, increment: impl Into<String>) -> Self {
        self.increment = increment.into();
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<String>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Mean score per visit, or `None` if the node was never scored.
    pub fn mean_value(&self) -> Option<f64> {
        if self.visits == 0 {
            None
        } else {
            Some(self.value / f64::from(self.visits))
        }
    }
}

/// Search tree owning every node ever created.
///
/// The tree only grows. Nothing is evicted until the whole tree is dropped.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree whose root holds `state`.
    pub fn new(state: impl Into<String>) -> Self {
        Self::with_root(Node::new(state, None))
    }

    /// Create a tree from a prepared root node (e.g. one carrying annotations).
    ///
    /// Links and statistics on `root` are reset so the tree starts clean.
    pub fn with_root(mut root: Node) -> Self {
        root.parent = None;
        root.children.clear();
        root.visits = 0;
        root.value = 0.0;
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// # Panics
    /// Panics if `id` was not produced by this tree.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// # Panics
    /// Panics if `id` was not produced by this tree.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Append a child under `parent` and return its id.
    ///
    /// The child's state is `parent.state + separator + increment`, with the
    /// separator dropped when the parent state is empty. The child starts
    /// unvisited with an empty annotation list.
    pub fn add_child(&mut self, parent: NodeId, separator: &str, increment: &str) -> NodeId {
        let state = join_state(&self.get(parent).state, separator, increment);

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(state, Some(parent)).with_increment(increment));
        self.get_mut(parent).children.push(id);
        id
    }

    /// Ids from the tree root down to `id`, inclusive.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Number of edges between the tree root and `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path(id).len() - 1
    }

    /// Indented outline of the subtree under `from`, at most `max_lines` lines.
    pub fn summarize(&self, from: NodeId, max_lines: usize) -> String {
        let mut lines = Vec::new();
        let mut stack = vec![(from, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            if lines.len() >= max_lines {
                break;
            }
            let node = self.get(id);
            let mean = node
                .mean_value()
                .map(|m| format!("{m:.2}"))
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "{}- {} {:?} (visits={}, mean={})",
                "  ".repeat(depth),
                id,
                preview(&node.increment, 40),
                node.visits,
                mean
            ));
            for child in node.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        lines.join("\n")
    }
}

/// Concatenate a parent state and a new increment.
pub fn join_state(parent_state: &str, separator: &str, increment: &str) -> String {
    let separator = if parent_state.is_empty() { "" } else { separator };
    let mut state = String::with_capacity(parent_state.len() + separator.len() + increment.len());
    state.push_str(parent_state);
    state.push_str(separator);
    state.push_str(increment);
    state
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
