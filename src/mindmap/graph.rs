use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::model::{Edge, EdgeKind, LevelNo, Node, NodeId};

// Node and edge storage for one mind map. Insertion order is kept so the
// column layout and exported files stay stable between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MindMap {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl MindMap {
    // Instantiate a new, empty map
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut map = Self { nodes, edges };
        map.prune_dangling_edges();
        map
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    pub fn original(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_original())
    }

    // Insert a prepared node; a parent that exists gets an edge to it and
    // dictates the node's level.
    pub fn insert_node(&mut self, mut node: Node) -> NodeId {
        let id = node.id;
        if let Some(pid) = node.parent_id {
            if let Some(parent) = self.get_node_mut(pid) {
                parent.has_children = true;
                node.level = parent.level + 1;
                self.edges.push(Edge::new(pid, id, EdgeKind::SmoothStep));
            }
        }
        self.nodes.push(node);
        id
    }

    // Add a keyword child under `parent`; returns None if the parent is gone
    pub fn add_child(&mut self, parent: NodeId, content: impl Into<String>, has_children: bool) -> Option<NodeId> {
        let level = self.get_node(parent)?.level + 1;
        let mut node = Node::keyword(content, level, Some(parent));
        node.can_expand = has_children;
        Some(self.insert_node(node))
    }

    pub fn update_content(&mut self, id: NodeId, content: String) -> bool {
        if let Some(node) = self.get_node_mut(id) {
            node.content = content;
            true
        } else {
            false
        }
    }

    pub fn toggle_expanded(&mut self, id: NodeId) -> Option<bool> {
        let node = self.get_node_mut(id)?;
        node.is_expanded = !node.is_expanded;
        Some(node.is_expanded)
    }

    // Parent only counts when it still exists; otherwise the node is root-like
    pub fn parent_of(&self, id: NodeId) -> Option<&Node> {
        let pid = self.get_node(id)?.parent_id?;
        self.get_node(pid)
    }

    pub fn children_of(&self, id: NodeId) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.parent_id == Some(id)).collect()
    }

    pub fn nodes_at_level(&self, level: LevelNo) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.level == level && !n.is_original()).collect()
    }

    pub fn count_at_level(&self, level: LevelNo) -> usize {
        self.nodes.iter().filter(|n| n.level == level && !n.is_original()).count()
    }

    // All ids below `id`, not including `id` itself
    pub fn descendants_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        seen.insert(id);
        let mut frontier = vec![id];
        while let Some(cur) = frontier.pop() {
            for child in self.nodes.iter().filter(|n| n.parent_id == Some(cur)) {
                if seen.insert(child.id) {
                    out.push(child.id);
                    frontier.push(child.id);
                }
            }
        }
        out
    }

    // Ancestors from the direct parent upwards
    pub fn ancestors_of(&self, id: NodeId) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut cur = id;
        while let Some(parent) = self.parent_of(cur) {
            if !seen.insert(parent.id) {
                break;
            }
            out.push(parent);
            cur = parent.id;
        }
        out
    }

    // Remove a node and its whole subtree. Returns the removed ids.
    pub fn remove_node(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut removed = vec![id];
        removed.extend(self.descendants_of(id));
        let gone: HashSet<NodeId> = removed.iter().copied().collect();
        let parent = self.get_node(id).and_then(|n| n.parent_id);
        self.nodes.retain(|n| !gone.contains(&n.id));
        // Cascade delete edges touching any removed node
        self.edges.retain(|e| !gone.contains(&e.source) && !gone.contains(&e.target));
        if let Some(pid) = parent {
            let still_has = self.nodes.iter().any(|n| n.parent_id == Some(pid));
            if let Some(p) = self.get_node_mut(pid) {
                p.has_children = still_has;
            }
        }
        removed
    }

    pub fn remove_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let child_ids: Vec<NodeId> = self.children_of(id).iter().map(|n| n.id).collect();
        let mut removed = Vec::new();
        for cid in child_ids {
            removed.extend(self.remove_node(cid));
        }
        removed
    }

    // Shift every keyword node at or above `from` by `delta` levels
    pub fn shift_levels_from(&mut self, from: LevelNo, delta: i32) {
        for node in self.nodes.iter_mut().filter(|n| !n.is_original() && n.level >= from) {
            node.level = node.level.saturating_add_signed(delta);
        }
    }

    pub fn prune_dangling_edges(&mut self) -> usize {
        let ids: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        let before = self.edges.len();
        self.edges.retain(|e| ids.contains(&e.source) && ids.contains(&e.target));
        before - self.edges.len()
    }

    // Nodes whose level does not sit above their (existing) parent's level
    pub fn check_levels(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| match self.parent_of(n.id) {
                Some(parent) => n.level <= parent.level,
                None => false,
            })
            .map(|n| n.id)
            .collect()
    }
}
