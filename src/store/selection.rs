use std::collections::BTreeMap;

use crate::mindmap::graph::MindMap;
use crate::mindmap::model::{LevelNo, NodeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    Selected { previous: Option<NodeId> },
    Deselected,
}

/// One selected node per level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionMap {
    by_level: BTreeMap<LevelNo, NodeId>,
}

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(by_level: BTreeMap<LevelNo, NodeId>) -> Self {
        Self { by_level }
    }

    pub fn as_map(&self) -> &BTreeMap<LevelNo, NodeId> {
        &self.by_level
    }

    pub fn get(&self, level: LevelNo) -> Option<NodeId> {
        self.by_level.get(&level).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_level.len()
    }

    // Clicking the already selected node deselects it
    pub fn toggle(&mut self, level: LevelNo, id: NodeId) -> SelectionChange {
        match self.by_level.get(&level) {
            Some(cur) if *cur == id => {
                self.by_level.remove(&level);
                SelectionChange::Deselected
            }
            _ => {
                let previous = self.by_level.insert(level, id);
                SelectionChange::Selected { previous }
            }
        }
    }

    pub fn clear_level(&mut self, level: LevelNo) -> Option<NodeId> {
        self.by_level.remove(&level)
    }

    pub fn clear(&mut self) {
        self.by_level.clear();
    }

    pub fn remove_node(&mut self, id: NodeId) {
        self.by_level.retain(|_, sel| *sel != id);
    }

    pub fn retain_existing(&mut self, map: &MindMap) {
        self.by_level.retain(|level, id| map.get_node(*id).is_some_and(|n| n.level == *level));
    }

    // Re-key entries at or above `from` by `delta`
    pub fn shift_from(&mut self, from: LevelNo, delta: i32) {
        let moved: Vec<(LevelNo, NodeId)> = self
            .by_level
            .iter()
            .filter(|(level, _)| **level >= from)
            .map(|(level, id)| (*level, *id))
            .collect();
        for (level, _) in &moved {
            self.by_level.remove(level);
        }
        for (level, id) in moved {
            self.by_level.insert(level.saturating_add_signed(delta), id);
        }
    }

    /// Selected nodes from level 1 upwards, stopping at the first gap or at a
    /// selection that is not a child of the previous one.
    pub fn selected_chain(&self, map: &MindMap) -> Vec<NodeId> {
        let mut chain: Vec<NodeId> = Vec::new();
        let mut level = 1;
        while let Some(id) = self.get(level) {
            let Some(node) = map.get_node(id) else { break };
            if let Some(prev) = chain.last() {
                if node.parent_id != Some(*prev) {
                    break;
                }
            }
            chain.push(id);
            level += 1;
        }
        chain
    }
}

// Renderers call this every frame instead of caching a per-node flag
pub fn is_highlighted(selection: &SelectionMap, id: NodeId) -> bool {
    selection.by_level.values().any(|sel| *sel == id)
}
