pub mod actions;
pub mod error;
pub mod levels;
pub mod selection;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ai::ChatMessage;
use crate::ai::parse::{LevelPlan, PlannedNode};
use crate::ai::prompts::ChildContext;
use crate::mindmap::graph::MindMap;
use crate::mindmap::model::{Edge, Level, LevelNo, Node, NodeId, Viewport};
use crate::persistence::snapshot::{SNAPSHOT_VERSION, SnapshotFile};

use error::AppError;
use levels::{LevelError, LevelTable};
use selection::{SelectionChange, SelectionMap};

pub const DEFAULT_MAX_HISTORY: usize = 20;

/// How a second "generate" request for a node that is already generating is handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    // Both requests run and both sets of children are appended
    #[default]
    Allow,
    // The second request is skipped while the first is in flight
    Coalesce,
}

/// Application state shared by every view. All mutations go through the
/// methods below; views hold a reference, async actions a `SharedStore`.
#[derive(Clone, Debug)]
pub struct CanvasStore {
    map: MindMap,
    levels: LevelTable,
    viewport: Viewport,
    selection: SelectionMap,
    topic: String,
    created_at: OffsetDateTime,
    in_flight: usize,
    generating: HashMap<NodeId, usize>,
    error: Option<AppError>,
    chat: Vec<ChatMessage>,
    report: Option<String>,
    history: Vec<SnapshotFile>,
    max_history: usize,
    duplicate_policy: DuplicatePolicy,
    revision: u64,
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasStore {
    pub fn new() -> Self {
        Self {
            map: MindMap::new(),
            levels: LevelTable::new(),
            viewport: Viewport::default(),
            selection: SelectionMap::new(),
            topic: String::new(),
            created_at: OffsetDateTime::now_utc(),
            in_flight: 0,
            generating: HashMap::new(),
            error: None,
            chat: Vec::new(),
            report: None,
            history: Vec::new(),
            max_history: DEFAULT_MAX_HISTORY,
            duplicate_policy: DuplicatePolicy::default(),
            revision: 0,
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_max_history(mut self, max: usize) -> Self {
        self.set_max_history(max);
        self
    }

    pub fn set_max_history(&mut self, max: usize) {
        self.max_history = max.max(1);
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    // --- reads ---

    pub fn map(&self) -> &MindMap {
        &self.map
    }

    pub fn nodes(&self) -> &[Node] {
        &self.map.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.map.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.map.get_node(id)
    }

    pub fn levels(&self) -> &[Level] {
        self.levels.as_slice()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn history(&self) -> &[SnapshotFile] {
        &self.history
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    pub fn set_duplicate_policy(&mut self, policy: DuplicatePolicy) {
        self.duplicate_policy = policy;
    }

    // Bumped on every mutation; autosave compares it
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // Level node counts and node selection flags are derived after each change
    fn refresh_derived(&mut self) {
        let map = &self.map;
        self.levels.update_counts(|level| map.count_at_level(level));
        for node in self.map.nodes.iter_mut() {
            node.is_selected = selection::is_highlighted(&self.selection, node.id);
            node.is_generating = self.generating.get(&node.id).is_some_and(|n| *n > 0);
        }
        self.touch();
    }

    // --- synchronous setters ---

    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.map.nodes = nodes;
        self.map.prune_dangling_edges();
        self.selection.retain_existing(&self.map);
        self.refresh_derived();
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.map.edges = edges;
        let dropped = self.map.prune_dangling_edges();
        if dropped > 0 {
            log::warn!("dropped {} edge(s) with missing endpoints", dropped);
        }
        self.touch();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = sanitize_viewport(viewport);
        self.touch();
    }

    pub fn set_viewport_x(&mut self, x: f32) {
        if x.is_finite() {
            self.viewport.x = x;
            self.touch();
        }
    }

    pub fn set_levels(&mut self, levels: Vec<Level>) {
        self.levels = LevelTable::from_levels(levels);
        self.refresh_derived();
    }

    pub fn set_error(&mut self, error: AppError) {
        log::warn!("{}", error);
        self.error = Some(error);
        self.touch();
    }

    pub fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.touch();
        }
    }

    // --- selection ---

    /// Select `id` at its level (deselecting any other node there), or
    /// deselect it if it is already the selection.
    pub fn select_node(&mut self, id: NodeId) -> Option<SelectionChange> {
        let level = self.map.get_node(id)?.level;
        let change = self.selection.toggle(level, id);
        if let SelectionChange::Selected { .. } = change {
            self.levels.set_active(level);
        }
        self.refresh_derived();
        Some(change)
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        selection::is_highlighted(&self.selection, id)
    }

    pub fn selected_chain(&self) -> Vec<&Node> {
        self.selection
            .selected_chain(&self.map)
            .into_iter()
            .filter_map(|id| self.map.get_node(id))
            .collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.refresh_derived();
    }

    // --- levels ---

    pub fn insert_level_after(&mut self, after: LevelNo, label: String, description: String) -> Result<LevelNo, LevelError> {
        let number = self.levels.insert_after(after, label, description)?;
        self.map.shift_levels_from(after + 1, 1);
        self.selection.shift_from(after + 1, 1);
        self.refresh_derived();
        log::info!("inserted level {} ({} levels)", number, self.levels.len());
        Ok(number)
    }

    /// Delete a level together with its nodes (and their subtrees). The last
    /// remaining level cannot be deleted.
    pub fn delete_level(&mut self, level: LevelNo) -> Result<(), LevelError> {
        if !self.levels.can_delete() {
            log::debug!("refusing to delete the last level");
            return Err(LevelError::LastLevel);
        }
        self.levels.delete(level)?;
        let doomed: Vec<NodeId> = self.map.nodes_at_level(level).iter().map(|n| n.id).collect();
        for id in doomed {
            for removed in self.map.remove_node(id) {
                self.selection.remove_node(removed);
                self.generating.remove(&removed);
            }
        }
        self.selection.clear_level(level);
        self.map.shift_levels_from(level + 1, -1);
        self.selection.shift_from(level + 1, -1);
        self.refresh_derived();
        log::info!("deleted level {} ({} levels left)", level, self.levels.len());
        Ok(())
    }

    pub fn edit_level(&mut self, level: LevelNo, label: String, description: String) -> bool {
        let ok = self.levels.edit(level, label, description);
        if ok {
            self.touch();
        }
        ok
    }

    pub fn set_active_level(&mut self, level: LevelNo) -> bool {
        let ok = self.levels.set_active(level);
        if ok {
            self.touch();
        }
        ok
    }

    pub fn active_level(&self) -> Option<LevelNo> {
        self.levels.active()
    }

    // --- nodes ---

    /// Start a fresh map for `topic`: one original node, no levels.
    pub fn reset_with_topic(&mut self, topic: &str) -> NodeId {
        self.map = MindMap::new();
        let id = self.map.insert_node(Node::original(topic.trim()));
        self.levels = LevelTable::new();
        self.selection.clear();
        self.generating.clear();
        self.topic = topic.trim().to_string();
        self.created_at = OffsetDateTime::now_utc();
        self.report = None;
        self.error = None;
        self.viewport = Viewport::default();
        self.refresh_derived();
        id
    }

    pub fn add_child_node(&mut self, parent: NodeId, content: &str) -> Result<NodeId, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Node text cannot be empty"));
        }
        let parent_level = self
            .map
            .get_node(parent)
            .ok_or_else(|| AppError::validation("Parent node no longer exists"))?
            .level;
        if parent_level as usize >= self.levels.len() {
            return Err(AppError::validation(format!("Level {} is the last level", parent_level)).with_node(parent));
        }
        let id = self
            .map
            .add_child(parent, content, true)
            .ok_or_else(|| AppError::validation("Parent node no longer exists"))?;
        if let Some(p) = self.map.get_node_mut(parent) {
            p.is_expanded = true;
        }
        self.refresh_derived();
        Ok(id)
    }

    pub fn edit_node_content(&mut self, id: NodeId, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }
        let ok = self.map.update_content(id, content.to_string());
        if ok {
            if self.map.get_node(id).is_some_and(|n| n.is_original()) {
                self.topic = content.to_string();
            }
            self.touch();
        }
        ok
    }

    pub fn toggle_expanded(&mut self, id: NodeId) -> Option<bool> {
        let expanded = self.map.toggle_expanded(id)?;
        self.touch();
        Some(expanded)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let removed = self.map.remove_node(id);
        for r in &removed {
            self.selection.remove_node(*r);
            self.generating.remove(r);
        }
        if !removed.is_empty() {
            self.refresh_derived();
        }
        removed
    }

    // --- generation bookkeeping (driven by `actions`) ---

    fn begin_loading(&mut self) {
        self.in_flight += 1;
        self.touch();
    }

    fn end_loading(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.touch();
    }

    // None when the policy coalesces a duplicate request
    fn begin_children(&mut self, id: NodeId) -> Result<Option<ChildContext>, AppError> {
        let node = self
            .map
            .get_node(id)
            .ok_or_else(|| AppError::validation("Node no longer exists"))?;
        let target_level = node.level + 1;
        if target_level as usize > self.levels.len() {
            return Err(AppError::validation(format!("Level {} is the last level", node.level)).with_node(id));
        }
        if self.duplicate_policy == DuplicatePolicy::Coalesce && self.generating.get(&id).is_some_and(|n| *n > 0) {
            log::debug!("generation for {} already running; coalesced", id);
            return Ok(None);
        }

        let mut path: Vec<String> = self
            .map
            .ancestors_of(id)
            .iter()
            .filter(|a| !a.is_original())
            .map(|a| a.content.clone())
            .collect();
        path.reverse();
        let siblings = match node.parent_id {
            Some(pid) => self
                .map
                .children_of(pid)
                .iter()
                .filter(|n| n.id != id)
                .map(|n| n.content.clone())
                .collect(),
            None => Vec::new(),
        };
        let existing_children = self.map.children_of(id).iter().map(|n| n.content.clone()).collect();
        let level = self.levels.get(target_level);
        let ctx = ChildContext {
            topic: self.topic.clone(),
            node_content: node.content.clone(),
            path,
            siblings,
            existing_children,
            target_level,
            level_label: level.map(|l| l.label.clone()),
            level_description: level.map(|l| l.description.clone()),
        };

        *self.generating.entry(id).or_insert(0) += 1;
        self.in_flight += 1;
        self.refresh_derived();
        Ok(Some(ctx))
    }

    fn end_children(&mut self, id: NodeId) {
        if let Some(n) = self.generating.get_mut(&id) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                self.generating.remove(&id);
            }
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        self.refresh_derived();
    }

    fn append_children(&mut self, parent: NodeId, children: Vec<PlannedNode>) -> Vec<NodeId> {
        let Some(parent_level) = self.map.get_node(parent).map(|n| n.level) else {
            log::warn!("node {} was removed while generating; dropping {} children", parent, children.len());
            return Vec::new();
        };
        let mut ids = Vec::with_capacity(children.len());
        let last = self.levels.last_level();
        for child in children {
            if child.level != parent_level + 1 {
                log::debug!("model placed '{}' at level {}; using {}", child.content, child.level, parent_level + 1);
            }
            let can_expand = child.has_children && parent_level + 1 < last;
            if let Some(id) = self.map.add_child(parent, child.content.trim(), can_expand) {
                ids.push(id);
            }
        }
        if let Some(p) = self.map.get_node_mut(parent) {
            p.is_expanded = true;
        }
        self.refresh_derived();
        ids
    }

    fn apply_plan(&mut self, topic: &str, plan: LevelPlan) -> Vec<NodeId> {
        let original = self.reset_with_topic(topic);
        self.levels = LevelTable::from_levels(
            plan.levels
                .into_iter()
                .map(|l| Level::new(l.level, l.label, l.description))
                .collect(),
        );
        let last = self.levels.last_level();
        let mut ids = Vec::new();
        for planned in plan.initial_nodes {
            if planned.level != 1 {
                log::debug!("skipping initial node '{}' at level {}", planned.content, planned.level);
                continue;
            }
            if let Some(id) = self.map.add_child(original, planned.content.trim(), planned.has_children && last > 1) {
                ids.push(id);
            }
        }
        self.levels.set_active(1);
        self.refresh_derived();
        log::info!("plan applied: {} levels, {} starting nodes", self.levels.len(), ids.len());
        ids
    }

    fn push_chat(&mut self, message: ChatMessage) {
        self.chat.push(message);
        self.touch();
    }

    fn set_report(&mut self, report: String) {
        self.report = Some(report);
        self.touch();
    }

    // --- snapshots ---

    pub fn capture_snapshot(&self, title: &str) -> SnapshotFile {
        let title = if title.trim().is_empty() { self.topic.clone() } else { title.trim().to_string() };
        SnapshotFile {
            version: SNAPSHOT_VERSION.to_string(),
            title,
            topic: self.topic.clone(),
            created_at: self.created_at,
            exported_at: OffsetDateTime::now_utc(),
            nodes: self.map.nodes.clone(),
            edges: self.map.edges.clone(),
            viewport: self.viewport,
            levels: self.levels.to_vec(),
            selected_path: self.selection.as_map().clone(),
            chat: self.chat.clone(),
        }
    }

    pub fn push_history(&mut self, snapshot: SnapshotFile) {
        self.history.push(snapshot);
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    /// Export: capture the current state and remember it in the history.
    pub fn export_snapshot(&mut self, title: &str) -> SnapshotFile {
        let snap = self.capture_snapshot(title);
        self.push_history(snap.clone());
        snap
    }

    /// Replace the whole state with `snapshot`. The previous state goes to
    /// the history first.
    pub fn import_snapshot(&mut self, snapshot: SnapshotFile) {
        let before = self.capture_snapshot("");
        self.push_history(before);
        self.apply_snapshot(snapshot);
    }

    pub fn restore_history(&mut self, index: usize) -> Result<(), AppError> {
        let snap = self
            .history
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::validation(format!("No history entry {}", index)))?;
        self.apply_snapshot(snap);
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: SnapshotFile) {
        let mut map = MindMap::from_parts(snapshot.nodes, snapshot.edges);
        for node in map.nodes.iter_mut() {
            node.is_generating = false;
        }
        let mut selection = SelectionMap::from_map(snapshot.selected_path);
        selection.retain_existing(&map);
        self.map = map;
        self.levels = LevelTable::from_levels(snapshot.levels);
        self.selection = selection;
        self.viewport = sanitize_viewport(snapshot.viewport);
        self.topic = if snapshot.topic.is_empty() {
            self.map.original().map(|n| n.content.clone()).unwrap_or_default()
        } else {
            snapshot.topic
        };
        self.created_at = snapshot.created_at;
        self.chat = snapshot.chat;
        self.generating.clear();
        self.report = None;
        self.error = None;
        self.refresh_derived();
        log::info!(
            "state replaced: {} nodes, {} edges, {} levels",
            self.map.node_count(),
            self.map.edge_count(),
            self.levels.len()
        );
    }
}

fn sanitize_viewport(v: Viewport) -> Viewport {
    if v.x.is_finite() && v.y.is_finite() && v.zoom.is_finite() && v.zoom > 0.0 {
        Viewport {
            zoom: v.zoom.clamp(crate::viewport::transform::MIN_ZOOM, crate::viewport::transform::MAX_ZOOM),
            ..v
        }
    } else {
        Viewport::default()
    }
}
