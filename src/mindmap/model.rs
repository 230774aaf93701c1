use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Basic type aliases for clarity
pub type NodeId = Uuid;
pub type EdgeId = Uuid;
pub type LevelNo = u32;

// The topic node lives left of the level bands
pub const ORIGINAL_LEVEL: LevelNo = 0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Keyword,
    Original,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub content: String,
    pub level: LevelNo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub can_expand: bool,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub is_generating: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub is_expanded: bool,
}

impl Node {
    pub fn keyword(content: impl Into<String>, level: LevelNo, parent_id: Option<NodeId>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: NodeKind::Keyword,
            content: content.into(),
            level,
            parent_id,
            can_expand: true,
            has_children: false,
            is_generating: false,
            is_selected: false,
            is_expanded: false,
        }
    }

    pub fn original(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Original,
            is_expanded: true,
            ..Self::keyword(content, ORIGINAL_LEVEL, None)
        }
    }

    pub fn is_original(&self) -> bool {
        self.kind == NodeKind::Original
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Default,
    Straight,
    Step,
    SmoothStep,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Self { id: Uuid::now_v7(), source, target, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub level: LevelNo,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub node_count: usize,
    #[serde(default)]
    pub is_active: bool,
}

impl Level {
    pub fn new(level: LevelNo, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            label: label.into(),
            description: description.into(),
            node_count: 0,
            is_active: false,
        }
    }
}

/// Pan offset and scale applied uniformly to canvas content.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}
