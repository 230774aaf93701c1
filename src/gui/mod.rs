pub mod canvas_view;
pub mod chat_panel;
pub mod frontend;
pub mod level_bar;
pub mod node_view;

use crate::mindmap::model::{LevelNo, NodeId};

/// Requests raised by the views while the store is locked. Synchronous edits
/// are applied in place; everything here runs after the lock is released.
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    GenerateInitial(String),
    GenerateChildren(NodeId),
    Renew(NodeId),
    SendChat(String),
    Report,
    SlideLeft,
    SlideRight,
    FocusLevel(LevelNo),
    // User took over the viewport (pan/zoom)
    StopSlide,
}
