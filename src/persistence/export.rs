use std::path::{Path, PathBuf};

use crate::store::CanvasStore;

// Outline export: one row per keyword node, ordered by level then insertion.
// Columns: level,level_label,content,parent,selected
pub fn export_outline_csv(store: &CanvasStore, path: &Path) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["level", "level_label", "content", "parent", "selected"])?;
    let map = store.map();
    let mut nodes: Vec<_> = map.nodes.iter().enumerate().filter(|(_, n)| !n.is_original()).collect();
    nodes.sort_by_key(|(idx, n)| (n.level, *idx));
    for (_, node) in nodes {
        let label = store
            .levels()
            .iter()
            .find(|l| l.level == node.level)
            .map(|l| l.label.as_str())
            .unwrap_or("");
        let parent = map.parent_of(node.id).map(|p| p.content.as_str()).unwrap_or("");
        let selected = if store.is_highlighted(node.id) { "yes" } else { "" };
        wtr.write_record([node.level.to_string().as_str(), label, node.content.as_str(), parent, selected])?;
    }
    wtr.flush()?;
    log::info!("outline exported to {}", path.display());
    Ok(path.to_path_buf())
}
