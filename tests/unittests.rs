use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyplan::ai::client::{build_endpoint, build_request_body, extract_text, http_error, GenerateResponse};
use anyplan::ai::error::AiError;
use anyplan::ai::parse::{parse_children, parse_level_plan, strip_code_fences};
use anyplan::ai::prompts::{children_prompt, ChildContext, SYSTEM_PROMPT};
use anyplan::ai::{ChatRole, CompletionRequest};
use anyplan::gui::node_view::{visual_for, NodeState};
use anyplan::mindmap::graph::MindMap;
use anyplan::mindmap::model::{Edge, EdgeKind, Level, Node, NodeKind, Viewport};
use anyplan::persistence::settings::AppSettings;
use anyplan::persistence::snapshot::{
    check_file, export_file_name, parse_snapshot, read_snapshot, to_json, write_snapshot, ImportWarning, SnapshotError,
};
use anyplan::persistence::{export, persist};
use anyplan::store::error::{AppError, ErrorCategory, NETWORK_FAILURE_TEXT};
use anyplan::store::levels::{LevelError, LevelTable, MAX_LEVELS};
use anyplan::store::selection::{is_highlighted, SelectionChange, SelectionMap};
use anyplan::store::CanvasStore;
use anyplan::viewport::layout::column_layout;
use anyplan::viewport::level_bar::{layout_level_buttons, show_add_level_controls, LevelBarGeometry};
use anyplan::viewport::slide::{
    centered_offset, ease_in_out_cubic, show_left_slide, show_right_slide, slide_left_target, slide_right_target,
    OverlapPolicy, SlideAnimator, SlideGeometry,
};
use anyplan::viewport::transform::level_band;
use egui::Pos2;
use uuid::Uuid;

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("anyplan-test-{}-{}", tag, Uuid::now_v7()))
}

fn levels(n: u32) -> Vec<Level> {
    (1..=n).map(|l| Level::new(l, format!("L{}", l), "")).collect()
}

// Topic node plus `n` levels, nothing else
fn store_with_levels(n: u32) -> (CanvasStore, Uuid) {
    let mut store = CanvasStore::new();
    let root = store.reset_with_topic("Coffee shop");
    store.set_levels(levels(n));
    (store, root)
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

// --- mind map ---

#[test]
fn mindmap_add_child_sets_level_and_edge() {
    let mut map = MindMap::new();
    let root = map.insert_node(Node::original("Topic"));
    let a = map.add_child(root, "Budget", true).expect("parent exists");
    let b = map.add_child(a, "Rent", false).expect("parent exists");

    assert_eq!(map.get_node(a).map(|n| n.level), Some(1));
    assert_eq!(map.get_node(b).map(|n| n.level), Some(2));
    assert!(map.get_node(root).is_some_and(|n| n.has_children));
    assert_eq!(map.edge_count(), 2);
    assert!(map.edges.iter().all(|e| e.kind == EdgeKind::SmoothStep));
    assert!(map.check_levels().is_empty());
    assert!(map.add_child(Uuid::now_v7(), "orphan", true).is_none());
}

#[test]
fn mindmap_remove_node_cascades_subtree_and_edges() {
    let mut map = MindMap::new();
    let root = map.insert_node(Node::original("Topic"));
    let a = map.add_child(root, "A", true).unwrap();
    let b = map.add_child(a, "B", true).unwrap();
    let _c = map.add_child(b, "C", false).unwrap();
    let d = map.add_child(root, "D", true).unwrap();

    let removed = map.remove_node(a);
    assert_eq!(removed.len(), 3);
    assert_eq!(map.node_count(), 2);
    assert_eq!(map.edge_count(), 1);
    assert!(map.contains(d));
    // root still has D
    assert!(map.get_node(root).is_some_and(|n| n.has_children));

    map.remove_node(d);
    assert!(map.get_node(root).is_some_and(|n| !n.has_children));
    assert!(map.remove_node(d).is_empty());
}

#[test]
fn mindmap_missing_parent_is_root_like_and_dangling_edges_pruned() {
    let ghost = Uuid::now_v7();
    let orphan = Node::keyword("Orphan", 2, Some(ghost));
    let orphan_id = orphan.id;
    let edges = vec![Edge::new(ghost, orphan_id, EdgeKind::Default)];
    let map = MindMap::from_parts(vec![orphan], edges);

    assert_eq!(map.edge_count(), 0);
    assert!(map.parent_of(orphan_id).is_none());
    assert!(map.ancestors_of(orphan_id).is_empty());
    assert!(map.check_levels().is_empty());
}

#[test]
fn mindmap_shift_levels_skips_original() {
    let mut map = MindMap::new();
    let root = map.insert_node(Node::original("Topic"));
    let a = map.add_child(root, "A", true).unwrap();
    let b = map.add_child(a, "B", true).unwrap();
    map.shift_levels_from(2, 1);
    assert_eq!(map.get_node(root).map(|n| n.level), Some(0));
    assert_eq!(map.get_node(a).map(|n| n.level), Some(1));
    assert_eq!(map.get_node(b).map(|n| n.level), Some(3));
    assert!(map.check_levels().is_empty());
}

#[test]
fn mindmap_node_json_uses_camel_case_and_type_tag() {
    let node = Node::keyword("Menu", 1, None);
    let v = serde_json::to_value(&node).unwrap();
    assert_eq!(v["type"], "keyword");
    assert_eq!(v["canExpand"], true);
    assert_eq!(v["hasChildren"], false);
    assert!(v.get("parentId").is_none());
}

// --- levels ---

#[test]
fn levels_insert_after_renumbers_following_levels() {
    let mut table = LevelTable::from_levels(levels(3));
    let n = table.insert_after(1, "New".into(), String::new()).unwrap();
    assert_eq!(n, 2);
    let labels: Vec<(u32, &str)> = table.as_slice().iter().map(|l| (l.level, l.label.as_str())).collect();
    assert_eq!(labels, vec![(1, "L1"), (2, "New"), (3, "L2"), (4, "L3")]);
    assert_eq!(table.insert_after(9, "x".into(), String::new()), Err(LevelError::OutOfRange(9)));
}

#[test]
fn store_insert_level_sweep_keeps_numbering_contiguous() {
    for n in 1..=(MAX_LEVELS as u32 - 1) {
        for k in 0..=n {
            let (mut store, root) = store_with_levels(n);
            // one selected node per level, chained through parent links
            let mut chain = Vec::new();
            let mut parent = root;
            for l in 1..=n {
                let id = store.add_child_node(parent, &format!("N{}", l)).unwrap();
                store.select_node(id);
                chain.push(id);
                parent = id;
            }

            let number = store.insert_level_after(k, "New".into(), String::new()).unwrap();
            assert_eq!(number, k + 1, "n={n} k={k}");
            assert_eq!(store.level_count(), n as usize + 1, "n={n} k={k}");
            let numbers: Vec<u32> = store.levels().iter().map(|l| l.level).collect();
            assert_eq!(numbers, (1..=n + 1).collect::<Vec<_>>(), "n={n} k={k}");
            assert_eq!(store.levels()[k as usize].label, "New", "n={n} k={k}");
            assert_eq!(store.levels()[k as usize].node_count, 0, "n={n} k={k}");

            for (i, id) in chain.iter().enumerate() {
                let old = i as u32 + 1;
                let expected = if old > k { old + 1 } else { old };
                assert_eq!(store.node(*id).map(|nd| nd.level), Some(expected), "n={n} k={k} node {old}");
                assert_eq!(store.selection().get(expected), Some(*id), "n={n} k={k} node {old}");
            }
            assert_eq!(store.selection().get(k + 1), None, "n={n} k={k}");
            assert!(store.map().check_levels().is_empty(), "n={n} k={k}");
        }
    }
}

#[test]
fn levels_capped_at_maximum() {
    let mut table = LevelTable::from_levels(levels(MAX_LEVELS as u32));
    assert!(!table.can_add());
    assert_eq!(table.insert_after(2, "x".into(), String::new()), Err(LevelError::Full { max: MAX_LEVELS }));
    // Oversized input is truncated and renumbered
    let table = LevelTable::from_levels(levels(9));
    assert_eq!(table.len(), MAX_LEVELS);
    assert_eq!(table.last_level(), MAX_LEVELS as u32);
}

#[test]
fn levels_last_one_cannot_be_deleted() {
    let mut table = LevelTable::from_levels(levels(2));
    table.delete(1).unwrap();
    assert_eq!(table.as_slice()[0].level, 1);
    assert_eq!(table.as_slice()[0].label, "L2");
    assert_eq!(table.delete(1), Err(LevelError::LastLevel));
    assert_eq!(table.len(), 1);
}

#[test]
fn store_insert_level_shifts_nodes_and_selection() {
    let (mut store, root) = store_with_levels(3);
    let a = store.add_child_node(root, "A").unwrap();
    let b = store.add_child_node(a, "B").unwrap();
    store.select_node(a);
    store.select_node(b);

    store.insert_level_after(1, "Inserted".into(), String::new()).unwrap();
    assert_eq!(store.level_count(), 4);
    assert_eq!(store.node(a).map(|n| n.level), Some(1));
    assert_eq!(store.node(b).map(|n| n.level), Some(3));
    assert_eq!(store.selection().get(3), Some(b));
    assert_eq!(store.selection().get(2), None);
    assert!(store.map().check_levels().is_empty());
    assert_eq!(store.levels()[2].node_count, 1);
}

#[test]
fn store_delete_level_removes_its_nodes_and_subtrees() {
    let (mut store, root) = store_with_levels(3);
    let a = store.add_child_node(root, "A").unwrap();
    let b = store.add_child_node(a, "B").unwrap();
    let c = store.add_child_node(b, "C").unwrap();
    store.select_node(b);

    store.delete_level(2).unwrap();
    assert_eq!(store.level_count(), 2);
    assert!(store.node(a).is_some());
    assert!(store.node(b).is_none());
    assert!(store.node(c).is_none());
    assert!(store.selection().is_empty());
    assert!(store.node(a).is_some_and(|n| !n.has_children));
}

#[test]
fn store_delete_last_level_is_noop() {
    let (mut store, root) = store_with_levels(1);
    let a = store.add_child_node(root, "A").unwrap();
    let before = store.nodes().to_vec();
    assert_eq!(store.delete_level(1), Err(LevelError::LastLevel));
    assert_eq!(store.level_count(), 1);
    assert_eq!(store.nodes(), before.as_slice());
    assert!(store.node(a).is_some());
}

#[test]
fn store_rejects_children_below_last_level() {
    let (mut store, root) = store_with_levels(1);
    let a = store.add_child_node(root, "A").unwrap();
    let err = store.add_child_node(a, "too deep").unwrap_err();
    assert_eq!(err.category, ErrorCategory::Validation);
    assert!(store.add_child_node(root, "   ").is_err());
}

#[test]
fn store_edit_original_updates_topic() {
    let (mut store, root) = store_with_levels(2);
    assert!(store.edit_node_content(root, "Bakery"));
    assert_eq!(store.topic(), "Bakery");
    assert!(!store.edit_node_content(root, "  "));
}

#[test]
fn store_setters_prune_edges_and_stale_selection() {
    let (mut store, root) = store_with_levels(2);
    let a = store.add_child_node(root, "A").unwrap();
    let b = store.add_child_node(root, "B").unwrap();
    store.select_node(b);

    let kept: Vec<Node> = store.nodes().iter().filter(|n| n.id != b).cloned().collect();
    store.set_nodes(kept);
    assert_eq!(store.nodes().len(), 2);
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.selection().get(1), None);
    assert_eq!(store.levels()[0].node_count, 1);

    let stray = Uuid::now_v7();
    store.set_edges(vec![Edge::new(root, a, EdgeKind::Straight), Edge::new(a, stray, EdgeKind::Default)]);
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].kind, EdgeKind::Straight);
}

// --- selection ---

#[test]
fn selection_one_per_level_and_toggle_off() {
    let (mut store, root) = store_with_levels(2);
    let a = store.add_child_node(root, "A").unwrap();
    let d = store.add_child_node(root, "D").unwrap();

    assert_eq!(store.select_node(a), Some(SelectionChange::Selected { previous: None }));
    assert_eq!(store.select_node(d), Some(SelectionChange::Selected { previous: Some(a) }));
    assert!(!store.is_highlighted(a));
    assert!(store.is_highlighted(d));
    assert!(store.node(d).is_some_and(|n| n.is_selected));
    assert!(store.node(a).is_some_and(|n| !n.is_selected));
    assert_eq!(store.active_level(), Some(1));

    assert_eq!(store.select_node(d), Some(SelectionChange::Deselected));
    assert!(store.selection().is_empty());
}

#[test]
fn selection_chain_follows_parent_links() {
    let (mut store, root) = store_with_levels(3);
    let a = store.add_child_node(root, "A").unwrap();
    let b = store.add_child_node(a, "B").unwrap();
    let d = store.add_child_node(root, "D").unwrap();
    store.select_node(a);
    store.select_node(b);
    let chain: Vec<Uuid> = store.selected_chain().iter().map(|n| n.id).collect();
    assert_eq!(chain, vec![a, b]);

    // B is not a child of D, so the chain stops after level 1
    store.select_node(d);
    let chain: Vec<Uuid> = store.selected_chain().iter().map(|n| n.id).collect();
    assert_eq!(chain, vec![d]);
}

#[test]
fn selection_highlight_is_pure_lookup() {
    let mut sel = SelectionMap::new();
    let x = Uuid::now_v7();
    let y = Uuid::now_v7();
    assert!(!is_highlighted(&sel, x));
    sel.toggle(1, x);
    sel.toggle(2, y);
    assert!(is_highlighted(&sel, x) && is_highlighted(&sel, y));
    sel.shift_from(2, 1);
    assert_eq!(sel.get(3), Some(y));
    sel.remove_node(x);
    assert!(!is_highlighted(&sel, x));
    assert_eq!(sel.len(), 1);
}

// --- viewport ---

#[test]
fn viewport_band_maps_through_affine_transform() {
    let vp = Viewport { x: 100.0, y: 0.0, zoom: 1.0 };
    let band = level_band(1);
    assert_eq!(band.start, 400.0);
    assert_eq!(band.end, 700.0);
    assert_eq!(band.screen_start(&vp), 500.0);

    let zoomed = Viewport { x: -20.0, y: 5.0, zoom: 0.5 };
    let p = zoomed.to_screen(Pos2::new(400.0, 100.0));
    assert!(approx(p.x, 180.0) && approx(p.y, 55.0));
    let back = zoomed.to_canvas(p);
    assert!(approx(back.x, 400.0) && approx(back.y, 100.0));
}

#[test]
fn viewport_zoom_keeps_anchor_fixed_and_clamps() {
    let mut vp = Viewport::default();
    let anchor = Pos2::new(250.0, 120.0);
    let before = vp.to_canvas(anchor);
    vp.zoom_at(anchor, 1.5);
    let after = vp.to_canvas(anchor);
    assert!(approx(before.x, after.x) && approx(before.y, after.y));
    vp.zoom_at(anchor, 100.0);
    assert_eq!(vp.zoom, 2.0);
}

#[test]
fn level_buttons_center_in_band_with_inset() {
    let vp = Viewport { x: 100.0, y: 0.0, zoom: 1.0 };
    let geom = LevelBarGeometry::new(2000.0);
    let buttons = layout_level_buttons(3, &vp, &geom);
    assert_eq!(buttons.len(), 3);
    // 500 + (300 - 120) / 2 - 16
    assert!(approx(buttons[0].left, 574.0));
    assert!(approx(buttons[1].left, 874.0));
    assert!(buttons.iter().all(|b| !b.clamped && b.width == 120.0));

    let small = Viewport { x: 0.0, y: 0.0, zoom: 0.25 };
    let buttons = layout_level_buttons(1, &small, &geom);
    assert!(approx(buttons[0].width, 75.0));
}

#[test]
fn level_buttons_hidden_or_pulled_into_view() {
    let geom = LevelBarGeometry::new(1000.0);
    // Level 1 partly off the left edge
    let vp = Viewport { x: -480.0, y: 0.0, zoom: 1.0 };
    let buttons = layout_level_buttons(2, &vp, &geom);
    assert_eq!(buttons[0].level, 1);
    assert_eq!(buttons[0].left, 0.0);
    assert!(buttons[0].clamped);

    // Level 1 fully off screen: dropped
    let vp = Viewport { x: -700.0, y: 0.0, zoom: 1.0 };
    let buttons = layout_level_buttons(2, &vp, &geom);
    assert_eq!(buttons.len(), 1);
    assert_eq!(buttons[0].level, 2);

    // Partly off the right edge
    let narrow = LevelBarGeometry::new(550.0);
    let buttons = layout_level_buttons(2, &Viewport::default(), &narrow);
    assert_eq!(buttons.len(), 1);
    assert!(approx(buttons[0].left, 430.0));
    assert!(buttons[0].clamped);
}

#[test]
fn add_level_controls_suppressed_at_edges() {
    assert!(!show_add_level_controls(3, 0));
    assert!(!show_add_level_controls(0, 5));
    assert!(!show_add_level_controls(MAX_LEVELS, 5));
    assert!(show_add_level_controls(3, 5));
}

#[test]
fn slide_targets_walk_levels_and_return_home() {
    let geom = SlideGeometry { container_width: 1000.0, level_count: 6 };
    let mut vp = Viewport::default();
    assert!(!show_left_slide(&vp, &geom));
    assert!(show_right_slide(&vp, &geom));

    let right = slide_right_target(&vp, &geom).expect("levels past the edge");
    assert!(approx(right, -650.0));
    vp.x = right;
    assert!(show_left_slide(&vp, &geom));

    let left = slide_left_target(&vp, &geom).expect("level 1 is cut");
    assert!(approx(left, -50.0));
    vp.x = left;
    assert_eq!(slide_left_target(&vp, &geom), Some(0.0));

    let wide = SlideGeometry { container_width: 3000.0, level_count: 6 };
    assert!(!show_right_slide(&Viewport::default(), &wide));
    assert_eq!(slide_right_target(&Viewport::default(), &wide), None);
    assert_eq!(centered_offset(1, 1.0, 3000.0), 0.0);
}

#[test]
fn slide_easing_is_cubic_in_out() {
    assert_eq!(ease_in_out_cubic(0.0), 0.0);
    assert_eq!(ease_in_out_cubic(1.0), 1.0);
    assert!(approx(ease_in_out_cubic(0.5), 0.5));
    assert!(approx(ease_in_out_cubic(0.25), 0.0625));
    assert_eq!(ease_in_out_cubic(2.0), 1.0);
}

#[test]
fn slide_animator_samples_and_finishes() {
    let mut anim = SlideAnimator::new(OverlapPolicy::CancelAndRestart, 0.5);
    anim.start(0.0, -650.0, 10.0).expect("idle animator accepts");
    assert!(anim.is_running());
    assert!(approx(anim.tick(10.25).unwrap(), -325.0));
    assert!(approx(anim.tick(10.5).unwrap(), -650.0));
    assert!(!anim.is_running());
    assert_eq!(anim.tick(10.6), None);
}

#[test]
fn slide_overlap_policies() {
    let mut restart = SlideAnimator::new(OverlapPolicy::CancelAndRestart, 0.5);
    let first = restart.start(0.0, -300.0, 0.0).unwrap();
    let second = restart.start(-100.0, -600.0, 0.1);
    assert!(first.is_cancelled());
    assert!(second.is_some());
    assert_eq!(restart.target(), Some(-600.0));

    let mut ignore = SlideAnimator::new(OverlapPolicy::IgnoreWhileRunning, 0.5);
    let first = ignore.start(0.0, -300.0, 0.0).unwrap();
    assert!(ignore.start(-100.0, -600.0, 0.1).is_none());
    assert!(!first.is_cancelled());
    assert_eq!(ignore.target(), Some(-300.0));

    ignore.cancel();
    assert!(first.is_cancelled());
    assert!(!ignore.is_running());
}

#[test]
fn layout_hides_collapsed_subtrees() {
    let (mut store, root) = store_with_levels(3);
    let a = store.add_child_node(root, "A").unwrap();
    let b = store.add_child_node(a, "B").unwrap();
    let pos = column_layout(store.map());
    assert!(pos.contains_key(&b));
    assert_eq!(pos[&a].x, level_band(1).center());

    store.toggle_expanded(a);
    let pos = column_layout(store.map());
    assert!(pos.contains_key(&a));
    assert!(!pos.contains_key(&b));
}

// --- snapshots ---

fn sample_store() -> (CanvasStore, Uuid, Uuid) {
    let (mut store, root) = store_with_levels(3);
    let a = store.add_child_node(root, "A").unwrap();
    let b = store.add_child_node(a, "B").unwrap();
    store.select_node(a);
    store.set_viewport(Viewport { x: -120.0, y: 10.0, zoom: 0.8 });
    (store, a, b)
}

#[test]
fn snapshot_json_round_trip_restores_state() {
    let (mut store, a, b) = sample_store();
    let snap = store.export_snapshot("My plan");
    assert_eq!(store.history().len(), 1);
    let text = to_json(&snap).unwrap();

    let (parsed, warnings) = parse_snapshot(&text).unwrap();
    assert!(warnings.is_empty());
    let mut other = CanvasStore::new();
    other.import_snapshot(parsed);
    assert_eq!(other.nodes().len(), 3);
    assert_eq!(other.edges().len(), 2);
    assert_eq!(other.level_count(), 3);
    assert_eq!(other.topic(), "Coffee shop");
    assert!(other.is_highlighted(a));
    assert!(!other.is_highlighted(b));
    assert_eq!(other.viewport(), Viewport { x: -120.0, y: 10.0, zoom: 0.8 });
}

#[test]
fn snapshot_missing_levels_leaves_store_untouched() {
    let (mut store, _, _) = sample_store();
    let before = store.capture_snapshot("");
    let text = r#"{"version": "1.0", "nodes": [], "edges": []}"#;

    match parse_snapshot(text) {
        Ok((snap, _)) => store.import_snapshot(snap),
        Err(e) => {
            assert!(matches!(e, SnapshotError::MissingField("levels")));
            store.set_error(AppError::from(&e));
        }
    }
    assert_eq!(store.nodes(), before.nodes.as_slice());
    assert_eq!(store.levels(), before.levels.as_slice());
    assert_eq!(store.error().map(|e| e.category), Some(ErrorCategory::Validation));
}

#[test]
fn snapshot_errors_map_to_categories() {
    let category = |e: SnapshotError| AppError::from(&e).category;
    assert_eq!(category(parse_snapshot("not json").unwrap_err()), ErrorCategory::Validation);
    assert_eq!(category(parse_snapshot("[1]").unwrap_err()), ErrorCategory::Validation);

    let dir = temp_dir("categories");
    let bad_ext = read_snapshot(&dir.join("map.txt")).unwrap_err();
    assert!(matches!(bad_ext, SnapshotError::BadExtension(_)));
    assert_eq!(category(bad_ext), ErrorCategory::Validation);
    // a .json path that does not exist fails on the read itself
    let missing = read_snapshot(&dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, SnapshotError::Io(_)));
    let err = AppError::from(&missing);
    assert_eq!(err.category, ErrorCategory::Storage);
    assert!(err.message.starts_with("Import failed"));
}

#[test]
fn snapshot_non_uuid_ids_are_named_in_the_error() {
    let text = r#"{"version": "1.0", "levels": [{"level": 1, "label": "L1"}],
        "nodes": [{"id": "node-1", "type": "keyword", "content": "A", "level": 1}]}"#;
    let err = parse_snapshot(text).unwrap_err();
    assert!(matches!(err, SnapshotError::BadId { field: "nodes", ref id } if id == "node-1"));
    assert!(err.to_string().contains("'node-1'"));
    assert_eq!(AppError::from(&err).category, ErrorCategory::Validation);

    let node = Uuid::now_v7();
    let text = format!(
        r#"{{"version": "1.0", "levels": [{{"level": 1, "label": "L1"}}],
        "nodes": [{{"id": "{node}", "type": "keyword", "content": "A", "level": 1}}],
        "edges": [{{"id": "edge-1", "source": "{node}", "target": "{node}"}}]}}"#
    );
    assert!(matches!(parse_snapshot(&text), Err(SnapshotError::BadId { field: "edges", .. })));
}

#[test]
fn snapshot_rejects_non_objects() {
    assert!(matches!(parse_snapshot("not json"), Err(SnapshotError::NotJson(_))));
    assert!(matches!(parse_snapshot("[1, 2]"), Err(SnapshotError::NotAnObject)));
    assert!(matches!(
        parse_snapshot(r#"{"nodes": [], "levels": []}"#),
        Err(SnapshotError::MissingField("version"))
    ));
}

#[test]
fn snapshot_version_mismatch_warns_but_loads() {
    let text = r#"{"version": "0.9", "nodes": [], "edges": [], "levels": [{"level": 1, "label": "Why"}]}"#;
    let (snap, warnings) = parse_snapshot(text).unwrap();
    assert_eq!(snap.levels.len(), 1);
    assert_eq!(
        warnings,
        vec![ImportWarning::VersionMismatch { found: "0.9".into(), expected: "1.0" }]
    );
}

#[test]
fn snapshot_file_name_and_checks() {
    let at = time::macros::datetime!(2024-03-05 12:00:00 UTC);
    let name = export_file_name("Coffee shop / plan", at);
    assert_eq!(name, format!("Coffee_shop___plan_2024-03-05_{}.json", at.unix_timestamp() * 1000));
    assert!(export_file_name("   ", at).starts_with("anyplan_"));

    let dir = temp_dir("snapcheck");
    std::fs::create_dir_all(&dir).unwrap();
    let txt = dir.join("plan.txt");
    std::fs::write(&txt, "{}").unwrap();
    assert!(matches!(check_file(&txt), Err(SnapshotError::BadExtension(_))));
    assert!(matches!(check_file(&dir.join("missing.json")), Err(SnapshotError::Io(_))));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn snapshot_written_file_reads_back() {
    let (mut store, _, _) = sample_store();
    let snap = store.export_snapshot("Round trip");
    let dir = temp_dir("snapfile");
    let path = write_snapshot(&dir, &snap).unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("Round_trip_"));
    let (loaded, warnings) = read_snapshot(&path).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(loaded.nodes, snap.nodes);
    assert_eq!(loaded.selected_path, snap.selected_path);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn snapshot_import_keeps_previous_state_in_history() {
    let (mut store, a, _) = sample_store();
    let mut other = CanvasStore::new();
    other.reset_with_topic("Other");
    other.set_levels(levels(1));
    store.import_snapshot(other.capture_snapshot("other"));
    assert_eq!(store.topic(), "Other");
    assert!(store.node(a).is_none());

    store.restore_history(0).unwrap();
    assert_eq!(store.topic(), "Coffee shop");
    assert!(store.node(a).is_some());
    assert!(store.restore_history(42).is_err());
}

#[test]
fn history_is_bounded() {
    let (store, _, _) = sample_store();
    let mut store = store.with_max_history(2);
    for i in 0..5 {
        store.export_snapshot(&format!("v{}", i));
    }
    let titles: Vec<&str> = store.history().iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["v3", "v4"]);
}

#[test]
fn snapshot_apply_drops_stale_selection() {
    let (store, a, _) = sample_store();
    let mut snap = store.capture_snapshot("");
    let mut bogus = BTreeMap::new();
    bogus.insert(1, Uuid::now_v7());
    bogus.insert(2, a); // wrong level
    snap.selected_path = bogus;
    let mut other = CanvasStore::new();
    other.import_snapshot(snap);
    assert!(other.selection().is_empty());
}

// --- autosave / settings / export ---

#[test]
fn persist_active_state_round_trip() {
    let (store, a, _) = sample_store();
    let dir = temp_dir("persist");
    let snap = store.capture_snapshot("");
    let path = persist::save_active(&dir, &snap).unwrap();
    assert!(path.ends_with("state.ron"));
    let loaded = persist::load_active(&dir).unwrap().expect("state saved");
    assert_eq!(loaded.nodes, snap.nodes);
    assert_eq!(loaded.selected_path.get(&1), Some(&a));

    let version = persist::save_versioned(&dir, &snap).unwrap();
    assert_eq!(persist::list_versions(&dir).unwrap(), vec![version]);
    assert!(persist::load_active(&temp_dir("empty")).unwrap().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn settings_defaults_fill_missing_fields() {
    let s = AppSettings::from_json("{}").unwrap();
    assert_eq!(s, AppSettings::default());
    assert!(s.autosave_enabled);
    assert_eq!(s.ai.timeout_secs, 30);
    assert_eq!(s.max_history, 20);

    let s = AppSettings::from_json(r#"{"ai": {"api_key": "abc", "timeout_secs": 0}}"#).unwrap();
    let cfg = s.ai.client_config().expect("explicit key");
    assert_eq!(cfg.api_key, "abc");
    assert_eq!(cfg.timeout, Duration::from_secs(1));
}

#[test]
fn settings_default_dirs_are_per_app() {
    assert!(AppSettings::settings_dir().ends_with("anyplan"));
    let s = AppSettings::default();
    assert!(s.autosave_dir().ends_with("anyplan"));
    assert_ne!(s.autosave_dir(), AppSettings::settings_dir());
    let custom = AppSettings { autosave_override: Some(PathBuf::from("/tmp/maps")), ..AppSettings::default() };
    assert_eq!(custom.autosave_dir(), PathBuf::from("/tmp/maps"));
}

#[test]
fn export_outline_csv_lists_nodes_by_level() {
    let (store, _, _) = sample_store();
    let dir = temp_dir("csv");
    let path = export::export_outline_csv(&store, &dir.join("outline.csv")).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "level,level_label,content,parent,selected");
    assert_eq!(lines[1], "1,L1,A,Coffee shop,yes");
    assert_eq!(lines[2], "2,L2,B,A,");
    let _ = std::fs::remove_dir_all(&dir);
}

// --- AI plumbing ---

#[test]
fn parse_strips_fences_and_prose() {
    assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    let children = parse_children("Sure! Here you go: {\"children\": [{\"content\": \"Rent\"}, {\"content\": \" \"}]} Enjoy").unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].content, "Rent");
    assert_eq!(children[0].level, 1);
    assert!(matches!(parse_children("```json\n```"), Err(AiError::EmptyResponse)));
    assert!(matches!(parse_children("no json here"), Err(AiError::Parse(_))));
    // an answer with nothing usable is a failed generation, not an empty success
    assert!(matches!(parse_children(r#"{"children": []}"#), Err(AiError::Parse(_))));
    assert!(matches!(parse_children(r#"{"children": [{"content": "  "}]}"#), Err(AiError::Parse(_))));
}

#[test]
fn parse_level_plan_normalizes() {
    let levels: Vec<String> = (1..=8).map(|l| format!("{{\"level\": {l}, \"label\": \"L{l}\"}}")).collect();
    let text = format!(
        "{{\"levelCount\": 3, \"levels\": [{}], \"initialNodes\": [{{\"content\": \"A\", \"hasChildren\": true}}, {{\"content\": \"\"}}]}}",
        levels.join(",")
    );
    let plan = parse_level_plan(&text).unwrap();
    assert_eq!(plan.levels.len(), MAX_LEVELS);
    assert_eq!(plan.level_count, MAX_LEVELS as u32);
    assert_eq!(plan.initial_nodes.len(), 1);
    assert!(plan.initial_nodes[0].has_children);

    let empty = r#"{"levelCount": 0, "levels": [], "initialNodes": [{"content": "A"}]}"#;
    assert!(matches!(parse_level_plan(empty), Err(AiError::Parse(_))));
}

#[test]
fn request_body_puts_system_prompt_first() {
    let req = CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        turns: vec![(ChatRole::User, "hi".into()), (ChatRole::Model, "hello".into()), (ChatRole::User, "more".into())],
    };
    let body = build_request_body(&req, 0.7, 512);
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[0]["parts"][0]["text"], SYSTEM_PROMPT);
    assert_eq!(contents[0]["parts"][1]["text"], "hi");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"].as_array().unwrap().len(), 1);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
}

#[test]
fn response_text_extraction() {
    let resp: GenerateResponse =
        serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": "answer"}]}}]}"#).unwrap();
    assert_eq!(extract_text(resp).unwrap(), "answer");
    assert!(matches!(extract_text(GenerateResponse::default()), Err(AiError::EmptyResponse)));
    let blank: GenerateResponse = serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": " "}]}}]}"#).unwrap();
    assert!(matches!(extract_text(blank), Err(AiError::EmptyResponse)));
}

#[test]
fn endpoint_and_http_errors() {
    let url = build_endpoint("https://example.test/v1beta/models/", "gemini-2.0-flash", "k&y").unwrap();
    assert_eq!(url.path(), "/v1beta/models/gemini-2.0-flash:generateContent");
    assert_eq!(url.query(), Some("key=k%26y"));

    let long = "x".repeat(1000);
    match http_error(500, &long) {
        AiError::Http { status, body } => {
            assert_eq!(status, 500);
            assert!(body.chars().count() <= 301);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn children_prompt_mentions_context() {
    let ctx = ChildContext {
        topic: "Coffee shop".into(),
        node_content: "Budget".into(),
        path: vec!["Money".into()],
        siblings: vec!["Location".into()],
        existing_children: vec!["Rent".into()],
        target_level: 2,
        level_label: Some("How".into()),
        level_description: Some("Concrete steps".into()),
    };
    let p = children_prompt(&ctx);
    assert!(p.contains("Coffee shop"));
    assert!(p.contains("Money"));
    assert!(p.contains("Level 2 is \"How\": Concrete steps"));
    assert!(p.contains("Rent"));
}

#[test]
fn timeouts_and_network_errors_read_the_same() {
    let t = AppError::from_ai(&AiError::Timeout { after: Duration::from_secs(30) }, None);
    let n = AppError::from_ai(&AiError::Network("dns".into()), None);
    assert_eq!(t.message, NETWORK_FAILURE_TEXT);
    assert_eq!(t.message, n.message);
    assert_eq!(t.category, ErrorCategory::Network);
    assert_ne!(t.code, n.code);

    let p = AppError::from_ai(&AiError::Parse("bad".into()), None);
    assert_eq!(p.category, ErrorCategory::Generation);
    assert!(p.message.starts_with("Generation failed"));
}

// --- node styling ---

#[test]
fn node_visuals_follow_state_table() {
    let plain = visual_for(NodeKind::Keyword, NodeState { selected: false, expanded: false, generating: false });
    let selected = visual_for(NodeKind::Keyword, NodeState { selected: true, expanded: false, generating: false });
    let busy = visual_for(NodeKind::Keyword, NodeState { selected: true, expanded: true, generating: true });
    let open = visual_for(NodeKind::Keyword, NodeState { selected: false, expanded: true, generating: false });
    assert_ne!(plain.fill, selected.fill);
    assert_eq!(busy.badge, Some("…"));
    assert_eq!(open.badge, Some("▾"));
    assert_eq!(plain.badge, None);
    let topic = visual_for(NodeKind::Original, NodeState { selected: true, expanded: true, generating: true });
    assert_eq!(topic.badge, None);
}
