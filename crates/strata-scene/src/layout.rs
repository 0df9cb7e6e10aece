//! Single-pass, depth-first layout.
//!
//! Each node sizes itself against the space its parent offers, lays out its
//! children inside its content rect (rect minus padding), then places them
//! according to its strategy. Rects are parent-relative; a final top-down pass
//! accumulates absolute screen rects.

use strata_core::{Rect, SceneConfig, Size, Vec2};

use crate::spec::{LayoutStrategy, NodeFlags, NodeKind, NodeSpec};
use crate::text::TextMeasure;
use crate::tree::{BoundAxes, NodeId, SceneTree};

struct LayoutCx<'a> {
    frame: u64,
    trace: bool,
    default_width: f32,
    default_height: f32,
    char_width_estimate: f32,
    infinity: f32,
    text_scale: f32,
    measure: Option<&'a dyn TextMeasure>,
}

impl<'a> LayoutCx<'a> {
    fn new(config: &SceneConfig, frame: u64, measure: Option<&'a dyn TextMeasure>) -> Self {
        Self {
            frame,
            trace: config.trace_layout,
            default_width: config.default_width,
            default_height: config.default_height,
            char_width_estimate: config.char_width_estimate,
            infinity: config.layout_infinity,
            text_scale: config.text_scale,
            measure,
        }
    }

    fn is_finite(&self, v: f32) -> bool {
        v > 0.0 && v < self.infinity
    }
}

/// Lays out the whole tree against a `window` sized viewport and refreshes
/// screen rects. `frame` only appears in trace output.
pub fn layout_root(
    tree: &mut SceneTree,
    window: Size,
    frame: u64,
    measure: Option<&dyn TextMeasure>,
) {
    let Some(root) = tree.root() else {
        return;
    };
    let cx = LayoutCx::new(tree.config(), frame, measure);
    layout_node(tree, &cx, root, None, window);
    update_screen_rects(tree, root, Vec2::ZERO);
}

fn layout_node(
    tree: &mut SceneTree,
    cx: &LayoutCx<'_>,
    id: NodeId,
    parent_strategy: Option<LayoutStrategy>,
    avail: Size,
) {
    let store = tree.shared_store();
    let Some(node) = tree.node(id) else {
        return;
    };
    let Some(spec) = store.get(node.spec) else {
        return;
    };
    let layout = &spec.layout;
    let pad = layout.padding;
    let children: Vec<NodeId> = node
        .children
        .iter()
        .copied()
        .filter(|c| tree.node(*c).is_some_and(|n| !n.is_hidden()))
        .collect();

    let w = if node.bound.contains(BoundAxes::WIDTH) {
        node.rect.w
    } else if layout.width >= 0.0 {
        layout.width
    } else {
        auto_width(cx, spec, &node.text, node.flags, parent_strategy, avail.width)
    };
    let fixed_h = if node.bound.contains(BoundAxes::HEIGHT) {
        Some(node.rect.h)
    } else if layout.height >= 0.0 {
        Some(layout.height)
    } else {
        None
    };
    let content_w = (w - pad * 2.0).max(0.0);

    let h = match fixed_h {
        Some(h) => h,
        None if layout.strategy == LayoutStrategy::FlexColumn && !children.is_empty() => {
            // Children first, against an open height: the column takes their
            // stacked height.
            let mut h = pad * 2.0;
            for c in &children {
                layout_node(
                    tree,
                    cx,
                    *c,
                    Some(layout.strategy),
                    Size {
                        width: content_w,
                        height: cx.infinity,
                    },
                );
                h += tree.node(*c).map_or(0.0, |n| n.rect.h) + layout.spacing;
            }
            h -= layout.spacing;
            if cx.is_finite(avail.height) && h < avail.height {
                h = avail.height;
            }
            h
        }
        None if cx.is_finite(avail.height) => avail.height,
        None => cx.default_height,
    };
    let stacked_first = fixed_h.is_none()
        && layout.strategy == LayoutStrategy::FlexColumn
        && !children.is_empty();

    if let Some(node) = tree.node_mut(id) {
        node.rect.w = w;
        node.rect.h = h;
        if cx.trace {
            log::debug!(
                "[Frame {}] Layout node id='{}': Rect({:.1}, {:.1}, {:.1}, {:.1})",
                cx.frame,
                spec.id_str(),
                node.rect.x,
                node.rect.y,
                node.rect.w,
                node.rect.h
            );
        }
    }

    let content = Size {
        width: content_w,
        height: (h - pad * 2.0).max(0.0),
    };
    if !stacked_first {
        let ratio = if layout.split_ratio > 0.0 {
            layout.split_ratio
        } else {
            0.5
        };
        let split = layout.strategy.is_split() && children.len() >= 2;
        for (i, c) in children.iter().enumerate() {
            let share = if i == 0 { ratio } else { 1.0 - ratio };
            let child_avail = match layout.strategy {
                LayoutStrategy::SplitH if split => Size {
                    width: content.width * share,
                    height: content.height,
                },
                LayoutStrategy::SplitV if split => Size {
                    width: content.width,
                    height: content.height * share,
                },
                _ => content,
            };
            layout_node(tree, cx, *c, Some(layout.strategy), child_avail);
        }
    }

    position_children(tree, id, spec, &children);
}

fn auto_width(
    cx: &LayoutCx<'_>,
    spec: &NodeSpec,
    cached: &str,
    flags: NodeFlags,
    parent: Option<LayoutStrategy>,
    avail_w: f32,
) -> f32 {
    let measured = parent == Some(LayoutStrategy::FlexRow)
        || matches!(spec.kind, NodeKind::Text | NodeKind::TextInput)
        || flags.contains(NodeFlags::CLICKABLE);
    if !measured {
        return if cx.is_finite(avail_w) {
            avail_w
        } else {
            cx.default_width
        };
    }

    let text = if cached.is_empty() {
        spec.text.as_deref().unwrap_or("")
    } else {
        cached
    };
    if text.is_empty() {
        return cx.default_width;
    }
    let pad = spec.layout.padding * 2.0;
    match cx.measure {
        Some(m) => {
            let scale = if spec.style.text_scale > 0.0 {
                spec.style.text_scale
            } else {
                cx.text_scale
            };
            m.measure(text, scale).width + pad
        }
        None => {
            text.chars().count() as f32 * cx.char_width_estimate + pad + cx.char_width_estimate
        }
    }
}

fn position_children(tree: &mut SceneTree, id: NodeId, spec: &NodeSpec, children: &[NodeId]) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let layout = &spec.layout;
    let scroll = node.scroll;
    let scrollable = node.flags.contains(NodeFlags::SCROLLABLE);
    let start = Vec2::new(layout.padding - scroll.x, layout.padding - scroll.y);
    let spacing = layout.spacing;

    let mut extent = Size::default();
    match layout.strategy {
        LayoutStrategy::FlexColumn => {
            let mut cursor = start.y;
            let mut max_x = start.x;
            for c in children {
                if let Some(n) = tree.node_mut(*c) {
                    n.rect.x = start.x;
                    n.rect.y = cursor;
                    cursor += n.rect.h + spacing;
                    max_x = max_x.max(n.rect.right());
                }
            }
            if !children.is_empty() {
                cursor -= spacing;
            }
            extent = Size {
                width: max_x - start.x,
                height: cursor - start.y,
            };
        }
        LayoutStrategy::FlexRow => {
            let mut cursor = start.x;
            let mut max_y = start.y;
            for c in children {
                if let Some(n) = tree.node_mut(*c) {
                    n.rect.x = cursor;
                    n.rect.y = start.y;
                    cursor += n.rect.w + spacing;
                    max_y = max_y.max(n.rect.bottom());
                }
            }
            if !children.is_empty() {
                cursor -= spacing;
            }
            extent = Size {
                width: cursor - start.x,
                height: max_y - start.y,
            };
        }
        LayoutStrategy::Canvas => {
            let shift = if scrollable { scroll } else { Vec2::ZERO };
            for c in children {
                if let Some(n) = tree.node_mut(*c) {
                    n.rect.x = n.origin.x - shift.x;
                    n.rect.y = n.origin.y - shift.y;
                    extent.width = extent.width.max(n.origin.x + n.rect.w);
                    extent.height = extent.height.max(n.origin.y + n.rect.h);
                }
            }
        }
        LayoutStrategy::SplitH | LayoutStrategy::SplitV => {
            let first = children.first().and_then(|c| tree.node(*c)).map(|n| n.rect);
            if let Some(r0) = first {
                if let Some(n) = tree.node_mut(children[0]) {
                    n.rect.x = start.x;
                    n.rect.y = start.y;
                }
                if let Some(n) = children.get(1).and_then(|c| tree.node_mut(*c)) {
                    if layout.strategy == LayoutStrategy::SplitH {
                        n.rect.x = start.x + r0.w;
                        n.rect.y = start.y;
                    } else {
                        n.rect.x = start.x;
                        n.rect.y = start.y + r0.h;
                    }
                }
            }
            if let Some(n) = tree.node(id) {
                extent = Size {
                    width: n.rect.w,
                    height: n.rect.h,
                };
            }
        }
    }
    if let Some(n) = tree.node_mut(id) {
        n.content_size = extent;
    }
}

/// Absolute rects: each node's rect offset by its parent's screen origin.
/// Any scroll shift applied to the previous rects is dropped.
pub fn update_screen_rects(tree: &mut SceneTree, id: NodeId, parent: Vec2) {
    let Some(node) = tree.node_mut(id) else {
        return;
    };
    node.screen_rect = Rect::new(
        parent.x + node.rect.x,
        parent.y + node.rect.y,
        node.rect.w,
        node.rect.h,
    );
    node.area.shift = 0.0;
    let origin = Vec2::new(node.screen_rect.x, node.screen_rect.y);
    let children = node.children.clone();
    for c in children {
        update_screen_rects(tree, c, origin);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::spec::{SpecId, SpecStore};
    use crate::text::MonospaceMeasure;

    fn spec(store: &mut SpecStore, f: impl FnOnce(&mut NodeSpec)) -> SpecId {
        let id = store.push_node().unwrap();
        f(store.get_mut(id).unwrap());
        id
    }

    fn laid_out(store: SpecStore, window: Size, measure: Option<&dyn TextMeasure>) -> SceneTree {
        let mut tree = SceneTree::new(Rc::new(store), &SceneConfig::default());
        tree.instantiate(None).unwrap();
        tree.update(0.0);
        layout_root(&mut tree, window, 1, measure);
        tree
    }

    fn rect_of(tree: &SceneTree, name: &str) -> Rect {
        tree.node(tree.find_by_id(name).unwrap()).unwrap().rect
    }

    fn screen_of(tree: &SceneTree, name: &str) -> Rect {
        tree.node(tree.find_by_id(name).unwrap()).unwrap().screen_rect
    }

    const WINDOW: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn test_column_auto_height_stacks_children() {
        let mut store = SpecStore::with_capacity(8);
        let a = spec(&mut store, |s| {
            s.id = Some("a".into());
            s.layout.height = 20.0;
        });
        let b = spec(&mut store, |s| {
            s.id = Some("b".into());
            s.layout.height = 30.0;
        });
        let list = spec(&mut store, |s| {
            s.id = Some("list".into());
            s.layout.padding = 10.0;
            s.layout.spacing = 5.0;
            s.children = vec![a, b];
        });
        let root = spec(&mut store, |s| s.children = vec![list]);
        store.set_root(root);

        let tree = laid_out(store, WINDOW, None);
        assert_eq!(rect_of(&tree, "list").h, 75.0);
        assert_eq!(rect_of(&tree, "a").y, 10.0);
        assert_eq!(rect_of(&tree, "b").y, 35.0);
        assert_eq!(rect_of(&tree, "a").w, 780.0);

        let root = tree.node(tree.root().unwrap()).unwrap();
        // the root column is raised to the window height
        assert_eq!(root.rect, Rect::new(0.0, 0.0, 800.0, 600.0));
        let list = tree.node(tree.find_by_id("list").unwrap()).unwrap();
        assert_eq!(list.content_size, Size { width: 780.0, height: 55.0 });
    }

    #[test]
    fn test_row_children_measure_their_text() {
        let mut store = SpecStore::with_capacity(8);
        let ok = spec(&mut store, |s| {
            s.id = Some("ok".into());
            s.text = Some("OK".into());
            s.layout.padding = 4.0;
        });
        let cancel = spec(&mut store, |s| {
            s.id = Some("cancel".into());
            s.text = Some("Cancel".into());
        });
        let empty = spec(&mut store, |s| s.id = Some("empty".into()));
        let root = spec(&mut store, |s| {
            s.layout.strategy = LayoutStrategy::FlexRow;
            s.layout.spacing = 2.0;
            s.children = vec![ok, cancel, empty];
        });
        store.set_root(root);

        let mono = MonospaceMeasure {
            advance: 16.0,
            line_height: 40.0,
        };
        let tree = laid_out(store, WINDOW, Some(&mono));
        // 2 chars * 16 * 0.5 + 2 * 4
        assert_eq!(rect_of(&tree, "ok").w, 24.0);
        assert_eq!(rect_of(&tree, "cancel").x, 26.0);
        assert_eq!(rect_of(&tree, "cancel").w, 48.0);
        assert_eq!(rect_of(&tree, "empty").w, 100.0);
        assert_eq!(rect_of(&tree, "empty").x, 76.0);
        // row children fill the row's height
        assert_eq!(rect_of(&tree, "ok").h, 600.0);
    }

    #[test]
    fn test_sized_column_children_fill_content_rect() {
        let mut store = SpecStore::with_capacity(8);
        let panel = spec(&mut store, |s| s.id = Some("panel".into()));
        let column = spec(&mut store, |s| {
            s.id = Some("column".into());
            s.layout.width = 200.0;
            s.layout.height = 300.0;
            s.layout.padding = 10.0;
            s.children = vec![panel];
        });
        let root = spec(&mut store, |s| s.children = vec![column]);
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        assert_eq!(rect_of(&tree, "panel"), Rect::new(10.0, 10.0, 180.0, 280.0));
    }

    #[test]
    fn test_sized_row_children_fill_content_height() {
        let mut store = SpecStore::with_capacity(8);
        let cell = spec(&mut store, |s| s.id = Some("cell".into()));
        let row = spec(&mut store, |s| {
            s.id = Some("row".into());
            s.layout.strategy = LayoutStrategy::FlexRow;
            s.layout.width = 400.0;
            s.layout.height = 50.0;
            s.layout.padding = 5.0;
            s.children = vec![cell];
        });
        let root = spec(&mut store, |s| s.children = vec![row]);
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        // row children measure their width, nothing to measure here
        assert_eq!(rect_of(&tree, "cell"), Rect::new(5.0, 5.0, 100.0, 40.0));
    }

    #[test]
    fn test_text_fallback_estimate() {
        let mut store = SpecStore::with_capacity(4);
        let label = spec(&mut store, |s| {
            s.id = Some("label".into());
            s.kind = NodeKind::Text;
            s.text = Some("abc".into());
            s.layout.padding = 2.0;
        });
        let root = spec(&mut store, |s| s.children = vec![label]);
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        assert_eq!(rect_of(&tree, "label").w, 3.0 * 10.0 + 4.0 + 10.0);
        // auto-height leaf in a column
        assert_eq!(rect_of(&tree, "label").h, 30.0);
    }

    #[test]
    fn test_split_divides_content() {
        let mut store = SpecStore::with_capacity(4);
        let left = spec(&mut store, |s| s.id = Some("left".into()));
        let right = spec(&mut store, |s| s.id = Some("right".into()));
        let root = spec(&mut store, |s| {
            s.layout.strategy = LayoutStrategy::SplitH;
            s.layout.split_ratio = 0.25;
            s.layout.padding = 10.0;
            s.children = vec![left, right];
        });
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        assert_eq!(rect_of(&tree, "left"), Rect::new(10.0, 10.0, 195.0, 580.0));
        assert_eq!(rect_of(&tree, "right"), Rect::new(205.0, 10.0, 585.0, 580.0));
    }

    #[test]
    fn test_split_v_defaults_to_half() {
        let mut store = SpecStore::with_capacity(4);
        let top = spec(&mut store, |s| s.id = Some("top".into()));
        let bottom = spec(&mut store, |s| s.id = Some("bottom".into()));
        let root = spec(&mut store, |s| {
            s.layout.strategy = LayoutStrategy::SplitV;
            s.children = vec![top, bottom];
        });
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        assert_eq!(rect_of(&tree, "top"), Rect::new(0.0, 0.0, 800.0, 300.0));
        assert_eq!(rect_of(&tree, "bottom"), Rect::new(0.0, 300.0, 800.0, 300.0));
    }

    #[test]
    fn test_canvas_keeps_positions_and_scrolls() {
        let mut store = SpecStore::with_capacity(4);
        let dot = spec(&mut store, |s| {
            s.id = Some("dot".into());
            s.layout.x = 50.0;
            s.layout.y = 700.0;
            s.layout.width = 10.0;
            s.layout.height = 10.0;
        });
        let root = spec(&mut store, |s| {
            s.layout.strategy = LayoutStrategy::Canvas;
            s.flags = NodeFlags::SCROLLABLE;
            s.children = vec![dot];
        });
        store.set_root(root);
        let mut tree = laid_out(store, WINDOW, None);
        let root = tree.root().unwrap();
        assert_eq!(
            tree.node(root).unwrap().content_size,
            Size { width: 60.0, height: 710.0 }
        );

        tree.node_mut(root).unwrap().scroll = Vec2::new(0.0, 200.0);
        layout_root(&mut tree, WINDOW, 2, None);
        assert_eq!(rect_of(&tree, "dot"), Rect::new(50.0, 500.0, 10.0, 10.0));
        // content extent ignores the scroll
        assert_eq!(tree.node(root).unwrap().content_size.height, 710.0);
    }

    #[test]
    fn test_hidden_children_take_no_space() {
        let mut store = SpecStore::with_capacity(4);
        let a = spec(&mut store, |s| {
            s.id = Some("a".into());
            s.flags = NodeFlags::HIDDEN;
            s.layout.height = 40.0;
        });
        let b = spec(&mut store, |s| {
            s.id = Some("b".into());
            s.layout.height = 10.0;
        });
        let root = spec(&mut store, |s| s.children = vec![a, b]);
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        assert_eq!(rect_of(&tree, "b").y, 0.0);
    }

    #[test]
    fn test_screen_rects_accumulate() {
        let mut store = SpecStore::with_capacity(4);
        let leaf = spec(&mut store, |s| {
            s.id = Some("leaf".into());
            s.layout.height = 10.0;
        });
        let panel = spec(&mut store, |s| {
            s.id = Some("panel".into());
            s.layout.padding = 5.0;
            s.layout.x = 100.0;
            s.layout.y = 40.0;
            s.layout.width = 200.0;
            s.layout.height = 100.0;
            s.children = vec![leaf];
        });
        let root = spec(&mut store, |s| {
            s.layout.strategy = LayoutStrategy::Canvas;
            s.layout.padding = 8.0;
            s.children = vec![panel];
        });
        store.set_root(root);
        let tree = laid_out(store, WINDOW, None);
        assert_eq!(screen_of(&tree, "panel"), Rect::new(100.0, 40.0, 200.0, 100.0));
        assert_eq!(screen_of(&tree, "leaf"), Rect::new(105.0, 45.0, 190.0, 10.0));
    }
}
