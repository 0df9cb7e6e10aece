//! # Scroll areas
//!
//! A scroll area is a name shared by any number of nodes (`scroll_area` in
//! the spec). Every frame [`ScrollController::apply`] rebuilds the areas from
//! the laid-out tree:
//!
//! - each participant adds its (unscrolled) screen rect to the area bounds;
//! - a `SCROLLBAR` participant claims the viewport, the largest one wins;
//! - the offset is clamped to `[0, content - viewport]`;
//! - participants are shifted up by the offset, scrollbars receive the
//!   viewport/content sizes, and clipping participants receive the viewport.
//!
//! Offsets survive rebuilds by name. Wheel input moves a target offset which
//! [`ScrollController::update`] eases towards; thumb drags set the offset
//! directly.

use std::rc::Rc;

use strata_core::{Rect, SceneConfig, Vec2};

use crate::spec::{NodeFlags, NodeSpec, SpecStore};
use crate::tree::{DrawOrder, Node, NodeId, SceneTree};

#[derive(Clone, Debug, PartialEq)]
pub struct ScrollArea {
    pub name: Rc<str>,
    pub bounds: Option<Rect>,
    pub viewport: Option<Rect>,
    /// A fixed-height scrollbar pins the viewport even when it is small
    /// compared to the content.
    pub anchored: bool,
    pub offset: f32,
    pub target_offset: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ScrollArea {
    fn new(name: Rc<str>) -> Self {
        Self {
            name,
            bounds: None,
            viewport: None,
            anchored: false,
            offset: 0.0,
            target_offset: 0.0,
            viewport_height: 0.0,
            content_height: 0.0,
        }
    }

    fn add(&mut self, rect: Rect, scrollbar: bool) {
        self.bounds = Some(match self.bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
        if scrollbar && self.viewport.is_none_or(|v| rect.area() > v.area()) {
            self.viewport = Some(rect);
        }
    }

    /// Viewport after the dwarf check, before any border is removed.
    pub fn effective_viewport(&self, dwarf_ratio: f32) -> Option<Rect> {
        match (self.viewport, self.bounds) {
            (Some(v), Some(b)) if !self.anchored && v.area() < b.area() * dwarf_ratio => Some(b),
            (Some(v), _) => Some(v),
            (None, b) => b,
        }
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_height - self.viewport_height).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollbarGeometry {
    pub track: Rect,
    pub thumb: Rect,
    pub max_offset: f32,
}

/// Track and thumb of a visible scrollbar node, in screen space. `None` when
/// the node is not a scrollbar, is hidden, or has nothing to scroll.
pub fn scrollbar_geometry(
    node: &Node,
    spec: &NodeSpec,
    config: &SceneConfig,
) -> Option<ScrollbarGeometry> {
    let area = &node.area;
    if !node.flags.contains(NodeFlags::SCROLLBAR) || !area.show_scrollbar {
        return None;
    }
    if area.viewport_size <= 0.0 {
        return None;
    }
    let max_offset = area.content_size - area.viewport_size;
    if max_offset <= config.overflow_epsilon {
        return None;
    }

    let inner = node.screen_rect.inset(spec.style.border.top.max(0.0));
    let pad = spec.layout.padding;
    let track_w = if spec.style.scrollbar_width > 0.0 {
        spec.style.scrollbar_width
    } else {
        (inner.w * config.track_width_ratio).max(config.min_track_width)
    };
    let track_h = inner.h - pad * 2.0;
    if track_h <= 0.0 {
        return None;
    }
    let track = Rect::new(
        inner.x + inner.w - track_w - pad * 0.5,
        inner.y + pad,
        track_w,
        track_h,
    );
    let thumb_h = (track_h * (area.viewport_size / area.content_size)).max(config.min_thumb);
    let t = area.offset.clamp(0.0, max_offset) / max_offset;
    let thumb = Rect::new(track.x, track.y + t * (track_h - thumb_h), track_w, thumb_h);
    Some(ScrollbarGeometry {
        track,
        thumb,
        max_offset,
    })
}

/// Offset that puts the thumb's grab point under `cursor_y`.
pub fn offset_from_cursor(
    track: Rect,
    thumb_h: f32,
    max_offset: f32,
    cursor_y: f32,
    grab: f32,
) -> f32 {
    if max_offset <= 0.0 {
        return 0.0;
    }
    let range = track.h - thumb_h;
    if range <= 0.0 {
        return 0.0;
    }
    let thumb_y = (cursor_y - grab).clamp(track.y, track.y + range);
    ((thumb_y - track.y) / range * max_offset).clamp(0.0, max_offset)
}

#[derive(Clone, Debug)]
struct ScrollDrag {
    area: Rc<str>,
    widget: NodeId,
    grab: f32,
}

/// One participant as it was drawn in the last composed frame.
#[derive(Clone, Debug)]
struct HitEntry {
    area: Rc<str>,
    rect: Rect,
    order: Option<DrawOrder>,
}

pub struct ScrollController {
    config: SceneConfig,
    areas: Vec<ScrollArea>,
    drag: Option<ScrollDrag>,
    snapshot: Vec<HitEntry>,
}

impl ScrollController {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            config: config.clone(),
            areas: Vec::new(),
            drag: None,
            snapshot: Vec::new(),
        }
    }

    pub fn areas(&self) -> &[ScrollArea] {
        &self.areas
    }

    pub fn area(&self, name: &str) -> Option<&ScrollArea> {
        self.areas.iter().find(|a| &*a.name == name)
    }

    fn area_mut(&mut self, name: &str) -> Option<&mut ScrollArea> {
        self.areas.iter_mut().find(|a| &*a.name == name)
    }

    pub fn offset(&self, name: &str) -> Option<f32> {
        self.area(name).map(|a| a.offset)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Jumps an area to `offset` (no easing). Clamped on the next apply.
    pub fn request_offset(&mut self, name: &str, offset: f32) -> bool {
        match self.area_mut(name) {
            Some(a) => {
                a.offset = offset;
                a.target_offset = offset;
                true
            }
            None => {
                log::debug!("ScrollController: no scroll area named '{}'", name);
                false
            }
        }
    }

    /// Rebuilds every area from the laid-out tree and pushes offsets, sizes
    /// and clips into the participating nodes. Safe to call repeatedly.
    pub fn apply(&mut self, tree: &mut SceneTree) {
        let store = tree.shared_store();
        let mut areas: Vec<ScrollArea> = Vec::new();

        for id in tree.walk() {
            let Some(node) = tree.node(id) else { continue };
            if node.is_hidden() {
                continue;
            }
            let Some(spec) = store.get(node.spec) else { continue };
            let Some(name) = spec.scroll_area.as_ref() else { continue };

            let idx = match areas.iter().position(|a| a.name == *name) {
                Some(i) => i,
                None => {
                    let mut a = ScrollArea::new(name.clone());
                    if let Some(prev) = self.area(name) {
                        a.offset = prev.offset;
                        a.target_offset = prev.target_offset;
                    }
                    areas.push(a);
                    areas.len() - 1
                }
            };
            let scrollbar = node.flags.contains(NodeFlags::SCROLLBAR);
            let base = node.screen_rect.translate(0.0, node.area.shift);
            areas[idx].add(base, scrollbar);
            if scrollbar && spec.layout.height >= 0.0 {
                areas[idx].anchored = true;
            }
        }

        for a in &mut areas {
            let viewport = a.effective_viewport(self.config.viewport_dwarf_ratio);
            a.viewport_height = viewport.map_or(0.0, |v| v.h);
            a.content_height = a.bounds.map_or(a.viewport_height, |b| b.h);
            let max = a.max_offset();
            a.offset = a.offset.clamp(0.0, max);
            a.target_offset = a.target_offset.clamp(0.0, max);
        }
        self.areas = areas;

        if let Some(root) = tree.root() {
            self.push(tree, &store, root, 0.0);
        }
    }

    fn push(&self, tree: &mut SceneTree, store: &SpecStore, id: NodeId, inherited: f32) {
        let ratio = self.config.viewport_dwarf_ratio;
        let epsilon = self.config.overflow_epsilon;
        let Some(node) = tree.node_mut(id) else {
            return;
        };
        let spec = store.get(node.spec);
        let area = spec
            .and_then(|s| s.scroll_area.as_deref())
            .and_then(|name| self.area(name))
            .filter(|_| !node.is_hidden());

        node.area.offset = 0.0;
        node.area.clip = None;
        node.area.show_scrollbar = false;

        let scrollbar = node.flags.contains(NodeFlags::SCROLLBAR);
        let mut shift = inherited;
        if let (Some(a), Some(spec)) = (area, spec) {
            let border = spec.style.border.top.max(0.0);
            let viewport = a.effective_viewport(ratio).map(|v| v.inset(border));
            node.area.offset = a.offset;
            if scrollbar {
                node.area.viewport_size = a.viewport_height;
                node.area.content_size = a.content_height;
                node.area.show_scrollbar = a.content_height - a.viewport_height > epsilon;
                node.area.clip = viewport;
                shift = 0.0;
            } else {
                if node.flags.contains(NodeFlags::CLIP_TO_AREA) {
                    node.area.clip = viewport;
                }
                shift = a.offset;
            }
        }

        // Move from the currently applied shift to the new one.
        node.screen_rect.y += node.area.shift - shift;
        node.area.shift = shift;

        let children = node.children.clone();
        for c in children {
            self.push(tree, store, c, shift);
        }
    }

    /// Records which participant is drawn where, for wheel targeting. Call
    /// after composing a frame.
    pub fn capture(&mut self, tree: &SceneTree) {
        self.snapshot.clear();
        for id in tree.walk() {
            let Some(node) = tree.node(id) else { continue };
            if node.is_hidden() {
                continue;
            }
            let Some(name) = tree.spec(id).and_then(|s| s.scroll_area.clone()) else {
                continue;
            };
            let rect = node
                .area
                .clip
                .unwrap_or_else(|| node.screen_rect.translate(0.0, node.area.shift));
            self.snapshot.push(HitEntry {
                area: name,
                rect,
                order: node.draw_order,
            });
        }
    }

    /// Nudges the topmost area under `pos` by `yoff` wheel units. Returns
    /// whether an area took the event.
    pub fn handle_wheel(&mut self, pos: Vec2, yoff: f32) -> bool {
        let mut target: Option<&HitEntry> = None;
        for e in &self.snapshot {
            if e.rect.contains(pos) && target.is_none_or(|t| e.order > t.order) {
                target = Some(e);
            }
        }
        let Some(name) = target.map(|t| t.area.clone()) else {
            return false;
        };
        let step = self.config.area_wheel_step;
        match self.area_mut(&name) {
            Some(a) => {
                let max = a.max_offset();
                a.target_offset = (a.target_offset - yoff * step).clamp(0.0, max);
                true
            }
            None => false,
        }
    }

    /// Starts or ends a thumb drag. Returns true when the press landed on a
    /// scrollbar track, or when a drag ended.
    pub fn handle_mouse_button(&mut self, tree: &mut SceneTree, pos: Vec2, pressed: bool) -> bool {
        if !pressed {
            return self.drag.take().is_some();
        }

        let store = tree.shared_store();
        let mut best: Option<(NodeId, Option<DrawOrder>)> = None;
        for id in tree.walk() {
            let Some(node) = tree.node(id) else { continue };
            let Some(spec) = store.get(node.spec) else { continue };
            if spec.scroll_area.is_none() {
                continue;
            }
            let Some(g) = scrollbar_geometry(node, spec, &self.config) else {
                continue;
            };
            if g.track.contains(pos) && best.is_none_or(|(_, o)| node.draw_order > o) {
                best = Some((id, node.draw_order));
            }
        }
        let Some((widget, _)) = best else {
            return false;
        };
        let Some(node) = tree.node(widget) else {
            return false;
        };
        let Some(spec) = store.get(node.spec) else {
            return false;
        };
        let (Some(name), Some(g)) = (
            spec.scroll_area.clone(),
            scrollbar_geometry(node, spec, &self.config),
        ) else {
            return false;
        };

        let on_thumb = pos.y >= g.thumb.y && pos.y <= g.thumb.bottom();
        let grab = if on_thumb {
            pos.y - g.thumb.y
        } else {
            g.thumb.h * 0.5
        };
        self.drag = Some(ScrollDrag {
            area: name.clone(),
            widget,
            grab,
        });
        if !on_thumb {
            let offset = offset_from_cursor(g.track, g.thumb.h, g.max_offset, pos.y, grab);
            if let Some(a) = self.area_mut(&name) {
                a.offset = offset;
                a.target_offset = offset;
            }
            self.apply(tree);
        }
        true
    }

    /// Follows the cursor while a thumb drag is active.
    pub fn handle_cursor(&mut self, tree: &mut SceneTree, pos: Vec2) -> bool {
        let Some(drag) = self.drag.clone() else {
            return false;
        };
        let geometry = tree.node(drag.widget).and_then(|n| {
            let spec = tree.spec(drag.widget)?;
            scrollbar_geometry(n, spec, &self.config)
        });
        let Some(g) = geometry else {
            self.drag = None;
            return false;
        };
        let grab = if drag.grab > 0.0 {
            drag.grab
        } else {
            g.thumb.h * 0.5
        };
        let offset = offset_from_cursor(g.track, g.thumb.h, g.max_offset, pos.y, grab);
        if let Some(a) = self.area_mut(&drag.area) {
            a.offset = offset;
            a.target_offset = offset;
        }
        self.apply(tree);
        true
    }

    /// Eases offsets towards their targets. Returns whether anything moved.
    pub fn update(&mut self, tree: &mut SceneTree, dt: f32) -> bool {
        let snap = self.config.scroll_snap;
        let k = self.config.scroll_smoothing;
        let mut changed = false;
        for a in &mut self.areas {
            let diff = a.target_offset - a.offset;
            if diff.abs() > snap {
                a.offset += diff * k * dt;
                if (a.target_offset - a.offset).abs() < snap {
                    a.offset = a.target_offset;
                }
                changed = true;
            }
        }
        if changed {
            self.apply(tree);
        }
        changed
    }

    /// Drops a thumb drag whose widget may no longer exist. Offsets are kept
    /// and re-attach by name on the next apply.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Re-derives areas from a laid-out tree, scaling the preserved offsets
    /// (e.g. after a DPI change). Ends any drag.
    pub fn rebuild(&mut self, tree: &mut SceneTree, offset_scale: f32) {
        self.drag = None;
        for a in &mut self.areas {
            a.offset *= offset_scale;
            a.target_offset *= offset_scale;
        }
        self.apply(tree);
    }
}
