//! # Render command compositor
//!
//! Walks the laid-out tree and emits backend-neutral [`RenderCommand`]s.
//!
//! Two passes: the first draws the normal tree and defers every node on the
//! [`Layer::Overlay`] layer; the second replays the deferred nodes with the
//! clip reset to "unbounded" and a higher base depth, so overlays land on top
//! and ignore their ancestors' clips.
//!
//! Every command carries a sort key `(layer, widget_order, phase, ordinal)`.
//! The buffer is sorted with [`stable_sort`], a merge sort, so commands with
//! equal keys keep their emission order.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use strata_core::{Color, Rect, SceneConfig, Size, Vec2};

use crate::provider::{ViewportRegistry, ViewportRequest};
use crate::scroll::scrollbar_geometry;
use crate::spec::{Layer, NodeFlags, NodeKind, SpecStore};
use crate::text::FontMetrics;
use crate::tree::{DrawOrder, NodeId, SceneTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Background = 0,
    Content = 1,
    Overlay = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub layer: Layer,
    pub widget_order: u32,
    pub phase: Phase,
    pub ordinal: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Background {
        rect: Rect,
        color: Color,
        radius: f32,
        border: f32,
        /// Nine-slice texture and its source size.
        texture: Option<Rc<str>>,
        tex_size: Size,
    },
    Glyph {
        rect: Rect,
        uv0: Vec2,
        uv1: Vec2,
        color: Color,
    },
}

impl Primitive {
    pub fn rect(&self) -> Rect {
        match self {
            Primitive::Background { rect, .. } | Primitive::Glyph { rect, .. } => *rect,
        }
    }

    pub fn solid(rect: Rect, color: Color) -> Self {
        Primitive::Background {
            rect,
            color,
            radius: 0.0,
            border: 0.0,
            texture: None,
            tex_size: Size::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderCommand {
    pub key: SortKey,
    /// `None` means unclipped.
    pub clip: Option<Rect>,
    pub z: f32,
    pub primitive: Primitive,
}

fn fmt_rect(f: &mut fmt::Formatter<'_>, r: &Rect) -> fmt::Result {
    write!(f, "[{} {} {} {}]", r.x, r.y, r.w, r.h)
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let k = &self.key;
        write!(
            f,
            "{:?}/{}/{:?}/{} z={} ",
            k.layer, k.widget_order, k.phase, k.ordinal, self.z
        )?;
        let (name, rect, color) = match &self.primitive {
            Primitive::Background { rect, color, .. } => ("background", rect, color),
            Primitive::Glyph { rect, color, .. } => ("glyph", rect, color),
        };
        write!(f, "{name} ")?;
        fmt_rect(f, rect)?;
        write!(f, " rgba({}, {}, {}, {}) clip=", color.r, color.g, color.b, color.a)?;
        match &self.clip {
            Some(c) => fmt_rect(f, c),
            None => write!(f, "none"),
        }
    }
}

/// Appends commands for one node, stamping them with that node's sort key.
pub struct CommandSink<'a> {
    out: &'a mut Vec<RenderCommand>,
    layer: Layer,
    widget_order: u32,
    phase: Phase,
    ordinal: u32,
    clip: Option<Rect>,
    z: f32,
}

impl<'a> CommandSink<'a> {
    pub fn new(out: &'a mut Vec<RenderCommand>, layer: Layer, widget_order: u32) -> Self {
        Self {
            out,
            layer,
            widget_order,
            phase: Phase::Content,
            ordinal: 0,
            clip: None,
            z: 0.0,
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    pub fn set_z(&mut self, z: f32) {
        self.z = z;
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.out.push(RenderCommand {
            key: SortKey {
                layer: self.layer,
                widget_order: self.widget_order,
                phase: self.phase,
                ordinal: self.ordinal,
            },
            clip: self.clip,
            z: self.z,
            primitive,
        });
        self.ordinal += 1;
    }

    /// Commands pushed through this sink so far.
    pub fn count(&self) -> u32 {
        self.ordinal
    }
}

/// Stable top-down merge sort by sort key. `scratch` is reused between
/// calls to avoid reallocating.
pub fn stable_sort(commands: &mut [RenderCommand], scratch: &mut Vec<RenderCommand>) {
    merge_sort_by(commands, scratch, &|a: &RenderCommand, b: &RenderCommand| {
        a.key.cmp(&b.key)
    });
}

pub fn merge_sort_by<T, F>(items: &mut [T], scratch: &mut Vec<T>, cmp: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    scratch.clear();
    scratch.extend_from_slice(items);
    split_merge(items, scratch, cmp);
}

/// Sorts `a`; `b` must hold the same elements and is used as work space.
fn split_merge<T, F>(a: &mut [T], b: &mut [T], cmp: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let n = a.len();
    if n < 2 {
        return;
    }
    let mid = n / 2;
    split_merge(&mut b[..mid], &mut a[..mid], cmp);
    split_merge(&mut b[mid..], &mut a[mid..], cmp);
    let (left, right) = b.split_at(mid);
    let (mut i, mut j) = (0, 0);
    for slot in a.iter_mut() {
        // ties go left
        let take_left =
            j >= right.len() || (i < left.len() && cmp(&right[j], &left[i]) != Ordering::Less);
        if take_left {
            *slot = left[i].clone();
            i += 1;
        } else {
            *slot = right[j].clone();
            j += 1;
        }
    }
}

struct FrameCx<'a> {
    store: &'a SpecStore,
    providers: &'a ViewportRegistry,
    fonts: Option<&'a dyn FontMetrics>,
    config: &'a SceneConfig,
}

#[derive(Default)]
pub struct Compositor {
    commands: Vec<RenderCommand>,
    scratch: Vec<RenderCommand>,
    deferred: Vec<NodeId>,
    next_order: u32,
}

const CONTENT_Z: f32 = 0.001;
const CARET_Z: f32 = 0.002;

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes one frame. Also records each drawn node's draw order, which
    /// hit testing and scroll targeting read back.
    pub fn build(
        &mut self,
        tree: &mut SceneTree,
        providers: &ViewportRegistry,
        fonts: Option<&dyn FontMetrics>,
    ) -> Vec<RenderCommand> {
        self.commands.clear();
        self.deferred.clear();
        self.next_order = 0;

        let store = tree.shared_store();
        let config = tree.config().clone();
        let cx = FrameCx {
            store: &store,
            providers,
            fonts,
            config: &config,
        };

        for id in tree.walk() {
            if let Some(n) = tree.node_mut(id) {
                n.draw_order = None;
            }
        }

        if let Some(root) = tree.root() {
            self.visit(tree, &cx, root, Rect::UNBOUNDED, 0.0, Layer::Normal, false);
        }
        let deferred = std::mem::take(&mut self.deferred);
        for id in &deferred {
            self.visit(
                tree,
                &cx,
                *id,
                Rect::UNBOUNDED,
                config.overlay_base_z,
                Layer::Overlay,
                true,
            );
        }
        self.deferred = deferred;

        stable_sort(&mut self.commands, &mut self.scratch);
        std::mem::take(&mut self.commands)
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &mut self,
        tree: &mut SceneTree,
        cx: &FrameCx<'_>,
        id: NodeId,
        parent_clip: Rect,
        base_z: f32,
        layer: Layer,
        overlay_pass: bool,
    ) {
        let Some(node) = tree.node(id) else {
            return;
        };
        if node.is_hidden() {
            return;
        }
        let Some(spec) = cx.store.get(node.spec) else {
            return;
        };
        let is_overlay = spec.layout.layer == Layer::Overlay;
        if is_overlay && !overlay_pass {
            self.deferred.push(id);
            return;
        }

        let mut clip = if is_overlay { Rect::UNBOUNDED } else { parent_clip };
        if let Some(area) = node.area.clip {
            clip = clip.intersect(&area);
        }
        if node.flags.contains(NodeFlags::CLIPPED) {
            clip = clip.intersect(&node.screen_rect);
        }
        let clip_opt = (clip != Rect::UNBOUNDED).then_some(clip);

        let order = self.next_order;
        self.next_order += 1;

        let mut sink = CommandSink::new(&mut self.commands, layer, order);
        sink.set_clip(clip_opt);
        sink.set_z(base_z);

        let style = &spec.style;
        if matches!(spec.kind, NodeKind::Container | NodeKind::TextInput) {
            let mut color = node.render_color;
            if color.a == 0.0 {
                color = Color::new(0.1, 0.1, 0.1, 0.8);
            }
            if node.active {
                color = color.tint(0.5);
            } else if node.hovered && style.hover_color.is_unset() {
                color = color.tint(1.2);
            } else if spec.kind == NodeKind::TextInput {
                color = color.tint(1.1);
            }
            sink.set_phase(Phase::Background);
            sink.push(Primitive::Background {
                rect: node.screen_rect,
                color,
                radius: style.corner_radius,
                border: style.border.top,
                texture: style.texture.clone(),
                tex_size: Size {
                    width: style.tex_w,
                    height: style.tex_h,
                },
            });
        }

        let text = node.text.as_str();
        if !text.is_empty() || spec.kind == NodeKind::TextInput {
            let scale = if style.text_scale > 0.0 {
                style.text_scale
            } else {
                cx.config.text_scale
            };
            let pen = Vec2::new(
                node.screen_rect.x + spec.layout.padding,
                node.screen_rect.y + spec.layout.padding,
            );
            sink.set_phase(Phase::Content);
            sink.set_z(base_z + CONTENT_Z);
            if let Some(fonts) = cx.fonts {
                let mut x = pen.x;
                for ch in text.chars() {
                    let Some(g) = fonts.glyph(ch, scale) else {
                        continue;
                    };
                    if g.size.width > 0.0 && g.size.height > 0.0 {
                        sink.push(Primitive::Glyph {
                            rect: Rect::new(
                                x + g.offset.x,
                                pen.y + g.offset.y,
                                g.size.width,
                                g.size.height,
                            ),
                            uv0: g.uv0,
                            uv1: g.uv1,
                            color: style.text_color,
                        });
                    }
                    x += g.advance;
                }
            }

            if spec.kind == NodeKind::TextInput && node.focused {
                let mut end = node.cursor.min(text.len());
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                let prefix = &text[..end];
                let dx = match cx.fonts {
                    Some(fonts) => fonts.advance(prefix, scale),
                    None => prefix.chars().count() as f32 * cx.config.char_width_estimate * scale,
                };
                let w = if style.caret_width > 0.0 {
                    style.caret_width
                } else {
                    cx.config.caret_width
                };
                let h = if style.caret_height > 0.0 {
                    style.caret_height
                } else {
                    cx.config.caret_height
                };
                sink.set_phase(Phase::Overlay);
                sink.set_z(base_z + CARET_Z);
                sink.push(Primitive::solid(
                    Rect::new(pen.x + dx, pen.y, w, h),
                    style.caret_color,
                ));
            }
        }

        if spec.kind == NodeKind::Viewport {
            if let Some(provider) = spec.provider.and_then(|p| cx.providers.get(p)) {
                let request = ViewportRequest {
                    node: id,
                    data: node.data.as_ref(),
                    screen_rect: node.screen_rect,
                    z: base_z,
                    clip: clip_opt,
                };
                sink.set_phase(Phase::Content);
                sink.set_z(base_z);
                provider.render(&request, &mut sink);
            }
        }
        drop(sink);

        let children = node.children.clone();
        if let Some(n) = tree.node_mut(id) {
            n.draw_order = Some(DrawOrder { layer, order });
        }
        for c in children {
            self.visit(tree, cx, c, clip, base_z, layer, overlay_pass);
        }

        // Scrollbars draw over their own subtree.
        let Some(node) = tree.node(id) else {
            return;
        };
        if let Some(g) = scrollbar_geometry(node, spec, cx.config) {
            let order = self.next_order;
            self.next_order += 1;
            let mut sink = CommandSink::new(&mut self.commands, layer, order);
            sink.set_clip(clip_opt);
            sink.set_z(base_z + CONTENT_Z);
            sink.set_phase(Phase::Overlay);
            sink.push(Primitive::solid(g.track, style.track_color));
            sink.push(Primitive::solid(g.thumb, style.thumb_color));
        }
    }
}
