//! Immutable node specifications and the store that owns them.

use std::rc::Rc;

use bitflags::bitflags;
use strata_core::{Color, SpecError, StringId, Transform};

bitflags! {
    /// Behaviour switches shared by specs and live nodes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        const CLICKABLE  = 1 << 0;
        /// Writes bound `layout.x`/`layout.y` while dragged.
        const DRAGGABLE  = 1 << 1;
        const SCROLLABLE = 1 << 2;
        const FOCUSABLE  = 1 << 3;
        const HIDDEN     = 1 << 4;
        /// Masks descendants outside the node's screen rect.
        const CLIPPED    = 1 << 5;
        const EDITABLE   = 1 << 6;
        /// Acts as the scrollbar (and viewport anchor) of its scroll area.
        const SCROLLBAR  = 1 << 7;
        /// Clips to the scroll area's viewport.
        const CLIP_TO_AREA = 1 << 8;
    }
}

impl NodeFlags {
    pub fn parse_name(name: &str) -> Option<NodeFlags> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "clickable" => NodeFlags::CLICKABLE,
            "draggable" => NodeFlags::DRAGGABLE,
            "scrollable" => NodeFlags::SCROLLABLE,
            "focusable" => NodeFlags::FOCUSABLE,
            "hidden" => NodeFlags::HIDDEN,
            "clipped" => NodeFlags::CLIPPED,
            "editable" => NodeFlags::EDITABLE,
            "scrollbar" => NodeFlags::SCROLLBAR,
            "clip_to_area" => NodeFlags::CLIP_TO_AREA,
            "none" => NodeFlags::empty(),
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    #[default]
    Container,
    Text,
    TextInput,
    /// Content drawn by a registered viewport provider.
    Viewport,
}

impl NodeKind {
    pub fn from_name(name: &str) -> Option<NodeKind> {
        Some(match name {
            "container" => NodeKind::Container,
            "text" => NodeKind::Text,
            "text_input" => NodeKind::TextInput,
            "viewport" => NodeKind::Viewport,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutStrategy {
    #[default]
    FlexColumn,
    FlexRow,
    Canvas,
    SplitH,
    SplitV,
}

impl LayoutStrategy {
    pub fn from_name(name: &str) -> Option<LayoutStrategy> {
        Some(match name {
            "column" | "flex_column" => LayoutStrategy::FlexColumn,
            "row" | "flex_row" => LayoutStrategy::FlexRow,
            "canvas" => LayoutStrategy::Canvas,
            "split_h" => LayoutStrategy::SplitH,
            "split_v" => LayoutStrategy::SplitV,
            _ => return None,
        })
    }

    pub fn is_split(self) -> bool {
        matches!(self, LayoutStrategy::SplitH | LayoutStrategy::SplitV)
    }

    pub fn is_stack(self) -> bool {
        matches!(self, LayoutStrategy::FlexColumn | LayoutStrategy::FlexRow)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    #[default]
    Normal = 0,
    /// Drawn after everything else, ignoring ancestor clips.
    Overlay = 1,
}

impl Layer {
    pub fn from_name(name: &str) -> Option<Layer> {
        Some(match name {
            "normal" => Layer::Normal,
            "overlay" => Layer::Overlay,
            _ => return None,
        })
    }
}

/// Sizing and placement. Negative width/height means "auto".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutSpec {
    pub strategy: LayoutStrategy,
    pub layer: Layer,
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub spacing: f32,
    /// Share of the content given to the first child of a split; `<= 0` means 0.5.
    pub split_ratio: f32,
    pub x: f32,
    pub y: f32,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::default(),
            layer: Layer::default(),
            width: -1.0,
            height: -1.0,
            padding: 0.0,
            spacing: 0.0,
            split_ratio: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub color: Color,
    pub hover_color: Color,
    pub active_color: Color,
    pub text_color: Color,
    pub caret_color: Color,
    pub border: Edges,
    pub corner_radius: f32,
    /// Hover blend speed per second; `<= 0` uses the configured default.
    pub animation_speed: f32,
    pub text_scale: f32,
    pub caret_width: f32,
    pub caret_height: f32,
    pub texture: Option<Rc<str>>,
    pub tex_w: f32,
    pub tex_h: f32,
    pub scrollbar_width: f32,
    pub track_color: Color,
    pub thumb_color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            hover_color: Color::TRANSPARENT,
            active_color: Color::TRANSPARENT,
            text_color: Color::WHITE,
            caret_color: Color::WHITE,
            border: Edges::default(),
            corner_radius: 0.0,
            animation_speed: 0.0,
            text_scale: 0.0,
            caret_width: 0.0,
            caret_height: 0.0,
            texture: None,
            tex_w: 0.0,
            tex_h: 0.0,
            scrollbar_width: 0.0,
            track_color: Color::new(0.6, 0.6, 0.6, 0.4),
            thumb_color: Color::new(1.0, 1.0, 1.0, 0.7),
        }
    }
}

/// `target <- source` pair as written in the spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingSpec {
    pub target: Rc<str>,
    pub source: Rc<str>,
}

/// Index of a spec inside its [`SpecStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(pub(crate) u32);

impl SpecId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSpec {
    pub id: Option<Rc<str>>,
    pub kind: NodeKind,
    pub flags: NodeFlags,
    pub transform: Transform,
    pub layout: LayoutSpec,
    pub style: Style,
    pub bindings: Vec<BindingSpec>,
    pub text: Option<Rc<str>>,
    pub children: Vec<SpecId>,
    /// Field on the bound data whose elements become dynamic children.
    pub collection: Option<Rc<str>>,
    pub item_template: Option<SpecId>,
    /// Enum field on each element naming the template to use for it.
    pub template_selector: Option<Rc<str>>,
    pub on_click: Option<StringId>,
    pub on_change: Option<StringId>,
    pub provider: Option<StringId>,
    pub scroll_area: Option<Rc<str>>,
    /// Source line for diagnostics.
    pub line: u32,
}

impl NodeSpec {
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("(anon)")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: u32,
    pub message: String,
}

/// Owns every [`NodeSpec`] of one loaded asset: the root tree, the named
/// templates and any copies made from them. Fixed capacity per load.
#[derive(Debug, Default)]
pub struct SpecStore {
    specs: Vec<NodeSpec>,
    capacity: usize,
    root: Option<SpecId>,
    templates: Vec<(Rc<str>, SpecId)>,
    diagnostics: Vec<Diagnostic>,
}

impl SpecStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            specs: Vec::new(),
            capacity,
            root: None,
            templates: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocates a spec with default values.
    pub fn push_node(&mut self) -> Result<SpecId, SpecError> {
        if self.specs.len() >= self.capacity {
            return Err(SpecError::Exhausted {
                capacity: self.capacity,
            });
        }
        self.specs.push(NodeSpec::default());
        Ok(SpecId((self.specs.len() - 1) as u32))
    }

    pub fn get(&self, id: SpecId) -> Option<&NodeSpec> {
        self.specs.get(id.index())
    }

    pub fn get_mut(&mut self, id: SpecId) -> Option<&mut NodeSpec> {
        self.specs.get_mut(id.index())
    }

    pub fn get_root(&self) -> Option<SpecId> {
        self.root
    }

    pub fn set_root(&mut self, id: SpecId) {
        self.root = Some(id);
    }

    /// Registers a template. A later template with the same name shadows the
    /// earlier one.
    pub fn add_template(&mut self, name: impl Into<Rc<str>>, id: SpecId) {
        self.templates.insert(0, (name.into(), id));
    }

    pub fn get_template(&self, name: &str) -> Option<SpecId> {
        self.templates
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, id)| *id)
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|(n, _)| &**n)
    }

    /// Deep copy of `src`: children and item template are copied recursively,
    /// strings are shared.
    pub fn copy_template(&mut self, src: SpecId) -> Result<SpecId, SpecError> {
        let Some(spec) = self.get(src).cloned() else {
            return Err(SpecError::Malformed {
                line: 0,
                message: format!("spec {} does not exist", src.index()),
            });
        };
        let dst = self.push_node()?;
        let mut copy = spec;
        let mut children = Vec::with_capacity(copy.children.len());
        for child in &copy.children {
            children.push(self.copy_template(*child)?);
        }
        copy.children = children;
        if let Some(t) = copy.item_template {
            copy.item_template = Some(self.copy_template(t)?);
        }
        self.specs[dst.index()] = copy;
        Ok(dst)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn warn(&mut self, line: u32, message: String) {
        log::warn!("SpecLoader: {} (line {})", message, line);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            line,
            message,
        });
    }

    pub(crate) fn error(&mut self, line: u32, message: String) {
        log::error!("SpecLoader: {} (line {})", message, line);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            line,
            message,
        });
    }
}
