//! Live scene tree: nodes instantiated from specs, bound to application data.
//!
//! Nodes live in a [`SlotMap`] bounded by the configured capacity; a
//! [`NodeId`] goes stale (and lookups return `None`) once its node is removed
//! by a rebuild.

use std::rc::Rc;

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};
use strata_core::reflect::{DataRef, FieldPath, FieldRef, Reflect, SharedData};
use strata_core::{BuildError, Color, Mat4, Rect, SceneConfig, Size, StringId, Vec2, Vec3};

use crate::binding::{self, BindingTarget, Bindings};
use crate::spec::{Layer, NodeFlags, NodeSpec, SpecId, SpecStore};

new_key_type! {
    pub struct NodeId;
}

bitflags! {
    /// Rect components driven by bindings; layout leaves them alone.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BoundAxes: u8 {
        const X      = 1 << 0;
        const Y      = 1 << 1;
        const WIDTH  = 1 << 2;
        const HEIGHT = 1 << 3;
    }
}

/// Per-node scroll area state written by the scroll controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AreaState {
    pub offset: f32,
    /// Vertical shift currently applied to this node's subtree screen rects.
    pub shift: f32,
    pub clip: Option<Rect>,
    pub viewport_size: f32,
    pub content_size: f32,
    pub show_scrollbar: bool,
}

/// Position of a node in the last composed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawOrder {
    pub layer: Layer,
    pub order: u32,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub spec: SpecId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: Option<DataRef>,
    pub bindings: Bindings,
    pub bound: BoundAxes,
    pub flags: NodeFlags,

    /// Local layout position (spec or bound x/y), before scroll.
    pub origin: Vec2,
    /// Parent-relative rect.
    pub rect: Rect,
    pub screen_rect: Rect,
    /// Per-instance transform position (bindable).
    pub position: Vec3,
    pub local_matrix: Mat4,
    pub world_matrix: Mat4,

    pub hovered: bool,
    pub active: bool,
    pub focused: bool,
    /// Hover blend factor in `[0, 1]`.
    pub hover_t: f32,

    pub scroll: Vec2,
    pub content_size: Size,
    pub area: AreaState,

    pub text: String,
    /// Byte offset of the caret in `text`.
    pub cursor: usize,
    pub render_color: Color,
    pub on_click: Option<StringId>,
    pub on_change: Option<StringId>,
    pub draw_order: Option<DrawOrder>,
}

impl Node {
    fn from_spec(id: SpecId, spec: &NodeSpec, parent: Option<NodeId>, data: Option<DataRef>) -> Self {
        let origin = Vec2::new(spec.layout.x, spec.layout.y);
        Self {
            spec: id,
            parent,
            children: Vec::new(),
            data,
            bindings: Bindings::new(),
            bound: BoundAxes::empty(),
            flags: spec.flags,
            origin,
            rect: Rect::new(origin.x, origin.y, 0.0, 0.0),
            screen_rect: Rect::default(),
            position: spec.transform.position,
            local_matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            hovered: false,
            active: false,
            focused: false,
            hover_t: 0.0,
            scroll: Vec2::ZERO,
            content_size: Size::default(),
            area: AreaState::default(),
            text: spec.text.as_deref().map(str::to_string).unwrap_or_default(),
            cursor: 0,
            render_color: spec.style.color,
            on_click: spec.on_click,
            on_change: spec.on_change,
            draw_order: None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN)
    }

    pub fn has_binding(&self, target: BindingTarget) -> bool {
        self.bindings.iter().any(|b| b.target == Some(target))
    }
}

/// Which template an element of a collection is built from.
struct ElementPlan {
    index: usize,
    template: SpecId,
}

pub struct SceneTree {
    store: Rc<SpecStore>,
    config: SceneConfig,
    nodes: SlotMap<NodeId, Node>,
    root: Option<NodeId>,
}

impl SceneTree {
    pub fn new(store: Rc<SpecStore>, config: &SceneConfig) -> Self {
        Self {
            store,
            config: config.clone(),
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    pub fn store(&self) -> &SpecStore {
        &self.store
    }

    pub fn shared_store(&self) -> Rc<SpecStore> {
        Rc::clone(&self.store)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.node_capacity
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Children of `id` in draw order; empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Spec a live node was created from.
    pub fn spec(&self, id: NodeId) -> Option<&NodeSpec> {
        self.store.get(self.nodes.get(id)?.spec)
    }

    /// Replaces the whole tree with a fresh instance of the store's root spec.
    pub fn instantiate(&mut self, data: Option<&SharedData>) -> Result<NodeId, BuildError> {
        self.clear();
        let root_spec = self.store.get_root().ok_or(BuildError::UnknownSpec)?;
        let data = data.map(DataRef::new);
        let id = self.create(root_spec, None, data)?;
        self.root = Some(id);
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Instantiates `spec` (and its subtree) under `parent`.
    pub fn create(
        &mut self,
        spec_id: SpecId,
        parent: Option<NodeId>,
        data: Option<DataRef>,
    ) -> Result<NodeId, BuildError> {
        if self.nodes.len() >= self.config.node_capacity {
            log::error!(
                "SceneTree: node pool exhausted ({} nodes)",
                self.config.node_capacity
            );
            return Err(BuildError::PoolExhausted {
                capacity: self.config.node_capacity,
            });
        }
        let store = self.shared_store();
        let spec = store.get(spec_id).ok_or(BuildError::UnknownSpec)?;

        let mut node = Node::from_spec(spec_id, spec, parent, data);
        node.bindings = binding::resolve(spec, node.data.as_ref());
        for b in &node.bindings {
            node.bound |= match b.target {
                Some(BindingTarget::LayoutX) => BoundAxes::X,
                Some(BindingTarget::LayoutY) => BoundAxes::Y,
                Some(BindingTarget::LayoutWidth) => BoundAxes::WIDTH,
                Some(BindingTarget::LayoutHeight) => BoundAxes::HEIGHT,
                _ => BoundAxes::empty(),
            };
        }

        let id = self.nodes.insert(node);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p)) {
            p.children.push(id);
        }
        self.rebuild_children(id)?;
        Ok(id)
    }

    /// Discards the children of `id` and builds them again from its spec:
    /// static children first, then one child per live collection element.
    pub fn rebuild_children(&mut self, id: NodeId) -> Result<(), BuildError> {
        self.clear_children(id);
        let Some(node) = self.nodes.get(id) else {
            return Ok(());
        };
        let data = node.data.clone();
        let store = self.shared_store();
        let Some(spec) = store.get(node.spec) else {
            return Err(BuildError::UnknownSpec);
        };

        for child in &spec.children {
            self.create(*child, Some(id), data.clone())?;
        }

        let Some(collection) = spec.collection.as_deref() else {
            return Ok(());
        };
        let Some(data) = data else {
            log::error!(
                "SceneTree: node '{}' has collection '{}' but no data",
                spec.id_str(),
                collection
            );
            return Ok(());
        };
        let plan = data
            .with(|obj| plan_collection(&store, spec, collection, obj))
            .flatten();
        let Some((list_path, elements)) = plan else {
            return Ok(());
        };
        for e in elements {
            self.create(e.template, Some(id), Some(data.element(&list_path, e.index)))?;
        }
        Ok(())
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        for c in children {
            self.remove_subtree(c);
        }
    }

    /// Removes `id` and its descendants, detaching it from its parent.
    pub fn remove(&mut self, id: NodeId) {
        let parent = self.nodes.get(id).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        self.remove_subtree(id);
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.remove(n) {
                stack.extend(node.children);
            }
        }
    }

    /// Pre-order walk from the root.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First node (pre-order) whose spec id equals `name`.
    pub fn find_by_id(&self, name: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.spec(*id).and_then(|s| s.id.as_deref()) == Some(name))
    }

    /// Per-tick refresh: matrices, hover animation, bindings, recursively.
    pub fn update(&mut self, dt: f32) {
        if let Some(root) = self.root {
            self.update_node(root, Mat4::IDENTITY, dt);
        }
    }

    fn update_node(&mut self, id: NodeId, parent_world: Mat4, dt: f32) {
        let store = self.shared_store();
        let hover_speed = self.config.hover_speed;
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let Some(spec) = store.get(node.spec) else {
            return;
        };

        let mut transform = spec.transform;
        transform.position = node.position;
        node.local_matrix = transform.to_matrix(node.origin);
        node.world_matrix = parent_world * node.local_matrix;

        let speed = if spec.style.animation_speed > 0.0 {
            spec.style.animation_speed
        } else {
            hover_speed
        };
        let step = speed * dt;
        node.hover_t = if node.hovered {
            (node.hover_t + step).min(1.0)
        } else {
            (node.hover_t - step).max(0.0)
        };
        if !spec.style.hover_color.is_unset() {
            node.render_color = spec.style.color.lerp(spec.style.hover_color, node.hover_t);
        }

        if node.bindings.is_empty() {
            if let Some(text) = spec.text.as_deref() {
                if node.text != text {
                    node.text = text.to_string();
                }
            }
        } else {
            binding::apply_all(node);
        }

        let world = node.world_matrix;
        let children = node.children.clone();
        for c in children {
            self.update_node(c, world, dt);
        }
    }
}

fn int_field(obj: &dyn Reflect, name: &str) -> Option<i64> {
    match obj.field_by_name(name)? {
        FieldRef::Int(n) => Some(n),
        _ => None,
    }
}

/// Element count for `collection`: an explicit `<name>_count` field, then
/// `<stem>_count` for `<stem>_ptrs` collections, then a generic `count`,
/// then the list length. Always clamped to the list length.
fn collection_count(obj: &dyn Reflect, collection: &str, len: usize) -> usize {
    let explicit = int_field(obj, &format!("{collection}_count"))
        .or_else(|| {
            collection
                .strip_suffix("_ptrs")
                .and_then(|stem| int_field(obj, &format!("{stem}_count")))
        })
        .or_else(|| int_field(obj, "count"));
    match explicit {
        Some(n) => {
            let n = n.max(0) as usize;
            if n > len {
                log::warn!(
                    "SceneTree: count {} for '{}' exceeds its length {}",
                    n,
                    collection,
                    len
                );
            }
            n.min(len)
        }
        None => len,
    }
}

fn plan_collection(
    store: &SpecStore,
    spec: &NodeSpec,
    collection: &str,
    obj: &dyn Reflect,
) -> Option<(FieldPath, Vec<ElementPlan>)> {
    let Some(list_path) = FieldPath::resolve(obj, collection) else {
        log::error!(
            "SceneTree: collection '{}' not found on '{}'",
            collection,
            obj.type_name()
        );
        return None;
    };
    let Some(FieldRef::List(list)) = list_path.read(obj) else {
        log::error!(
            "SceneTree: field '{}' on '{}' is not a list",
            collection,
            obj.type_name()
        );
        return None;
    };

    let count = collection_count(obj, collection, list.len());
    let mut out = Vec::with_capacity(count);
    for index in 0..count {
        let Some(item) = list.item(index) else {
            continue;
        };
        let selected = spec.template_selector.as_deref().and_then(|field| {
            match item.field_by_name(field) {
                Some(FieldRef::Enum(variant)) => {
                    let t = store.get_template(variant);
                    if t.is_none() {
                        log::warn!(
                            "SceneTree: no template named '{}' for element {} of '{}'",
                            variant,
                            index,
                            collection
                        );
                    }
                    t
                }
                _ => {
                    log::warn!(
                        "SceneTree: selector '{}' is not an enum field of '{}'",
                        field,
                        item.type_name()
                    );
                    None
                }
            }
        });
        match selected.or(spec.item_template) {
            Some(template) => out.push(ElementPlan { index, template }),
            None => log::warn!(
                "SceneTree: no template for element {} of '{}' (node '{}')",
                index,
                collection,
                spec.id_str()
            ),
        }
    }
    Some((list_path, out))
}
