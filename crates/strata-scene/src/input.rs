//! # Pointer and keyboard handling
//!
//! [`InputController`] turns normalized [`InputEvent`]s into node state
//! (`hovered`, `active`, `focused`), data writes through bindings, and a queue
//! of [`UiEvent`]s the application drains with
//! [`pop_event`](InputController::pop_event).
//!
//! Scroll-area scrollbars see presses, cursor moves and wheel input first;
//! whatever they take never reaches the nodes.

use std::collections::VecDeque;

use strata_core::{InputEvent, Key, MouseButton, SceneConfig, Vec2};
use unicode_segmentation::UnicodeSegmentation;

use crate::binding::{self, BindingTarget};
use crate::command::CommandRegistry;
use crate::scroll::ScrollController;
use crate::spec::NodeFlags;
use crate::tree::{Node, NodeId, SceneTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEventKind {
    /// Press and release on the same node without dragging.
    Click,
    /// Input wrote to the node's bound data.
    ValueChange,
    DragStart,
    DragEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiEvent {
    pub kind: UiEventKind,
    pub target: NodeId,
}

/// Topmost visible node under `pos`: children are tested last-to-first
/// before their parent. Clipped nodes and scroll-area viewports cut off
/// their subtree outside their bounds.
pub fn hit_test(tree: &SceneTree, pos: Vec2) -> Option<NodeId> {
    hit_node(tree, tree.root()?, pos)
}

fn hit_node(tree: &SceneTree, id: NodeId, pos: Vec2) -> Option<NodeId> {
    let node = tree.node(id)?;
    if node.is_hidden() {
        return None;
    }
    if node.flags.contains(NodeFlags::CLIPPED) && !node.screen_rect.contains(pos) {
        return None;
    }
    if node.area.clip.is_some_and(|c| !c.contains(pos)) {
        return None;
    }
    for c in node.children.iter().rev() {
        if let Some(hit) = hit_node(tree, *c, pos) {
            return Some(hit);
        }
    }
    node.screen_rect.contains(pos).then_some(id)
}

/// Scroll offset clamped to the content that does not fit the padded rect.
fn clamp_scroll(node: &Node, padding: f32, scroll: Vec2) -> Vec2 {
    let max_x = (node.content_size.width - (node.rect.w - padding * 2.0)).max(0.0);
    let max_y = (node.content_size.height - (node.rect.h - padding * 2.0)).max(0.0);
    Vec2::new(scroll.x.clamp(0.0, max_x), scroll.y.clamp(0.0, max_y))
}

pub struct InputController {
    drag_threshold_sq: f32,
    wheel_step: f32,
    capacity: usize,

    cursor: Vec2,
    hovered: Option<NodeId>,
    active: Option<NodeId>,
    focused: Option<NodeId>,

    possible_drag: bool,
    dragging: bool,
    drag_start: Vec2,
    /// Bound position or scroll offset of the active node at press time.
    drag_origin: Vec2,

    events: VecDeque<UiEvent>,
}

impl InputController {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            drag_threshold_sq: config.drag_threshold_sq,
            wheel_step: config.node_wheel_step,
            capacity: config.event_queue_capacity,
            cursor: Vec2::ZERO,
            hovered: None,
            active: None,
            focused: None,
            possible_drag: false,
            dragging: false,
            drag_start: Vec2::ZERO,
            drag_origin: Vec2::ZERO,
            events: VecDeque::with_capacity(config.event_queue_capacity),
        }
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn pop_event(&mut self) -> Option<UiEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Forgets every node handle, e.g. after the tree was rebuilt.
    pub fn reset(&mut self) {
        self.hovered = None;
        self.active = None;
        self.focused = None;
        self.possible_drag = false;
        self.dragging = false;
    }

    /// Re-runs the hit test at the last cursor position. Call after layout
    /// so hover follows content that moved under a still cursor.
    pub fn refresh_hover(&mut self, tree: &mut SceneTree) {
        let hit = hit_test(tree, self.cursor);
        self.set_hovered(tree, hit);
    }

    /// Feeds one event. Returns whether anything took it.
    pub fn handle(
        &mut self,
        tree: &mut SceneTree,
        scroll: &mut ScrollController,
        commands: &CommandRegistry,
        event: &InputEvent,
    ) -> bool {
        match *event {
            InputEvent::CursorMoved { pos } => {
                self.cursor = pos;
                if scroll.handle_cursor(tree, pos) {
                    return true;
                }
                self.refresh_hover(tree);
                self.drag(tree, commands, pos)
            }
            InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed,
                pos,
            } => {
                self.cursor = pos;
                if scroll.handle_mouse_button(tree, pos, pressed) {
                    return true;
                }
                self.refresh_hover(tree);
                if pressed {
                    self.press(tree, pos)
                } else {
                    self.release(tree, commands)
                }
            }
            InputEvent::MouseButton { .. } => false,
            InputEvent::Wheel { pos, delta } => {
                if scroll.handle_wheel(pos, delta.y) {
                    return true;
                }
                self.wheel(tree, pos, delta)
            }
            InputEvent::Char(c) => self.insert_char(tree, commands, c),
            InputEvent::Key {
                key: Key::Backspace,
                pressed: true,
                ..
            } => self.backspace(tree, commands),
            InputEvent::Key { .. } => false,
        }
    }

    fn push(&mut self, kind: UiEventKind, target: NodeId) {
        if self.events.len() >= self.capacity {
            log::warn!("InputController: event queue full, dropping {:?}", kind);
            return;
        }
        self.events.push_back(UiEvent { kind, target });
    }

    fn set_hovered(&mut self, tree: &mut SceneTree, hit: Option<NodeId>) {
        if self.hovered != hit {
            if let Some(prev) = self.hovered.and_then(|h| tree.node_mut(h)) {
                prev.hovered = false;
            }
        }
        self.hovered = hit;
        if let Some(n) = hit.and_then(|h| tree.node_mut(h)) {
            n.hovered = true;
        }
    }

    fn set_focus(&mut self, tree: &mut SceneTree, id: Option<NodeId>) {
        if self.focused == id {
            return;
        }
        if let Some(prev) = self.focused.and_then(|f| tree.node_mut(f)) {
            prev.focused = false;
        }
        self.focused = id;
        if let Some(n) = id.and_then(|f| tree.node_mut(f)) {
            n.focused = true;
            n.cursor = n.text.len();
        }
    }

    fn press(&mut self, tree: &mut SceneTree, pos: Vec2) -> bool {
        let Some(id) = self.hovered else {
            self.set_focus(tree, None);
            return false;
        };
        let Some(node) = tree.node_mut(id) else {
            return false;
        };
        node.active = true;
        self.active = Some(id);
        self.possible_drag = true;
        self.drag_start = pos;

        if node.flags.contains(NodeFlags::SCROLLABLE) {
            self.drag_origin = node.scroll;
        } else if node.flags.contains(NodeFlags::DRAGGABLE) {
            let x = binding::read_binding_float(node, BindingTarget::LayoutX).unwrap_or(node.origin.x);
            let y = binding::read_binding_float(node, BindingTarget::LayoutY).unwrap_or(node.origin.y);
            self.drag_origin = Vec2::new(x, y);
        }

        let focus = node.flags.contains(NodeFlags::FOCUSABLE).then_some(id);
        self.set_focus(tree, focus);
        true
    }

    fn drag(&mut self, tree: &mut SceneTree, commands: &CommandRegistry, pos: Vec2) -> bool {
        let Some(id) = self.active else {
            return false;
        };
        let delta = pos - self.drag_start;
        if self.possible_drag && !self.dragging && delta.length_sq() > self.drag_threshold_sq {
            self.dragging = true;
            self.push(UiEventKind::DragStart, id);
        }
        if !self.dragging {
            return false;
        }

        let padding = tree.spec(id).map_or(0.0, |s| s.layout.padding);
        let Some(node) = tree.node(id) else {
            return false;
        };
        if node.flags.contains(NodeFlags::DRAGGABLE) {
            let target = self.drag_origin + delta;
            let mut changed = binding::write_binding_float(node, BindingTarget::LayoutX, target.x);
            changed |= binding::write_binding_float(node, BindingTarget::LayoutY, target.y);
            if changed {
                self.value_changed(tree, commands, id);
            }
        } else if node.flags.contains(NodeFlags::SCROLLABLE) {
            let scroll = clamp_scroll(node, padding, self.drag_origin - delta);
            if let Some(n) = tree.node_mut(id) {
                n.scroll = scroll;
            }
        }
        true
    }

    fn release(&mut self, tree: &mut SceneTree, commands: &CommandRegistry) -> bool {
        let dragging = std::mem::replace(&mut self.dragging, false);
        self.possible_drag = false;
        let Some(id) = self.active.take() else {
            return false;
        };
        if dragging {
            self.push(UiEventKind::DragEnd, id);
        } else if self.hovered == Some(id) {
            self.push(UiEventKind::Click, id);
            if let Some(cmd) = tree.node(id).and_then(|n| n.on_click) {
                commands.execute_id(cmd, tree, id);
            }
        }
        if let Some(n) = tree.node_mut(id) {
            n.active = false;
        }
        true
    }

    fn value_changed(&mut self, tree: &SceneTree, commands: &CommandRegistry, id: NodeId) {
        self.push(UiEventKind::ValueChange, id);
        if let Some(cmd) = tree.node(id).and_then(|n| n.on_change) {
            commands.execute_id(cmd, tree, id);
        }
    }

    fn wheel(&mut self, tree: &mut SceneTree, pos: Vec2, delta: Vec2) -> bool {
        let mut current = hit_test(tree, pos);
        while let Some(id) = current {
            let Some(node) = tree.node(id) else {
                return false;
            };
            if node.flags.contains(NodeFlags::SCROLLABLE) {
                let padding = tree.spec(id).map_or(0.0, |s| s.layout.padding);
                let wanted = Vec2::new(
                    node.scroll.x + delta.x * self.wheel_step,
                    node.scroll.y - delta.y * self.wheel_step,
                );
                let scroll = clamp_scroll(node, padding, wanted);
                if let Some(n) = tree.node_mut(id) {
                    n.scroll = scroll;
                }
                return true;
            }
            current = node.parent;
        }
        false
    }

    fn insert_char(&mut self, tree: &mut SceneTree, commands: &CommandRegistry, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        self.edit_text(tree, commands, |text| {
            text.push(c);
            true
        })
    }

    fn backspace(&mut self, tree: &mut SceneTree, commands: &CommandRegistry) -> bool {
        self.edit_text(tree, commands, |text| match text.grapheme_indices(true).next_back() {
            Some((at, _)) => {
                text.truncate(at);
                true
            }
            None => false,
        })
    }

    /// Edits the text binding of the focused editable node.
    fn edit_text(
        &mut self,
        tree: &mut SceneTree,
        commands: &CommandRegistry,
        edit: impl FnOnce(&mut String) -> bool,
    ) -> bool {
        let Some(id) = self.focused else {
            return false;
        };
        let Some(node) = tree.node(id) else {
            return false;
        };
        if !node.flags.contains(NodeFlags::EDITABLE) {
            return false;
        }
        let Some(mut text) = binding::read_binding_string(node, BindingTarget::Text) else {
            return false;
        };
        if !edit(&mut text) || !binding::write_binding_string(node, BindingTarget::Text, &text) {
            return false;
        }
        if let Some(n) = tree.node_mut(id) {
            n.cursor = text.len();
            n.text = text;
        }
        self.value_changed(tree, commands, id);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use strata_core::impl_reflect;
    use strata_core::reflect::SharedData;
    use strata_core::{Size, StringId};

    use super::*;
    use crate::layout::layout_root;
    use crate::spec::{BindingSpec, LayoutStrategy, NodeKind, NodeSpec, SpecId, SpecStore};

    #[derive(Default)]
    struct Form {
        name: String,
        x: f32,
        y: f32,
    }
    impl_reflect!(Form { value name, value x, value y });

    fn push(store: &mut SpecStore, name: &str, f: impl FnOnce(&mut NodeSpec)) -> SpecId {
        let id = store.push_node().unwrap();
        let s = store.get_mut(id).unwrap();
        s.id = Some(name.into());
        f(s);
        id
    }

    fn bind(target: &str, source: &str) -> BindingSpec {
        BindingSpec {
            target: target.into(),
            source: source.into(),
        }
    }

    fn place(s: &mut NodeSpec, x: f32, y: f32, w: f32, h: f32) {
        s.layout.x = x;
        s.layout.y = y;
        s.layout.width = w;
        s.layout.height = h;
    }

    struct Fixture {
        tree: SceneTree,
        model: Rc<RefCell<Form>>,
        scroll: ScrollController,
        commands: CommandRegistry,
        input: InputController,
        clicks: Rc<Cell<u32>>,
        changes: Rc<Cell<u32>>,
    }

    impl Fixture {
        fn new(config: SceneConfig) -> Self {
            let mut store = SpecStore::with_capacity(16);
            let button = push(&mut store, "button", |s| {
                s.flags = NodeFlags::CLICKABLE;
                s.on_click = Some(StringId::new("clicked"));
                place(s, 10.0, 10.0, 100.0, 40.0);
            });
            let field = push(&mut store, "field", |s| {
                s.kind = NodeKind::TextInput;
                s.flags = NodeFlags::FOCUSABLE | NodeFlags::EDITABLE;
                s.bindings = vec![bind("text", "name")];
                s.on_change = Some(StringId::new("changed"));
                place(s, 10.0, 60.0, 200.0, 30.0);
            });
            let knob = push(&mut store, "knob", |s| {
                s.flags = NodeFlags::DRAGGABLE;
                s.bindings = vec![bind("layout.x", "x"), bind("layout.y", "y")];
                s.on_change = Some(StringId::new("changed"));
                s.layout.width = 20.0;
                s.layout.height = 20.0;
            });
            let row = push(&mut store, "row", |s| s.layout.height = 30.0);
            let list = push(&mut store, "list", |s| {
                s.flags = NodeFlags::SCROLLABLE | NodeFlags::CLIPPED;
                place(s, 500.0, 0.0, 200.0, 100.0);
                s.children = vec![row; 10];
            });
            let root = push(&mut store, "root", |s| {
                s.layout.strategy = LayoutStrategy::Canvas;
                s.children = vec![button, field, knob, list];
            });
            store.set_root(root);

            let model = Rc::new(RefCell::new(Form {
                name: String::new(),
                x: 300.0,
                y: 300.0,
            }));
            let shared: SharedData = model.clone();
            let mut tree = SceneTree::new(Rc::new(store), &config);
            tree.instantiate(Some(&shared)).unwrap();

            let clicks = Rc::new(Cell::new(0));
            let changes = Rc::new(Cell::new(0));
            let mut commands = CommandRegistry::new();
            let c = clicks.clone();
            commands.register("clicked", move |_, _| c.set(c.get() + 1));
            let c = changes.clone();
            commands.register("changed", move |_, _| c.set(c.get() + 1));

            let mut fx = Self {
                tree,
                model,
                scroll: ScrollController::new(&config),
                commands,
                input: InputController::new(&config),
                clicks,
                changes,
            };
            fx.frame();
            fx
        }

        fn frame(&mut self) {
            self.tree.update(0.0);
            layout_root(
                &mut self.tree,
                Size {
                    width: 800.0,
                    height: 600.0,
                },
                0,
                None,
            );
        }

        fn send(&mut self, event: InputEvent) -> bool {
            self.input
                .handle(&mut self.tree, &mut self.scroll, &self.commands, &event)
        }

        fn move_to(&mut self, x: f32, y: f32) -> bool {
            self.send(InputEvent::CursorMoved {
                pos: Vec2::new(x, y),
            })
        }

        fn button(&mut self, x: f32, y: f32, pressed: bool) -> bool {
            self.send(InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed,
                pos: Vec2::new(x, y),
            })
        }

        fn click(&mut self, x: f32, y: f32) {
            self.move_to(x, y);
            self.button(x, y, true);
            self.button(x, y, false);
        }

        fn id(&self, name: &str) -> NodeId {
            self.tree.find_by_id(name).unwrap()
        }

        fn drain(&mut self) -> Vec<(UiEventKind, NodeId)> {
            std::iter::from_fn(|| self.input.pop_event())
                .map(|e| (e.kind, e.target))
                .collect()
        }
    }

    #[test]
    fn test_hit_test_prefers_last_child_and_respects_clip() {
        let mut fx = Fixture::new(SceneConfig::default());
        assert_eq!(hit_test(&fx.tree, Vec2::new(20.0, 20.0)), Some(fx.id("button")));
        assert_eq!(hit_test(&fx.tree, Vec2::new(5.0, 5.0)), Some(fx.id("root")));
        assert_eq!(hit_test(&fx.tree, Vec2::new(900.0, 5.0)), None);

        // rows below the clipped list are cut off
        let rows: Vec<NodeId> = fx.tree.children(fx.id("list")).to_vec();
        assert_eq!(hit_test(&fx.tree, Vec2::new(510.0, 40.0)), Some(rows[1]));
        assert_eq!(hit_test(&fx.tree, Vec2::new(510.0, 150.0)), Some(fx.id("root")));

        let button = fx.id("button");
        fx.tree.node_mut(button).unwrap().flags |= NodeFlags::HIDDEN;
        assert_eq!(hit_test(&fx.tree, Vec2::new(20.0, 20.0)), Some(fx.id("root")));
    }

    #[test]
    fn test_hover_follows_cursor() {
        let mut fx = Fixture::new(SceneConfig::default());
        fx.move_to(20.0, 20.0);
        let button = fx.id("button");
        assert_eq!(fx.input.hovered(), Some(button));
        assert!(fx.tree.node(button).unwrap().hovered);

        fx.move_to(5.0, 5.0);
        assert!(!fx.tree.node(button).unwrap().hovered);
        assert!(fx.tree.node(fx.id("root")).unwrap().hovered);
    }

    #[test]
    fn test_click_runs_command() {
        let mut fx = Fixture::new(SceneConfig::default());
        let button = fx.id("button");

        fx.move_to(20.0, 20.0);
        assert!(fx.button(20.0, 20.0, true));
        assert!(fx.tree.node(button).unwrap().active);
        // below the drag threshold
        fx.move_to(21.0, 21.0);
        assert!(fx.button(21.0, 21.0, false));

        assert!(!fx.tree.node(button).unwrap().active);
        assert_eq!(fx.drain(), vec![(UiEventKind::Click, button)]);
        assert_eq!(fx.clicks.get(), 1);
    }

    #[test]
    fn test_drag_suppresses_click() {
        let mut fx = Fixture::new(SceneConfig::default());
        let button = fx.id("button");
        fx.move_to(20.0, 20.0);
        fx.button(20.0, 20.0, true);
        fx.move_to(25.0, 20.0);
        assert!(fx.input.is_dragging());
        fx.button(25.0, 20.0, false);

        assert_eq!(
            fx.drain(),
            vec![(UiEventKind::DragStart, button), (UiEventKind::DragEnd, button)]
        );
        assert_eq!(fx.clicks.get(), 0);
    }

    #[test]
    fn test_release_elsewhere_is_not_a_click() {
        let mut fx = Fixture::new(SceneConfig::default());
        fx.move_to(20.0, 20.0);
        fx.button(20.0, 20.0, true);
        fx.button(20.0, 20.0, false);
        fx.drain();

        fx.button(108.0, 48.0, true);
        // released over the root after a tiny move
        fx.button(111.0, 48.0, false);
        assert!(fx.drain().is_empty());
        assert_eq!(fx.clicks.get(), 1);
    }

    #[test]
    fn test_dragging_writes_bound_position() {
        let mut fx = Fixture::new(SceneConfig::default());
        let knob = fx.id("knob");
        assert_eq!(fx.tree.node(knob).unwrap().screen_rect.x, 300.0);

        fx.move_to(310.0, 310.0);
        fx.button(310.0, 310.0, true);
        fx.move_to(330.0, 315.0);
        assert_eq!(fx.model.borrow().x, 320.0);
        assert_eq!(fx.model.borrow().y, 305.0);
        fx.move_to(340.0, 300.0);
        assert_eq!(fx.model.borrow().x, 330.0);
        assert_eq!(fx.model.borrow().y, 290.0);
        fx.button(340.0, 300.0, false);

        assert_eq!(
            fx.drain(),
            vec![
                (UiEventKind::DragStart, knob),
                (UiEventKind::ValueChange, knob),
                (UiEventKind::ValueChange, knob),
                (UiEventKind::DragEnd, knob),
            ]
        );
        assert_eq!(fx.changes.get(), 2);

        fx.frame();
        assert_eq!(fx.tree.node(knob).unwrap().screen_rect.x, 330.0);
    }

    #[test]
    fn test_typing_edits_the_bound_text() {
        let mut fx = Fixture::new(SceneConfig::default());
        let field = fx.id("field");

        // not focused yet
        assert!(!fx.send(InputEvent::Char('x')));

        fx.click(20.0, 70.0);
        assert_eq!(fx.input.focused(), Some(field));
        assert!(fx.tree.node(field).unwrap().focused);
        for c in "hi".chars() {
            assert!(fx.send(InputEvent::Char(c)));
        }
        assert!(!fx.send(InputEvent::Char('\u{7}')));
        assert_eq!(fx.model.borrow().name, "hi");
        assert_eq!(fx.tree.node(field).unwrap().cursor, 2);

        fx.send(InputEvent::Char('e'));
        fx.send(InputEvent::Char('\u{301}'));
        assert_eq!(fx.model.borrow().name, "hie\u{301}");
        let backspace = InputEvent::Key {
            key: Key::Backspace,
            pressed: true,
            repeat: false,
        };
        assert!(fx.send(backspace));
        assert_eq!(fx.model.borrow().name, "hi");
        assert_eq!(fx.tree.node(field).unwrap().text, "hi");

        let events = fx.drain();
        assert_eq!(events[0], (UiEventKind::Click, field));
        assert_eq!(events.len(), 6);
        assert!(events[1..].iter().all(|e| *e == (UiEventKind::ValueChange, field)));
        assert_eq!(fx.changes.get(), 5);

        // pressing a non-focusable node drops focus
        fx.click(5.0, 5.0);
        assert_eq!(fx.input.focused(), None);
        assert!(!fx.tree.node(field).unwrap().focused);
        assert!(!fx.send(InputEvent::Char('z')));
        assert_eq!(fx.model.borrow().name, "hi");
    }

    #[test]
    fn test_backspace_on_empty_text_does_nothing() {
        let mut fx = Fixture::new(SceneConfig::default());
        fx.click(20.0, 70.0);
        fx.drain();
        assert!(!fx.send(InputEvent::Key {
            key: Key::Backspace,
            pressed: true,
            repeat: false,
        }));
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn test_wheel_scrolls_nearest_scrollable_ancestor() {
        let mut fx = Fixture::new(SceneConfig::default());
        let list = fx.id("list");
        let wheel = |dy: f32| InputEvent::Wheel {
            pos: Vec2::new(550.0, 50.0),
            delta: Vec2::new(0.0, dy),
        };

        assert!(fx.send(wheel(-1.0)));
        assert_eq!(fx.tree.node(list).unwrap().scroll, Vec2::new(0.0, 24.0));
        fx.frame();
        let first_row = fx.tree.children(list)[0];
        assert_eq!(fx.tree.node(first_row).unwrap().screen_rect.y, -24.0);

        for _ in 0..20 {
            fx.send(wheel(-1.0));
        }
        // 300 of rows in a 100 tall list
        assert_eq!(fx.tree.node(list).unwrap().scroll.y, 200.0);
        fx.send(wheel(50.0));
        assert_eq!(fx.tree.node(list).unwrap().scroll.y, 0.0);

        // nothing scrollable under the cursor
        assert!(!fx.send(InputEvent::Wheel {
            pos: Vec2::new(20.0, 20.0),
            delta: Vec2::new(0.0, -1.0),
        }));
    }

    #[test]
    fn test_dragging_a_scrollable_moves_its_content() {
        let mut fx = Fixture::new(SceneConfig::default());
        let list = fx.id("list");
        // expose the list itself; the extent from the last layout stays 300
        let rows: Vec<NodeId> = fx.tree.children(list).to_vec();
        for r in rows {
            fx.tree.node_mut(r).unwrap().flags |= NodeFlags::HIDDEN;
        }
        fx.move_to(600.0, 80.0);
        assert_eq!(fx.input.hovered(), Some(list));

        fx.button(600.0, 80.0, true);
        fx.move_to(600.0, 30.0);
        assert!(fx.input.is_dragging());
        assert_eq!(fx.tree.node(list).unwrap().scroll.y, 50.0);
        fx.move_to(600.0, -500.0);
        assert_eq!(fx.tree.node(list).unwrap().scroll.y, 200.0);
        fx.button(600.0, -500.0, false);
        assert_eq!(fx.drain(), vec![(UiEventKind::DragStart, list), (UiEventKind::DragEnd, list)]);
    }

    #[test]
    fn test_event_queue_is_bounded() {
        let config = SceneConfig {
            event_queue_capacity: 2,
            ..SceneConfig::default()
        };
        let mut fx = Fixture::new(config);
        for _ in 0..3 {
            fx.click(20.0, 20.0);
        }
        assert_eq!(fx.input.pending_events(), 2);
        assert_eq!(fx.drain().len(), 2);
        assert_eq!(fx.input.pop_event(), None);
        // commands still run for dropped events
        assert_eq!(fx.clicks.get(), 3);
    }

    #[test]
    fn test_right_button_is_ignored() {
        let mut fx = Fixture::new(SceneConfig::default());
        fx.move_to(20.0, 20.0);
        assert!(!fx.send(InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
            pos: Vec2::new(20.0, 20.0),
        }));
        assert_eq!(fx.input.active(), None);
    }
}
