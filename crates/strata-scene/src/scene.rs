//! [`Scene`] ties the pipeline together for hosts that do not need to drive
//! the stages themselves:
//!
//! 1. `handle_input` for every pending [`InputEvent`];
//! 2. `update`: bindings and animation, layout, scroll smoothing, scroll
//!    clip and shift. Bindings run before layout on purpose, so a bound
//!    position or size is laid out in the same frame it changed;
//! 3. `compose`: the sorted [`RenderCommand`] list for the renderer.

use std::rc::Rc;

use strata_core::reflect::SharedData;
use strata_core::{BuildError, ConfigNode, InputEvent, SceneConfig, Size, SpecError};
use thiserror::Error;

use crate::command::CommandRegistry;
use crate::compositor::{Compositor, RenderCommand};
use crate::input::{InputController, UiEvent};
use crate::layout::layout_root;
use crate::loader;
use crate::provider::ViewportRegistry;
use crate::scroll::ScrollController;
use crate::spec::SpecStore;
use crate::text::{FontMetrics, TextMeasure};
use crate::tree::{NodeId, SceneTree};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

pub struct Scene {
    tree: SceneTree,
    scroll: ScrollController,
    input: InputController,
    compositor: Compositor,
    commands: CommandRegistry,
    providers: ViewportRegistry,
    data: Option<SharedData>,
    window: Size,
    frame: u64,
}

impl Scene {
    pub fn new(store: SpecStore, config: SceneConfig) -> Self {
        Self {
            tree: SceneTree::new(Rc::new(store), &config),
            scroll: ScrollController::new(&config),
            input: InputController::new(&config),
            compositor: Compositor::new(),
            commands: CommandRegistry::new(),
            providers: ViewportRegistry::new(),
            data: None,
            window: Size {
                width: 800.0,
                height: 600.0,
            },
            frame: 0,
        }
    }

    /// Loads a scene document. Its `settings` map overrides `config`.
    pub fn load(doc: &ConfigNode, mut config: SceneConfig) -> Result<Self, SceneError> {
        loader::apply_settings(doc, &mut config);
        let store = loader::load(doc, config.spec_capacity)?;
        log::info!(
            "Scene: loaded {} specs ({} diagnostics)",
            store.len(),
            store.diagnostics().len()
        );
        Ok(Self::new(store, config))
    }

    /// Instantiates the root spec against `data`, replacing any previous tree.
    pub fn bind(&mut self, data: Option<SharedData>) -> Result<NodeId, SceneError> {
        self.data = data;
        self.rebuild()
    }

    /// Re-instantiates the tree against the current data, e.g. after the
    /// application added or removed collection elements. Scroll offsets
    /// survive by area name.
    pub fn rebuild(&mut self) -> Result<NodeId, SceneError> {
        self.input.reset();
        self.scroll.cancel_drag();
        let root = self.tree.instantiate(self.data.as_ref())?;
        log::debug!("Scene: built {} nodes", self.tree.len());
        Ok(root)
    }

    pub fn resize(&mut self, window: Size) {
        self.window = window;
    }

    pub fn window(&self) -> Size {
        self.window
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        self.input
            .handle(&mut self.tree, &mut self.scroll, &self.commands, event)
    }

    /// Advances one tick: bindings, layout, scroll easing and scroll
    /// placement, then hover under the (possibly moved) content.
    pub fn update(&mut self, dt: f32, measure: Option<&dyn TextMeasure>) {
        self.frame += 1;
        self.tree.update(dt);
        layout_root(&mut self.tree, self.window, self.frame, measure);
        self.scroll.update(&mut self.tree, dt);
        self.scroll.apply(&mut self.tree);
        self.input.refresh_hover(&mut self.tree);
    }

    /// Composes the current frame and records it for wheel targeting.
    pub fn compose(&mut self, fonts: Option<&dyn FontMetrics>) -> Vec<RenderCommand> {
        let commands = self.compositor.build(&mut self.tree, &self.providers, fonts);
        self.scroll.capture(&self.tree);
        commands
    }

    pub fn pop_event(&mut self) -> Option<UiEvent> {
        self.input.pop_event()
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    pub fn store(&self) -> &SpecStore {
        self.tree.store()
    }

    pub fn config(&self) -> &SceneConfig {
        self.tree.config()
    }

    pub fn scroll(&self) -> &ScrollController {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollController {
        &mut self.scroll
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    pub fn providers_mut(&mut self) -> &mut ViewportRegistry {
        &mut self.providers
    }
}
