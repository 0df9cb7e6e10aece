//! # Strata scene
//!
//! A retained scene graph driven by declarative node specs and bound to
//! application data through [`strata_core::reflect`].
//!
//! The frame pipeline, in order:
//!
//! | Stage | Module | Produces |
//! |---|---|---|
//! | load | [`loader`] | a [`SpecStore`] of node specs and templates |
//! | build | [`tree`] | live [`Node`]s, one per spec instance and collection element |
//! | update | [`tree`], [`binding`] | text, visibility, colors and positions from data |
//! | layout | [`layout`] | parent-relative and screen rects |
//! | scroll | [`scroll`] | area offsets, shifted rects, viewport clips |
//! | compose | [`compositor`] | a stably sorted list of [`RenderCommand`]s |
//!
//! [`Scene`] runs all of it; each stage is also usable on its own.
//!
//! ## Example
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use strata_core::{impl_reflect, reflect::SharedData, ConfigNode, SceneConfig};
//! use strata_scene::Scene;
//!
//! #[derive(Default)]
//! struct Player {
//!     name: String,
//! }
//! impl_reflect!(Player { value name });
//!
//! let doc = ConfigNode::map(
//!     vec![
//!         ("type".into(), ConfigNode::scalar("text", 1)),
//!         ("text".into(), ConfigNode::scalar("{name}", 1)),
//!     ],
//!     1,
//! );
//! let mut scene = Scene::load(&doc, SceneConfig::default()).unwrap();
//! let player: SharedData = Rc::new(RefCell::new(Player { name: "Ada".into() }));
//! let root = scene.bind(Some(player)).unwrap();
//!
//! scene.update(0.016, None);
//! assert_eq!(scene.tree().node(root).unwrap().text, "Ada");
//! let _commands = scene.compose(None);
//! ```

pub mod binding;
pub mod command;
pub mod compositor;
pub mod input;
pub mod layout;
pub mod loader;
pub mod provider;
pub mod scene;
pub mod scroll;
pub mod spec;
pub mod text;
pub mod tree;

pub use binding::{BindingTarget, ResolvedBinding};
pub use command::CommandRegistry;
pub use compositor::{CommandSink, Compositor, Phase, Primitive, RenderCommand, SortKey};
pub use input::{InputController, UiEvent, UiEventKind, hit_test};
pub use layout::layout_root;
pub use provider::{ViewportProvider, ViewportRegistry, ViewportRequest};
pub use scene::{Scene, SceneError};
pub use scroll::{ScrollArea, ScrollController, ScrollbarGeometry};
pub use spec::{
    BindingSpec, Layer, LayoutSpec, LayoutStrategy, NodeFlags, NodeKind, NodeSpec, SpecId,
    SpecStore, Style,
};
pub use text::{FontMetrics, GlyphInfo, MonospaceMeasure, TextMeasure};
pub use tree::{Node, NodeId, SceneTree};
