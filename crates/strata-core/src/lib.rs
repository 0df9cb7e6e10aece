//! # Strata core
//!
//! Plain data shared by every strata crate. Nothing here knows about nodes,
//! layout or rendering:
//!
//! - geometry (`Vec2`, `Vec3`, `Vec4`, `Rect`, `Mat4`, `Transform`) and `Color`
//! - `ConfigNode`, the parsed key/value/sequence tree specs are loaded from
//! - `SceneConfig`, the tunables of the frame pipeline
//! - `reflect`, typed access to application data that scene nodes bind to
//! - `InputEvent`, the normalized input feed
//! - `SpecError` / `BuildError`
//!
//! ## Binding application data
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use strata_core::{impl_reflect, reflect::*};
//!
//! #[derive(Default)]
//! struct Hud {
//!     title: String,
//!     health: f32,
//! }
//! impl_reflect!(Hud { value title, value health });
//!
//! let model = Rc::new(RefCell::new(Hud { title: "Ready".into(), health: 0.5 }));
//! let shared: SharedData = model.clone();
//! let data = DataRef::new(&shared);
//!
//! let title = data.with(|obj| match obj.field_by_name("title") {
//!     Some(FieldRef::Str(s)) => s.to_string(),
//!     _ => String::new(),
//! });
//! assert_eq!(title.as_deref(), Some("Ready"));
//! ```

pub mod color;
pub mod config;
pub mod config_tree;
pub mod error;
pub mod geometry;
pub mod input;
pub mod reflect;
pub mod string_id;
pub mod tests;

pub use color::*;
pub use config::*;
pub use config_tree::*;
pub use error::*;
pub use geometry::*;
pub use input::*;
pub use string_id::*;
