//! Viewport providers: host callbacks that draw the content of viewport-kind
//! nodes (a 3D view, a minimap, a plot). The registry is owned by the host
//! and handed to the compositor each frame.

use std::collections::HashMap;

use strata_core::reflect::DataRef;
use strata_core::{Rect, StringId};

use crate::compositor::CommandSink;
use crate::tree::NodeId;

/// What a provider gets to know about the node it draws into.
pub struct ViewportRequest<'a> {
    pub node: NodeId,
    pub data: Option<&'a DataRef>,
    pub screen_rect: Rect,
    pub z: f32,
    pub clip: Option<Rect>,
}

pub trait ViewportProvider {
    fn render(&self, request: &ViewportRequest<'_>, sink: &mut CommandSink<'_>);
}

impl<F> ViewportProvider for F
where
    F: Fn(&ViewportRequest<'_>, &mut CommandSink<'_>),
{
    fn render(&self, request: &ViewportRequest<'_>, sink: &mut CommandSink<'_>) {
        self(request, sink)
    }
}

#[derive(Default)]
pub struct ViewportRegistry {
    providers: HashMap<StringId, Box<dyn ViewportProvider>>,
}

impl ViewportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, provider: impl ViewportProvider + 'static) {
        if self
            .providers
            .insert(StringId::new(name), Box::new(provider))
            .is_some()
        {
            log::debug!("ViewportRegistry: replaced provider '{}'", name);
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.providers.remove(&StringId::new(name)).is_some()
    }

    pub fn get(&self, id: StringId) -> Option<&dyn ViewportProvider> {
        self.providers.get(&id).map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ViewportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportRegistry")
            .field("providers", &self.providers.len())
            .finish()
    }
}
