//! Binding resolver: maps spec `target <- source` pairs onto node properties
//! and application data fields.
//!
//! Resolution happens once per node, at creation: the target string becomes a
//! [`BindingTarget`] and the dotted source becomes a [`FieldPath`] on the
//! node's data object. Every tick [`apply_all`] reads the fields through their
//! paths; interactive controls push values back with [`write_binding_float`]
//! and [`write_binding_string`].

use std::rc::Rc;

use smallvec::SmallVec;
use strata_core::Color;
use strata_core::reflect::{DataRef, FieldMut, FieldPath, FieldRef, Reflect};

use crate::spec::{NodeFlags, NodeSpec};
use crate::tree::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingTarget {
    Text,
    Visible,
    LayoutX,
    LayoutY,
    LayoutWidth,
    LayoutHeight,
    StyleColor,
    PositionX,
    PositionY,
    PositionZ,
}

impl BindingTarget {
    pub fn parse(s: &str) -> Option<BindingTarget> {
        Some(match s {
            "text" => BindingTarget::Text,
            "visible" => BindingTarget::Visible,
            "layout.x" | "x" => BindingTarget::LayoutX,
            "layout.y" | "y" => BindingTarget::LayoutY,
            "layout.width" | "w" => BindingTarget::LayoutWidth,
            "layout.height" | "h" => BindingTarget::LayoutHeight,
            "style.color" => BindingTarget::StyleColor,
            "transform.position.x" => BindingTarget::PositionX,
            "transform.position.y" => BindingTarget::PositionY,
            "transform.position.z" => BindingTarget::PositionZ,
            _ => return None,
        })
    }
}

/// A binding after name resolution. `target == None` marks a binding whose
/// target was not understood; it stays on the node but does nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBinding {
    pub target: Option<BindingTarget>,
    pub source: FieldPath,
    pub source_name: Rc<str>,
}

pub type Bindings = SmallVec<[ResolvedBinding; 4]>;

/// Resolves every binding of `spec` against the node's data. Unresolvable
/// sources are logged and dropped; unknown targets are logged and kept inert.
pub fn resolve(spec: &NodeSpec, data: Option<&DataRef>) -> Bindings {
    let mut out = Bindings::new();
    if spec.bindings.is_empty() {
        return out;
    }
    let Some(data) = data else {
        log::error!(
            "Binding: node '{}' declares {} binding(s) but has no data",
            spec.id_str(),
            spec.bindings.len()
        );
        return out;
    };

    for b in &spec.bindings {
        let path = data.with(|obj| (FieldPath::resolve(obj, &b.source), obj.type_name()));
        let (path, type_name) = match path {
            Some((p, t)) => (p, t),
            None => {
                log::error!(
                    "Binding: data for node '{}' is unavailable while resolving '{}'",
                    spec.id_str(),
                    b.source
                );
                continue;
            }
        };
        let Some(source) = path else {
            log::error!(
                "Binding: source field '{}' not found on '{}' (node '{}')",
                b.source,
                type_name,
                spec.id_str()
            );
            continue;
        };
        let target = BindingTarget::parse(&b.target);
        if target.is_none() {
            log::warn!(
                "Binding: unknown target '{}' on node '{}'",
                b.target,
                spec.id_str()
            );
        }
        out.push(ResolvedBinding {
            target,
            source,
            source_name: b.source.clone(),
        });
    }
    out
}

/// Formats a field value the way the text target shows it.
pub fn format_value(value: FieldRef<'_>) -> String {
    match value {
        FieldRef::Str(s) => s.to_string(),
        FieldRef::Float(f) => format!("{f:.2}"),
        FieldRef::Int(i) => i.to_string(),
        FieldRef::Bool(b) => if b { "true" } else { "false" }.to_string(),
        FieldRef::Enum(name) => name.to_string(),
        FieldRef::Vec4(_) | FieldRef::Struct(_) | FieldRef::List(_) => String::new(),
    }
}

fn as_float(value: FieldRef<'_>) -> Option<f32> {
    match value {
        FieldRef::Float(f) => Some(f),
        FieldRef::Int(i) => Some(i as f32),
        _ => None,
    }
}

/// Applies one binding using an already-borrowed data object.
pub fn apply_binding(node: &mut Node, binding: &ResolvedBinding, obj: &dyn Reflect) {
    let Some(target) = binding.target else {
        return;
    };
    let Some(value) = binding.source.read(obj) else {
        return;
    };
    match target {
        BindingTarget::Text => {
            let text = format_value(value);
            if node.text != text {
                node.text = text;
            }
        }
        BindingTarget::Visible => {
            let visible = match value {
                FieldRef::Bool(b) => b,
                FieldRef::Int(i) => i != 0,
                _ => return,
            };
            node.flags.set(NodeFlags::HIDDEN, !visible);
        }
        BindingTarget::StyleColor => {
            if let FieldRef::Vec4(v) = value {
                node.render_color = Color::from(v);
            }
        }
        _ => {
            let Some(v) = as_float(value) else { return };
            match target {
                BindingTarget::LayoutX => {
                    node.rect.x = v;
                    node.origin.x = v;
                }
                BindingTarget::LayoutY => {
                    node.rect.y = v;
                    node.origin.y = v;
                }
                BindingTarget::LayoutWidth => node.rect.w = v,
                BindingTarget::LayoutHeight => node.rect.h = v,
                BindingTarget::PositionX => node.position.x = v,
                BindingTarget::PositionY => node.position.y = v,
                BindingTarget::PositionZ => node.position.z = v,
                _ => {}
            }
        }
    }
}

/// Applies every binding of `node`. Returns false when the data is gone or
/// busy, in which case nothing changed.
pub fn apply_all(node: &mut Node) -> bool {
    if node.bindings.is_empty() {
        return true;
    }
    let Some(data) = node.data.clone() else {
        return false;
    };
    let bindings = std::mem::take(&mut node.bindings);
    let applied = data
        .with(|obj| {
            for b in &bindings {
                apply_binding(node, b, obj);
            }
        })
        .is_some();
    node.bindings = bindings;
    applied
}

fn find(node: &Node, target: BindingTarget) -> Option<&ResolvedBinding> {
    node.bindings.iter().find(|b| b.target == Some(target))
}

/// Writes `value` into the field bound to `target`. Int fields receive the
/// truncated value. Returns false when there is no such binding or the field
/// is not numeric.
pub fn write_binding_float(node: &Node, target: BindingTarget, value: f32) -> bool {
    let (Some(b), Some(data)) = (find(node, target), node.data.as_ref()) else {
        return false;
    };
    data.with_mut(|obj| match b.source.read_mut(obj) {
        Some(FieldMut::Float(f)) => {
            *f = value;
            true
        }
        Some(FieldMut::Int(i)) => {
            *i = value as i32;
            true
        }
        _ => false,
    })
    .unwrap_or(false)
}

pub fn write_binding_string(node: &Node, target: BindingTarget, value: &str) -> bool {
    let (Some(b), Some(data)) = (find(node, target), node.data.as_ref()) else {
        return false;
    };
    data.with_mut(|obj| match b.source.read_mut(obj) {
        Some(FieldMut::Str(s)) => {
            s.clear();
            s.push_str(value);
            true
        }
        _ => false,
    })
    .unwrap_or(false)
}

pub fn read_binding_float(node: &Node, target: BindingTarget) -> Option<f32> {
    let b = find(node, target)?;
    node.data
        .as_ref()?
        .with(|obj| b.source.read(obj).and_then(as_float))?
}

pub fn read_binding_string(node: &Node, target: BindingTarget) -> Option<String> {
    let b = find(node, target)?;
    node.data
        .as_ref()?
        .with(|obj| b.source.read(obj).map(format_value))?
}
