//! Builds a [`SpecStore`] from a parsed [`ConfigNode`] document.
//!
//! Document shape:
//!
//! ```yaml
//! settings: { drag_threshold_sq: 16 }   # optional, see `apply_settings`
//! templates:
//!   row: { type: container, layout: { type: row, spacing: 4 } }
//! type: container
//! layout: { type: column, padding: 10 }
//! children:
//!   - { type: text, text: "{title}" }
//!   - { type: instance, instance: row, collection: items, item_template: row }
//! ```
//!
//! Problems that only degrade a single feature are logged and recorded as
//! diagnostics on the store; a split container without exactly two children
//! rejects the whole document.

use std::rc::Rc;

use strata_core::{Color, ConfigNode, SceneConfig, SpecError, StringId, Vec3};

use crate::spec::{
    BindingSpec, Edges, Layer, LayoutStrategy, NodeFlags, NodeKind, SpecId, SpecStore,
};

const DOCUMENT_KEYS: &[&str] = &["templates", "settings"];

/// Loads templates and the root node of `doc` into a fresh store of
/// `capacity` specs.
pub fn load(doc: &ConfigNode, capacity: usize) -> Result<SpecStore, SpecError> {
    let mut store = SpecStore::with_capacity(capacity);
    load_into(&mut store, doc)?;
    Ok(store)
}

pub fn load_into(store: &mut SpecStore, doc: &ConfigNode) -> Result<(), SpecError> {
    if !doc.is_map() {
        return Err(SpecError::Malformed {
            line: doc.line,
            message: "document root must be a map".into(),
        });
    }

    if let Some(templates) = doc.get("templates") {
        if !templates.is_map() {
            store.warn(templates.line, "'templates' must be a map".into());
        }
        for (name, node) in templates.entries() {
            let id = load_node(store, node, false)?;
            log::trace!("SpecLoader: registered template '{}'", name);
            store.add_template(name.as_str(), id);
        }
    }

    let root_node = doc.get("root").unwrap_or(doc);
    let root = load_node(store, root_node, std::ptr::eq(root_node, doc))?;
    store.set_root(root);

    let mut seen = vec![false; store.len()];
    validate(store, root, &mut seen)?;
    // Templates reached only through a template selector are not under the root.
    let templates: Vec<SpecId> = store
        .template_names()
        .filter_map(|name| store.get_template(name))
        .collect();
    for t in templates {
        validate(store, t, &mut seen)?;
    }
    Ok(())
}

/// Copies the document's `settings` map (if any) into `config`.
pub fn apply_settings(doc: &ConfigNode, config: &mut SceneConfig) {
    if let Some(settings) = doc.get("settings") {
        config.apply_overrides(settings);
    }
}

fn load_node(store: &mut SpecStore, node: &ConfigNode, document: bool) -> Result<SpecId, SpecError> {
    if !node.is_map() {
        return Err(SpecError::Malformed {
            line: node.line,
            message: "node must be a map".into(),
        });
    }

    let type_name = node.get("type").and_then(|t| t.as_str());
    let id = match type_name {
        Some("instance") => match node.get("instance").and_then(|n| n.as_str()) {
            Some(name) => match store.get_template(name) {
                Some(t) => store.copy_template(t)?,
                None => {
                    store.error(node.line, format!("instance template '{name}' not found"));
                    store.push_node()?
                }
            },
            None => {
                store.error(node.line, "'type: instance' without an 'instance' key".into());
                store.push_node()?
            }
        },
        Some(name) => match store.get_template(name) {
            Some(t) => store.copy_template(t)?,
            None => {
                let id = store.push_node()?;
                let kind = NodeKind::from_name(name).unwrap_or_else(|| {
                    store.warn(node.line, format!("unknown node type '{name}', using container"));
                    NodeKind::Container
                });
                if let Some(spec) = store.get_mut(id) {
                    spec.kind = kind;
                }
                id
            }
        },
        None => store.push_node()?,
    };
    if let Some(spec) = store.get_mut(id) {
        spec.line = node.line;
    }

    for (key, val) in node.entries() {
        match key.as_str() {
            "type" | "instance" => {}
            "import" => {
                let e = SpecError::ImportNotSupported { line: val.line };
                store.error(val.line, e.to_string());
            }
            "id" => {
                let s = scalar(store, key, val).map(Rc::<str>::from);
                with_spec(store, id, |spec| spec.id = s);
            }
            "flags" => {
                let flags = parse_flags(store, val);
                with_spec(store, id, |spec| spec.flags = flags);
            }
            "text" => {
                let Some(s) = scalar(store, key, val) else { continue };
                match s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                    Some(field) if !field.is_empty() => {
                        let b = BindingSpec {
                            target: "text".into(),
                            source: field.into(),
                        };
                        with_spec(store, id, |spec| {
                            spec.text = None;
                            spec.bindings.push(b);
                        });
                    }
                    _ => {
                        let text: Rc<str> = s.into();
                        with_spec(store, id, |spec| spec.text = Some(text));
                    }
                }
            }
            "bindings" => {
                for b in val.items() {
                    let target = b.get("target").and_then(|n| n.as_str());
                    let source = b.get("source").and_then(|n| n.as_str());
                    match (target, source) {
                        (Some(t), Some(s)) => {
                            let b = BindingSpec {
                                target: t.into(),
                                source: s.into(),
                            };
                            with_spec(store, id, |spec| spec.bindings.push(b));
                        }
                        _ => store.warn(b.line, "binding needs both 'target' and 'source'".into()),
                    }
                }
                if !val.is_seq() {
                    store.warn(val.line, "'bindings' must be a sequence".into());
                }
            }
            "children" => {
                if !val.is_seq() {
                    store.warn(val.line, "'children' must be a sequence".into());
                    continue;
                }
                let mut children = Vec::with_capacity(val.items().len());
                for child in val.items() {
                    children.push(load_node(store, child, false)?);
                }
                with_spec(store, id, |spec| spec.children = children);
            }
            "item_template" => {
                let template = if let Some(name) = val.as_str() {
                    match store.get_template(name) {
                        Some(t) => Some(store.copy_template(t)?),
                        None => {
                            let e = SpecError::MissingTemplate {
                                name: name.to_string(),
                                line: val.line,
                            };
                            store.error(val.line, e.to_string());
                            None
                        }
                    }
                } else {
                    Some(load_node(store, val, false)?)
                };
                with_spec(store, id, |spec| spec.item_template = template);
            }
            "collection" => {
                let s = scalar(store, key, val).map(Rc::<str>::from);
                with_spec(store, id, |spec| spec.collection = s);
            }
            "template_selector" => {
                let s = scalar(store, key, val).map(Rc::<str>::from);
                with_spec(store, id, |spec| spec.template_selector = s);
            }
            "scroll_area" => {
                let s = scalar(store, key, val).map(Rc::<str>::from);
                with_spec(store, id, |spec| spec.scroll_area = s);
            }
            "on_click" => {
                let s = scalar(store, key, val).map(StringId::new);
                with_spec(store, id, |spec| spec.on_click = s);
            }
            "on_change" => {
                let s = scalar(store, key, val).map(StringId::new);
                with_spec(store, id, |spec| spec.on_change = s);
            }
            "provider" => {
                let s = scalar(store, key, val).map(StringId::new);
                with_spec(store, id, |spec| spec.provider = s);
            }
            "layout" => parse_layout(store, id, val),
            "style" => parse_style(store, id, val),
            "transform" => parse_transform(store, id, val),
            k if document && (DOCUMENT_KEYS.contains(&k) || k == "root") => {}
            other => store.warn(
                val.line,
                format!("unknown field '{other}'; check indentation or spelling"),
            ),
        }
    }
    Ok(id)
}

fn with_spec(store: &mut SpecStore, id: SpecId, f: impl FnOnce(&mut crate::spec::NodeSpec)) {
    if let Some(spec) = store.get_mut(id) {
        f(spec);
    }
}

fn scalar<'a>(store: &mut SpecStore, key: &str, val: &'a ConfigNode) -> Option<&'a str> {
    let s = val.as_str();
    if s.is_none() {
        store.warn(val.line, format!("'{key}' expects a scalar"));
    }
    s
}

fn number(store: &mut SpecStore, key: &str, val: &ConfigNode) -> Option<f32> {
    let v = val.as_f32();
    if v.is_none() {
        store.warn(val.line, format!("'{key}' expects a number"));
    }
    v
}

fn color(store: &mut SpecStore, key: &str, val: &ConfigNode) -> Option<Color> {
    if let Some([r, g, b, a]) = val.as_floats::<4>() {
        return Some(Color::new(r, g, b, a));
    }
    match val.as_str() {
        Some(s) if s.starts_with('#') => Some(Color::from_hex(s)),
        _ => {
            store.warn(val.line, format!("'{key}' expects [r, g, b, a] or '#rrggbb'"));
            None
        }
    }
}

fn vec3(store: &mut SpecStore, key: &str, val: &ConfigNode) -> Option<Vec3> {
    match val.as_floats::<3>() {
        Some([x, y, z]) => Some(Vec3::new(x, y, z)),
        None => {
            store.warn(val.line, format!("'{key}' expects [x, y, z]"));
            None
        }
    }
}

fn parse_flags(store: &mut SpecStore, val: &ConfigNode) -> NodeFlags {
    let names: Vec<(String, u32)> = match val.as_str() {
        Some(s) => s.split('|').map(|n| (n.to_string(), val.line)).collect(),
        None => val
            .items()
            .iter()
            .filter_map(|n| n.as_str().map(|s| (s.to_string(), n.line)))
            .collect(),
    };
    let mut flags = NodeFlags::empty();
    for (name, line) in names {
        match NodeFlags::parse_name(&name) {
            Some(f) => flags |= f,
            None => store.warn(line, format!("unknown flag '{}'", name.trim())),
        }
    }
    flags
}

fn parse_layout(store: &mut SpecStore, id: SpecId, map: &ConfigNode) {
    for (key, val) in map.entries() {
        match key.as_str() {
            "type" | "strategy" => {
                let Some(name) = scalar(store, key, val) else { continue };
                match LayoutStrategy::from_name(name) {
                    Some(s) => with_spec(store, id, |spec| spec.layout.strategy = s),
                    None => store.warn(val.line, format!("unknown layout type '{name}'")),
                }
            }
            "layer" => {
                let Some(name) = scalar(store, key, val) else { continue };
                match Layer::from_name(name) {
                    Some(l) => with_spec(store, id, |spec| spec.layout.layer = l),
                    None => store.warn(val.line, format!("unknown layer '{name}'")),
                }
            }
            k @ ("width" | "height" | "padding" | "spacing" | "split_ratio" | "x" | "y") => {
                let Some(v) = number(store, k, val) else { continue };
                with_spec(store, id, |spec| {
                    let l = &mut spec.layout;
                    match k {
                        "width" => l.width = v,
                        "height" => l.height = v,
                        "padding" => l.padding = v,
                        "spacing" => l.spacing = v,
                        "split_ratio" => l.split_ratio = v,
                        "x" => l.x = v,
                        _ => l.y = v,
                    }
                });
            }
            other => store.warn(val.line, format!("unknown field '{other}' in layout")),
        }
    }
}

fn parse_style(store: &mut SpecStore, id: SpecId, map: &ConfigNode) {
    for (key, val) in map.entries() {
        match key.as_str() {
            k @ ("color" | "hover_color" | "active_color" | "text_color" | "caret_color"
            | "track_color" | "thumb_color") => {
                let Some(c) = color(store, k, val) else { continue };
                with_spec(store, id, |spec| {
                    let s = &mut spec.style;
                    match k {
                        "color" => s.color = c,
                        "hover_color" => s.hover_color = c,
                        "active_color" => s.active_color = c,
                        "text_color" => s.text_color = c,
                        "track_color" => s.track_color = c,
                        "thumb_color" => s.thumb_color = c,
                        _ => s.caret_color = c,
                    }
                });
            }
            "border" => {
                let edges = if let Some(t) = val.as_f32() {
                    Some(Edges {
                        left: t,
                        top: t,
                        right: t,
                        bottom: t,
                    })
                } else if let Some([l, t, r, b]) = val.as_floats::<4>() {
                    Some(Edges {
                        left: l,
                        top: t,
                        right: r,
                        bottom: b,
                    })
                } else {
                    store.warn(val.line, "'border' expects a number or [l, t, r, b]".into());
                    None
                };
                if let Some(e) = edges {
                    with_spec(store, id, |spec| spec.style.border = e);
                }
            }
            "texture" => {
                let s = scalar(store, key, val).map(Rc::<str>::from);
                with_spec(store, id, |spec| spec.style.texture = s);
            }
            k @ ("border_l" | "border_t" | "border_r" | "border_b" | "corner_radius"
            | "animation_speed" | "text_scale" | "caret_width" | "caret_height" | "tex_w"
            | "tex_h" | "scrollbar_width") => {
                let Some(v) = number(store, k, val) else { continue };
                with_spec(store, id, |spec| {
                    let s = &mut spec.style;
                    match k {
                        "border_l" => s.border.left = v,
                        "border_t" => s.border.top = v,
                        "border_r" => s.border.right = v,
                        "border_b" => s.border.bottom = v,
                        "corner_radius" => s.corner_radius = v,
                        "animation_speed" => s.animation_speed = v,
                        "text_scale" => s.text_scale = v,
                        "caret_width" => s.caret_width = v,
                        "caret_height" => s.caret_height = v,
                        "tex_w" => s.tex_w = v,
                        "tex_h" => s.tex_h = v,
                        _ => s.scrollbar_width = v,
                    }
                });
            }
            other => store.warn(val.line, format!("unknown field '{other}' in style")),
        }
    }
}

fn parse_transform(store: &mut SpecStore, id: SpecId, map: &ConfigNode) {
    for (key, val) in map.entries() {
        match key.as_str() {
            k @ ("position" | "rotation" | "scale") => {
                let Some(v) = vec3(store, k, val) else { continue };
                with_spec(store, id, |spec| match k {
                    "position" => spec.transform.position = v,
                    "rotation" => spec.transform.rotation = v,
                    _ => spec.transform.scale = v,
                });
            }
            other => store.warn(val.line, format!("unknown field '{other}' in transform")),
        }
    }
}

/// Post-load checks over the tree rooted at `id` (item templates included).
/// Each spec is checked once.
fn validate(store: &mut SpecStore, id: SpecId, seen: &mut [bool]) -> Result<(), SpecError> {
    match seen.get_mut(id.index()) {
        Some(done) if *done => return Ok(()),
        Some(done) => *done = true,
        None => {}
    }
    let Some(spec) = store.get(id) else {
        return Ok(());
    };
    let spec = spec.clone();

    if spec.layout.strategy.is_split() && spec.children.len() != 2 {
        let e = SpecError::SplitArity {
            id: spec.id_str().to_string(),
            count: spec.children.len(),
            line: spec.line,
        };
        store.error(spec.line, e.to_string());
        return Err(e);
    }

    if spec.layout.strategy.is_stack() {
        for child in &spec.children {
            let Some(c) = store.get(*child) else { continue };
            let positional = c
                .bindings
                .iter()
                .any(|b| matches!(&*b.target, "layout.x" | "layout.y" | "x" | "y"));
            if positional {
                let (line, cid) = (c.line, c.id_str().to_string());
                store.warn(
                    line,
                    format!("'{cid}' binds x/y but its parent stacks children; the binding is overridden by layout"),
                );
            }
        }
    }

    for child in &spec.children {
        validate(store, *child, seen)?;
    }
    if let Some(t) = spec.item_template {
        validate(store, t, seen)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Severity;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> ConfigNode {
        ConfigNode::from_json(&v)
    }

    #[test]
    fn test_load_basic_tree() {
        let store = load(
            &doc(json!({
                "id": "root",
                "layout": { "type": "column", "padding": 10, "spacing": 5 },
                "style": { "color": [0.2, 0.3, 0.4], "border": 2 },
                "children": [
                    { "type": "text", "text": "Hello", "flags": "clickable | focusable" },
                    { "type": "viewport", "provider": "map", "transform": { "scale": [2, 2, 1] } }
                ]
            })),
            64,
        )
        .unwrap();

        let root = store.get(store.get_root().unwrap()).unwrap();
        assert_eq!(root.id.as_deref(), Some("root"));
        assert_eq!(root.layout.padding, 10.0);
        assert_eq!(root.style.color, Color::new(0.2, 0.3, 0.4, 1.0));
        assert_eq!(root.style.border.left, 2.0);
        assert_eq!(root.children.len(), 2);

        let text = store.get(root.children[0]).unwrap();
        assert_eq!(text.kind, NodeKind::Text);
        assert_eq!(text.text.as_deref(), Some("Hello"));
        assert_eq!(text.flags, NodeFlags::CLICKABLE | NodeFlags::FOCUSABLE);

        let vp = store.get(root.children[1]).unwrap();
        assert_eq!(vp.kind, NodeKind::Viewport);
        assert_eq!(vp.provider, Some(StringId::new("map")));
        assert_eq!(vp.transform.scale, Vec3::new(2.0, 2.0, 1.0));
        assert!(store.diagnostics().is_empty());
    }

    #[test]
    fn test_text_shorthand_becomes_binding() {
        let store = load(&doc(json!({ "type": "text", "text": "{player.name}" })), 8).unwrap();
        let root = store.get(store.get_root().unwrap()).unwrap();
        assert!(root.text.is_none());
        assert_eq!(root.bindings.len(), 1);
        assert_eq!(&*root.bindings[0].target, "text");
        assert_eq!(&*root.bindings[0].source, "player.name");
    }

    #[test]
    fn test_templates_and_instances() {
        let store = load(
            &doc(json!({
                "templates": {
                    "button": {
                        "flags": "clickable",
                        "style": { "color": "#336699" },
                        "bindings": [ { "target": "text", "source": "label" } ]
                    }
                },
                "children": [
                    { "type": "button", "on_click": "save" },
                    { "type": "instance", "instance": "button",
                      "bindings": [ { "target": "visible", "source": "enabled" } ] }
                ]
            })),
            64,
        )
        .unwrap();

        let template = store.get_template("button").unwrap();
        let root = store.get(store.get_root().unwrap()).unwrap();
        let a = store.get(root.children[0]).unwrap();
        let b = store.get(root.children[1]).unwrap();
        assert_ne!(root.children[0], template);
        assert_eq!(a.flags, NodeFlags::CLICKABLE);
        assert_eq!(a.on_click, Some(StringId::new("save")));
        assert_eq!(b.bindings.len(), 2);
        assert_eq!(&*b.bindings[1].source, "enabled");
        // the template itself is untouched by per-instance overrides
        let t = store.get(template).unwrap();
        assert_eq!(t.on_click, None);
        assert_eq!(t.bindings.len(), 1);
    }

    #[test]
    fn test_item_template_by_name_and_inline() {
        let store = load(
            &doc(json!({
                "templates": { "row": { "type": "text" } },
                "children": [
                    { "collection": "items", "item_template": "row" },
                    { "collection": "others", "item_template": { "type": "text_input" } },
                    { "collection": "ghosts", "item_template": "missing" }
                ]
            })),
            64,
        )
        .unwrap();
        let root = store.get(store.get_root().unwrap()).unwrap();
        let by_name = store.get(root.children[0]).unwrap();
        let inline = store.get(root.children[1]).unwrap();
        let missing = store.get(root.children[2]).unwrap();
        assert_eq!(
            store.get(by_name.item_template.unwrap()).unwrap().kind,
            NodeKind::Text
        );
        assert_eq!(
            store.get(inline.item_template.unwrap()).unwrap().kind,
            NodeKind::TextInput
        );
        assert!(missing.item_template.is_none());
        assert!(store
            .diagnostics()
            .iter()
            .any(|d| d.severity == Severity::Error && d.message.contains("missing")));
    }

    #[test]
    fn test_split_arity_is_rejected() {
        let err = load(
            &doc(json!({
                "children": [
                    { "id": "editor", "layout": { "type": "split_h" }, "children": [ {} ] }
                ]
            })),
            16,
        )
        .unwrap_err();
        match err {
            SpecError::SplitArity { id, count, .. } => {
                assert_eq!(id, "editor");
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let ok = load(
            &doc(json!({ "layout": { "type": "split_v" }, "children": [ {}, {} ] })),
            16,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_selector_only_template_is_validated() {
        let err = load(
            &doc(json!({
                "templates": {
                    "card": { "id": "card", "layout": { "height": 20 } },
                    "wide_card": {
                        "id": "wide_card",
                        "layout": { "type": "split_h" },
                        "children": [ {} ]
                    }
                },
                "children": [
                    {
                        "id": "cards",
                        "collection": "cards",
                        "item_template": "card",
                        "template_selector": "kind"
                    }
                ]
            })),
            32,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SpecError::SplitArity { ref id, count: 1, .. } if id == "wide_card"
        ));
    }

    #[test]
    fn test_unknown_keys_warn_but_load() {
        let store = load(
            &doc(json!({
                "colour": [1, 0, 0],
                "layout": { "wdith": 3 },
                "flags": "clickable | sparkly",
                "children": [ { "import": "other.yaml" } ]
            })),
            16,
        )
        .unwrap();
        let d = store.diagnostics();
        assert!(d.iter().any(|d| d.message.contains("colour")));
        assert!(d.iter().any(|d| d.message.contains("wdith")));
        assert!(d.iter().any(|d| d.message.contains("sparkly")));
        assert!(d
            .iter()
            .any(|d| d.severity == Severity::Error && d.message.contains("import")));
        let root = store.get(store.get_root().unwrap()).unwrap();
        assert_eq!(root.flags, NodeFlags::CLICKABLE);
    }

    #[test]
    fn test_store_exhaustion_aborts_load() {
        let err = load(&doc(json!({ "children": [ {}, {}, {} ] })), 2).unwrap_err();
        assert_eq!(err, SpecError::Exhausted { capacity: 2 });
    }

    #[test]
    fn test_settings_are_applied() {
        let d = doc(json!({ "settings": { "node_wheel_step": 30 }, "type": "text" }));
        let mut cfg = SceneConfig::default();
        apply_settings(&d, &mut cfg);
        assert_eq!(cfg.node_wheel_step, 30.0);
        let store = load(&d, 4).unwrap();
        assert!(store.diagnostics().is_empty());
    }
}
