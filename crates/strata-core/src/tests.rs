#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::impl_reflect;
    use crate::reflect::*;
    use crate::*;

    #[derive(Default)]
    struct Stats {
        hp: f32,
        level: i32,
    }
    impl_reflect!(Stats { value hp, value level });

    #[derive(Clone, Copy, Default)]
    enum Rarity {
        #[default]
        Common,
        Epic,
    }
    impl ReflectEnum for Rarity {
        fn variant_name(&self) -> &'static str {
            match self {
                Rarity::Common => "Common",
                Rarity::Epic => "Epic",
            }
        }
    }

    #[derive(Default)]
    struct Item {
        name: String,
        rarity: Rarity,
    }
    impl_reflect!(Item { value name, variant rarity });

    #[derive(Default)]
    struct Player {
        name: String,
        alive: bool,
        tint: Vec4,
        stats: Stats,
        items: Vec<Item>,
        slots: SparseList<Item>,
    }
    impl_reflect!(Player {
        value name,
        value alive,
        value tint,
        nested stats,
        value items,
        value slots,
    });

    fn player() -> Player {
        Player {
            name: "Ada".into(),
            alive: true,
            tint: Vec4::new(1.0, 0.5, 0.25, 1.0),
            stats: Stats { hp: 42.0, level: 3 },
            items: vec![
                Item {
                    name: "Sword".into(),
                    rarity: Rarity::Common,
                },
                Item {
                    name: "Crown".into(),
                    rarity: Rarity::Epic,
                },
            ],
            slots: SparseList(vec![
                None,
                Some(Item {
                    name: "Shield".into(),
                    rarity: Rarity::Common,
                }),
            ]),
        }
    }

    #[test]
    fn test_rect_intersect_and_union() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(50.0, 25.0, 100.0, 100.0);
        assert_eq!(a.intersect(&b), Rect::new(50.0, 25.0, 50.0, 25.0));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 150.0, 125.0));

        let far = Rect::new(500.0, 500.0, 10.0, 10.0);
        let none = a.intersect(&far);
        assert_eq!(none.w, 0.0);
        assert_eq!(none.h, 0.0);
    }

    #[test]
    fn test_rect_inset_clamps() {
        let r = Rect::new(10.0, 10.0, 6.0, 40.0);
        let i = r.inset(4.0);
        assert_eq!(i, Rect::new(14.0, 14.0, 0.0, 32.0));
        assert!(r.contains(Vec2::new(16.0, 50.0)));
        assert!(!r.contains(Vec2::new(17.0, 50.0)));
    }

    #[test]
    fn test_transform_matrix_translates_with_origin() {
        let t = Transform {
            position: Vec3::new(5.0, 0.0, 1.0),
            rotation: Vec3::ZERO,
            scale: Vec3::new(0.0, 2.0, 1.0),
        };
        let m = t.to_matrix(Vec2::new(10.0, 20.0));
        let p = m.transform_point(Vec3::new(1.0, 1.0, 0.0));
        // zero x-scale reads as 1
        assert_eq!(p, Vec3::new(16.0, 22.0, 1.0));

        let world = Mat4::translation(Vec3::new(100.0, 0.0, 0.0)) * m;
        assert_eq!(world.transform_point(Vec3::ZERO), Vec3::new(115.0, 20.0, 1.0));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let m = Mat4::rotation_euler(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));
        let p = m.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_color_helpers() {
        let c = Color::from_hex("#FF000080");
        assert_eq!(c.r, 1.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(Color::new(0.5, 0.5, 0.5, 1.0).tint(2.0), Color::WHITE);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.5), Color::new(0.5, 0.5, 0.5, 1.0));
        assert!(Color::default().is_unset());
    }

    #[test]
    fn test_string_id_is_stable() {
        assert_eq!(StringId::new("save"), StringId::new("save"));
        assert_ne!(StringId::new("save"), StringId::new("load"));
        assert_eq!(StringId::from("save"), StringId::new("save"));
    }

    #[test]
    fn test_resolve_nested_field() {
        let p = player();
        let path = FieldPath::resolve(&p, "stats.hp").unwrap();
        assert_eq!(path.steps(), &[PathStep::Field(3), PathStep::Field(0)]);
        assert!(matches!(path.read(&p), Some(FieldRef::Float(v)) if v == 42.0));
        assert!(FieldPath::resolve(&p, "stats.mana").is_none());
        assert!(FieldPath::resolve(&p, "name.first").is_none());
    }

    #[test]
    fn test_resolve_through_lists() {
        let p = player();
        let path = FieldPath::resolve(&p, "items.1.name").unwrap();
        assert!(matches!(path.read(&p), Some(FieldRef::Str("Crown"))));

        let rarity = FieldPath::resolve(&p, "items.1.rarity").unwrap();
        assert!(matches!(rarity.read(&p), Some(FieldRef::Enum("Epic"))));

        // empty sparse slot
        assert!(FieldPath::resolve(&p, "slots.0.name").is_none());
        assert!(FieldPath::resolve(&p, "slots.1.name").is_some());
    }

    #[test]
    fn test_write_through_path() {
        let mut p = player();
        let path = FieldPath::resolve(&p, "stats.level").unwrap();
        if let Some(FieldMut::Int(v)) = path.read_mut(&mut p) {
            *v = 9;
        }
        assert_eq!(p.stats.level, 9);

        // enums are read-only
        let rarity = FieldPath::resolve(&p, "items.0.rarity").unwrap();
        assert!(rarity.read_mut(&mut p).is_none());
    }

    #[test]
    fn test_data_ref_follows_weak_root() {
        let model = Rc::new(RefCell::new(player()));
        let shared: SharedData = model.clone();
        let root = DataRef::new(&shared);

        let items = FieldPath::resolve(&*model.borrow(), "items").unwrap();
        let second = root.element(&items, 1);
        let name = second.with(|obj| match obj.field_by_name("name") {
            Some(FieldRef::Str(s)) => s.to_string(),
            _ => String::new(),
        });
        assert_eq!(name.as_deref(), Some("Crown"));

        second.with_mut(|obj| {
            let i = obj.field_index("name").unwrap();
            if let Some(FieldMut::Str(s)) = obj.field_mut(i) {
                s.push('!');
            }
        });
        assert_eq!(model.borrow().items[1].name, "Crown!");

        drop(shared);
        drop(model);
        assert!(!second.is_alive());
        assert!(second.with(|_| ()).is_none());
    }

    #[test]
    fn test_data_ref_refuses_reentrant_borrow() {
        let model = Rc::new(RefCell::new(player()));
        let shared: SharedData = model.clone();
        let data = DataRef::new(&shared);
        let _guard = model.borrow_mut();
        assert!(data.with(|_| ()).is_none());
    }

    #[test]
    fn test_config_node_accessors() {
        let node = ConfigNode::map(
            vec![
                ("w".into(), ConfigNode::scalar("12.5", 2)),
                ("on".into(), ConfigNode::scalar("yes", 3)),
                (
                    "color".into(),
                    ConfigNode::seq(
                        vec![
                            ConfigNode::scalar("0.5", 4),
                            ConfigNode::scalar("0.25", 4),
                            ConfigNode::scalar("1", 4),
                        ],
                        4,
                    ),
                ),
            ],
            1,
        );
        assert_eq!(node.get("w").and_then(|n| n.as_f32()), Some(12.5));
        assert_eq!(node.get("on").and_then(|n| n.as_bool()), Some(true));
        assert_eq!(
            node.get("color").and_then(|n| n.as_floats::<4>()),
            Some([0.5, 0.25, 1.0, 1.0])
        );
        assert!(node.get("missing").is_none());
        assert!(node.items().is_empty());
    }

    #[test]
    fn test_scene_config_overrides() {
        let settings = ConfigNode::map(
            vec![
                ("drag_threshold_sq".into(), ConfigNode::scalar("16", 2)),
                ("node_capacity".into(), ConfigNode::scalar("10", 3)),
                ("bogus".into(), ConfigNode::scalar("1", 4)),
                ("min_thumb".into(), ConfigNode::scalar("wide", 5)),
            ],
            1,
        );
        let mut cfg = SceneConfig::default();
        cfg.apply_overrides(&settings);
        assert_eq!(cfg.drag_threshold_sq, 16.0);
        assert_eq!(cfg.node_capacity, 10);
        assert_eq!(cfg.min_thumb, 12.0);
        assert_eq!(cfg.area_wheel_step, 120.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_node_from_json() {
        let v = serde_json::json!({ "type": "text", "children": [ { "id": "a" } ], "w": 3 });
        let node = ConfigNode::from_json(&v);
        assert_eq!(node.line, 1);
        assert_eq!(node.get("w").and_then(|n| n.as_f32()), Some(3.0));
        let children = node.get("children").unwrap();
        assert_eq!(children.items().len(), 1);
        assert_eq!(
            children.items()[0].get("id").and_then(|n| n.as_str()),
            Some("a")
        );
    }
}
