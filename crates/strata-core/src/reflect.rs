//! # Reflection
//!
//! Scene nodes bind to application data they do not own. Instead of raw field
//! offsets, bound types implement [`Reflect`]: a small table of named fields,
//! each exposed as a typed [`FieldRef`] (read) or [`FieldMut`] (write).
//!
//! Names are resolved once into a [`FieldPath`] (a list of field and list
//! indices); every later read or write walks the indices without touching
//! strings.
//!
//! ```rust
//! use strata_core::reflect::*;
//! use strata_core::impl_reflect;
//!
//! #[derive(Default)]
//! struct Slot {
//!     label: String,
//!     weight: f32,
//! }
//! impl_reflect!(Slot { value label, value weight });
//!
//! let slot = Slot { label: "Sword".into(), weight: 3.5 };
//! let path = FieldPath::resolve(&slot, "weight").unwrap();
//! assert!(matches!(path.read(&slot), Some(FieldRef::Float(w)) if w == 3.5));
//! ```
//!
//! `impl_reflect!` takes one of three markers per field:
//!
//! - `value` for scalars, strings, `Vec4`, `Vec<T: Reflect>` and `SparseList<T>`
//! - `nested` for struct fields that implement `Reflect` themselves
//! - `variant` for enums implementing [`ReflectEnum`] (read-only)

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::Vec4;

/// Read view of one reflected field.
#[derive(Clone, Copy)]
pub enum FieldRef<'a> {
    Float(f32),
    Int(i64),
    Bool(bool),
    Str(&'a str),
    Vec4(Vec4),
    /// Enum variant name.
    Enum(&'static str),
    Struct(&'a dyn Reflect),
    List(&'a dyn ReflectList),
}

/// Write view of one reflected field.
pub enum FieldMut<'a> {
    Float(&'a mut f32),
    Int(&'a mut i32),
    Bool(&'a mut bool),
    Str(&'a mut String),
    Vec4(&'a mut Vec4),
    Struct(&'a mut dyn Reflect),
    List(&'a mut dyn ReflectList),
}

pub trait Reflect: Any {
    fn type_name(&self) -> &'static str;

    fn field_names(&self) -> &'static [&'static str];

    fn field(&self, index: usize) -> Option<FieldRef<'_>>;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;

    fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names().iter().position(|n| *n == name)
    }

    fn field_by_name(&self, name: &str) -> Option<FieldRef<'_>> {
        self.field(self.field_index(name)?)
    }
}

/// Homogeneous element sequence behind a collection field.
pub trait ReflectList {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` for out-of-range indices and for empty slots of sparse lists.
    fn item(&self, index: usize) -> Option<&dyn Reflect>;

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

impl<T: Reflect> ReflectList for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }
    fn item(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|t| t as &dyn Reflect)
    }
    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|t| t as &mut dyn Reflect)
    }
}

/// A list whose slots may be empty, the equivalent of an array of nullable
/// pointers. Empty slots produce no nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseList<T>(pub Vec<Option<T>>);

impl<T: Reflect> ReflectList for SparseList<T> {
    fn len(&self) -> usize {
        self.0.len()
    }
    fn item(&self, index: usize) -> Option<&dyn Reflect> {
        self.0.get(index)?.as_ref().map(|t| t as &dyn Reflect)
    }
    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.0.get_mut(index)?.as_mut().map(|t| t as &mut dyn Reflect)
    }
}

/// Field types `impl_reflect!` can expose with the `value` marker.
pub trait ReflectValue {
    fn as_field(&self) -> FieldRef<'_>;
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>>;
}

impl ReflectValue for f32 {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Float(*self)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::Float(self))
    }
}

impl ReflectValue for i32 {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Int(*self as i64)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::Int(self))
    }
}

// Counts are commonly stored unsigned; they are readable but not bindable for writes.
impl ReflectValue for u32 {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Int(*self as i64)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        None
    }
}

impl ReflectValue for usize {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Int(*self as i64)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        None
    }
}

impl ReflectValue for bool {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Bool(*self)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::Bool(self))
    }
}

impl ReflectValue for String {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Str(self)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::Str(self))
    }
}

impl ReflectValue for Vec4 {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Vec4(*self)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::Vec4(self))
    }
}

impl<T: Reflect> ReflectValue for Vec<T> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::List(self)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::List(self))
    }
}

impl<T: Reflect> ReflectValue for SparseList<T> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::List(self)
    }
    fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        Some(FieldMut::List(self))
    }
}

/// Enums readable through reflection by variant name (used for per-item
/// template selection).
pub trait ReflectEnum {
    fn variant_name(&self) -> &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathStep {
    Field(usize),
    Index(usize),
}

/// Pre-resolved route from a root object to a field or element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(SmallVec<[PathStep; 4]>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a dotted name (`stats.hp`, `items.2.name`) against a live
    /// object. Numeric segments index into list fields.
    pub fn resolve(root: &dyn Reflect, dotted: &str) -> Option<FieldPath> {
        let mut path = FieldPath::new();
        let mut cur = FieldRef::Struct(root);
        for seg in dotted.split('.') {
            let (step, next) = match cur {
                FieldRef::Struct(obj) => {
                    let i = obj.field_index(seg)?;
                    (PathStep::Field(i), obj.field(i)?)
                }
                FieldRef::List(list) => {
                    let i: usize = seg.parse().ok()?;
                    (PathStep::Index(i), FieldRef::Struct(list.item(i)?))
                }
                _ => return None,
            };
            path.0.push(step);
            cur = next;
        }
        Some(path)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, step: PathStep) {
        self.0.push(step);
    }

    /// `self` followed by `rest`.
    pub fn join(&self, rest: &FieldPath) -> FieldPath {
        let mut out = self.clone();
        out.0.extend(rest.0.iter().copied());
        out
    }

    pub fn read<'a>(&self, root: &'a dyn Reflect) -> Option<FieldRef<'a>> {
        let mut cur = FieldRef::Struct(root);
        for step in &self.0 {
            cur = match (cur, *step) {
                (FieldRef::Struct(obj), PathStep::Field(i)) => obj.field(i)?,
                (FieldRef::List(list), PathStep::Index(i)) => FieldRef::Struct(list.item(i)?),
                _ => return None,
            };
        }
        Some(cur)
    }

    pub fn read_mut<'a>(&self, root: &'a mut dyn Reflect) -> Option<FieldMut<'a>> {
        let mut cur = FieldMut::Struct(root);
        for step in &self.0 {
            cur = match (cur, *step) {
                (FieldMut::Struct(obj), PathStep::Field(i)) => obj.field_mut(i)?,
                (FieldMut::List(list), PathStep::Index(i)) => {
                    FieldMut::Struct(list.item_mut(i)?)
                }
                _ => return None,
            };
        }
        Some(cur)
    }

    /// The object this path ends on, if it ends on a struct or list element.
    pub fn object<'a>(&self, root: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        match self.read(root)? {
            FieldRef::Struct(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn object_mut<'a>(&self, root: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        match self.read_mut(root)? {
            FieldMut::Struct(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Shared handle to application data a tree binds against.
pub type SharedData = Rc<RefCell<dyn Reflect>>;

/// Non-owning reference to an object inside application data: the weak root
/// plus the path from it. Once the host drops the root every access returns
/// `None`.
#[derive(Clone)]
pub struct DataRef {
    root: Weak<RefCell<dyn Reflect>>,
    path: FieldPath,
}

impl DataRef {
    pub fn new(root: &SharedData) -> Self {
        Self {
            root: Rc::downgrade(root),
            path: FieldPath::new(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Reference to the `index`th element of the list at `list_path`
    /// (relative to this object).
    pub fn element(&self, list_path: &FieldPath, index: usize) -> DataRef {
        let mut path = self.path.join(list_path);
        path.push(PathStep::Index(index));
        DataRef {
            root: self.root.clone(),
            path,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.root.strong_count() > 0
    }

    /// Runs `f` on the referenced object. `None` when the root is gone, already
    /// mutably borrowed, or the path no longer leads to an object.
    pub fn with<R>(&self, f: impl FnOnce(&dyn Reflect) -> R) -> Option<R> {
        let root = self.root.upgrade()?;
        let guard = root.try_borrow().ok()?;
        let obj = self.path.object(&*guard)?;
        Some(f(obj))
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn Reflect) -> R) -> Option<R> {
        let root = self.root.upgrade()?;
        let mut guard = root.try_borrow_mut().ok()?;
        let obj = self.path.object_mut(&mut *guard)?;
        Some(f(obj))
    }
}

impl std::fmt::Debug for DataRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataRef")
            .field("alive", &self.is_alive())
            .field("path", &self.path)
            .finish()
    }
}

/// Implements [`Reflect`] for a struct by listing its fields with a marker
/// (`value`, `nested` or `variant`).
#[macro_export]
macro_rules! impl_reflect {
    ($ty:ident { $($kind:ident $field:ident),* $(,)? }) => {
        impl $crate::reflect::Reflect for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($field)),*]
            }

            #[allow(unused_assignments, unused_mut)]
            fn field(&self, index: usize) -> Option<$crate::reflect::FieldRef<'_>> {
                let mut i = 0usize;
                $(
                    if i == index {
                        return Some($crate::__reflect_ref!($kind, self.$field));
                    }
                    i += 1;
                )*
                None
            }

            #[allow(unused_assignments, unused_mut)]
            fn field_mut(&mut self, index: usize) -> Option<$crate::reflect::FieldMut<'_>> {
                let mut i = 0usize;
                $(
                    if i == index {
                        return $crate::__reflect_mut!($kind, self.$field);
                    }
                    i += 1;
                )*
                None
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __reflect_ref {
    (value, $e:expr) => {
        $crate::reflect::ReflectValue::as_field(&$e)
    };
    (nested, $e:expr) => {
        $crate::reflect::FieldRef::Struct(&$e)
    };
    (variant, $e:expr) => {
        $crate::reflect::FieldRef::Enum($crate::reflect::ReflectEnum::variant_name(&$e))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __reflect_mut {
    (value, $e:expr) => {
        $crate::reflect::ReflectValue::as_field_mut(&mut $e)
    };
    (nested, $e:expr) => {
        Some($crate::reflect::FieldMut::Struct(&mut $e))
    };
    (variant, $e:expr) => {
        None
    };
}
