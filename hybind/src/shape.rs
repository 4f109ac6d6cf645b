//! Runtime type identities for values crossing the tagged codec.
//!
//! Rust has no class hierarchy to reflect on, so a value type opts in by implementing [`Shape`]
//! and, optionally, declaring its lineage: the types it should be considered a subtype of.
//! A binding registered for a type then matches that type and every shape listing it in its
//! lineage. Values travel through the codec as `&dyn DynShape` / `Box<dyn DynShape>` and are
//! recovered with the `downcast_*` helpers.

use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use downcast_rs::{DowncastSync, impl_downcast};

/// Identity of a concrete type.
///
/// Equality and hashing only consider the [`TypeId`]; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value type the tagged codec can carry.
///
/// This trait should be implemented with [`impl_shape!`](crate::impl_shape) rather than by hand.
/// It deliberately has no encoding method: how a shape is written is decided by the registry,
/// never by the value itself.
pub trait Shape: Any + Send + Sync + fmt::Debug {
    /// Every type this shape is a subtype of, nearest first, transitive ancestors included.
    fn lineage() -> Vec<TypeKey>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// Object-safe view of a [`Shape`].
///
/// Implemented for every [`Shape`]; never implement it directly.
pub trait DynShape: DowncastSync + fmt::Debug {
    /// The concrete runtime type of this value.
    fn runtime_type(&self) -> RuntimeType;
}
impl_downcast!(sync DynShape);

impl<T: Shape> DynShape for T {
    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::of::<T>()
    }
}

/// The concrete type of a value together with its declared lineage.
///
/// This is what binding predicates are evaluated against. The lineage is only materialized when
/// asked for, which only happens while resolving a type the codec has not seen yet.
#[derive(Clone, Copy)]
pub struct RuntimeType {
    key: TypeKey,
    lineage: fn() -> Vec<TypeKey>,
}

impl RuntimeType {
    pub fn of<T: Shape>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            lineage: <T as Shape>::lineage,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name
    }

    pub fn lineage(&self) -> Vec<TypeKey> {
        (self.lineage)()
    }

    /// True if this type is `ty` itself or declares `ty` in its lineage.
    pub fn is_assignable_to(&self, ty: TypeKey) -> bool {
        self.key == ty || self.lineage().contains(&ty)
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.key.id == TypeId::of::<T>()
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("key", &self.key)
            .field("lineage", &self.lineage())
            .finish()
    }
}

/// Implement [`Shape`] for one or more types.
///
/// ```
/// use hybind::{impl_shape, shape::{RuntimeType, TypeKey}};
///
/// #[derive(Debug)]
/// struct Task;
/// #[derive(Debug)]
/// struct CopyTask;
///
/// impl_shape!(Task);
/// impl_shape!(CopyTask => [Task]);
///
/// assert!(RuntimeType::of::<CopyTask>().is_assignable_to(TypeKey::of::<Task>()));
/// assert!(!RuntimeType::of::<Task>().is_assignable_to(TypeKey::of::<CopyTask>()));
/// ```
#[macro_export]
macro_rules! impl_shape {
    ($ty:ty => [$($parent:ty),* $(,)?]) => {
        impl $crate::shape::Shape for $ty {
            fn lineage() -> ::std::vec::Vec<$crate::shape::TypeKey> {
                ::std::vec![$($crate::shape::TypeKey::of::<$parent>()),*]
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::shape::Shape for $ty {}
        )+
    };
}

impl_shape!(
    bool,
    char,
    u8,
    i8,
    u16,
    i16,
    u32,
    i32,
    u64,
    i64,
    f32,
    f64,
    String,
    Vec<u8>,
);
