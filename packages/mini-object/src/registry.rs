use core::any::{Any, TypeId};
use core::fmt::Debug;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use tracing::debug;

use crate::{Buffer, Error, MiniObject, Result, Value, ValueImpl};

type GetFn = fn(&Value) -> Result<Box<dyn Any + Send>>;
type SetFn = fn(&mut Value, &dyn Any) -> Result<()>;

/// Type-erased adapter pair of a registered value type.
#[derive(Clone, Copy)]
pub struct ValueVTable {
    type_name: &'static str,
    type_id: TypeId,
    get: GetFn,
    set: SetFn,
}

impl ValueVTable {
    fn of<T: ValueImpl>() -> Self {
        Self {
            type_name: T::type_name(),
            type_id: TypeId::of::<T>(),
            get: get_erased::<T>,
            set: set_erased::<T>,
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn get(&self, value: &Value) -> Result<Box<dyn Any + Send>> {
        (self.get)(value)
    }

    /// `data` must be of the registered type.
    pub fn set(&self, value: &mut Value, data: &dyn Any) -> Result<()> {
        (self.set)(value, data)
    }
}

impl Debug for ValueVTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ValueVTable").field(&self.type_name).finish()
    }
}

fn get_erased<T: ValueImpl>(value: &Value) -> Result<Box<dyn Any + Send>> {
    T::get(value).map(|data| Box::new(data) as Box<dyn Any + Send>)
}

fn set_erased<T: ValueImpl>(value: &mut Value, data: &dyn Any) -> Result<()> {
    match data.downcast_ref::<T>() {
        Some(data) => T::set(value, data),
        None => Err(Error::TypeMismatch {
            expected: T::type_name(),
            actual: "<unregistered type>",
        }),
    }
}

/// Types that can be carried in a [`Value`].
#[derive(Debug, Default)]
pub struct ValueRegistry {
    types: RwLock<HashMap<TypeId, ValueVTable>>,
}

impl ValueRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`MiniObject`] and [`Buffer`] registered.
    #[must_use]
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register::<MiniObject>();
        registry.register::<Buffer>();
        registry
    }

    /// The registry used by [`Value::get`] and [`Value::set`].
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<ValueRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::with_builtin)
    }

    /// Returns `false` if `T` was already registered.
    pub fn register<T: ValueImpl>(&self) -> bool {
        let mut types = self.types.write();
        if types.contains_key(&TypeId::of::<T>()) {
            return false;
        }
        types.insert(TypeId::of::<T>(), ValueVTable::of::<T>());
        debug!(type_name = T::type_name(), "registered value type");
        true
    }

    #[must_use]
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.types.read().contains_key(&TypeId::of::<T>())
    }

    pub fn vtable<T: 'static>(&self) -> Result<ValueVTable> {
        self.types
            .read()
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or_else(|| Error::Unregistered(core::any::type_name::<T>().to_owned()))
    }

    #[must_use]
    pub fn by_name(&self, type_name: &str) -> Option<ValueVTable> {
        self.types
            .read()
            .values()
            .find(|vtable| vtable.type_name == type_name)
            .copied()
    }

    pub fn get<T: ValueImpl>(&self, value: &Value) -> Result<T> {
        let data = self.vtable::<T>()?.get(value)?;
        match data.downcast::<T>() {
            Ok(data) => Ok(*data),
            Err(_) => Err(Error::TypeMismatch {
                expected: T::type_name(),
                actual: value.type_name(),
            }),
        }
    }

    pub fn set<T: ValueImpl>(&self, value: &mut Value, data: &T) -> Result<()> {
        self.vtable::<T>()?.set(value, data)
    }

    /// Reads `value` as the registered type called `type_name`.
    pub fn get_boxed(&self, type_name: &str, value: &Value) -> Result<Box<dyn Any + Send>> {
        self.by_name(type_name)
            .ok_or_else(|| Error::Unregistered(type_name.to_owned()))?
            .get(value)
    }
}
