use core::fmt::Debug;

use mini_object_sys as sys;

use crate::object::static_str;
use crate::{Error, MiniObject, MiniObjectType, Result, ValueRegistry};

/// Adapter pair marshaling a type in and out of a [`Value`].
pub trait ValueImpl: Sized + Send + 'static {
    fn type_name() -> &'static str;

    /// Declared type of a [`Value`] created for `Self`.
    fn value_type() -> &'static sys::mini_object_type;

    fn get(value: &Value) -> Result<Self>;

    fn set(value: &mut Value, data: &Self) -> Result<()>;
}

impl<T: MiniObjectType> ValueImpl for T {
    fn type_name() -> &'static str {
        T::static_type_name()
    }

    fn value_type() -> &'static sys::mini_object_type {
        T::static_type()
    }

    fn get(value: &Value) -> Result<Self> {
        let ptr = unsafe { sys::mini_value_get_mini_object(value.as_ptr()) };
        if ptr.is_null() {
            return Err(Error::EmptyValue);
        }
        let obj = unsafe { MiniObject::from_raw_none(ptr) }?;
        obj.downcast::<T>().map_err(|obj| Error::TypeMismatch {
            expected: T::static_type_name(),
            actual: obj.type_name(),
        })
    }

    fn set(value: &mut Value, data: &Self) -> Result<()> {
        let obj = data.as_mini_object();
        if unsafe { sys::mini_value_set_mini_object(value.as_mut_ptr(), obj.as_ptr()) } {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: value.type_name(),
                actual: obj.type_name(),
            })
        }
    }
}

/// Dynamically typed cell holding at most one mini object of its declared
/// type or a subtype.
///
/// Access goes through the adapters in [`ValueRegistry::global`], so only
/// registered types can be stored or retrieved.
pub struct Value {
    raw: sys::mini_value,
}

// SAFETY: the cell owns a reference to a `Send + Sync` record
unsafe impl Send for Value {}
unsafe impl Sync for Value {}

impl Value {
    /// Empty value declared for `T`.
    #[must_use]
    pub fn new<T: ValueImpl>() -> Self {
        Self {
            raw: sys::mini_value::new(T::value_type()),
        }
    }

    /// Value declared for `T` holding a reference to `data`.
    pub fn from_object<T: ValueImpl>(data: &T) -> Result<Self> {
        let mut value = Self::new::<T>();
        value.set(data)?;
        Ok(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_ptr(&self) -> *const sys::mini_value {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut sys::mini_value {
        &mut self.raw
    }

    /// Name of the declared type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        unsafe { static_str((*self.raw.type_).name) }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.data.is_null()
    }

    /// The content is a `T`.
    #[must_use]
    pub fn holds<T: ValueImpl>(&self) -> bool {
        !self.is_empty()
            && unsafe { sys::mini_object_type_is_a((*self.raw.data).type_, T::value_type()) }
    }

    pub fn get<T: ValueImpl>(&self) -> Result<T> {
        ValueRegistry::global().get(self)
    }

    pub fn set<T: ValueImpl>(&mut self, data: &T) -> Result<()> {
        ValueRegistry::global().set(self, data)
    }

    /// Moves the content out, leaving the value empty. On error the content
    /// is left in place.
    pub fn take<T: ValueImpl>(&mut self) -> Result<T> {
        let data = self.get()?;
        self.unset();
        Ok(data)
    }

    pub fn unset(&mut self) {
        unsafe { sys::mini_value_unset(&mut self.raw) };
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::new::<MiniObject>()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let mut raw = sys::mini_value::new(self.raw.type_);
        // same declared type, can't be rejected
        unsafe { sys::mini_value_set_mini_object(&mut raw, self.raw.data) };
        Self { raw }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        self.unset();
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name())
            .field("data", &self.raw.data)
            .finish()
    }
}
