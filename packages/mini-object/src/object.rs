use core::ffi::{c_char, CStr};
use core::fmt::Debug;
use core::ptr::NonNull;

use mini_object_sys as sys;
use tracing::{trace, warn};

use crate::{Error, LockFlags, LockGuard, MiniObjectFlags, Result};

ref_counted_wrapper!(struct Inner(sys::mini_object) {
    acquire: sys::mini_object_ref,
    release: sys::mini_object_unref,
});

/// A strong reference to a native mini object.
///
/// Cloning takes another native reference and dropping releases one; the
/// record is freed by the native layer when the last reference goes away.
/// Mutating operations take `&mut self` but the record may still be shared
/// with other holders, call [`MiniObject::make_writable`] first to get a
/// private record.
#[derive(Clone)]
#[repr(transparent)]
pub struct MiniObject(Inner);

// SAFETY: reference count, flags and lock state are atomic in the native record.
unsafe impl Send for MiniObject {}
unsafe impl Sync for MiniObject {}

impl MiniObject {
    /// Allocates a plain record of the root type.
    #[must_use]
    pub fn new(flags: MiniObjectFlags) -> Self {
        // SAFETY: the native allocation never returns null
        unsafe { Self::from_non_null(NonNull::new_unchecked(sys::mini_object_new(flags.bits()))) }
    }

    /// # Safety
    ///
    /// `ptr` must carry a reference that is handed over to the new object.
    #[inline]
    pub(crate) const unsafe fn from_non_null(ptr: NonNull<sys::mini_object>) -> Self {
        Self(Inner(ptr))
    }

    /// Wraps `ptr`, taking over the reference owned by the caller.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a valid record with a reference owned by
    /// the caller.
    #[inline]
    pub unsafe fn from_raw_full(ptr: *mut sys::mini_object) -> Result<Self> {
        Inner::from_full(ptr).map(Self)
    }

    /// Wraps `ptr`, acquiring a new reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a valid record.
    #[inline]
    pub unsafe fn from_raw_none(ptr: *mut sys::mini_object) -> Result<Self> {
        Inner::from_none(ptr).map(Self)
    }

    #[inline]
    #[must_use]
    pub const fn as_ptr(&self) -> *mut sys::mini_object {
        self.0.as_ptr()
    }

    /// Gives up ownership without releasing the reference.
    #[inline]
    #[must_use]
    pub fn into_raw(self) -> *mut sys::mini_object {
        self.0.into_raw()
    }

    /// Duplicates the record. The copy starts with a reference count of 1,
    /// owned by the returned object.
    pub fn copy(&self) -> Result<Self> {
        let copy = unsafe { sys::mini_object_copy(self.as_ptr()) };
        if copy.is_null() {
            return Err(Error::NotCopyable(self.type_name()));
        }
        trace!(type_name = self.type_name(), "copied mini object");
        unsafe { Self::from_raw_full(copy) }
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        unsafe { sys::mini_object_is_writable(self.as_ptr()) }
    }

    /// Makes sure the record can be mutated in place, replacing it with a
    /// private copy when it is shared. Other holders keep the original.
    pub fn make_writable(&mut self) -> Result<()> {
        let ptr = self.as_ptr();
        let writable = unsafe { sys::mini_object_make_writable(ptr) };
        match NonNull::new(writable) {
            Some(writable) if writable.as_ptr() == ptr => Ok(()),
            Some(writable) => {
                trace!(type_name = self.type_name(), "replaced shared mini object by a copy");
                // SAFETY: the native layer released our reference to `ptr`
                unsafe { self.0.rebind(writable) };
                Ok(())
            }
            None => {
                warn!(
                    type_name = self.type_name(),
                    "shared mini object can't be made writable"
                );
                Err(Error::NotCopyable(self.type_name()))
            }
        }
    }

    #[must_use]
    pub fn flags(&self) -> MiniObjectFlags {
        MiniObjectFlags::from_bits_retain(unsafe { sys::mini_object_flags(self.as_ptr()) })
    }

    /// Whether any bit of `flag` is set.
    #[must_use]
    pub fn flag_is_set(&self, flag: impl Into<MiniObjectFlags>) -> bool {
        unsafe { sys::mini_object_flag_is_set(self.as_ptr(), flag.into().bits()) }
    }

    pub fn set_flag(&mut self, flag: impl Into<MiniObjectFlags>) {
        unsafe { sys::mini_object_flag_set(self.as_ptr(), flag.into().bits()) };
    }

    pub fn unset_flag(&mut self, flag: impl Into<MiniObjectFlags>) {
        unsafe { sys::mini_object_flag_unset(self.as_ptr(), flag.into().bits()) };
    }

    /// Takes another reference to the same record.
    #[inline]
    #[must_use]
    pub fn ref_(&self) -> Self {
        self.clone()
    }

    /// Releases this reference.
    #[inline]
    pub fn unref(self) {
        drop(self);
    }

    #[must_use]
    pub fn refcount(&self) -> u32 {
        let count = unsafe { sys::mini_object_refcount(self.as_ptr()) };
        count.unsigned_abs()
    }

    pub fn lock(&self, flags: LockFlags) -> Result<LockGuard<'_>> {
        LockGuard::new(self, flags)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        unsafe { sys::mini_object_is_locked(self.as_ptr()) }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        unsafe { static_str(sys::mini_object_type_name(self.as_ptr())) }
    }

    /// Both refer to the same record.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr()
    }

    #[must_use]
    pub fn is<T: MiniObjectType>(&self) -> bool {
        unsafe { sys::mini_object_type_is_a((*self.as_ptr()).type_, T::static_type()) }
    }

    pub fn downcast<T: MiniObjectType>(self) -> core::result::Result<T, Self> {
        if self.is::<T>() {
            Ok(unsafe { T::from_mini_object_unchecked(self) })
        } else {
            Err(self)
        }
    }
}

impl PartialEq for MiniObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for MiniObject {}

impl Debug for MiniObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MiniObject")
            .field("type", &self.type_name())
            .field("ptr", &self.as_ptr())
            .field("refcount", &self.refcount())
            .field("flags", &self.flags())
            .finish()
    }
}

/// Implemented by [`MiniObject`] and its subtypes.
///
/// # Safety
///
/// Every record wrapped by the implementor must be of
/// [`MiniObjectType::static_type`] or one of its descendants.
pub unsafe trait MiniObjectType: Clone + Send + Sync + 'static {
    fn static_type() -> &'static sys::mini_object_type;

    fn as_mini_object(&self) -> &MiniObject;

    /// # Safety
    ///
    /// `obj` must be of [`MiniObjectType::static_type`] or a descendant.
    unsafe fn from_mini_object_unchecked(obj: MiniObject) -> Self;

    #[must_use]
    fn static_type_name() -> &'static str {
        unsafe { static_str(Self::static_type().name) }
    }
}

unsafe impl MiniObjectType for MiniObject {
    fn static_type() -> &'static sys::mini_object_type {
        &sys::MINI_OBJECT_TYPE
    }

    fn as_mini_object(&self) -> &MiniObject {
        self
    }

    unsafe fn from_mini_object_unchecked(obj: MiniObject) -> Self {
        obj
    }
}

/// Type names live in static descriptors.
pub(crate) unsafe fn static_str(name: *const c_char) -> &'static str {
    CStr::from_ptr(name).to_str().unwrap_or("<invalid type name>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MiniObjectFlag;

    #[test]
    fn fresh_object() {
        let flags = MiniObjectFlags::MAY_BE_LEAKED | MiniObjectFlags::custom(2);
        let obj = MiniObject::new(flags);
        assert_eq!(obj.flags(), flags);
        assert_eq!(obj.refcount(), 1);
        assert_eq!(obj.type_name(), "MiniObject");
        assert!(obj.is_writable());
    }

    #[test]
    fn flags_are_idempotent() {
        let flag = MiniObjectFlags::custom(0);
        let mut obj = MiniObject::new(MiniObjectFlags::empty());
        for _ in 0..2 {
            obj.set_flag(flag);
            assert!(obj.flag_is_set(flag));
        }
        for _ in 0..2 {
            obj.unset_flag(flag);
            assert!(!obj.flag_is_set(flag));
        }
        obj.set_flag(MiniObjectFlag::MayBeLeaked);
        assert_eq!(obj.flags(), MiniObjectFlags::MAY_BE_LEAKED);
    }

    #[test]
    fn writable_until_referenced() {
        let obj = MiniObject::new(MiniObjectFlags::empty());
        assert!(obj.is_writable());
        let other = obj.ref_();
        assert_eq!(obj.refcount(), 2);
        assert!(!obj.is_writable());
        other.unref();
        assert!(obj.is_writable());
    }

    #[test]
    fn readonly_is_never_writable() {
        let obj = MiniObject::new(MiniObjectFlags::LOCK_READONLY);
        assert_eq!(obj.refcount(), 1);
        assert!(!obj.is_writable());
    }

    #[test]
    fn copy_is_independent() {
        let flag = MiniObjectFlags::custom(1);
        let obj = MiniObject::new(flag);
        let mut copy = obj.copy().unwrap();
        assert!(!copy.ptr_eq(&obj));
        assert_eq!(copy.refcount(), 1);
        assert_eq!(obj.refcount(), 1);
        assert_eq!(copy.flags(), obj.flags());

        copy.unset_flag(flag);
        assert!(obj.flag_is_set(flag));
    }

    #[test]
    fn make_writable_unique_keeps_identity() {
        let mut obj = MiniObject::new(MiniObjectFlags::empty());
        let ptr = obj.as_ptr();
        obj.make_writable().unwrap();
        assert_eq!(obj.as_ptr(), ptr);
        assert_eq!(obj.refcount(), 1);
    }

    #[test]
    fn make_writable_shared_copies() {
        let flag = MiniObjectFlags::custom(3);
        let original = MiniObject::new(flag);
        let mut obj = original.clone();
        assert_eq!(original.refcount(), 2);

        obj.make_writable().unwrap();
        assert!(!obj.ptr_eq(&original));
        assert_eq!(original.refcount(), 1);
        assert_eq!(obj.refcount(), 1);
        assert_eq!(obj.flags(), original.flags());
        assert!(obj.is_writable());
    }

    #[test]
    fn make_writable_shared_lockable_copies() {
        let other = MiniObject::new(MiniObjectFlags::LOCKABLE);
        let mut obj = other.clone();
        assert!(!obj.is_writable());

        obj.make_writable().unwrap();
        assert!(!obj.ptr_eq(&other));
        assert_eq!(obj.refcount(), 1);
        obj.set_flag(MiniObjectFlags::custom(0));
        assert!(!other.flag_is_set(MiniObjectFlags::custom(0)));
    }

    #[test]
    fn raw_round_trip() {
        let obj = MiniObject::new(MiniObjectFlags::empty());
        let borrowed = unsafe { MiniObject::from_raw_none(obj.as_ptr()) }.unwrap();
        assert_eq!(obj, borrowed);
        assert_eq!(obj.refcount(), 2);

        let raw = borrowed.into_raw();
        assert_eq!(obj.refcount(), 2);
        let owned = unsafe { MiniObject::from_raw_full(raw) }.unwrap();
        drop(owned);
        assert_eq!(obj.refcount(), 1);

        let err = unsafe { MiniObject::from_raw_full(core::ptr::null_mut()) }.unwrap_err();
        assert_eq!(err, Error::NullHandle);
    }
}
