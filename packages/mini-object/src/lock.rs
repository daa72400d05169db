use bitflags::bitflags;
use mini_object_sys as sys;
use tracing::warn;

use crate::{Error, MiniObject, Result};

bitflags! {
    /// Access mode requested from [`MiniObject::lock`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LockFlags: u32 {
        const READ = sys::LOCK_FLAG_READ;
        const WRITE = sys::LOCK_FLAG_WRITE;
        /// Counts the holder as an exclusive owner. More than one exclusive
        /// owner makes a lockable record non-writable.
        const EXCLUSIVE = sys::LOCK_FLAG_EXCLUSIVE;
    }
}

impl LockFlags {
    pub const READWRITE: Self = Self::READ.union(Self::WRITE);
}

/// Holds a lock on a mini object and releases it with the same flags when
/// dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    obj: &'a MiniObject,
    flags: LockFlags,
}

impl<'a> LockGuard<'a> {
    pub(crate) fn new(obj: &'a MiniObject, flags: LockFlags) -> Result<Self> {
        if unsafe { sys::mini_object_lock(obj.as_ptr(), flags.bits()) } {
            Ok(Self { obj, flags })
        } else {
            Err(Error::LockFailed {
                type_name: obj.type_name(),
                flags,
            })
        }
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> LockFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub const fn object(&self) -> &'a MiniObject {
        self.obj
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !unsafe { sys::mini_object_unlock(self.obj.as_ptr(), self.flags.bits()) } {
            warn!(
                type_name = self.obj.type_name(),
                flags = ?self.flags,
                "lock released outside of its guard"
            );
        }
    }
}

impl core::fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockGuard")
            .field("object", self.obj)
            .field("flags", &self.flags)
            .finish()
    }
}
