//! Native mini object records.
//!
//! A mini object is a small reference-counted record carrying a flag set, an
//! access lock state and per-type copy/dispose/free hooks. Subtypes embed a
//! [`mini_object`] as their first field and describe themselves with a static
//! [`mini_object_type`] whose parent chain ends at [`MINI_OBJECT_TYPE`].
//!
//! Every entry point takes raw pointers and performs no validation beyond what
//! is documented; passing a dangling record is undefined behavior.

#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types, clippy::missing_safety_doc)]

extern crate alloc;

use core::sync::atomic::{AtomicI32, AtomicU32};

use libc::{c_char, c_uint};

pub use self::lock::*;
pub use self::object::*;
pub use self::value::*;

mod lock;
mod object;
mod value;

pub const MINI_OBJECT_FLAG_LOCKABLE: c_uint = 1 << 0;
pub const MINI_OBJECT_FLAG_LOCK_READONLY: c_uint = 1 << 1;
pub const MINI_OBJECT_FLAG_MAY_BE_LEAKED: c_uint = 1 << 2;
/// First flag bit available to subtypes.
pub const MINI_OBJECT_FLAG_LAST: c_uint = 1 << 4;

pub const LOCK_FLAG_READ: c_uint = 1 << 0;
pub const LOCK_FLAG_WRITE: c_uint = 1 << 1;
pub const LOCK_FLAG_EXCLUSIVE: c_uint = 1 << 2;
pub const LOCK_FLAG_LAST: c_uint = 1 << 8;

/// Static description of a mini object type.
#[repr(C)]
#[derive(Debug)]
pub struct mini_object_type {
    pub name: *const c_char,
    /// Null for the root type.
    pub parent: *const mini_object_type,
}

// descriptors are immutable statics
unsafe impl Send for mini_object_type {}
unsafe impl Sync for mini_object_type {}

pub static MINI_OBJECT_TYPE: mini_object_type = mini_object_type {
    name: b"MiniObject\0".as_ptr() as *const c_char,
    parent: core::ptr::null(),
};

/// Returns a newly allocated duplicate with a reference count of 1.
pub type mini_object_copy_function =
    Option<unsafe extern "C" fn(obj: *const mini_object) -> *mut mini_object>;
/// Called when the reference count drops to zero. Returning `false` means the
/// function took a new reference and the record must not be freed.
pub type mini_object_dispose_function = Option<unsafe extern "C" fn(obj: *mut mini_object) -> bool>;
pub type mini_object_free_function = Option<unsafe extern "C" fn(obj: *mut mini_object)>;

#[repr(C)]
pub struct mini_object {
    pub type_: *const mini_object_type,
    pub refcount: AtomicI32,
    pub lockstate: AtomicI32,
    pub flags: AtomicU32,
    pub copy: mini_object_copy_function,
    pub dispose: mini_object_dispose_function,
    pub free: mini_object_free_function,
}

impl mini_object {
    #[must_use]
    pub const fn new(
        flags: c_uint,
        type_: *const mini_object_type,
        copy: mini_object_copy_function,
        dispose: mini_object_dispose_function,
        free: mini_object_free_function,
    ) -> Self {
        Self {
            type_,
            refcount: AtomicI32::new(1),
            lockstate: AtomicI32::new(0),
            flags: AtomicU32::new(flags),
            copy,
            dispose,
            free,
        }
    }
}
