use alloc::boxed::Box;
use core::ptr;
use core::sync::atomic::{fence, Ordering};

use libc::{c_char, c_int, c_uint};

use crate::lock::is_shared;
use crate::{
    mini_object, mini_object_copy_function, mini_object_dispose_function,
    mini_object_free_function, mini_object_type, MINI_OBJECT_FLAG_LOCKABLE,
    MINI_OBJECT_FLAG_LOCK_READONLY, MINI_OBJECT_TYPE,
};

/// Initializes the header of a freshly allocated record with a reference
/// count of 1 and no locks held.
#[no_mangle]
pub unsafe extern "C" fn mini_object_init(
    obj: *mut mini_object,
    flags: c_uint,
    type_: *const mini_object_type,
    copy: mini_object_copy_function,
    dispose: mini_object_dispose_function,
    free: mini_object_free_function,
) {
    ptr::write(obj, mini_object::new(flags, type_, copy, dispose, free));
}

unsafe extern "C" fn plain_copy(obj: *const mini_object) -> *mut mini_object {
    let flags = (*obj).flags.load(Ordering::Relaxed) & !MINI_OBJECT_FLAG_LOCK_READONLY;
    mini_object_new(flags)
}

unsafe extern "C" fn plain_free(obj: *mut mini_object) {
    drop(Box::from_raw(obj));
}

/// Allocates a record of the root type.
#[no_mangle]
pub extern "C" fn mini_object_new(flags: c_uint) -> *mut mini_object {
    Box::into_raw(Box::new(mini_object::new(
        flags,
        &MINI_OBJECT_TYPE,
        Some(plain_copy),
        None,
        Some(plain_free),
    )))
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_ref(obj: *mut mini_object) -> *mut mini_object {
    (*obj).refcount.fetch_add(1, Ordering::Relaxed);
    obj
}

/// Drops one reference. The last reference runs the dispose hook and, unless
/// it resurrected the record, the free hook.
#[no_mangle]
pub unsafe extern "C" fn mini_object_unref(obj: *mut mini_object) {
    if (*obj).refcount.fetch_sub(1, Ordering::Release) != 1 {
        return;
    }
    fence(Ordering::Acquire);

    if let Some(dispose) = (*obj).dispose {
        if !dispose(obj) {
            return;
        }
    }
    if let Some(free) = (*obj).free {
        free(obj);
    }
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_refcount(obj: *const mini_object) -> c_int {
    (*obj).refcount.load(Ordering::Acquire)
}

/// Returns null if the type has no copy function.
#[no_mangle]
pub unsafe extern "C" fn mini_object_copy(obj: *const mini_object) -> *mut mini_object {
    match (*obj).copy {
        Some(copy) => copy(obj),
        None => ptr::null_mut(),
    }
}

/// A record is writable when it has a single reference, is not read-only and,
/// if lockable, has at most one exclusive holder.
#[no_mangle]
pub unsafe extern "C" fn mini_object_is_writable(obj: *const mini_object) -> bool {
    let flags = (*obj).flags.load(Ordering::Acquire);
    if flags & MINI_OBJECT_FLAG_LOCK_READONLY != 0 {
        return false;
    }

    if (*obj).refcount.load(Ordering::Acquire) != 1 {
        return false;
    }
    flags & MINI_OBJECT_FLAG_LOCKABLE == 0 || !is_shared((*obj).lockstate.load(Ordering::Acquire))
}

/// Returns `obj` if it is writable. Otherwise the reference to `obj` is
/// exchanged for a reference to a private copy. When the type can't be copied
/// null is returned and the caller keeps its reference to `obj`.
#[no_mangle]
pub unsafe extern "C" fn mini_object_make_writable(obj: *mut mini_object) -> *mut mini_object {
    if mini_object_is_writable(obj) {
        return obj;
    }

    let copy = mini_object_copy(obj);
    if !copy.is_null() {
        mini_object_unref(obj);
    }
    copy
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_flags(obj: *const mini_object) -> c_uint {
    (*obj).flags.load(Ordering::Acquire)
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_flag_is_set(obj: *const mini_object, flag: c_uint) -> bool {
    (*obj).flags.load(Ordering::Acquire) & flag != 0
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_flag_set(obj: *mut mini_object, flag: c_uint) {
    (*obj).flags.fetch_or(flag, Ordering::AcqRel);
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_flag_unset(obj: *mut mini_object, flag: c_uint) {
    (*obj).flags.fetch_and(!flag, Ordering::AcqRel);
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_type_name(obj: *const mini_object) -> *const c_char {
    (*(*obj).type_).name
}

/// Walks the parent chain of `type_` looking for `ancestor`.
#[no_mangle]
pub unsafe extern "C" fn mini_object_type_is_a(
    type_: *const mini_object_type,
    ancestor: *const mini_object_type,
) -> bool {
    let mut current = type_;
    while !current.is_null() {
        if ptr::eq(current, ancestor) {
            return true;
        }
        current = (*current).parent;
    }
    false
}
