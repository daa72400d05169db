use core::ptr;

use crate::{
    mini_object, mini_object_ref, mini_object_type, mini_object_type_is_a, mini_object_unref,
};

/// A value cell holding at most one reference to a record of `type_` or one
/// of its descendants.
#[repr(C)]
#[derive(Debug)]
pub struct mini_value {
    pub type_: *const mini_object_type,
    pub data: *mut mini_object,
}

impl mini_value {
    #[must_use]
    pub const fn new(type_: *const mini_object_type) -> Self {
        Self {
            type_,
            data: ptr::null_mut(),
        }
    }
}

/// `value` must not hold a reference yet, otherwise it is leaked.
#[no_mangle]
pub unsafe extern "C" fn mini_value_init(value: *mut mini_value, type_: *const mini_object_type) {
    ptr::write(value, mini_value::new(type_));
}

/// Whether `obj` (or null) may be stored in `value`.
#[no_mangle]
pub unsafe extern "C" fn mini_value_accepts(
    value: *const mini_value,
    obj: *const mini_object,
) -> bool {
    obj.is_null() || mini_object_type_is_a((*obj).type_, (*value).type_)
}

/// Stores a new reference to `obj`, releasing the previous content.
#[no_mangle]
pub unsafe extern "C" fn mini_value_set_mini_object(
    value: *mut mini_value,
    obj: *mut mini_object,
) -> bool {
    if !mini_value_accepts(value, obj) {
        return false;
    }
    if !obj.is_null() {
        mini_object_ref(obj);
    }
    replace(value, obj);
    true
}

/// Like [`mini_value_set_mini_object`] but takes over the caller's reference.
/// On failure the caller keeps it.
#[no_mangle]
pub unsafe extern "C" fn mini_value_take_mini_object(
    value: *mut mini_value,
    obj: *mut mini_object,
) -> bool {
    if !mini_value_accepts(value, obj) {
        return false;
    }
    replace(value, obj);
    true
}

/// Borrowed pointer to the content; null if empty.
#[no_mangle]
pub unsafe extern "C" fn mini_value_get_mini_object(value: *const mini_value) -> *mut mini_object {
    (*value).data
}

/// New reference to the content; null if empty.
#[no_mangle]
pub unsafe extern "C" fn mini_value_dup_mini_object(value: *const mini_value) -> *mut mini_object {
    let obj = (*value).data;
    if obj.is_null() {
        return obj;
    }
    mini_object_ref(obj)
}

/// Empties the cell and hands its reference to the caller.
#[no_mangle]
pub unsafe extern "C" fn mini_value_steal_mini_object(value: *mut mini_value) -> *mut mini_object {
    core::mem::replace(&mut (*value).data, ptr::null_mut())
}

#[no_mangle]
pub unsafe extern "C" fn mini_value_unset(value: *mut mini_value) {
    replace(value, ptr::null_mut());
}

unsafe fn replace(value: *mut mini_value, obj: *mut mini_object) {
    let old = core::mem::replace(&mut (*value).data, obj);
    if !old.is_null() {
        mini_object_unref(old);
    }
}
