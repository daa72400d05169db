//! Access locking.
//!
//! `lockstate` layout: bits 0..8 hold the access mode of the current lock
//! holders, bits 8..16 the number of access locks and bits 16.. the number of
//! exclusive holders.

use core::sync::atomic::Ordering;

use libc::c_uint;

use crate::{
    mini_object, LOCK_FLAG_EXCLUSIVE, LOCK_FLAG_LAST, LOCK_FLAG_WRITE,
    MINI_OBJECT_FLAG_LOCK_READONLY,
};

const FLAG_MASK: c_uint = LOCK_FLAG_LAST - 1;
const LOCK_ONE: i32 = LOCK_FLAG_LAST as i32;
const SHARE_ONE: i32 = 1 << 16;
const LOCK_FLAG_MASK: i32 = SHARE_ONE - 1;
const MAX_LOCKS: i32 = 0xff;

/// More than one exclusive holder.
#[inline]
pub(crate) const fn is_shared(state: i32) -> bool {
    state >= 2 * SHARE_ONE
}

/// Locks `obj` with the access mode in `flags`. Fails if a write lock is
/// requested on a read-only or shared record, if the record is already
/// locked with an incompatible mode or if the lock or share count is
/// exhausted.
#[no_mangle]
pub unsafe extern "C" fn mini_object_lock(obj: *mut mini_object, flags: c_uint) -> bool {
    let obj = &*obj;
    let access_mode = flags & FLAG_MASK & !LOCK_FLAG_EXCLUSIVE;
    let mut state = obj.lockstate.load(Ordering::Relaxed);

    loop {
        let mut newstate = state;
        if flags & LOCK_FLAG_EXCLUSIVE != 0 {
            newstate = match newstate.checked_add(SHARE_ONE) {
                Some(newstate) => newstate,
                None => return false,
            };
        }

        if access_mode != 0 {
            if (state & LOCK_FLAG_MASK) >> 8 == MAX_LOCKS {
                return false;
            }
            if access_mode & LOCK_FLAG_WRITE != 0 {
                if is_shared(newstate) {
                    return false;
                }
                if obj.flags.load(Ordering::Acquire) & MINI_OBJECT_FLAG_LOCK_READONLY != 0 {
                    return false;
                }
            }

            if state & LOCK_FLAG_MASK == 0 {
                newstate |= access_mode as i32;
            } else if (state as c_uint) & access_mode != access_mode {
                return false;
            }
            newstate += LOCK_ONE;
        }

        match obj.lockstate.compare_exchange_weak(
            state,
            newstate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return true,
            Err(current) => state = current,
        }
    }
}

/// Releases a lock taken with the same `flags`. Returns `false` without
/// touching the state if no such lock is held.
#[no_mangle]
pub unsafe extern "C" fn mini_object_unlock(obj: *mut mini_object, flags: c_uint) -> bool {
    let obj = &*obj;
    let access_mode = flags & FLAG_MASK & !LOCK_FLAG_EXCLUSIVE;
    let mut state = obj.lockstate.load(Ordering::Relaxed);

    loop {
        let mut newstate = state;
        if flags & LOCK_FLAG_EXCLUSIVE != 0 {
            if state < SHARE_ONE {
                return false;
            }
            newstate -= SHARE_ONE;
        }

        if access_mode != 0 {
            let count = (state & LOCK_FLAG_MASK) >> 8;
            if count == 0 || (state as c_uint) & access_mode != access_mode {
                return false;
            }
            newstate -= LOCK_ONE;
            if count == 1 {
                newstate &= !LOCK_FLAG_MASK;
            }
        }

        match obj.lockstate.compare_exchange_weak(
            state,
            newstate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return true,
            Err(current) => state = current,
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn mini_object_is_locked(obj: *const mini_object) -> bool {
    (*obj).lockstate.load(Ordering::Acquire) & LOCK_FLAG_MASK != 0
}
