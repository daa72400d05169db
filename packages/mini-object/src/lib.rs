//! Safe smart pointers over native mini objects.
//!
//! A [`MiniObject`] owns one reference to a record managed by
//! [`mini_object_sys`]. Cloning and dropping forward to the native reference
//! count, [`MiniObject::make_writable`] implements copy-on-write and the flag
//! word is exposed as [`MiniObjectFlags`]. Mini objects can be carried in a
//! dynamically typed [`Value`] for every type registered in the
//! [`ValueRegistry`].

pub use mini_object_sys as sys;

pub use self::buffer::{Buffer, BufferBuilder};
pub use self::error::Error;
pub use self::flags::{MiniObjectFlag, MiniObjectFlags};
pub use self::lock::{LockFlags, LockGuard};
pub use self::object::{MiniObject, MiniObjectType};
pub use self::registry::{ValueRegistry, ValueVTable};
pub use self::value::{Value, ValueImpl};

pub type Result<T> = core::result::Result<T, Error>;

#[macro_use]
mod macros;
mod buffer;
mod error;
mod flags;
mod lock;
mod object;
mod registry;
mod value;
