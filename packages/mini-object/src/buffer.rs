use core::ffi::c_char;
use core::fmt::Debug;
use core::ops::Deref;
use core::ptr::NonNull;

use mini_object_sys as sys;

use crate::{MiniObject, MiniObjectFlags, MiniObjectType, Result};

static BUFFER_TYPE: sys::mini_object_type = sys::mini_object_type {
    name: b"Buffer\0".as_ptr() as *const c_char,
    parent: &sys::MINI_OBJECT_TYPE,
};

// the header must stay the first field
#[repr(C)]
struct RawBuffer {
    parent: sys::mini_object,
    data: Vec<u8>,
}

impl RawBuffer {
    fn alloc(flags: u32, data: Vec<u8>) -> NonNull<sys::mini_object> {
        let raw = Box::new(Self {
            parent: sys::mini_object::new(
                flags,
                &BUFFER_TYPE,
                Some(buffer_copy),
                None,
                Some(buffer_free),
            ),
            data,
        });
        NonNull::from(Box::leak(raw)).cast()
    }
}

unsafe extern "C" fn buffer_copy(obj: *const sys::mini_object) -> *mut sys::mini_object {
    let buffer = &*obj.cast::<RawBuffer>();
    let flags = sys::mini_object_flags(obj) & !sys::MINI_OBJECT_FLAG_LOCK_READONLY;
    RawBuffer::alloc(flags, buffer.data.clone()).as_ptr()
}

unsafe extern "C" fn buffer_free(obj: *mut sys::mini_object) {
    drop(Box::from_raw(obj.cast::<RawBuffer>()));
}

/// A mini object carrying a byte payload.
///
/// The payload is shared between clones; [`Buffer::data_mut`] copies it first
/// if anyone else holds the record.
#[derive(Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Buffer(MiniObject);

impl Buffer {
    #[must_use]
    pub fn builder() -> BufferBuilder {
        BufferBuilder::new()
    }

    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        Self::builder().data(data).build()
    }

    /// Zero-filled buffer of `size` bytes.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self::builder().size(size).build()
    }

    fn from_vec(flags: MiniObjectFlags, data: Vec<u8>) -> Self {
        // SAFETY: freshly allocated record with one reference
        Self(unsafe { MiniObject::from_non_null(RawBuffer::alloc(flags.bits(), data)) })
    }

    fn raw(&self) -> &RawBuffer {
        unsafe { &*self.0.as_ptr().cast::<RawBuffer>() }
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.raw().data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw().data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw().data.is_empty()
    }

    /// Mutable access to the payload, copying the record first if it's
    /// shared.
    pub fn data_mut(&mut self) -> Result<&mut [u8]> {
        Ok(self.vec_mut()?.as_mut_slice())
    }

    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        self.vec_mut()?.extend_from_slice(data);
        Ok(())
    }

    fn vec_mut(&mut self) -> Result<&mut Vec<u8>> {
        self.0.make_writable()?;
        // SAFETY: a writable record has no other holders
        Ok(unsafe { &mut (*self.0.as_ptr().cast::<RawBuffer>()).data })
    }

    /// Duplicates the record and its payload.
    pub fn copy(&self) -> Result<Self> {
        self.0.copy().map(Self)
    }

    pub fn make_writable(&mut self) -> Result<()> {
        self.0.make_writable()
    }

    pub fn set_flag(&mut self, flag: impl Into<MiniObjectFlags>) {
        self.0.set_flag(flag);
    }

    pub fn unset_flag(&mut self, flag: impl Into<MiniObjectFlags>) {
        self.0.unset_flag(flag);
    }

    #[inline]
    #[must_use]
    pub fn upcast(self) -> MiniObject {
        self.0
    }
}

impl Deref for Buffer {
    type Target = MiniObject;

    fn deref(&self) -> &MiniObject {
        &self.0
    }
}

unsafe impl MiniObjectType for Buffer {
    fn static_type() -> &'static sys::mini_object_type {
        &BUFFER_TYPE
    }

    fn as_mini_object(&self) -> &MiniObject {
        &self.0
    }

    unsafe fn from_mini_object_unchecked(obj: MiniObject) -> Self {
        Self(obj)
    }
}

impl From<Buffer> for MiniObject {
    fn from(value: Buffer) -> Self {
        value.upcast()
    }
}

impl TryFrom<MiniObject> for Buffer {
    type Error = MiniObject;

    fn try_from(value: MiniObject) -> core::result::Result<Self, Self::Error> {
        value.downcast()
    }
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.as_ptr())
            .field("refcount", &self.refcount())
            .field("flags", &self.flags())
            .field("len", &self.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct BufferBuilder {
    data: Vec<u8>,
    flags: MiniObjectFlags,
}

impl BufferBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&mut self, data: &[u8]) -> &mut Self {
        self.data = data.to_vec();
        self
    }

    /// Truncates or zero-extends the payload.
    pub fn size(&mut self, size: usize) -> &mut Self {
        self.data.resize(size, 0);
        self
    }

    pub fn flags(&mut self, flags: MiniObjectFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn build(&mut self) -> Buffer {
        Buffer::from_vec(self.flags, core::mem::take(&mut self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let buffer = Buffer::builder()
            .data(b"abc")
            .size(5)
            .flags(MiniObjectFlags::custom(0))
            .build();
        assert_eq!(buffer.data(), b"abc\0\0");
        assert_eq!(buffer.flags(), MiniObjectFlags::custom(0));
        assert_eq!(buffer.type_name(), "Buffer");
        assert!(Buffer::with_size(0).is_empty());
    }

    #[test]
    fn data_mut_unique_in_place() {
        let mut buffer = Buffer::from_slice(b"hello");
        let ptr = buffer.as_ptr();
        buffer.data_mut().unwrap()[0] = b'j';
        assert_eq!(buffer.as_ptr(), ptr);
        assert_eq!(buffer.data(), b"jello");
    }

    #[test]
    fn data_mut_shared_copies() {
        let original = Buffer::from_slice(b"hello");
        let mut buffer = original.clone();
        buffer.data_mut().unwrap()[0] = b'j';
        assert_eq!(original.data(), b"hello");
        assert_eq!(buffer.data(), b"jello");
        assert_eq!(original.refcount(), 1);
        assert_eq!(buffer.refcount(), 1);
    }

    #[test]
    fn data_mut_lockable_shared_copies() {
        let original = Buffer::builder()
            .data(b"abc")
            .flags(MiniObjectFlags::LOCKABLE)
            .build();
        let mut buffer = original.clone();
        assert!(!buffer.is_writable());
        buffer.extend_from_slice(b"def").unwrap();
        assert!(!buffer.ptr_eq(&original));
        assert_eq!(original.data(), b"abc");
        assert_eq!(buffer.data(), b"abcdef");
    }

    #[test]
    fn copy_duplicates_payload() {
        let buffer = Buffer::from_slice(b"xyz");
        let copy = buffer.copy().unwrap();
        assert_ne!(copy, buffer);
        assert_eq!(copy.data(), buffer.data());
    }

    #[test]
    fn readonly_flag_not_copied() {
        let buffer = Buffer::builder()
            .data(b"ro")
            .flags(MiniObjectFlags::LOCK_READONLY | MiniObjectFlags::custom(1))
            .build();
        let copy = buffer.copy().unwrap();
        assert_eq!(copy.flags(), MiniObjectFlags::custom(1));
    }

    #[test]
    fn downcast() {
        let obj: MiniObject = Buffer::from_slice(b"1").into();
        assert!(obj.is::<Buffer>());
        assert!(obj.is::<MiniObject>());
        let buffer = Buffer::try_from(obj).unwrap();
        assert_eq!(buffer.data(), b"1");

        let plain = MiniObject::new(MiniObjectFlags::empty());
        assert!(!plain.is::<Buffer>());
        assert!(Buffer::try_from(plain).is_err());
        assert_eq!(Buffer::static_type_name(), "Buffer");
    }
}
