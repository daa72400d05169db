use bitflags::bitflags;
use mini_object_sys as sys;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::Error;

/// A single flag defined by the native layer.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum MiniObjectFlag {
    /// The record may be locked for access.
    Lockable = sys::MINI_OBJECT_FLAG_LOCKABLE,
    /// Write locks are refused and the record is never writable in place.
    LockReadonly = sys::MINI_OBJECT_FLAG_LOCK_READONLY,
    MayBeLeaked = sys::MINI_OBJECT_FLAG_MAY_BE_LEAKED,
    /// First bit available to subtypes.
    Last = sys::MINI_OBJECT_FLAG_LAST,
}

impl TryFrom<u32> for MiniObjectFlag {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::iter()
            .find(|flag| *flag as u32 == value)
            .ok_or(Error::UnknownFlag(value))
    }
}

bitflags! {
    /// Flag word of a mini object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MiniObjectFlags: u32 {
        const LOCKABLE = sys::MINI_OBJECT_FLAG_LOCKABLE;
        const LOCK_READONLY = sys::MINI_OBJECT_FLAG_LOCK_READONLY;
        const MAY_BE_LEAKED = sys::MINI_OBJECT_FLAG_MAY_BE_LEAKED;
        const LAST = sys::MINI_OBJECT_FLAG_LAST;
    }
}

impl MiniObjectFlags {
    /// Number of flag bits available from [`MiniObjectFlags::LAST`] on.
    pub const CUSTOM_BITS: u32 = u32::BITS - MiniObjectFlags::LAST.bits().trailing_zeros();

    /// The `n`th flag bit counted from [`MiniObjectFlags::LAST`], free for
    /// subtypes and applications.
    ///
    /// # Panics
    ///
    /// If `n` is not below [`MiniObjectFlags::CUSTOM_BITS`].
    #[inline]
    #[must_use]
    pub const fn custom(n: u32) -> Self {
        assert!(n < Self::CUSTOM_BITS, "custom flag out of range");
        Self::from_bits_retain(Self::LAST.bits() << n)
    }

    /// Named flags contained in the set.
    pub fn named_flags(self) -> impl Iterator<Item = MiniObjectFlag> {
        MiniObjectFlag::iter().filter(move |flag| self.contains((*flag).into()))
    }
}

impl From<MiniObjectFlag> for MiniObjectFlags {
    fn from(value: MiniObjectFlag) -> Self {
        Self::from_bits_retain(value as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_impl() {
        assert_eq!(format!("{:?}", MiniObjectFlags::empty()), "MiniObjectFlags(0x0)");
        assert_eq!(
            format!("{:?}", MiniObjectFlags::LOCKABLE | MiniObjectFlags::LOCK_READONLY),
            "MiniObjectFlags(LOCKABLE | LOCK_READONLY)"
        );
        assert_eq!(
            format!("{:?}", MiniObjectFlags::LOCKABLE | MiniObjectFlags::custom(1)),
            "MiniObjectFlags(LOCKABLE | 0x20)"
        );
    }

    #[test]
    fn flag_names() {
        assert_eq!(MiniObjectFlag::LockReadonly.to_string(), "lock-readonly");
        assert_eq!(
            "may-be-leaked".parse::<MiniObjectFlag>().unwrap(),
            MiniObjectFlag::MayBeLeaked
        );
    }

    #[test]
    fn from_raw_value() {
        assert_eq!(MiniObjectFlag::try_from(1u32).unwrap(), MiniObjectFlag::Lockable);
        assert_eq!(
            MiniObjectFlag::try_from(1u32 << 3),
            Err(Error::UnknownFlag(1 << 3))
        );
    }

    #[test]
    fn set_operations() {
        let flags = MiniObjectFlags::LOCKABLE | MiniObjectFlags::custom(1);
        assert!(flags.contains(MiniObjectFlag::Lockable.into()));
        assert!(!flags.contains(MiniObjectFlags::LOCKABLE | MiniObjectFlags::LOCK_READONLY));
        assert!(flags.intersects(MiniObjectFlags::LOCKABLE | MiniObjectFlags::LOCK_READONLY));
        assert_eq!(flags - MiniObjectFlags::LOCKABLE, MiniObjectFlags::custom(1));
        assert_eq!(
            flags.named_flags().collect::<Vec<_>>(),
            vec![MiniObjectFlag::Lockable]
        );
    }

    #[test]
    fn custom_bits_stay_in_range() {
        assert_eq!(MiniObjectFlags::CUSTOM_BITS, 28);
        assert_eq!(MiniObjectFlags::custom(27).bits(), 1 << 31);
        assert!(std::panic::catch_unwind(|| MiniObjectFlags::custom(28)).is_err());
    }
}
