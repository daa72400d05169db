use crate::LockFlags;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("null mini object handle")]
    NullHandle,
    #[error("{0} can't be copied")]
    NotCopyable(&'static str),
    #[error("couldn't lock {type_name} with {flags:?}")]
    LockFailed {
        type_name: &'static str,
        flags: LockFlags,
    },
    #[error("expected a {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("value is empty")]
    EmptyValue,
    #[error("{0} is not a registered value type")]
    Unregistered(String),
    #[error("unknown mini object flag {0:#x}")]
    UnknownFlag(u32),
}
