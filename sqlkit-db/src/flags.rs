//! Open-mode flags and connection options.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::time::Duration;

use strum::IntoEnumIterator;

use crate::ffi;

/// One open-mode flag, as accepted by `sqlite3_open_v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OpenFlag {
    /// Open for reading only.
    ReadOnly,
    /// Open for reading and writing.
    ReadWrite,
    /// Create the database if it does not exist (needs `ReadWrite`).
    Create,
    /// Keep the database purely in memory.
    Memory,
    /// Multi-thread threading mode.
    NoMutex,
    /// Serialized threading mode.
    FullMutex,
    /// Enable shared cache.
    SharedCache,
    /// Disable shared cache.
    PrivateCache,
    /// Refuse to open a path that is a symbolic link.
    NoFollow,
}

impl OpenFlag {
    const fn bits(self) -> i32 {
        match self {
            Self::ReadOnly => ffi::SQLITE_OPEN_READONLY,
            Self::ReadWrite => ffi::SQLITE_OPEN_READWRITE,
            Self::Create => ffi::SQLITE_OPEN_CREATE,
            Self::Memory => ffi::SQLITE_OPEN_MEMORY,
            Self::NoMutex => ffi::SQLITE_OPEN_NOMUTEX,
            Self::FullMutex => ffi::SQLITE_OPEN_FULLMUTEX,
            Self::SharedCache => ffi::SQLITE_OPEN_SHAREDCACHE,
            Self::PrivateCache => ffi::SQLITE_OPEN_PRIVATECACHE,
            Self::NoFollow => ffi::SQLITE_OPEN_NOFOLLOW,
        }
    }
}

/// A bitwise combination of [`OpenFlag`]s.
///
/// URI interpretation and extended result codes are always requested on top
/// of these; callers never pass them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenFlags(i32);

impl OpenFlags {
    /// `SQLITE_OPEN_READONLY`
    pub const READONLY: Self = Self(ffi::SQLITE_OPEN_READONLY);
    /// `SQLITE_OPEN_READWRITE`
    pub const READWRITE: Self = Self(ffi::SQLITE_OPEN_READWRITE);
    /// `SQLITE_OPEN_CREATE`
    pub const CREATE: Self = Self(ffi::SQLITE_OPEN_CREATE);
    /// `SQLITE_OPEN_MEMORY`
    pub const MEMORY: Self = Self(ffi::SQLITE_OPEN_MEMORY);
    /// `SQLITE_OPEN_NOMUTEX`
    pub const NOMUTEX: Self = Self(ffi::SQLITE_OPEN_NOMUTEX);
    /// `SQLITE_OPEN_FULLMUTEX`
    pub const FULLMUTEX: Self = Self(ffi::SQLITE_OPEN_FULLMUTEX);
    /// `SQLITE_OPEN_SHAREDCACHE`
    pub const SHAREDCACHE: Self = Self(ffi::SQLITE_OPEN_SHAREDCACHE);
    /// `SQLITE_OPEN_PRIVATECACHE`
    pub const PRIVATECACHE: Self = Self(ffi::SQLITE_OPEN_PRIVATECACHE);
    /// `SQLITE_OPEN_NOFOLLOW`
    pub const NOFOLLOW: Self = Self(ffi::SQLITE_OPEN_NOFOLLOW);

    const IMPLICIT: Self = Self(ffi::SQLITE_OPEN_URI | ffi::SQLITE_OPEN_EXRESCODE);

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Builds flags from a raw bit pattern. Unknown bits are passed through
    /// to the engine untouched.
    #[must_use]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The bits actually handed to `sqlite3_open_v2`.
    pub(crate) const fn with_implicit(self) -> Self {
        Self(self.0 | Self::IMPLICIT.0)
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::READONLY
    }
}

impl BitOr for OpenFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<OpenFlag> for OpenFlags {
    fn from(flag: OpenFlag) -> Self {
        Self(flag.bits())
    }
}

impl FromIterator<OpenFlag> for OpenFlags {
    fn from_iter<I: IntoIterator<Item = OpenFlag>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, flag| bits | flag.bits()))
    }
}

impl fmt::Display for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = OpenFlag::iter()
            .filter(|flag| self.contains((*flag).into()))
            .map(|flag| flag.to_string())
            .collect();
        if names.is_empty() {
            write!(f, "{:#x}", self.0)
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Options used to open a [`Connection`](crate::Connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    /// Open-mode flags. Defaults to [`OpenFlags::READONLY`].
    pub flags: OpenFlags,
    /// How long to wait on a locked database before giving up with
    /// `SQLITE_BUSY`. `None` keeps the engine default of not waiting.
    pub busy_timeout: Option<Duration>,
}

impl OpenOptions {
    /// Read-only options with no busy timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the open-mode flags.
    #[must_use]
    pub const fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine_and_display() {
        let flags = OpenFlags::READWRITE | OpenFlags::CREATE;
        assert!(flags.contains(OpenFlags::CREATE));
        assert!(!flags.contains(OpenFlags::READONLY));
        assert_eq!(flags.to_string(), "readwrite|create");
    }

    #[test]
    fn test_flags_from_names() {
        let flags: OpenFlags = ["readwrite", "create", "nofollow"]
            .iter()
            .map(|name| name.parse::<OpenFlag>().expect("known flag"))
            .collect();
        assert_eq!(
            flags,
            OpenFlags::READWRITE | OpenFlags::CREATE | OpenFlags::NOFOLLOW
        );
        assert!("bogus".parse::<OpenFlag>().is_err());
    }

    #[test]
    fn test_implicit_flags_are_added() {
        let bits = OpenFlags::READONLY.with_implicit().bits();
        assert_ne!(bits & ffi::SQLITE_OPEN_URI, 0);
        assert_ne!(bits & ffi::SQLITE_OPEN_EXRESCODE, 0);
        assert_ne!(bits & ffi::SQLITE_OPEN_READONLY, 0);
    }

    #[test]
    fn test_default_is_readonly() {
        assert_eq!(OpenOptions::new().flags, OpenFlags::READONLY);
        assert_eq!(OpenOptions::new().busy_timeout, None);
    }
}
