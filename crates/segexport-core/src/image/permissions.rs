use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Read/write/execute attributes of a memory region.
///
/// Packed into the container as a 3-bit field: bit0 = execute, bit1 = write,
/// bit2 = read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permissions {
    pub const EXECUTE_BIT: u64 = 1;
    pub const WRITE_BIT: u64 = 2;
    pub const READ_BIT: u64 = 4;

    pub const NONE: Self = Self::new(false, false, false);
    pub const READ: Self = Self::new(true, false, false);
    pub const READ_WRITE: Self = Self::new(true, true, false);
    pub const READ_EXECUTE: Self = Self::new(true, false, true);
    pub const ALL: Self = Self::new(true, true, true);

    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Self {
            read,
            write,
            execute,
        }
    }

    /// Pack into the container's 3-bit field (`read*4 + write*2 + execute*1`).
    pub fn bits(&self) -> u64 {
        let mut bits = 0;
        if self.read {
            bits |= Self::READ_BIT;
        }
        if self.write {
            bits |= Self::WRITE_BIT;
        }
        if self.execute {
            bits |= Self::EXECUTE_BIT;
        }
        bits
    }

    /// Unpack a permissions word. Returns `None` if bits above bit2 are set.
    pub fn from_bits(bits: u64) -> Option<Self> {
        if bits & !(Self::READ_BIT | Self::WRITE_BIT | Self::EXECUTE_BIT) != 0 {
            return None;
        }
        Some(Self {
            read: bits & Self::READ_BIT != 0,
            write: bits & Self::WRITE_BIT != 0,
            execute: bits & Self::EXECUTE_BIT != 0,
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' }
        )
    }
}

/// Parses `"r-x"`, `"rw"`, `"---"` and similar strings.
impl FromStr for Permissions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::InvalidPermissions("empty string".to_string()));
        }

        let mut perms = Permissions::NONE;
        for c in s.chars() {
            let flag = match c.to_ascii_lowercase() {
                'r' => &mut perms.read,
                'w' => &mut perms.write,
                'x' => &mut perms.execute,
                '-' => continue,
                _ => {
                    return Err(Error::InvalidPermissions(format!(
                        "unexpected character {:?} in {:?}",
                        c, s
                    )));
                }
            };
            if *flag {
                return Err(Error::InvalidPermissions(format!(
                    "duplicate flag {:?} in {:?}",
                    c, s
                )));
            }
            *flag = true;
        }
        Ok(perms)
    }
}

impl TryFrom<String> for Permissions {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permissions> for String {
    fn from(value: Permissions) -> Self {
        value.to_string()
    }
}
