// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Protocol status codes surfaced by browse and path resolution.
use std::fmt;

/// 32-bit protocol status code. The top two bits carry the severity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct StatusCode(u32);

impl StatusCode {
    /// Operation succeeded.
    pub const GOOD: Self = Self(0);
    /// Nothing was requested.
    pub const BAD_NOTHING_TO_DO: Self = Self(0x800F_0000);
    /// Caller lacks the permission for the operation.
    pub const BAD_USER_ACCESS_DENIED: Self = Self(0x801F_0000);
    /// Node id syntax is invalid.
    pub const BAD_NODE_ID_INVALID: Self = Self(0x8033_0000);
    /// Node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    /// Reference type id is unknown or not a reference type.
    pub const BAD_REFERENCE_TYPE_ID_INVALID: Self = Self(0x804C_0000);
    /// Browse direction is out of range.
    pub const BAD_BROWSE_DIRECTION_INVALID: Self = Self(0x804D_0000);
    /// Node class is not valid for the operation.
    pub const BAD_NODE_CLASS_INVALID: Self = Self(0x805F_0000);
    /// Browse name is missing or invalid.
    pub const BAD_BROWSE_NAME_INVALID: Self = Self(0x8060_0000);
    /// A path resolved to no target.
    pub const BAD_NO_MATCH: Self = Self(0x806F_0000);
    /// Argument value has the wrong data type.
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    /// Required arguments were not supplied.
    pub const BAD_ARGUMENTS_MISSING: Self = Self(0x8076_0000);
    /// An argument is invalid.
    pub const BAD_INVALID_ARGUMENT: Self = Self(0x80AB_0000);

    const NAMES: [(Self, &'static str); 13] = [
        (Self::GOOD, "Good"),
        (Self::BAD_NOTHING_TO_DO, "BadNothingToDo"),
        (Self::BAD_USER_ACCESS_DENIED, "BadUserAccessDenied"),
        (Self::BAD_NODE_ID_INVALID, "BadNodeIdInvalid"),
        (Self::BAD_NODE_ID_UNKNOWN, "BadNodeIdUnknown"),
        (Self::BAD_REFERENCE_TYPE_ID_INVALID, "BadReferenceTypeIdInvalid"),
        (Self::BAD_BROWSE_DIRECTION_INVALID, "BadBrowseDirectionInvalid"),
        (Self::BAD_NODE_CLASS_INVALID, "BadNodeClassInvalid"),
        (Self::BAD_BROWSE_NAME_INVALID, "BadBrowseNameInvalid"),
        (Self::BAD_NO_MATCH, "BadNoMatch"),
        (Self::BAD_TYPE_MISMATCH, "BadTypeMismatch"),
        (Self::BAD_ARGUMENTS_MISSING, "BadArgumentsMissing"),
        (Self::BAD_INVALID_ARGUMENT, "BadInvalidArgument"),
    ];

    /// Wraps raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Severity is Good.
    #[must_use]
    pub const fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Severity is Bad.
    #[must_use]
    pub const fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Symbolic name, when the code is one this crate knows about.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, name)| *name)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::GOOD
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}
