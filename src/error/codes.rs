//! Partitioned error code space.
//!
//! # Ranges
//! ```text
//!   1000 ..=  1999   authentication
//!   3000 ..=  3999   resource access
//!   4000 ..=  4999   internal protocol / application
//! -32700 ..= -32603  standard JSON-RPC codes
//! -32099 ..= -32000  custom server-defined wire codes
//! ```
//!
//! The positive category codes are internal. Only the two negative bands are
//! ever sent to a client as a top-level code.

use std::fmt;
use std::ops::RangeInclusive;

/// Numeric error code drawn from the partitioned space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // Authentication (1000-1999).
    pub const AUTH_FAILURE: Self = Self(1000);
    pub const AUTH_EXPIRED: Self = Self(1001);
    pub const AUTH_INVALID: Self = Self(1002);
    pub const AUTH_MISSING: Self = Self(1003);

    // Resource access (3000-3999).
    pub const RESOURCE_NOT_FOUND: Self = Self(3000);
    pub const RESOURCE_FORBIDDEN: Self = Self(3001);
    pub const RESOURCE_INVALID: Self = Self(3002);

    // Internal protocol / application (4000-4999).
    pub const PROTOCOL_INVALID: Self = Self(4000);
    pub const PROTOCOL_UNSUPPORTED: Self = Self(4001);

    // Standard JSON-RPC codes.
    pub const PARSE_ERROR: Self = Self(-32700);
    pub const INVALID_REQUEST: Self = Self(-32600);
    pub const METHOD_NOT_FOUND: Self = Self(-32601);
    pub const INVALID_PARAMS: Self = Self(-32602);
    pub const INTERNAL_ERROR: Self = Self(-32603);

    // Custom server-defined wire codes (-32000 to -32099).
    pub const REQUEST_SEQUENCE: Self = Self(-32001);
    pub const SERVICE_NOT_FOUND: Self = Self(-32002);

    /// Wrap a raw code without range checks.
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Raw numeric value.
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// The category this code falls into, if any.
    pub fn category(self) -> Option<ErrorCategory> {
        ErrorCategory::ALL
            .into_iter()
            .find(|category| category.contains(self))
    }

    /// True when the code may be sent to a client as a top-level code.
    pub fn is_wire_code(self) -> bool {
        matches!(
            self.category(),
            Some(ErrorCategory::StandardWire | ErrorCategory::CustomWire)
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

/// Disjoint partitions of the code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Auth,
    Resource,
    Protocol,
    StandardWire,
    CustomWire,
}

impl ErrorCategory {
    pub const ALL: [Self; 5] = [
        Self::Auth,
        Self::Resource,
        Self::Protocol,
        Self::StandardWire,
        Self::CustomWire,
    ];

    /// Inclusive numeric range owned by the category.
    pub const fn range(self) -> RangeInclusive<i32> {
        match self {
            Self::Auth => 1000..=1999,
            Self::Resource => 3000..=3999,
            Self::Protocol => 4000..=4999,
            Self::StandardWire => -32700..=-32600,
            Self::CustomWire => -32099..=-32000,
        }
    }

    /// Code substituted when a constructor receives an out-of-range code.
    pub const fn default_code(self) -> ErrorCode {
        match self {
            Self::Auth => ErrorCode::AUTH_FAILURE,
            Self::Resource => ErrorCode::RESOURCE_NOT_FOUND,
            Self::Protocol => ErrorCode::PROTOCOL_INVALID,
            Self::StandardWire => ErrorCode::INTERNAL_ERROR,
            Self::CustomWire => ErrorCode::SERVICE_NOT_FOUND,
        }
    }

    pub fn contains(self, code: ErrorCode) -> bool {
        self.range().contains(&code.0)
    }

    /// Returns `code` when it belongs to this category, the category default
    /// otherwise. Out-of-range input is never an error.
    pub fn coerce(self, code: ErrorCode) -> ErrorCode {
        if self.contains(code) {
            code
        } else {
            self.default_code()
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Resource => "resource",
            Self::Protocol => "protocol",
            Self::StandardWire => "standard_wire",
            Self::CustomWire => "custom_wire",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_disjoint() {
        for (i, a) in ErrorCategory::ALL.iter().enumerate() {
            for b in ErrorCategory::ALL.iter().skip(i + 1) {
                let (ra, rb) = (a.range(), b.range());
                assert!(
                    ra.end() < rb.start() || rb.end() < ra.start(),
                    "{a} overlaps {b}"
                );
            }
        }
    }

    #[test]
    fn named_codes_land_in_their_category() {
        assert_eq!(ErrorCode::AUTH_MISSING.category(), Some(ErrorCategory::Auth));
        assert_eq!(
            ErrorCode::RESOURCE_INVALID.category(),
            Some(ErrorCategory::Resource)
        );
        assert_eq!(
            ErrorCode::PROTOCOL_UNSUPPORTED.category(),
            Some(ErrorCategory::Protocol)
        );
        assert_eq!(
            ErrorCode::PARSE_ERROR.category(),
            Some(ErrorCategory::StandardWire)
        );
        assert_eq!(
            ErrorCode::INTERNAL_ERROR.category(),
            Some(ErrorCategory::StandardWire)
        );
        assert_eq!(
            ErrorCode::SERVICE_NOT_FOUND.category(),
            Some(ErrorCategory::CustomWire)
        );
        assert_eq!(ErrorCode::new(2500).category(), None);
    }

    #[test]
    fn defaults_belong_to_their_category() {
        for category in ErrorCategory::ALL {
            assert!(category.contains(category.default_code()));
        }
    }

    #[test]
    fn coerce_keeps_in_range_and_replaces_out_of_range() {
        assert_eq!(
            ErrorCategory::Auth.coerce(ErrorCode::new(1500)),
            ErrorCode::new(1500)
        );
        assert_eq!(
            ErrorCategory::Auth.coerce(ErrorCode::new(999)),
            ErrorCode::AUTH_FAILURE
        );
        assert_eq!(
            ErrorCategory::Resource.coerce(ErrorCode::AUTH_FAILURE),
            ErrorCode::RESOURCE_NOT_FOUND
        );
    }

    #[test]
    fn only_negative_bands_are_wire_codes() {
        assert!(ErrorCode::INVALID_PARAMS.is_wire_code());
        assert!(ErrorCode::new(-32010).is_wire_code());
        assert!(!ErrorCode::AUTH_FAILURE.is_wire_code());
        assert!(!ErrorCode::new(-1).is_wire_code());
    }

    #[test]
    fn standard_wire_band_covers_request_method_and_params_codes() {
        for code in [
            ErrorCode::PARSE_ERROR,
            ErrorCode::INVALID_REQUEST,
            ErrorCode::METHOD_NOT_FOUND,
            ErrorCode::INVALID_PARAMS,
            ErrorCode::INTERNAL_ERROR,
        ] {
            assert_eq!(code.category(), Some(ErrorCategory::StandardWire), "code {code}");
            assert!(code.is_wire_code(), "code {code}");
        }
        assert_eq!(ErrorCode::new(-32599).category(), None);
        assert_eq!(ErrorCode::new(-32701).category(), None);
    }
}
