//! Error taxonomy and wire mapping.
//!
//! # Data Flow
//! ```text
//! handler failure
//!     → domain.rs (category constructor: code coerced, cause + context kept)
//!     → logged in full server-side (DomainError::detailed)
//!     → mapper.rs (sanitized {code, message, data})
//!     → client
//! ```
//!
//! # Design Decisions
//! - Out-of-range codes fall back to the category default; construction never fails
//! - Context is split into an internal bag and an allowlisted safe bag
//! - Category codes (1000s/3000s/4000s) never leave as a top-level wire code

pub mod codes;
pub mod domain;
pub mod mapper;

pub use codes::{ErrorCategory, ErrorCode};
pub use domain::{BoxError, DomainError, ErrorContext, SafeField};
pub use mapper::{map_error, MappedError};
