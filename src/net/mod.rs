//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limit)
//!     → connection.rs (connection id, metrics guard)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection is reported to the metrics collector for its lifetime

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId};
pub use listener::{ConnectionPermit, Listener, ListenerError};
