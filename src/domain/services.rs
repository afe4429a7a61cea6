//! External services for the criteria engine.
//!
//! Services provide external dependencies (like time) to the aggregate and
//! ledger without coupling them to specific implementations.

use crate::domain::types::TimestampUtc;

/// Clock service for timestamp generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineClock;

impl EngineClock {
    /// Returns the current UTC timestamp.
    pub fn now(&self) -> TimestampUtc {
        TimestampUtc::now()
    }
}
