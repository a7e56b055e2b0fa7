//! Operation identifiers.
//!
//! An [`OperationId`] names one in-flight group of engine processes. Ids come
//! from an [`OperationIdGenerator`], a monotonically increasing atomic counter,
//! so two operations created at the same instant never alias each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a registered operation. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(NonZeroU64);

impl OperationId {
    /// Wrap a raw value; `None` for zero, which never names an operation.
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Return the raw numeric value.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NonZeroU64::from_str(s).map(Self)
    }
}

impl From<OperationId> for u64 {
    fn from(id: OperationId) -> Self {
        id.get()
    }
}

/// Hands out fresh [`OperationId`]s.
#[derive(Debug)]
pub struct OperationIdGenerator {
    next: AtomicU64,
}

impl OperationIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> OperationId {
        // Zero only shows up after the counter wraps; skip it.
        loop {
            if let Some(raw) = NonZeroU64::new(self.next.fetch_add(1, Ordering::Relaxed)) {
                return OperationId(raw);
            }
        }
    }
}

impl Default for OperationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
