//! Overflow policies for the record queue
//!
//! Decide what a producer does when the bounded queue is full. Error and fatal
//! records always wait for space regardless of policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// # Example
///
/// ```
/// use fanlog::OverflowPolicy;
/// use std::time::Duration;
///
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// assert_eq!(policy.to_string(), "BlockWithTimeout(100ms)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Wait until space is available
    #[default]
    Block,

    /// Drop the record being submitted
    DropNewest,

    /// Wait up to the timeout, then drop
    BlockWithTimeout(Duration),
}

impl OverflowPolicy {
    /// How long a producer may wait for space, `None` meaning forever.
    pub fn wait_limit(&self) -> Option<Duration> {
        match self {
            OverflowPolicy::Block => None,
            OverflowPolicy::DropNewest => Some(Duration::ZERO),
            OverflowPolicy::BlockWithTimeout(timeout) => Some(*timeout),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Block.to_string(), "Block");
        assert_eq!(OverflowPolicy::DropNewest.to_string(), "DropNewest");
    }

    #[test]
    fn test_wait_limit() {
        assert_eq!(OverflowPolicy::Block.wait_limit(), None);
        assert_eq!(OverflowPolicy::DropNewest.wait_limit(), Some(Duration::ZERO));
        assert_eq!(
            OverflowPolicy::BlockWithTimeout(Duration::from_millis(5)).wait_limit(),
            Some(Duration::from_millis(5))
        );
    }
}
