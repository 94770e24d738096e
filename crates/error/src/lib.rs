use serde::{Deserialize, Serialize};

/// Errors returned by the pagesim virtual memory core. Every variant is
/// surfaced to the caller; nothing is logged and swallowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    /// Invalid constructor arguments. The manager is never built.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An access to a virtual page the process never allocated.
    #[error("unmapped address {virtual_address:#x} for process {process_id}")]
    UnmappedAddress { process_id: u32, virtual_address: u64 },

    /// A rejected `allocate_pages` request. No pages were added.
    #[error("invalid allocation request: {0}")]
    InvalidAllocation(String),

    /// A replacement strategy broke its contract. Unreachable in correct operation.
    #[error("replacement strategy invariant violated: {0}")]
    StrategyInvariantViolation(String),

    /// The frame pool and page tables disagree.
    #[error("inconsistent memory state: {0}")]
    InconsistentState(String),

    /// Unparseable user input, e.g. an unknown policy name.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Constructs an `Err(Error::Configuration)` for the given format string.
#[macro_export]
macro_rules! errconfig {
    ($($args:tt)*) => { Err($crate::Error::Configuration(format!($($args)*))) };
}

/// Constructs an `Err(Error::InvalidAllocation)` for the given format string.
#[macro_export]
macro_rules! erralloc {
    ($($args:tt)*) => { Err($crate::Error::InvalidAllocation(format!($($args)*))) };
}

/// Constructs an `Err(Error::InvalidInput)` for the given format string.
#[macro_export]
macro_rules! errinput {
    ($($args:tt)*) => { Err($crate::Error::InvalidInput(format!($($args)*))) };
}

/// Constructs an `Err(Error::StrategyInvariantViolation)` for the given format string.
#[macro_export]
macro_rules! errstrategy {
    ($($args:tt)*) => { Err($crate::Error::StrategyInvariantViolation(format!($($args)*))) };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> Result<()> {
        errconfig!("page size {} must divide {}", 3, 10)
    }

    #[test]
    fn test_macro_builds_variant() {
        assert_eq!(
            configuration(),
            Err(Error::Configuration("page size 3 must divide 10".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let err = Error::UnmappedAddress {
            process_id: 7,
            virtual_address: 0x2000,
        };
        assert_eq!(err.to_string(), "unmapped address 0x2000 for process 7");
    }
}
