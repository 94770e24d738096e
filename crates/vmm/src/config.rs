use std::fmt;
use std::str::FromStr;

use pagesim_error::{errconfig, errinput, Error};
use serde::{Deserialize, Serialize};

use crate::Result;

pub const DEFAULT_PHYSICAL_MEMORY_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Page replacement policy selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Fifo,
    Lru,
    Clock,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::Fifo, Policy::Lru, Policy::Clock];
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::Fifo => "FIFO",
            Policy::Lru => "LRU",
            Policy::Clock => "Clock",
        };
        f.write_str(name)
    }
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(Policy::Fifo),
            "lru" => Ok(Policy::Lru),
            "clock" => Ok(Policy::Clock),
            other => errinput!("unknown replacement policy '{other}'"),
        }
    }
}

/// Construction-time parameters of a [`crate::VirtualMemoryManager`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Physical memory in bytes.
    pub physical_memory_size: u64,
    /// Page (and frame) size in bytes.
    pub page_size: u64,
    pub policy: Policy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            physical_memory_size: DEFAULT_PHYSICAL_MEMORY_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            policy: Policy::Lru,
        }
    }
}

impl MemoryConfig {
    pub fn new(physical_memory_size: u64, page_size: u64, policy: Policy) -> Self {
        Self {
            physical_memory_size,
            page_size,
            policy,
        }
    }

    /// Sizes physical memory as exactly `frames` frames of `page_size` bytes.
    pub fn with_frames(frames: usize, page_size: u64, policy: Policy) -> Self {
        Self::new((frames as u64).saturating_mul(page_size), page_size, policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return errconfig!("page size must be positive");
        }
        if self.physical_memory_size == 0 {
            return errconfig!("physical memory size must be positive");
        }
        if self.physical_memory_size % self.page_size != 0 {
            return errconfig!(
                "page size {} does not evenly divide physical memory size {}",
                self.page_size,
                self.physical_memory_size
            );
        }
        if usize::try_from(self.total_frames()).is_err() {
            return errconfig!("{} frames do not fit in memory", self.total_frames());
        }
        Ok(())
    }

    /// Number of physical frames. Only meaningful after [`Self::validate`].
    pub fn total_frames(&self) -> u64 {
        self.physical_memory_size / self.page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_one_megabyte_of_4k_pages() {
        let config = MemoryConfig::default();
        assert_eq!(config.total_frames(), 256);
        assert_eq!(config.policy, Policy::Lru);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        assert!(matches!(
            MemoryConfig::new(0, 4096, Policy::Fifo).validate(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            MemoryConfig::new(4096, 0, Policy::Fifo).validate(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            MemoryConfig::new(10_000, 4096, Policy::Fifo).validate(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_page_size_need_not_be_power_of_two() {
        let config = MemoryConfig::new(3000, 1000, Policy::Clock);
        assert!(config.validate().is_ok());
        assert_eq!(config.total_frames(), 3);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("FIFO".parse::<Policy>(), Ok(Policy::Fifo));
        assert_eq!("lru".parse::<Policy>(), Ok(Policy::Lru));
        assert_eq!("Clock".parse::<Policy>(), Ok(Policy::Clock));
        assert!(matches!("optimal".parse::<Policy>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: MemoryConfig = serde_json::from_str(r#"{"policy":"clock"}"#).unwrap();
        assert_eq!(config.policy, Policy::Clock);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }
}
