//! Hashing configuration
//!
//! Argon2id cost parameters for hashed field values.

use argon2::Params;
use serde::{Deserialize, Serialize};

use super::errors::{CryptoError, CryptoResult};

/// Argon2id cost parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Memory cost in KiB (default: 19456)
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of passes (default: 2)
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Degree of parallelism (default: 1)
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl HashingConfig {
    /// Cheapest parameters Argon2 accepts; for tests and local tooling only
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Builds validated Argon2 parameters
    pub fn params(&self) -> CryptoResult<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| CryptoError::InvalidParams(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HashingConfig::default();
        assert_eq!(config.memory_kib, 19456);
        assert_eq!(config.iterations, 2);
        assert!(config.params().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HashingConfig = serde_json::from_str(r#"{"iterations": 3}"#).unwrap();
        assert_eq!(config.iterations, 3);
        assert_eq!(config.memory_kib, 19456);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = HashingConfig {
            memory_kib: 8,
            iterations: 0,
            parallelism: 1,
        };
        assert!(matches!(config.params(), Err(CryptoError::InvalidParams(_))));
    }

    #[test]
    fn test_minimal_params_valid() {
        assert!(HashingConfig::minimal().params().is_ok());
    }
}
