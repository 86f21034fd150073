use serde::{Deserialize, Serialize};

use trine_compress::SnapshotConfig;
use trine_query::DEFAULT_MAX_DEPTH;
use trine_types::Capacity;

use crate::error::{EngineError, EngineResult};

/// Configuration for an [`Engine`](crate::Engine).
///
/// Every field has a default, so a TOML document only needs the keys it
/// changes:
///
/// ```toml
/// max_depth = 16
/// transitive_predicates = ["subClassOf"]
///
/// [capacity]
/// max_subjects = 65536
/// max_predicates = 256
/// max_objects = 65536
///
/// [snapshot]
/// dictionary_threshold = 0.25
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Edge budget for transitive queries that do not pass their own.
    pub max_depth: usize,
    /// Predicates interned and declared transitive at creation.
    pub transitive_predicates: Vec<String>,
    /// Identifier bounds, fixed for the engine's lifetime.
    pub capacity: Capacity,
    /// Snapshot encoding knobs.
    pub snapshot: SnapshotConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            transitive_predicates: Vec::new(),
            capacity: Capacity::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl EngineConfig {
    /// A default configuration with the given bounds.
    pub fn with_capacity(capacity: Capacity) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Reject configurations no engine can be built from.
    pub fn validate(&self) -> EngineResult<()> {
        self.capacity
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let threshold = self.snapshot.dictionary_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::Config(format!(
                "snapshot.dictionary_threshold must be a finite non-negative number, got {threshold}"
            )));
        }
        if !(1..=22).contains(&self.snapshot.zstd_level) {
            return Err(EngineError::Config(format!(
                "snapshot.zstd_level must be within 1..=22, got {}",
                self.snapshot.zstd_level
            )));
        }
        if let Some(name) = self.transitive_predicates.iter().find(|n| n.is_empty()) {
            return Err(EngineError::Config(format!("empty transitive predicate name {name:?}")));
        }
        Ok(())
    }
}
