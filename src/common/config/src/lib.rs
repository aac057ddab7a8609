//! Configuration management for Quarry.
//!
//! Holds the process-wide options that steer materialization (engine
//! options) and the reading behaviour of the product backend (storage
//! options). Options are addressed by case-insensitive name from hosts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use common_error::{QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};

/// Global Quarry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuarryConfig {
    /// Materialization options.
    pub engine: EngineOptions,
    /// Backend read options.
    pub storage: StorageOptions,
}

/// Options consulted by the materialization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Leave hidden and unavailable record fields out of structures.
    pub filter_record_fields: bool,
    /// Present multi-dimensional arrays in column-major host order.
    pub swap_dimensions: bool,
    /// Report time values as days instead of seconds since 2000-01-01.
    pub time_unit_days: bool,
    /// Log every error handed back to the host.
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            filter_record_fields: true,
            swap_dimensions: true,
            time_unit_days: false,
            verbose: true,
        }
    }
}

/// Options forwarded to the product backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Interpret special types (time, complex, ...) instead of their base data.
    pub use_special_types: bool,
    /// Apply unit conversions defined on numeric types.
    pub perform_conversions: bool,
    /// Check array indices against the array extents.
    pub perform_boundary_checks: bool,
    /// Allow the backend to memory-map product files.
    pub use_mmap: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            use_special_types: true,
            perform_conversions: true,
            perform_boundary_checks: true,
            use_mmap: true,
        }
    }
}

/// Host-visible option names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionName {
    FilterRecordFields,
    PerformConversions,
    PerformBoundaryChecks,
    SwapDimensions,
    TimeUnitDays,
    UseSpecialTypes,
    UseMMap,
    Verbose,
}

impl OptionName {
    /// All options in their canonical spelling order.
    pub const ALL: [OptionName; 8] = [
        OptionName::FilterRecordFields,
        OptionName::PerformConversions,
        OptionName::PerformBoundaryChecks,
        OptionName::SwapDimensions,
        OptionName::TimeUnitDays,
        OptionName::UseSpecialTypes,
        OptionName::UseMMap,
        OptionName::Verbose,
    ];

    /// Canonical spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FilterRecordFields => "FilterRecordFields",
            Self::PerformConversions => "PerformConversions",
            Self::PerformBoundaryChecks => "PerformBoundaryChecks",
            Self::SwapDimensions => "SwapDimensions",
            Self::TimeUnitDays => "TimeUnitDays",
            Self::UseSpecialTypes => "UseSpecialTypes",
            Self::UseMMap => "UseMMap",
            Self::Verbose => "Verbose",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionName {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| QuarryError::UnknownOption(s.to_string()))
    }
}

impl QuarryConfig {
    /// Current value of an option.
    pub fn get(&self, name: OptionName) -> bool {
        match name {
            OptionName::FilterRecordFields => self.engine.filter_record_fields,
            OptionName::PerformConversions => self.storage.perform_conversions,
            OptionName::PerformBoundaryChecks => self.storage.perform_boundary_checks,
            OptionName::SwapDimensions => self.engine.swap_dimensions,
            OptionName::TimeUnitDays => self.engine.time_unit_days,
            OptionName::UseSpecialTypes => self.storage.use_special_types,
            OptionName::UseMMap => self.storage.use_mmap,
            OptionName::Verbose => self.engine.verbose,
        }
    }

    /// Set an option and return its previous value.
    pub fn set(&mut self, name: OptionName, value: bool) -> bool {
        let slot = match name {
            OptionName::FilterRecordFields => &mut self.engine.filter_record_fields,
            OptionName::PerformConversions => &mut self.storage.perform_conversions,
            OptionName::PerformBoundaryChecks => &mut self.storage.perform_boundary_checks,
            OptionName::SwapDimensions => &mut self.engine.swap_dimensions,
            OptionName::TimeUnitDays => &mut self.engine.time_unit_days,
            OptionName::UseSpecialTypes => &mut self.storage.use_special_types,
            OptionName::UseMMap => &mut self.storage.use_mmap,
            OptionName::Verbose => &mut self.engine.verbose,
        };
        let previous = std::mem::replace(slot, value);
        log::debug!("option {} changed from {} to {}", name, previous, value);
        previous
    }

    /// Load a configuration from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> QuarryResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_name_case_insensitive() {
        assert_eq!(
            "swapdimensions".parse::<OptionName>().unwrap(),
            OptionName::SwapDimensions
        );
        assert_eq!("USEMMAP".parse::<OptionName>().unwrap(), OptionName::UseMMap);
    }

    #[test]
    fn test_unknown_option() {
        let err = "Nonsense".parse::<OptionName>().unwrap_err();
        assert_eq!(err.code(), -910);
    }

    #[test]
    fn test_set_returns_previous() {
        let mut config = QuarryConfig::default();
        assert!(config.set(OptionName::SwapDimensions, false));
        assert!(!config.set(OptionName::SwapDimensions, true));
        assert!(config.get(OptionName::SwapDimensions));
    }
}
