//! Level gate deciding whether an emission proceeds at all

use super::log_level::LogLevel;
use std::collections::HashMap;

/// Combined enabled flag, minimum threshold and per-level overrides
///
/// A level passes iff the gate is enabled and either an explicit
/// override exists for it (and is `true`) or, without an override,
/// the level is at or above the threshold.
#[derive(Debug, Clone)]
pub struct LevelGate {
    enabled: bool,
    min_level: LogLevel,
    overrides: HashMap<LogLevel, bool>,
}

impl LevelGate {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            enabled: true,
            min_level,
            overrides: HashMap::new(),
        }
    }

    #[inline]
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        if !self.enabled {
            return false;
        }
        match self.overrides.get(&level) {
            Some(&explicit) => explicit,
            None => level >= self.min_level,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Replace the threshold; individual overrides are cleared
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
        self.overrides.clear();
    }

    pub fn enable_individual_level(&mut self, level: LogLevel) {
        self.overrides.insert(level, true);
    }

    pub fn disable_individual_level(&mut self, level: LogLevel) {
        self.overrides.insert(level, false);
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(LogLevel::Trace)
    }
}
