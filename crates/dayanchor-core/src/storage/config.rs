//! TOML-based engine configuration.
//!
//! Holds every tunable constant of the pipeline:
//! - Canonical zone levels, zone thresholds and time-of-day defaults
//! - Gap detection minimum and the nightly rest window
//! - Scoring weights and the confidence floor
//!
//! Configuration is stored at `~/.config/dayanchor/config.toml` and passed
//! into the engine as an explicit value.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::energy::{EnergyZone, MAX_ENERGY_LEVEL};
use crate::error::ConfigError;
use crate::timeline::{RestWindow, MINUTES_PER_DAY};

/// Energy levels and zone thresholds used by the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(default = "default_peak_level")]
    pub peak_level: u8,
    #[serde(default = "default_maintenance_level")]
    pub maintenance_level: u8,
    #[serde(default = "default_recovery_level")]
    pub recovery_level: u8,
    /// Levels at or above this are Peak.
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: u8,
    /// Levels at or above this (and below `peak_threshold`) are Maintenance.
    #[serde(default = "default_maintenance_threshold")]
    pub maintenance_threshold: u8,
    #[serde(default = "default_early_morning_level")]
    pub early_morning_level: u8,
    #[serde(default = "default_late_night_level")]
    pub late_night_level: u8,
    #[serde(default = "default_daytime_level")]
    pub daytime_level: u8,
    /// Hours before this use `early_morning_level`.
    #[serde(default = "default_early_morning_end_hour")]
    pub early_morning_end_hour: u8,
    /// Hours from this on use `late_night_level`.
    #[serde(default = "default_late_night_start_hour")]
    pub late_night_start_hour: u8,
    #[serde(default = "default_wake_anchor_level")]
    pub wake_anchor_level: u8,
    #[serde(default = "default_sleep_anchor_level")]
    pub sleep_anchor_level: u8,
}

/// Gap detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapConfig {
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: u16,
    #[serde(default)]
    pub rest_window: RestWindow,
}

/// Weights and floors for task-to-gap scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_duration_weight")]
    pub duration_weight: f64,
    #[serde(default = "default_zone_weight")]
    pub zone_weight: f64,
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f64,
    /// Composite scores below this fall back to the original start.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Energy distance at which zone credit reaches zero.
    #[serde(default = "default_zone_distance_falloff")]
    pub zone_distance_falloff: f64,
    /// Priority that earns full priority alignment.
    #[serde(default = "default_priority_scale")]
    pub priority_scale: f64,
    /// Allow starting later in a gap when that improves the zone match.
    #[serde(default = "default_true")]
    pub energy_aligned_placement: bool,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/dayanchor/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default)]
    pub gaps: GapConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

// Default functions
fn default_peak_level() -> u8 {
    85
}
fn default_maintenance_level() -> u8 {
    60
}
fn default_recovery_level() -> u8 {
    35
}
fn default_peak_threshold() -> u8 {
    75
}
fn default_maintenance_threshold() -> u8 {
    50
}
fn default_early_morning_level() -> u8 {
    30
}
fn default_late_night_level() -> u8 {
    25
}
fn default_daytime_level() -> u8 {
    40
}
fn default_early_morning_end_hour() -> u8 {
    6
}
fn default_late_night_start_hour() -> u8 {
    22
}
fn default_wake_anchor_level() -> u8 {
    35
}
fn default_sleep_anchor_level() -> u8 {
    25
}
fn default_min_gap_minutes() -> u16 {
    15
}
fn default_duration_weight() -> f64 {
    0.3
}
fn default_zone_weight() -> f64 {
    0.5
}
fn default_priority_weight() -> f64 {
    0.2
}
fn default_confidence_floor() -> f64 {
    0.3
}
fn default_zone_distance_falloff() -> f64 {
    50.0
}
fn default_priority_scale() -> f64 {
    10.0
}
fn default_true() -> bool {
    true
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            peak_level: default_peak_level(),
            maintenance_level: default_maintenance_level(),
            recovery_level: default_recovery_level(),
            peak_threshold: default_peak_threshold(),
            maintenance_threshold: default_maintenance_threshold(),
            early_morning_level: default_early_morning_level(),
            late_night_level: default_late_night_level(),
            daytime_level: default_daytime_level(),
            early_morning_end_hour: default_early_morning_end_hour(),
            late_night_start_hour: default_late_night_start_hour(),
            wake_anchor_level: default_wake_anchor_level(),
            sleep_anchor_level: default_sleep_anchor_level(),
        }
    }
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            min_gap_minutes: default_min_gap_minutes(),
            rest_window: RestWindow::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            duration_weight: default_duration_weight(),
            zone_weight: default_zone_weight(),
            priority_weight: default_priority_weight(),
            confidence_floor: default_confidence_floor(),
            zone_distance_falloff: default_zone_distance_falloff(),
            priority_scale: default_priority_scale(),
            energy_aligned_placement: true,
        }
    }
}

impl EnergyConfig {
    /// Zone for an energy level, from the thresholds alone.
    pub fn zone_for(&self, level: u8) -> EnergyZone {
        if level >= self.peak_threshold {
            EnergyZone::Peak
        } else if level >= self.maintenance_threshold {
            EnergyZone::Maintenance
        } else {
            EnergyZone::Recovery
        }
    }

    /// Canonical level a window of `zone` is tagged with.
    pub fn canonical_level(&self, zone: EnergyZone) -> u8 {
        match zone {
            EnergyZone::Peak => self.peak_level,
            EnergyZone::Maintenance => self.maintenance_level,
            EnergyZone::Recovery => self.recovery_level,
        }
    }

    /// Half-open level band `[low, high)` that counts as `zone`.
    ///
    /// Peak's upper bound sits one past the top level so that 100 is inside.
    pub fn zone_band(&self, zone: EnergyZone) -> (f64, f64) {
        match zone {
            EnergyZone::Peak => (self.peak_threshold as f64, MAX_ENERGY_LEVEL as f64 + 1.0),
            EnergyZone::Maintenance => (
                self.maintenance_threshold as f64,
                self.peak_threshold as f64,
            ),
            EnergyZone::Recovery => (0.0, self.maintenance_threshold as f64),
        }
    }

    /// Fallback level when no window informs a minute.
    pub fn time_of_day_level(&self, minute: u16) -> u8 {
        let hour = minute / 60;
        if hour < self.early_morning_end_hour as u16 {
            self.early_morning_level
        } else if hour >= self.late_night_start_hour as u16 {
            self.late_night_level
        } else {
            self.daytime_level
        }
    }
}

impl GapConfig {
    pub fn rest_window(&self) -> RestWindow {
        self.rest_window
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl EngineConfig {
    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.energy;
        let levels = [
            ("energy.peak_level", e.peak_level),
            ("energy.maintenance_level", e.maintenance_level),
            ("energy.recovery_level", e.recovery_level),
            ("energy.peak_threshold", e.peak_threshold),
            ("energy.maintenance_threshold", e.maintenance_threshold),
            ("energy.early_morning_level", e.early_morning_level),
            ("energy.late_night_level", e.late_night_level),
            ("energy.daytime_level", e.daytime_level),
            ("energy.wake_anchor_level", e.wake_anchor_level),
            ("energy.sleep_anchor_level", e.sleep_anchor_level),
        ];
        for (key, level) in levels {
            if level > MAX_ENERGY_LEVEL {
                return Err(invalid(key, format!("{level} exceeds {MAX_ENERGY_LEVEL}")));
            }
        }
        if e.maintenance_threshold == 0 || e.maintenance_threshold >= e.peak_threshold {
            return Err(invalid(
                "energy.maintenance_threshold",
                "must be positive and below energy.peak_threshold",
            ));
        }
        for zone in [EnergyZone::Peak, EnergyZone::Maintenance, EnergyZone::Recovery] {
            if e.zone_for(e.canonical_level(zone)) != zone {
                return Err(invalid(
                    &format!("energy.{}_level", zone.key()),
                    "canonical level falls outside its own zone",
                ));
            }
        }
        if e.early_morning_end_hour > e.late_night_start_hour || e.late_night_start_hour > 24 {
            return Err(invalid(
                "energy.late_night_start_hour",
                "hours must satisfy early_morning_end_hour <= late_night_start_hour <= 24",
            ));
        }

        if self.gaps.min_gap_minutes == 0 || self.gaps.min_gap_minutes > MINUTES_PER_DAY {
            return Err(invalid("gaps.min_gap_minutes", "must be within 1..=1440"));
        }

        let s = &self.scoring;
        let weights = [
            ("scoring.duration_weight", s.duration_weight),
            ("scoring.zone_weight", s.zone_weight),
            ("scoring.priority_weight", s.priority_weight),
        ];
        for (key, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(key, "must be a non-negative number"));
            }
        }
        if s.duration_weight + s.zone_weight + s.priority_weight <= 0.0 {
            return Err(invalid("scoring", "weights must not all be zero"));
        }
        if !(0.0..=1.0).contains(&s.confidence_floor) {
            return Err(invalid("scoring.confidence_floor", "must be within 0..=1"));
        }
        if !(s.zone_distance_falloff > 0.0) {
            return Err(invalid("scoring.zone_distance_falloff", "must be positive"));
        }
        if !(s.priority_scale > 0.0) {
            return Err(invalid("scoring.priority_scale", "must be positive"));
        }
        Ok(())
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(key, format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(key, format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// validated, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: EngineConfig = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is inconsistent. `self` is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig =
            serde_json::from_value(json).map_err(|e| invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(toml_str.contains("rest_window = \"22:00-06:00\""));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn config_default_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.energy.peak_level, 85);
        assert_eq!(cfg.energy.maintenance_level, 60);
        assert_eq!(cfg.energy.recovery_level, 35);
        assert_eq!(cfg.energy.peak_threshold, 75);
        assert_eq!(cfg.energy.maintenance_threshold, 50);
        assert_eq!(cfg.gaps.min_gap_minutes, 15);
        assert_eq!(cfg.scoring.confidence_floor, 0.3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: EngineConfig = toml::from_str("[scoring]\nconfidence_floor = 0.5\n").unwrap();
        assert_eq!(cfg.scoring.confidence_floor, 0.5);
        assert_eq!(cfg.scoring.zone_weight, 0.5);
        assert_eq!(cfg.energy.peak_level, 85);
    }

    #[test]
    fn zone_for_thresholds() {
        let e = EnergyConfig::default();
        assert_eq!(e.zone_for(100), EnergyZone::Peak);
        assert_eq!(e.zone_for(75), EnergyZone::Peak);
        assert_eq!(e.zone_for(74), EnergyZone::Maintenance);
        assert_eq!(e.zone_for(50), EnergyZone::Maintenance);
        assert_eq!(e.zone_for(49), EnergyZone::Recovery);
        assert_eq!(e.zone_for(0), EnergyZone::Recovery);
    }

    #[test]
    fn time_of_day_levels() {
        let e = EnergyConfig::default();
        assert_eq!(e.time_of_day_level(0), 30);
        assert_eq!(e.time_of_day_level(359), 30);
        assert_eq!(e.time_of_day_level(360), 40);
        assert_eq!(e.time_of_day_level(1319), 40);
        assert_eq!(e.time_of_day_level(1320), 25);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.get("energy.peak_level").as_deref(), Some("85"));
        assert_eq!(cfg.get("gaps.rest_window").as_deref(), Some("22:00-06:00"));
        assert_eq!(cfg.get("scoring.energy_aligned_placement").as_deref(), Some("true"));
        assert!(cfg.get("energy.missing").is_none());
        assert!(cfg.get("energy").is_none());
    }

    #[test]
    fn set_updates_values() {
        let mut cfg = EngineConfig::default();
        cfg.set("scoring.confidence_floor", "0.4").unwrap();
        cfg.set("gaps.min_gap_minutes", "20").unwrap();
        cfg.set("gaps.rest_window", "23:00-07:00").unwrap();
        cfg.set("scoring.energy_aligned_placement", "false").unwrap();
        assert_eq!(cfg.scoring.confidence_floor, 0.4);
        assert_eq!(cfg.gaps.min_gap_minutes, 20);
        assert_eq!(cfg.gaps.rest_window.start_minute, 23 * 60);
        assert!(!cfg.scoring.energy_aligned_placement);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = EngineConfig::default();
        assert!(matches!(
            cfg.set("energy.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.set("scoring.energy_aligned_placement", "maybe").is_err());
        assert!(cfg.set("energy.peak_level", "high").is_err());
        assert!(cfg.set("gaps.rest_window", "late").is_err());
    }

    #[test]
    fn set_rejects_inconsistent_config_and_keeps_old_value() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.set("energy.peak_level", "70").is_err());
        assert!(cfg.set("scoring.confidence_floor", "1.5").is_err());
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn validate_rejects_swapped_thresholds() {
        let mut cfg = EngineConfig::default();
        cfg.energy.maintenance_threshold = 80;
        assert!(cfg.validate().is_err());
    }
}
