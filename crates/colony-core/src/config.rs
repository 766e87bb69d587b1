//! Configuration loading for the scheduler.
//!
//! Every tuning constant (weights, durations, rates, thresholds) lives in a
//! TOML file. Missing sections and fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Complete scheduler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Tick length, seed and run length
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Task weights, durations and rates
    #[serde(default)]
    pub tasks: TaskConfig,
    /// Accident base rates and phase weights
    #[serde(default)]
    pub accidents: AccidentConfig,
    /// EVA thresholds and airlock timing
    #[serde(default)]
    pub eva: EvaConfig,
    /// Mission weights, site goals and supply margins
    #[serde(default)]
    pub missions: MissionConfig,
}

impl SchedulerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string and validates it.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values that would stall or destabilize the scheduler.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("simulation.tick_millisols", self.simulation.tick_millisols)?;
        positive("tasks.load_rate", self.tasks.load_rate)?;
        positive("tasks.unload_rate", self.tasks.unload_rate)?;
        positive("eva.airlock_cycle_time", self.eva.airlock_cycle_time)?;
        positive("missions.collection_rate", self.missions.collection_rate)?;
        positive("missions.site_goal", self.missions.site_goal)?;
        if self.missions.collection_sites == 0 {
            return Err(ConfigError::Invalid {
                field: "missions.collection_sites",
                reason: "at least one site is required".into(),
            });
        }
        if self.missions.min_members == 0 {
            return Err(ConfigError::Invalid {
                field: "missions.min_members",
                reason: "a mission needs at least one member".into(),
            });
        }
        let fractions = [
            ("eva.min_oxygen_fraction", self.eva.min_oxygen_fraction),
            ("eva.min_water_fraction", self.eva.min_water_fraction),
            ("eva.min_performance", self.eva.min_performance),
            ("missions.min_performance", self.missions.min_performance),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is not within 0..=1", value),
                });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} must be a positive number", value),
        })
    }
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Millisols advanced per tick
    pub tick_millisols: f64,
    /// Seed for the shared random source
    pub seed: u64,
    /// Ticks to run in the headless runner
    pub ticks: u64,
    /// Ticks between snapshots (0 disables them)
    pub snapshot_interval: u64,
    /// Colonists created per settlement by the default setup
    pub colonists_per_settlement: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_millisols: 10.0,
            seed: 42,
            ticks: 2000,
            snapshot_interval: 200,
            colonists_per_settlement: 6,
        }
    }
}

/// Task selection weights, durations and rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Fatigue above which sleeping is considered
    pub sleep_fatigue_threshold: f64,
    /// Sleep weight once tired
    pub sleep_weight: f64,
    /// Extra sleep weight when there is no sunlight
    pub sleep_night_bonus: f64,
    pub sleep_duration: f64,
    /// Fatigue removed per millisol of sleep
    pub sleep_recovery_rate: f64,
    /// Hunger above which eating is considered
    pub hunger_threshold: f64,
    /// Eat weight per point of hunger over the threshold
    pub eat_weight_per_hunger: f64,
    pub eat_max_weight: f64,
    pub eat_duration: f64,
    /// Food eaten per millisol of a meal (kg)
    pub food_per_millisol: f64,
    /// Hunger removed per millisol of a full meal
    pub hunger_recovery_rate: f64,
    pub relax_weight: f64,
    pub relax_duration: f64,
    pub research_weight: f64,
    pub research_duration: f64,
    pub treatment_weight: f64,
    /// Recovery progress per millisol on a medical aid
    pub treatment_healing_rate: f64,
    pub maintenance_weight: f64,
    /// Time since last maintenance before a vehicle is due
    pub maintenance_interval: f64,
    pub repair_weight: f64,
    /// Resources moved per millisol while loading (kg)
    pub load_rate: f64,
    /// Resources moved per millisol while unloading (kg)
    pub unload_rate: f64,
    /// Longest single driving shift
    pub drive_shift_duration: f64,
    /// Chance per colonist per millisol of falling ill
    pub illness_chance: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            sleep_fatigue_threshold: 750.0,
            sleep_weight: 25.0,
            sleep_night_bonus: 50.0,
            sleep_duration: 250.0,
            sleep_recovery_rate: 5.0,
            hunger_threshold: 250.0,
            eat_weight_per_hunger: 0.1,
            eat_max_weight: 100.0,
            eat_duration: 20.0,
            food_per_millisol: 0.03,
            hunger_recovery_rate: 40.0,
            relax_weight: 5.0,
            relax_duration: 100.0,
            research_weight: 15.0,
            research_duration: 150.0,
            treatment_weight: 100.0,
            treatment_healing_rate: 1.0,
            maintenance_weight: 20.0,
            maintenance_interval: 1000.0,
            repair_weight: 50.0,
            load_rate: 10.0,
            unload_rate: 10.0,
            drive_shift_duration: 100.0,
            illness_chance: 0.0002,
        }
    }
}

/// Accident rates. The skill modifier is fixed; these scale it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentConfig {
    /// Base chance per millisol before modifiers
    pub base_chance: f64,
    pub eva_phase_weight: f64,
    pub drive_phase_weight: f64,
    pub maintenance_phase_weight: f64,
    pub repair_phase_weight: f64,
}

impl Default for AccidentConfig {
    fn default() -> Self {
        Self {
            base_chance: 0.001,
            eva_phase_weight: 1.0,
            drive_phase_weight: 1.0,
            maintenance_phase_weight: 1.0,
            repair_phase_weight: 1.5,
        }
    }
}

/// EVA safety thresholds and airlock timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaConfig {
    /// Suit oxygen fraction at or below which the EVA ends
    pub min_oxygen_fraction: f64,
    /// Suit water fraction at or below which the EVA ends
    pub min_water_fraction: f64,
    /// Performance below which the EVA ends
    pub min_performance: f64,
    /// Millisols to cycle the airlock chamber once
    pub airlock_cycle_time: f64,
    /// Oxygen used per millisol outside (kg)
    pub oxygen_per_millisol: f64,
    /// Water used per millisol outside (kg)
    pub water_per_millisol: f64,
}

impl Default for EvaConfig {
    fn default() -> Self {
        Self {
            min_oxygen_fraction: 0.15,
            min_water_fraction: 0.15,
            min_performance: 0.5,
            airlock_cycle_time: 5.0,
            oxygen_per_millisol: 0.001,
            water_per_millisol: 0.004,
        }
    }
}

/// Mission weights, site goals and supply margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Performance below which no mission is started or joined
    pub min_performance: f64,
    pub collect_ice_weight: f64,
    pub collect_regolith_weight: f64,
    pub travel_weight: f64,
    /// Weight of joining an open mission
    pub join_weight: f64,
    pub min_members: usize,
    /// Resource to collect at each site (kg)
    pub site_goal: f64,
    /// Collection rate per colonist (kg per millisol)
    pub collection_rate: f64,
    pub collection_sites: usize,
    /// Distance from home to the first site and between sites (km)
    pub site_distance: f64,
    /// Longest time spent at one site
    pub site_time_limit: f64,
    /// Time an embarking mission waits for enough members
    pub recruitment_time: f64,
    /// Amount the home settlement must keep after loading (kg per resource)
    pub settlement_reserve: f64,
    pub oxygen_per_person_millisol: f64,
    pub water_per_person_millisol: f64,
    pub food_per_person_millisol: f64,
    /// Multiplier on fuel and consumables for the planned trip
    pub supply_buffer: f64,
    /// Medical seriousness that forces the rover home
    pub emergency_seriousness: u32,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            min_performance: 0.5,
            collect_ice_weight: 6.0,
            collect_regolith_weight: 3.0,
            travel_weight: 1.0,
            join_weight: 30.0,
            min_members: 2,
            site_goal: 100.0,
            collection_rate: 1.0,
            collection_sites: 2,
            site_distance: 20.0,
            site_time_limit: 200.0,
            recruitment_time: 300.0,
            settlement_reserve: 50.0,
            oxygen_per_person_millisol: 0.001,
            water_per_person_millisol: 0.004,
            food_per_person_millisol: 0.0006,
            supply_buffer: 1.5,
            emergency_seriousness: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();

        assert_eq!(config.tasks.sleep_fatigue_threshold, 750.0);
        assert_eq!(config.accidents.base_chance, 0.001);
        assert_eq!(config.eva.min_oxygen_fraction, 0.15);
        assert_eq!(config.missions.emergency_seriousness, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [tasks]
            sleep_weight = 30.0

            [missions]
            collection_sites = 3
        "#;

        let config = SchedulerConfig::from_str(toml).unwrap();

        // Specified values
        assert_eq!(config.tasks.sleep_weight, 30.0);
        assert_eq!(config.missions.collection_sites, 3);
        // Default values
        assert_eq!(config.tasks.sleep_night_bonus, 50.0);
        assert_eq!(config.simulation.tick_millisols, 10.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SchedulerConfig::from_str("[simulation]\ntick_millisols = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "simulation.tick_millisols",
                ..
            }
        ));

        let err = SchedulerConfig::from_str("[eva]\nmin_performance = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SchedulerConfig::from_str("[tasks\nsleep_weight = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_to_toml_roundtrips_through_file() {
        let config = SchedulerConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[simulation]"));
        assert!(text.contains("[missions]"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let loaded = SchedulerConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.tasks.load_rate, config.tasks.load_rate);
        assert_eq!(loaded.missions.site_goal, config.missions.site_goal);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SchedulerConfig::from_file(Path::new("/nonexistent/colony.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
