//! Malfunctions
//!
//! Per-entity damage and wear bookkeeping. Accidents add malfunctions,
//! repair work removes them, and maintenance resets wear.

use serde::{Deserialize, Serialize};

use crate::EPSILON;

/// Time since last maintenance at which wear condition reaches 0.
pub const WEAR_LIFETIME: f64 = 10_000.0;

/// Repair effort needed to fix an accident's damage.
const ACCIDENT_REPAIR_WORK: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Malfunction {
    pub name: String,
    /// 1 to 100
    pub severity: u32,
    pub repair_work_required: f64,
    pub repair_work_completed: f64,
    pub affects_life_support: bool,
}

impl Malfunction {
    pub fn new(name: impl Into<String>, severity: u32, repair_work_required: f64) -> Self {
        Self {
            name: name.into(),
            severity: severity.clamp(1, 100),
            repair_work_required,
            repair_work_completed: 0.0,
            affects_life_support: false,
        }
    }

    pub fn affecting_life_support(mut self) -> Self {
        self.affects_life_support = true;
        self
    }

    pub fn remaining_work(&self) -> f64 {
        (self.repair_work_required - self.repair_work_completed).max(0.0)
    }

    pub fn is_fixed(&self) -> bool {
        self.remaining_work() < EPSILON
    }
}

#[derive(Debug, Clone)]
pub struct MalfunctionManager {
    malfunctions: Vec<Malfunction>,
    time_since_last_maintenance: f64,
    maintenance_work_required: f64,
    maintenance_work_completed: f64,
    accident_count: u32,
}

impl MalfunctionManager {
    pub fn new(maintenance_work_required: f64) -> Self {
        Self {
            malfunctions: Vec::new(),
            time_since_last_maintenance: 0.0,
            maintenance_work_required: maintenance_work_required.max(EPSILON),
            maintenance_work_completed: 0.0,
            accident_count: 0,
        }
    }

    pub fn has_malfunction(&self) -> bool {
        !self.malfunctions.is_empty()
    }

    pub fn has_life_support_fault(&self) -> bool {
        self.malfunctions.iter().any(|m| m.affects_life_support)
    }

    pub fn malfunctions(&self) -> &[Malfunction] {
        &self.malfunctions
    }

    pub fn add_malfunction(&mut self, malfunction: Malfunction) {
        self.malfunctions.push(malfunction);
    }

    /// Records accident damage caused while doing `activity`.
    pub fn trigger_accident(&mut self, activity: &str) {
        self.accident_count += 1;
        self.malfunctions.push(Malfunction::new(
            format!("Accident while {}", activity),
            20,
            ACCIDENT_REPAIR_WORK,
        ));
    }

    pub fn accident_count(&self) -> u32 {
        self.accident_count
    }

    pub fn time_passing(&mut self, time: f64) {
        if time.is_finite() && time > 0.0 {
            self.time_since_last_maintenance += time;
        }
    }

    pub fn time_since_last_maintenance(&self) -> f64 {
        self.time_since_last_maintenance
    }

    /// Test and setup hook for aging an entity.
    pub fn set_time_since_last_maintenance(&mut self, time: f64) {
        self.time_since_last_maintenance = time.max(0.0);
    }

    pub fn maintenance_work_remaining(&self) -> f64 {
        (self.maintenance_work_required - self.maintenance_work_completed).max(0.0)
    }

    /// Adds maintenance effort. Returns true when a full maintenance was
    /// completed, which resets wear.
    pub fn add_maintenance_work(&mut self, time: f64) -> bool {
        if !time.is_finite() || time <= 0.0 {
            return false;
        }
        self.maintenance_work_completed += time;
        if self.maintenance_work_completed >= self.maintenance_work_required - EPSILON {
            self.maintenance_work_completed = 0.0;
            self.time_since_last_maintenance = 0.0;
            true
        } else {
            false
        }
    }

    /// Applies repair effort to the oldest malfunction first. Fixed
    /// malfunctions are removed. Returns the effort left unused.
    pub fn add_repair_work(&mut self, time: f64) -> f64 {
        if !time.is_finite() || time <= 0.0 {
            return 0.0;
        }
        let mut left = time;
        while left > EPSILON {
            let Some(current) = self.malfunctions.first_mut() else {
                break;
            };
            let used = left.min(current.remaining_work());
            current.repair_work_completed += used;
            left -= used;
            if current.is_fixed() {
                let fixed = self.malfunctions.remove(0);
                tracing::debug!(malfunction = %fixed.name, "malfunction repaired");
            }
        }
        left.max(0.0)
    }

    /// Wear condition from 100 (fresh) down to 0 (worn out).
    pub fn wear_condition(&self) -> f64 {
        (100.0 * (1.0 - self.time_since_last_maintenance / WEAR_LIFETIME)).clamp(0.0, 100.0)
    }

    /// Environment weight for accident checks: 1.0 when fresh, up to 2.0
    /// when worn out.
    pub fn wear_accident_modifier(&self) -> f64 {
        1.0 + (100.0 - self.wear_condition()) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_resets_wear() {
        let mut manager = MalfunctionManager::new(50.0);
        manager.time_passing(5000.0);
        assert_eq!(manager.wear_condition(), 50.0);
        assert!((manager.wear_accident_modifier() - 1.5).abs() < 1e-9);

        assert!(!manager.add_maintenance_work(30.0));
        assert_eq!(manager.maintenance_work_remaining(), 20.0);
        assert!(manager.add_maintenance_work(20.0));
        assert_eq!(manager.time_since_last_maintenance(), 0.0);
        assert_eq!(manager.wear_condition(), 100.0);
    }

    #[test]
    fn test_repair_work_fixes_in_order() {
        let mut manager = MalfunctionManager::new(50.0);
        manager.trigger_accident("driving");
        manager.add_malfunction(Malfunction::new("Seal leak", 40, 10.0));
        assert!(manager.has_malfunction());
        assert_eq!(manager.accident_count(), 1);

        assert_eq!(manager.add_repair_work(25.0), 0.0);
        assert_eq!(manager.malfunctions().len(), 1);
        assert_eq!(manager.malfunctions()[0].name, "Seal leak");

        let left = manager.add_repair_work(20.0);
        assert!((left - 15.0).abs() < 1e-9);
        assert!(!manager.has_malfunction());
    }

    #[test]
    fn test_life_support_fault() {
        let mut manager = MalfunctionManager::new(10.0);
        manager.add_malfunction(Malfunction::new("Regulator", 60, 5.0).affecting_life_support());
        assert!(manager.has_life_support_fault());
    }
}
