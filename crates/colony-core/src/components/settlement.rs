//! Settlements
//!
//! Habitats with a shared store, an airlock, a garage, laboratories and
//! medical aids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::components::{
    AgentId, Airlock, Coordinates, ExclusiveClaim, Inventory, MalfunctionManager, SlotCounter,
    VehicleId,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementId(pub String);

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vehicle bays. A vehicle occupies one bay while admitted.
#[derive(Debug, Clone)]
pub struct Garage {
    bays: SlotCounter,
    vehicles: BTreeSet<VehicleId>,
}

impl Garage {
    pub fn new(bays: u32) -> Self {
        Self {
            bays: SlotCounter::new(bays),
            vehicles: BTreeSet::new(),
        }
    }

    pub fn contains(&self, vehicle: &VehicleId) -> bool {
        self.vehicles.contains(vehicle)
    }

    /// Admits a vehicle not already inside. False when full or present.
    pub fn try_admit(&mut self, vehicle: &VehicleId) -> bool {
        if self.vehicles.contains(vehicle) || !self.bays.try_enter() {
            return false;
        }
        self.vehicles.insert(vehicle.clone());
        true
    }

    pub fn release(&mut self, vehicle: &VehicleId) -> bool {
        if self.vehicles.remove(vehicle) {
            self.bays.leave();
            true
        } else {
            false
        }
    }

    pub fn occupied(&self) -> u32 {
        self.bays.occupied()
    }

    pub fn capacity(&self) -> u32 {
        self.bays.capacity()
    }
}

#[derive(Debug, Clone)]
pub struct Laboratory {
    pub name: String,
    researchers: SlotCounter,
    pub science_points: f64,
}

impl Laboratory {
    pub fn new(name: impl Into<String>, researcher_slots: u32) -> Self {
        Self {
            name: name.into(),
            researchers: SlotCounter::new(researcher_slots),
            science_points: 0.0,
        }
    }

    pub fn try_enter(&mut self) -> bool {
        self.researchers.try_enter()
    }

    pub fn leave(&mut self) -> bool {
        self.researchers.leave()
    }

    pub fn has_free_slot(&self) -> bool {
        !self.researchers.is_full()
    }

    pub fn researcher_count(&self) -> u32 {
        self.researchers.occupied()
    }
}

/// A sick bay bed. One patient at a time.
#[derive(Debug, Clone)]
pub struct MedicalAid {
    pub name: String,
    patient: ExclusiveClaim<AgentId>,
}

impl MedicalAid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patient: ExclusiveClaim::new(),
        }
    }

    pub fn try_admit(&mut self, agent: &AgentId) -> bool {
        self.patient.try_acquire(agent)
    }

    pub fn discharge(&mut self, agent: &AgentId) -> bool {
        self.patient.release(agent)
    }

    pub fn is_in_use(&self) -> bool {
        self.patient.is_held()
    }

    pub fn patient(&self) -> Option<&AgentId> {
        self.patient.holder()
    }
}

#[derive(Debug, Clone)]
pub struct Settlement {
    pub id: SettlementId,
    pub name: String,
    /// Numeric prefix of mission designations started here
    pub index: u32,
    pub coordinates: Coordinates,
    pub inventory: Inventory,
    pub airlock: Airlock,
    pub garage: Garage,
    pub laboratories: Vec<Laboratory>,
    pub medical_aids: Vec<MedicalAid>,
    pub malfunctions: MalfunctionManager,
}

impl Settlement {
    pub fn new(
        id: SettlementId,
        name: impl Into<String>,
        index: u32,
        coordinates: Coordinates,
        airlock: Airlock,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            index,
            coordinates,
            inventory: Inventory::new(),
            airlock,
            garage: Garage::new(0),
            laboratories: Vec::new(),
            medical_aids: Vec::new(),
            malfunctions: MalfunctionManager::new(200.0),
        }
    }

    /// Index of the first laboratory with a free researcher slot.
    pub fn free_laboratory(&self) -> Option<usize> {
        self.laboratories.iter().position(Laboratory::has_free_slot)
    }

    /// Index of the first unoccupied medical aid.
    pub fn free_medical_aid(&self) -> Option<usize> {
        self.medical_aids.iter().position(|aid| !aid.is_in_use())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garage_admission_is_balanced() {
        let mut garage = Garage::new(1);
        let a = VehicleId("rover_1".into());
        let b = VehicleId("rover_2".into());

        assert!(garage.try_admit(&a));
        assert!(!garage.try_admit(&a));
        assert!(!garage.try_admit(&b));
        assert_eq!(garage.occupied(), 1);

        assert!(!garage.release(&b));
        assert!(garage.release(&a));
        assert_eq!(garage.occupied(), 0);
        assert!(garage.try_admit(&b));
    }

    #[test]
    fn test_medical_aid_single_patient() {
        let mut aid = MedicalAid::new("Bed 1");
        let a = AgentId("a".into());
        let b = AgentId("b".into());
        assert!(aid.try_admit(&a));
        assert!(!aid.try_admit(&b));
        assert!(aid.discharge(&a));
        assert!(!aid.is_in_use());
    }

    #[test]
    fn test_free_laboratory_skips_full() {
        let mut settlement = Settlement::new(
            SettlementId("s".into()),
            "Alpha",
            0,
            Coordinates::default(),
            Airlock::new(2, 5.0),
        );
        settlement.laboratories.push(Laboratory::new("Lab A", 1));
        settlement.laboratories.push(Laboratory::new("Lab B", 1));
        assert_eq!(settlement.free_laboratory(), Some(0));
        assert!(settlement.laboratories[0].try_enter());
        assert_eq!(settlement.free_laboratory(), Some(1));
    }
}
