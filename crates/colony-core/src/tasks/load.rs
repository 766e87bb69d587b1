//! Loading and Unloading
//!
//! Rate-limited cargo transfer between a settlement and a rover parked
//! there. [`SupplyManifest`] is what a trip needs aboard before departure.

use std::collections::BTreeMap;

use crate::components::{transfer, AgentId, Inventory, Resource, SettlementId, VehicleId};
use crate::config::MissionConfig;
use crate::systems::TickContext;
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};
use crate::EPSILON;

/// Resources a rover must carry for one trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplyManifest {
    amounts: BTreeMap<Resource, f64>,
}

impl SupplyManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: Resource, amount: f64) -> Self {
        if amount > 0.0 && amount.is_finite() {
            self.amounts.insert(resource, amount);
        }
        self
    }

    /// Fuel for `distance` plus life support for `crew` over `trip_time`
    /// millisols, all scaled by the configured buffer.
    pub fn for_trip(
        distance: f64,
        crew: usize,
        trip_time: f64,
        fuel_efficiency: f64,
        config: &MissionConfig,
    ) -> Self {
        let person_time = crew as f64 * trip_time * config.supply_buffer;
        Self::new()
            .with(
                Resource::Methane,
                distance / fuel_efficiency.max(EPSILON) * config.supply_buffer,
            )
            .with(Resource::Oxygen, person_time * config.oxygen_per_person_millisol)
            .with(Resource::Water, person_time * config.water_per_person_millisol)
            .with(Resource::Food, person_time * config.food_per_person_millisol)
    }

    pub fn amount(&self, resource: Resource) -> f64 {
        self.amounts.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        self.amounts.iter().map(|(r, a)| (*r, *a))
    }

    /// Amount of `resource` still missing from `cargo`.
    pub fn outstanding(&self, cargo: &Inventory, resource: Resource) -> f64 {
        (self.amount(resource) - cargo.stored_amount(resource)).max(0.0)
    }

    pub fn is_fully_loaded(&self, cargo: &Inventory) -> bool {
        self.iter()
            .all(|(resource, _)| self.outstanding(cargo, resource) <= EPSILON)
    }

    /// Whether `stock` can cover what is missing from `cargo` and still keep
    /// `reserve` of every resource behind.
    pub fn has_enough_supplies(&self, stock: &Inventory, cargo: &Inventory, reserve: f64) -> bool {
        self.iter().all(|(resource, _)| {
            self.outstanding(cargo, resource) <= stock.stored_amount(resource) - reserve + EPSILON
        })
    }
}

#[derive(Debug)]
pub struct LoadVehicle {
    settlement: SettlementId,
    vehicle: VehicleId,
    manifest: SupplyManifest,
}

impl LoadVehicle {
    pub fn task(settlement: SettlementId, vehicle: VehicleId, manifest: SupplyManifest) -> Task {
        Task::new(
            TaskKind::LoadVehicle,
            format!("Loading {}", vehicle),
            Self {
                settlement,
                vehicle,
                manifest,
            },
        )
    }
}

impl TaskBehavior for LoadVehicle {
    fn phase(&self) -> String {
        "Loading".to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        let rate = ctx.config.tasks.load_rate;
        let Some((settlement, rover)) = ctx
            .colony
            .settlement_and_vehicle_mut(&self.settlement, &self.vehicle)
        else {
            return StepOutcome::Done(time);
        };
        if rover.parked_at.as_ref() != Some(&self.settlement) {
            return StepOutcome::Done(time);
        }

        let mut budget = rate * time;
        let mut moved = 0.0;
        for (resource, _) in self.manifest.iter() {
            if budget <= EPSILON {
                break;
            }
            let wanted = self.manifest.outstanding(&rover.inventory, resource).min(budget);
            if wanted <= EPSILON {
                continue;
            }
            let loaded = transfer(&mut settlement.inventory, &mut rover.inventory, resource, wanted);
            budget -= loaded;
            moved += loaded;
        }

        if self.manifest.is_fully_loaded(&rover.inventory) {
            return StepOutcome::Done((time - moved / rate).max(0.0));
        }
        if moved <= EPSILON {
            tracing::debug!(agent = %agent, vehicle = %self.vehicle, "settlement out of supplies");
            return StepOutcome::Done(time);
        }
        StepOutcome::Continue(0.0)
    }
}

#[derive(Debug)]
pub struct UnloadVehicle {
    settlement: SettlementId,
    vehicle: VehicleId,
}

impl UnloadVehicle {
    pub fn task(settlement: SettlementId, vehicle: VehicleId) -> Task {
        Task::new(
            TaskKind::UnloadVehicle,
            format!("Unloading {}", vehicle),
            Self { settlement, vehicle },
        )
    }
}

impl TaskBehavior for UnloadVehicle {
    fn phase(&self) -> String {
        "Unloading".to_string()
    }

    fn perform(&mut self, _agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        let rate = ctx.config.tasks.unload_rate;
        let Some((settlement, rover)) = ctx
            .colony
            .settlement_and_vehicle_mut(&self.settlement, &self.vehicle)
        else {
            return StepOutcome::Done(time);
        };

        let mut budget = rate * time;
        let mut moved = 0.0;
        for resource in rover.inventory.stored_resources() {
            if budget <= EPSILON {
                break;
            }
            let stored = rover.inventory.stored_amount(resource);
            let unloaded = transfer(&mut rover.inventory, &mut settlement.inventory, resource, stored.min(budget));
            budget -= unloaded;
            moved += unloaded;
        }

        if rover.inventory.is_empty() {
            return StepOutcome::Done((time - moved / rate).max(0.0));
        }
        if moved <= EPSILON {
            // settlement storage is full
            return StepOutcome::Done(time);
        }
        StepOutcome::Continue(0.0)
    }
}
