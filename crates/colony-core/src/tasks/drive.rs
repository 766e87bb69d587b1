//! Drive Vehicle
//!
//! One driving shift toward a destination. The driver seat is exclusive;
//! speed drops with terrain difficulty and rough ground raises the accident
//! chance.

use crate::components::{AgentId, Colony, Coordinates, SkillType, VehicleId, VehicleStatus};
use crate::systems::TickContext;
use crate::tasks::{check_for_accident, HazardousWork, StepOutcome, Task, TaskBehavior, TaskKind};
use crate::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrivePhase {
    Mobilize,
    Driving,
}

#[derive(Debug)]
pub struct DriveVehicle {
    vehicle: VehicleId,
    destination: Coordinates,
    phase: DrivePhase,
    seated: bool,
}

impl DriveVehicle {
    pub fn task(colony: &Colony, vehicle: VehicleId, destination: Coordinates, shift: f64) -> Task {
        let name = colony
            .vehicles
            .get(&vehicle)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| vehicle.0.clone());
        Task::new(
            TaskKind::DriveVehicle,
            format!("Driving {} to {}", name, destination),
            Self {
                vehicle,
                destination,
                phase: DrivePhase::Mobilize,
                seated: false,
            },
        )
        .with_duration(shift)
    }

    fn drive(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        let Some(rover) = ctx.colony.vehicles.get(&self.vehicle) else {
            return StepOutcome::Done(time);
        };
        if rover.malfunctions.has_malfunction() {
            tracing::debug!(agent = %agent, vehicle = %self.vehicle, "vehicle malfunction, stopping");
            return StepOutcome::Done(time);
        }
        let position = rover.coordinates;
        let heading = position.heading_to(&self.destination);
        let terrain = ctx.colony.environment.terrain_difficulty(&position, heading);
        let speed = rover.spec.base_speed / terrain.max(1.0);

        let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) else {
            return StepOutcome::Done(time);
        };
        let planned = speed * time;
        let covered = rover.drive_toward(self.destination, planned);
        let used = (covered / speed).min(time);
        let arrived = rover.coordinates.distance_to(&self.destination) <= EPSILON;
        if let Some(person) = ctx.person_mut(agent) {
            person.skills.add_experience(SkillType::Driving, used / 10.0);
        }

        // the shift goes on; a damaged rover stops it on the next step
        let entity = self.vehicle.0.clone();
        let work = HazardousWork {
            skill: SkillType::Driving,
            phase_weight: ctx.config.accidents.drive_phase_weight,
            environment_weight: terrain,
            entity: &entity,
            activity: "driving",
        };
        if check_for_accident(agent, ctx, &work, used) {
            if let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) {
                rover.malfunctions.trigger_accident("driving");
            }
        }

        if arrived {
            tracing::debug!(agent = %agent, vehicle = %self.vehicle, "arrived");
            return StepOutcome::Done(time - used);
        }
        if covered < planned - EPSILON {
            tracing::warn!(agent = %agent, vehicle = %self.vehicle, "out of fuel");
            return StepOutcome::Done(time - used);
        }
        StepOutcome::Continue(0.0)
    }
}

impl TaskBehavior for DriveVehicle {
    fn phase(&self) -> String {
        match self.phase {
            DrivePhase::Mobilize => "Mobilizing vehicle",
            DrivePhase::Driving => "Driving",
        }
        .to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.phase {
            DrivePhase::Mobilize => {
                let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) else {
                    return StepOutcome::Done(time);
                };
                if !rover.take_driver_seat(agent) {
                    return StepOutcome::Done(time);
                }
                self.seated = true;
                self.phase = DrivePhase::Driving;
                StepOutcome::Continue(time)
            }
            DrivePhase::Driving => self.drive(agent, ctx, time),
        }
    }

    fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if !self.seated {
            return;
        }
        if let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) {
            rover.leave_driver_seat(agent);
            rover.status = VehicleStatus::Parked;
        }
        self.seated = false;
    }
}
