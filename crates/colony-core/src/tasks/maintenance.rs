//! Maintain Vehicle
//!
//! Preventive maintenance on a parked rover. The rover is pulled into a
//! garage bay when one is free; the maintenance claim keeps missions and
//! other mechanics away while the work is in progress.

use crate::components::{AgentId, Colony, Person, Rover, SettlementId, SkillType, VehicleId};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{check_for_accident, HazardousWork, StepOutcome, Task, TaskBehavior, TaskKind};

/// Weight stops growing once a rover is this many intervals overdue.
const MAX_OVERDUE_FACTOR: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaintenancePhase {
    EnterGarage,
    Maintaining,
}

#[derive(Debug)]
pub struct MaintainVehicle {
    settlement: SettlementId,
    vehicle: VehicleId,
    phase: MaintenancePhase,
    claimed: bool,
    garaged: bool,
}

fn needs_maintenance(rover: &Rover, config: &SchedulerConfig) -> bool {
    !rover.is_reserved()
        && !rover.is_under_maintenance()
        && !rover.malfunctions.has_malfunction()
        && rover.malfunctions.time_since_last_maintenance() > config.tasks.maintenance_interval
}

/// The most overdue rover parked where the colonist is.
fn find_target<'a>(colony: &'a Colony, person: &Person, config: &SchedulerConfig) -> Option<&'a Rover> {
    let settlement = person.is_inside_settlement()?;
    colony
        .parked_vehicles(settlement)
        .filter(|rover| needs_maintenance(rover, config))
        .max_by(|a, b| {
            a.malfunctions
                .time_since_last_maintenance()
                .total_cmp(&b.malfunctions.time_since_last_maintenance())
        })
}

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    let Some(rover) = find_target(colony, person, config) else {
        return 0.0;
    };
    let overdue = rover.malfunctions.time_since_last_maintenance() / config.tasks.maintenance_interval;
    config.tasks.maintenance_weight * overdue.min(MAX_OVERDUE_FACTOR) * person.performance()
}

pub fn create(colony: &Colony, person: &Person, config: &SchedulerConfig) -> Option<Task> {
    let settlement = person.is_inside_settlement()?.clone();
    let rover = find_target(colony, person, config)?;
    Some(Task::new(
        TaskKind::MaintainVehicle,
        format!("{} is maintaining {}", person.name, rover.name),
        MaintainVehicle {
            settlement,
            vehicle: rover.id.clone(),
            phase: MaintenancePhase::EnterGarage,
            claimed: false,
            garaged: false,
        },
    ))
}

impl TaskBehavior for MaintainVehicle {
    fn phase(&self) -> String {
        match self.phase {
            MaintenancePhase::EnterGarage => "Moving vehicle into garage",
            MaintenancePhase::Maintaining => "Maintaining",
        }
        .to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.phase {
            MaintenancePhase::EnterGarage => {
                let Some((settlement, rover)) = ctx
                    .colony
                    .settlement_and_vehicle_mut(&self.settlement, &self.vehicle)
                else {
                    return StepOutcome::Done(time);
                };
                if rover.parked_at.as_ref() != Some(&self.settlement)
                    || rover.is_reserved()
                    || !rover.claim_maintenance(agent)
                {
                    return StepOutcome::Done(time);
                }
                self.claimed = true;
                if settlement.garage.capacity() > 0 {
                    if settlement.garage.contains(&self.vehicle) {
                        // someone else already pulled it in
                    } else if settlement.garage.try_admit(&self.vehicle) {
                        self.garaged = true;
                    } else {
                        tracing::debug!(agent = %agent, vehicle = %self.vehicle, "garage full");
                        return StepOutcome::Done(time);
                    }
                }
                self.phase = MaintenancePhase::Maintaining;
                StepOutcome::Continue(time)
            }
            MaintenancePhase::Maintaining => {
                let Some(rover) = ctx.colony.vehicles.get(&self.vehicle) else {
                    return StepOutcome::Done(time);
                };
                if rover.malfunctions.has_malfunction() {
                    return StepOutcome::Done(time);
                }
                let wear = rover.malfunctions.wear_accident_modifier();

                let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) else {
                    return StepOutcome::Done(time);
                };
                let needed = rover.malfunctions.maintenance_work_remaining();
                let completed = rover.malfunctions.add_maintenance_work(time);
                let used = if completed { needed.min(time) } else { time };
                if let Some(person) = ctx.person_mut(agent) {
                    person.skills.add_experience(SkillType::Mechanics, used / 10.0);
                }

                let entity = self.vehicle.0.clone();
                let work = HazardousWork {
                    skill: SkillType::Mechanics,
                    phase_weight: ctx.config.accidents.maintenance_phase_weight,
                    environment_weight: wear,
                    entity: &entity,
                    activity: "maintenance",
                };
                if check_for_accident(agent, ctx, &work, used) {
                    // the malfunction check ends the task next step
                    if let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) {
                        rover.malfunctions.trigger_accident("maintenance");
                    }
                }

                if completed {
                    tracing::debug!(agent = %agent, vehicle = %self.vehicle, "maintenance completed");
                    return StepOutcome::Done(time - used);
                }
                StepOutcome::Continue(0.0)
            }
        }
    }

    fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if let Some((settlement, rover)) = ctx
            .colony
            .settlement_and_vehicle_mut(&self.settlement, &self.vehicle)
        {
            if self.claimed {
                rover.release_maintenance(agent);
            }
            if self.garaged {
                settlement.garage.release(&self.vehicle);
            }
        }
        self.claimed = false;
        self.garaged = false;
    }
}
