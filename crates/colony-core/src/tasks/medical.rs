//! Receive Treatment
//!
//! A colonist with a medical problem occupies a medical aid until the
//! problem is healed.

use crate::components::{AgentId, Colony, Person, SettlementId};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};
use crate::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreatmentPhase {
    Admission,
    Recovering,
}

#[derive(Debug)]
pub struct ReceiveTreatment {
    settlement: SettlementId,
    aid: usize,
    phase: TreatmentPhase,
    admitted: bool,
}

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    let Some(problem) = &person.condition.problem else {
        return 0.0;
    };
    let free_aid = person
        .is_inside_settlement()
        .and_then(|id| colony.settlements.get(id))
        .and_then(|s| s.free_medical_aid())
        .is_some();
    if !free_aid {
        return 0.0;
    }
    config.tasks.treatment_weight * (1.0 + problem.seriousness as f64 / 50.0)
}

pub fn create(colony: &Colony, person: &Person, _config: &SchedulerConfig) -> Option<Task> {
    let problem = person.condition.problem.as_ref()?;
    let settlement_id = person.is_inside_settlement()?;
    let aid = colony.settlements.get(settlement_id)?.free_medical_aid()?;
    Some(Task::new(
        TaskKind::ReceiveTreatment,
        format!("{} is being treated for {}", person.name, problem.name),
        ReceiveTreatment {
            settlement: settlement_id.clone(),
            aid,
            phase: TreatmentPhase::Admission,
            admitted: false,
        },
    ))
}

impl TaskBehavior for ReceiveTreatment {
    fn phase(&self) -> String {
        match self.phase {
            TreatmentPhase::Admission => "Waiting for medical aid",
            TreatmentPhase::Recovering => "Recovering",
        }
        .to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.phase {
            TreatmentPhase::Admission => {
                let Some(aid) = ctx
                    .colony
                    .settlements
                    .get_mut(&self.settlement)
                    .and_then(|s| s.medical_aids.get_mut(self.aid))
                else {
                    return StepOutcome::Done(time);
                };
                if !aid.try_admit(agent) {
                    return StepOutcome::Done(time);
                }
                self.admitted = true;
                self.phase = TreatmentPhase::Recovering;
                StepOutcome::Continue(time)
            }
            TreatmentPhase::Recovering => {
                let rate = ctx.config.tasks.treatment_healing_rate;
                let Some(person) = ctx.person_mut(agent) else {
                    return StepOutcome::Done(time);
                };
                let Some(problem) = person.condition.problem.as_mut() else {
                    return StepOutcome::Done(time);
                };
                let needed = problem.recovery_remaining / rate;
                if needed <= time + EPSILON {
                    let cured = problem.name.clone();
                    person.condition.set_problem(None);
                    tracing::debug!(agent = %agent, problem = %cured, "recovered");
                    return StepOutcome::Done((time - needed).max(0.0));
                }
                problem.recovery_remaining -= time * rate;
                StepOutcome::Continue(0.0)
            }
        }
    }

    fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if !self.admitted {
            return;
        }
        if let Some(aid) = ctx
            .colony
            .settlements
            .get_mut(&self.settlement)
            .and_then(|s| s.medical_aids.get_mut(self.aid))
        {
            aid.discharge(agent);
        }
        self.admitted = false;
    }
}
