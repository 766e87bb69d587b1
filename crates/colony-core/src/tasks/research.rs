//! Research
//!
//! Takes one researcher slot in a settlement laboratory and turns time into
//! science points and science experience.

use crate::components::{AgentId, Colony, Person, SettlementId, SkillType};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResearchPhase {
    EnteringLab,
    Researching,
}

#[derive(Debug)]
pub struct Research {
    settlement: SettlementId,
    laboratory: usize,
    phase: ResearchPhase,
    entered: bool,
}

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    let Some(settlement) = person
        .is_inside_settlement()
        .and_then(|id| colony.settlements.get(id))
    else {
        return 0.0;
    };
    if settlement.free_laboratory().is_none() {
        return 0.0;
    }
    let level = person.skills.level(SkillType::Science) as f64;
    config.tasks.research_weight * (1.0 + level * 0.1) * person.performance()
}

pub fn create(colony: &Colony, person: &Person, config: &SchedulerConfig) -> Option<Task> {
    let settlement_id = person.is_inside_settlement()?;
    let settlement = colony.settlements.get(settlement_id)?;
    let laboratory = settlement.free_laboratory()?;
    Some(
        Task::new(
            TaskKind::Research,
            format!(
                "{} is researching in {}",
                person.name, settlement.laboratories[laboratory].name
            ),
            Research {
                settlement: settlement_id.clone(),
                laboratory,
                phase: ResearchPhase::EnteringLab,
                entered: false,
            },
        )
        .with_duration(config.tasks.research_duration),
    )
}

impl TaskBehavior for Research {
    fn phase(&self) -> String {
        match self.phase {
            ResearchPhase::EnteringLab => "Entering laboratory",
            ResearchPhase::Researching => "Researching",
        }
        .to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.phase {
            ResearchPhase::EnteringLab => {
                let Some(lab) = ctx
                    .colony
                    .settlements
                    .get_mut(&self.settlement)
                    .and_then(|s| s.laboratories.get_mut(self.laboratory))
                else {
                    return StepOutcome::Done(time);
                };
                if !lab.try_enter() {
                    tracing::debug!(agent = %agent, lab = %lab.name, "no researcher slot free");
                    return StepOutcome::Done(time);
                }
                self.entered = true;
                self.phase = ResearchPhase::Researching;
                StepOutcome::Continue(time)
            }
            ResearchPhase::Researching => {
                let level = ctx
                    .person(agent)
                    .map(|p| p.skills.level(SkillType::Science))
                    .unwrap_or(0);
                if let Some(lab) = ctx
                    .colony
                    .settlements
                    .get_mut(&self.settlement)
                    .and_then(|s| s.laboratories.get_mut(self.laboratory))
                {
                    lab.science_points += time * (1.0 + level as f64) / 100.0;
                }
                if let Some(person) = ctx.person_mut(agent) {
                    person.skills.add_experience(SkillType::Science, time / 10.0);
                }
                StepOutcome::Continue(0.0)
            }
        }
    }

    fn release(&mut self, _agent: &AgentId, ctx: &mut TickContext<'_>) {
        if !self.entered {
            return;
        }
        if let Some(lab) = ctx
            .colony
            .settlements
            .get_mut(&self.settlement)
            .and_then(|s| s.laboratories.get_mut(self.laboratory))
        {
            lab.leave();
        }
        self.entered = false;
    }
}
