//! Population-level interventions run by the orchestrator before the agents act: vaccination
//! campaigns, relocation of travelers and the medics' curing pass.
use log::{debug, trace};

use crate::agents::{AgentId, AgentKind, ContextAgentsExt, InfectionEvent, InfectionState};
use crate::context::Context;
use crate::define_data_plugin;
use crate::grid::ContextGridExt;
use crate::parameters::ContextParametersExt;
use crate::random::{sample_multiple_from_known_length, ContextRandomExt};

// Ticks left until the first vaccine batch is deployed.
define_data_plugin!(VaccineCountdownPlugin, usize, |context| {
    context.get_parameters().vaccine_ready_time
});

pub trait ContextInterventionsExt {
    /// Ticks left before vaccines become available.
    fn get_vaccine_countdown(&self) -> usize;

    /// Counts down to vaccine availability, then deploys one batch every tick.
    fn step_vaccination(&mut self);

    /// Vaccinates a batch of distinct agents drawn uniformly from the whole population,
    /// whatever their state. Returns the agents drawn.
    ///
    /// # Panics
    ///
    /// Panics if the batch is larger than the population.
    fn deploy_vaccines(&mut self, batch_size: usize) -> Vec<AgentId>;

    /// Moves every traveling agent to a uniformly random cell.
    fn relocate_travelers(&mut self);

    /// Lets every living medic try to cure each infected agent sharing its cell.
    fn curing_pass(&mut self);
}

impl ContextInterventionsExt for Context {
    fn get_vaccine_countdown(&self) -> usize {
        match self.get_data_container(VaccineCountdownPlugin) {
            Some(countdown) => *countdown,
            None => self.get_parameters().vaccine_ready_time,
        }
    }

    fn step_vaccination(&mut self) {
        let countdown = self.get_data_mut(VaccineCountdownPlugin);
        if *countdown > 0 {
            *countdown -= 1;
            return;
        }
        let batch_size = self.get_parameters().vaccine_batch_size;
        self.deploy_vaccines(batch_size);
    }

    fn deploy_vaccines(&mut self, batch_size: usize) -> Vec<AgentId> {
        let population: Vec<AgentId> = self.get_agents().iter().map(|agent| agent.id()).collect();
        let batch =
            self.sample(|rng| sample_multiple_from_known_length(rng, population, batch_size));
        for agent_id in &batch {
            self.vaccinate_agent(*agent_id);
        }
        debug!(
            "vaccinated {} agents at tick {}",
            batch.len(),
            self.get_current_tick()
        );
        batch
    }

    fn relocate_travelers(&mut self) {
        let travelers = self.get_agents_of_kind(AgentKind::Traveling).to_vec();
        for agent_id in travelers {
            let position = self.sample_cell();
            trace!("{agent_id} travels to {position:?}");
            self.place_agent(agent_id, position);
        }
    }

    fn curing_pass(&mut self) {
        let curing_chance = self.get_parameters().curing_chance;
        let medics = self.get_agents_of_kind(AgentKind::Medic).to_vec();
        for medic_id in medics {
            if !self.get_agent_state(medic_id).is_alive() {
                continue;
            }
            for patient_id in self.get_cohabitants(medic_id) {
                if self.sample_bool(curing_chance)
                    && self.get_agent_state(patient_id) == InfectionState::Infected
                {
                    trace!("{medic_id} cures {patient_id}");
                    self.apply_infection_event(patient_id, InfectionEvent::Recovery);
                }
            }
        }
    }
}
