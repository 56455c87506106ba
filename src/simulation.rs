//! The orchestrator: builds the population and drives the fixed per-tick sequence.
//!
//! Every call to [`ContextSimulationExt::step`] runs, in order:
//!
//! 1. a statistics snapshot,
//! 2. the vaccination countdown or deployment,
//! 3. the relocation of traveling agents,
//! 4. the medics' curing pass,
//! 5. one activation of every agent in random order (progression, movement, contact),
//! 6. the tick increment,
//! 7. the termination check: the simulation stops once no agent is infected.
use log::{debug, info};

use crate::agents::{AgentId, AgentKind, ContextAgentsExt, InfectionState};
use crate::context::Context;
use crate::error::EpigridError;
use crate::grid::ContextGridExt;
use crate::interventions::ContextInterventionsExt;
use crate::movement::move_agent;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::progression::progress_disease;
use crate::scheduler::ContextSchedulerExt;
use crate::statistics::ContextStatisticsExt;
use crate::transmission::contact;

/// Everything an agent does when the scheduler activates it.
pub fn activate_agent(context: &mut Context, agent_id: AgentId) {
    progress_disease(context, agent_id);
    move_agent(context, agent_id);
    contact(context, agent_id);
}

pub trait ContextSimulationExt {
    /// Stores the parameters, creates the grid and the population (regular agents, then
    /// travelers, then medics) and takes the initial statistics snapshot.
    ///
    /// The random source must have been initialized.
    ///
    /// # Errors
    ///
    /// Returns `EpigridError::ConfigError` if the parameters are invalid.
    fn init_simulation(&mut self, parameters: Parameters) -> Result<(), EpigridError>;

    /// Advances the simulation by exactly one tick.
    fn step(&mut self);

    /// Steps until the simulation stops or `max_ticks` ticks have elapsed. Returns the number
    /// of steps taken.
    fn run_simulation(&mut self, max_ticks: usize) -> usize;
}

impl ContextSimulationExt for Context {
    fn init_simulation(&mut self, parameters: Parameters) -> Result<(), EpigridError> {
        self.set_parameters(parameters)?;
        self.init_grid();

        let parameters = self.get_parameters();
        let populations = [
            (AgentKind::Regular, parameters.num_agents),
            (AgentKind::Traveling, parameters.num_traveling_agents),
            (AgentKind::Medic, parameters.num_medic_agents),
        ];
        for (kind, count) in populations {
            for _ in 0..count {
                self.add_agent(kind);
            }
        }

        self.init_statistics();
        self.collect_statistics();
        info!(
            "initialized {} agents on a {}x{} grid, {} infected",
            self.get_agent_count(),
            self.grid().width(),
            self.grid().height(),
            self.count_agents_in_state(InfectionState::Infected)
        );
        Ok(())
    }

    fn step(&mut self) {
        self.collect_statistics();
        self.step_vaccination();
        self.relocate_travelers();
        self.curing_pass();
        self.step_scheduler(activate_agent);
        self.advance_tick();

        let infected = self.count_agents_in_state(InfectionState::Infected);
        debug!(
            "tick {}: {} infected, {} isolated, {} deceased, {} recovered",
            self.get_current_tick(),
            infected,
            self.count_agents_in_state(InfectionState::Isolated),
            self.count_agents_in_state(InfectionState::Deceased),
            self.count_agents_in_state(InfectionState::Recovered)
        );
        if infected == 0 && self.is_running() {
            info!(
                "no infected agents left, stopping at tick {}",
                self.get_current_tick()
            );
            self.shutdown();
        }
    }

    fn run_simulation(&mut self, max_ticks: usize) -> usize {
        let mut steps = 0;
        while self.is_running() && steps < max_ticks {
            self.step();
            steps += 1;
        }
        steps
    }
}
