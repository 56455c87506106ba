//! Transmission between agents sharing a cell.
use log::trace;

use crate::agents::{Agent, AgentId, ContextAgentsExt, InfectionEvent, InfectionState};
use crate::context::Context;
use crate::grid::ContextGridExt;
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;

/// Probability that `source` infects `target` on one contact. A mask on the source and a
/// vaccination of the target each scale the base infection rate down.
pub fn effective_infection_probability(
    parameters: &Parameters,
    source: &Agent,
    target: &Agent,
) -> f64 {
    let mut probability = parameters.infection_rate;
    if source.wears_mask() {
        probability *= 1.0 - parameters.mask_effectiveness;
    }
    if target.is_vaccinated() {
        probability *= 1.0 - parameters.vaccine_effectiveness;
    }
    probability
}

/// The contact part of an agent's activation: an infected agent tries to infect every
/// susceptible agent in its cell.
pub fn contact(context: &mut Context, agent_id: AgentId) {
    if context.get_agent_state(agent_id) != InfectionState::Infected {
        return;
    }
    for target_id in context.get_cohabitants(agent_id) {
        if context.get_agent_state(target_id) != InfectionState::Susceptible {
            continue;
        }
        let probability = effective_infection_probability(
            context.get_parameters(),
            context.get_agent(agent_id),
            context.get_agent(target_id),
        );
        if context.sample_bool(probability) {
            trace!("{agent_id} infects {target_id}");
            context.apply_infection_event(target_id, InfectionEvent::Infection);
        }
    }
}
