//! Agent movement: a plain random step to a neighbouring cell, and the distance-seeking search
//! agents use when social distancing.
use log::trace;

use crate::agents::{AgentId, ContextAgentsExt, InfectionState};
use crate::context::Context;
use crate::grid::{ContextGridExt, Position};
use crate::parameters::ContextParametersExt;
use crate::random::{sample_single_from_known_length, ContextRandomExt};

/// Whether no agent other than `agent_id` is within `radius` of `position`, the cell itself
/// included.
pub fn check_social_distance(
    context: &Context,
    agent_id: AgentId,
    position: Position,
    radius: usize,
) -> bool {
    let grid = context.grid();
    grid.neighbourhood(position, radius, true)
        .into_iter()
        .all(|cell| grid.occupants(cell).iter().all(|other| *other == agent_id))
}

/// Moves the agent to one of the eight cells around it, chosen uniformly.
pub fn random_move(context: &mut Context, agent_id: AgentId) {
    let position = context.get_agent(agent_id).position();
    let candidates = context.grid().neighbourhood(position, 1, false);
    let target =
        context.sample(|rng| sample_single_from_known_length(rng, candidates.into_iter()));
    if let Some(target) = target {
        context.place_agent(agent_id, target);
    }
}

/// Looks for a neighbouring cell with no other agent within `social_distance - 1` of it,
/// trying the agent's own cell after the neighbours. Each failed round relaxes the distance
/// by one; once no distance is left the agent makes a plain random move.
pub fn move_with_distance(context: &mut Context, agent_id: AgentId, social_distance: usize) {
    let position = context.get_agent(agent_id).position();
    let mut candidates = context.grid().neighbourhood(position, 1, false);
    context.shuffle(&mut candidates);

    for distance in (1..=social_distance).rev() {
        let radius = distance - 1;
        if let Some(&target) = candidates
            .iter()
            .find(|cell| check_social_distance(context, agent_id, **cell, radius))
        {
            trace!("{agent_id} keeps distance {distance} by moving to {target:?}");
            context.place_agent(agent_id, target);
            return;
        }
        if check_social_distance(context, agent_id, position, radius) {
            trace!("{agent_id} keeps distance {distance} by staying at {position:?}");
            return;
        }
    }
    random_move(context, agent_id);
}

/// The movement part of an agent's activation. Deceased and isolated agents stay put.
pub fn move_agent(context: &mut Context, agent_id: AgentId) {
    if matches!(
        context.get_agent_state(agent_id),
        InfectionState::Deceased | InfectionState::Isolated
    ) {
        return;
    }
    let parameters = context.get_parameters();
    let social_distance = parameters.social_distance;
    let social_distance_chance = parameters.social_distance_chance;

    if social_distance > 0 && context.sample_bool(social_distance_chance) {
        move_with_distance(context, agent_id, social_distance);
    } else {
        random_move(context, agent_id);
    }
}
