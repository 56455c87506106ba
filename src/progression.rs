//! Disease progression of a single agent: the death roll, recovery and isolation.
use log::trace;

use crate::agents::{
    increment_isolation_time, AgentId, ContextAgentsExt, InfectionEvent, InfectionState,
};
use crate::context::Context;
use crate::parameters::ContextParametersExt;
use crate::random::ContextRandomExt;
use crate::statistics::ContextStatisticsExt;

/// Rolls for death, then checks recovery, then rolls for isolation. Only agents that are
/// infected or isolated are affected; the first outcome that applies ends the check.
pub fn check_status(context: &mut Context, agent_id: AgentId) {
    let state = context.get_agent_state(agent_id);
    if !state.is_ill() {
        return;
    }

    let parameters = context.get_parameters();
    let death_rate = parameters.death_rate;
    let isolation_chance = parameters.isolation_chance;
    let tick = context.get_current_tick();
    let agent = context.get_agent(agent_id);
    let days_infected = tick.saturating_sub(agent.infection_time());
    let recovery_time = agent.recovery_time();

    if context.sample_bool(death_rate) {
        context.apply_infection_event(agent_id, InfectionEvent::Death);
        context.register_death(days_infected);
    } else if days_infected >= recovery_time {
        context.apply_infection_event(agent_id, InfectionEvent::Recovery);
    } else if state == InfectionState::Infected && context.sample_bool(isolation_chance) {
        context.apply_infection_event(agent_id, InfectionEvent::Isolation);
    }
}

/// Counts one tick of isolation and releases the agent once the isolation duration has
/// elapsed. A duration of zero never releases.
pub fn advance_isolation(context: &mut Context, agent_id: AgentId) {
    if context.get_agent_state(agent_id) != InfectionState::Isolated {
        return;
    }
    let isolation_duration = context.get_parameters().isolation_duration;
    let isolation_time = increment_isolation_time(context, agent_id);
    if isolation_time == isolation_duration {
        trace!("{agent_id} ends isolation after {isolation_time} ticks");
        context.apply_infection_event(agent_id, InfectionEvent::Release);
    }
}

/// The progression part of an agent's activation. An agent that starts isolating during
/// this tick's status check does not count this tick towards its isolation.
pub fn progress_disease(context: &mut Context, agent_id: AgentId) {
    let was_isolated = context.get_agent_state(agent_id) == InfectionState::Isolated;
    check_status(context, agent_id);
    if was_isolated {
        advance_isolation(context, agent_id);
    }
}
