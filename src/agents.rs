//! Agents and their epidemiological state machine.
//!
//! An agent's lifetime attributes (age, mask wearing, medic role, recovery time) are drawn once
//! when it is created and never change. Its infection state only ever changes through
//! [`ContextAgentsExt::apply_infection_event`], which checks every change against
//! [`InfectionState::transition`].
use std::fmt::{self, Display};
use std::ops::RangeInclusive;

use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, IntoStaticStr};

use crate::context::Context;
use crate::define_data_plugin;
use crate::grid::{ContextGridExt, Position};
use crate::parameters::ContextParametersExt;
use crate::random::ContextRandomExt;
use crate::scheduler::ContextSchedulerExt;

/// Ages are drawn uniformly from `[0, MAX_AGE]`.
pub const MAX_AGE: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub(crate) usize);

impl AgentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent {}", self.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
    StrumDisplay,
)]
pub enum InfectionState {
    Susceptible,
    Infected,
    Isolated,
    Deceased,
    Recovered,
}

/// Something that happens to an agent and may change its infection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfectionEvent {
    /// Successful transmission from an infected cohabitant.
    Infection,
    /// The agent starts isolating.
    Isolation,
    /// The isolation period ends.
    Release,
    Death,
    /// Natural recovery or a medic's cure.
    Recovery,
}

impl InfectionState {
    /// The state reached from `self` when `event` happens, or `None` if the event cannot happen
    /// to an agent in this state.
    pub fn transition(self, event: InfectionEvent) -> Option<InfectionState> {
        use InfectionEvent as E;
        use InfectionState as S;
        match (self, event) {
            (S::Susceptible, E::Infection) => Some(S::Infected),
            (S::Infected, E::Isolation) => Some(S::Isolated),
            (S::Isolated, E::Release) => Some(S::Infected),
            (S::Infected | S::Isolated, E::Death) => Some(S::Deceased),
            (S::Infected | S::Isolated, E::Recovery) => Some(S::Recovered),
            _ => None,
        }
    }

    /// Deceased and Recovered agents never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, InfectionState::Deceased | InfectionState::Recovered)
    }

    /// Whether the agent carries an infection, isolated or not.
    pub fn is_ill(self) -> bool {
        matches!(self, InfectionState::Infected | InfectionState::Isolated)
    }

    pub fn is_alive(self) -> bool {
        self != InfectionState::Deceased
    }
}

/// The sub-population an agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum AgentKind {
    Regular,
    /// Relocated to a random cell at the start of every tick.
    Traveling,
    /// Tries to cure its cohabitants at the start of every tick.
    Medic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    state: InfectionState,
    age: f64,
    wear_mask: bool,
    vaccinated: bool,
    infection_time: usize,
    isolation_time: usize,
    recovery_time: usize,
    position: Position,
}

impl Agent {
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn state(&self) -> InfectionState {
        self.state
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn wears_mask(&self) -> bool {
        self.wear_mask
    }

    pub fn is_vaccinated(&self) -> bool {
        self.vaccinated
    }

    pub fn is_medic(&self) -> bool {
        self.kind == AgentKind::Medic
    }

    /// The tick at which the agent most recently became infected, 0 if it never was.
    pub fn infection_time(&self) -> usize {
        self.infection_time
    }

    /// Ticks spent in the current isolation. Meaningless unless the agent is isolated.
    pub fn isolation_time(&self) -> usize {
        self.isolation_time
    }

    /// Ticks after infection at which the agent recovers.
    pub fn recovery_time(&self) -> usize {
        self.recovery_time
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

/// Read-only view of an agent for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub state: InfectionState,
    pub position: Position,
    pub wear_mask: bool,
    pub vaccinated: bool,
    pub is_medic: bool,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        AgentSnapshot {
            id: agent.id,
            state: agent.state,
            position: agent.position,
            wear_mask: agent.wear_mask,
            vaccinated: agent.vaccinated,
            is_medic: agent.is_medic(),
        }
    }
}

/// Upper age bound (inclusive) and the range of base recovery times for agents up to that age.
const RECOVERY_TIME_BRACKETS: [(f64, RangeInclusive<usize>); 7] = [
    (12.0, 2..=7),
    (19.0, 4..=11),
    (29.0, 5..=14),
    (39.0, 7..=14),
    (59.0, 8..=21),
    (79.0, 14..=21),
    (f64::INFINITY, 14..=28),
];

/// The range of base recovery times (in ticks) for an agent of the given age.
pub fn recovery_time_bracket(age: f64) -> RangeInclusive<usize> {
    RECOVERY_TIME_BRACKETS
        .iter()
        .find(|(max_age, _)| age <= *max_age)
        .map_or(14..=28, |(_, bracket)| bracket.clone())
}

/// Draws a base recovery time for `age`, scales it by `multiplier` and rounds down.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sample_recovery_time(context: &Context, age: f64, multiplier: f64) -> usize {
    let base: usize = context.sample_range(recovery_time_bracket(age));
    (base as f64 * multiplier).floor() as usize
}

#[derive(Default)]
struct AgentsData {
    agents: Vec<Agent>,
    regular: Vec<AgentId>,
    traveling: Vec<AgentId>,
    medics: Vec<AgentId>,
}

impl AgentsData {
    fn agent_mut(&mut self, agent_id: AgentId) -> &mut Agent {
        &mut self.agents[agent_id.0]
    }
}

define_data_plugin!(AgentsPlugin, AgentsData, AgentsData::default());

pub(crate) fn set_agent_position(context: &mut Context, agent_id: AgentId, position: Position) {
    context
        .get_data_mut(AgentsPlugin)
        .agent_mut(agent_id)
        .position = position;
}

/// Advances the isolation timer of `agent_id` and returns the new value.
pub(crate) fn increment_isolation_time(context: &mut Context, agent_id: AgentId) -> usize {
    let agent = context.get_data_mut(AgentsPlugin).agent_mut(agent_id);
    agent.isolation_time += 1;
    agent.isolation_time
}

pub trait ContextAgentsExt {
    /// Creates an agent of the given kind: draws its attributes, places it on a random cell,
    /// adds it to the scheduler and draws its initial infection.
    fn add_agent(&mut self, kind: AgentKind) -> AgentId;

    fn get_agent(&self, agent_id: AgentId) -> &Agent;

    /// All agents in creation order.
    fn get_agents(&self) -> &[Agent];

    fn get_agent_count(&self) -> usize;

    /// The ids of the agents of one sub-population, in creation order.
    fn get_agents_of_kind(&self, kind: AgentKind) -> &[AgentId];

    fn get_agent_state(&self, agent_id: AgentId) -> InfectionState;

    /// Applies `event` to the agent and returns its new state. An infection records the
    /// current tick as the infection time; an isolation resets the isolation timer.
    ///
    /// # Panics
    ///
    /// Panics if the event cannot happen in the agent's current state.
    fn apply_infection_event(&mut self, agent_id: AgentId, event: InfectionEvent)
        -> InfectionState;

    fn vaccinate_agent(&mut self, agent_id: AgentId);

    fn count_agents_in_state(&self, state: InfectionState) -> usize;

    fn get_agent_snapshot(&self, agent_id: AgentId) -> AgentSnapshot;

    fn agent_snapshots(&self) -> Vec<AgentSnapshot>;
}

impl ContextAgentsExt for Context {
    fn add_agent(&mut self, kind: AgentKind) -> AgentId {
        let parameters = self.get_parameters();
        let wear_mask_chance = parameters.wear_mask_chance;
        let multiplier = parameters.recovery_time_multiplier;
        let start_infection_rate = parameters.start_infection_rate;

        let age = self.sample_range(0.0..=MAX_AGE);
        let wear_mask = self.sample_bool(wear_mask_chance);
        let recovery_time = sample_recovery_time(self, age, multiplier);
        let position = self.sample_cell();

        let data = self.get_data_mut(AgentsPlugin);
        let agent_id = AgentId(data.agents.len());
        data.agents.push(Agent {
            id: agent_id,
            kind,
            state: InfectionState::Susceptible,
            age,
            wear_mask,
            vaccinated: false,
            infection_time: 0,
            isolation_time: 0,
            recovery_time,
            position,
        });
        match kind {
            AgentKind::Regular => data.regular.push(agent_id),
            AgentKind::Traveling => data.traveling.push(agent_id),
            AgentKind::Medic => data.medics.push(agent_id),
        }
        trace!("created {agent_id} ({kind:?}, age {age:.1}, recovery time {recovery_time})");

        self.place_agent(agent_id, position);
        self.schedule_agent(agent_id);

        if self.sample_bool(start_infection_rate) {
            self.apply_infection_event(agent_id, InfectionEvent::Infection);
        }
        agent_id
    }

    fn get_agent(&self, agent_id: AgentId) -> &Agent {
        &self.get_data(AgentsPlugin).agents[agent_id.0]
    }

    fn get_agents(&self) -> &[Agent] {
        match self.get_data_container(AgentsPlugin) {
            Some(data) => &data.agents,
            None => &[],
        }
    }

    fn get_agent_count(&self) -> usize {
        self.get_agents().len()
    }

    fn get_agents_of_kind(&self, kind: AgentKind) -> &[AgentId] {
        let Some(data) = self.get_data_container(AgentsPlugin) else {
            return &[];
        };
        match kind {
            AgentKind::Regular => &data.regular,
            AgentKind::Traveling => &data.traveling,
            AgentKind::Medic => &data.medics,
        }
    }

    fn get_agent_state(&self, agent_id: AgentId) -> InfectionState {
        self.get_agent(agent_id).state
    }

    fn apply_infection_event(
        &mut self,
        agent_id: AgentId,
        event: InfectionEvent,
    ) -> InfectionState {
        let tick = self.get_current_tick();
        let agent = self.get_data_mut(AgentsPlugin).agent_mut(agent_id);
        let previous = agent.state;
        let Some(next) = previous.transition(event) else {
            panic!("{agent_id} cannot undergo {event:?} while {previous}");
        };
        agent.state = next;
        match event {
            InfectionEvent::Infection => agent.infection_time = tick,
            InfectionEvent::Isolation => agent.isolation_time = 0,
            _ => {}
        }
        trace!("{agent_id}: {previous} -> {next} at tick {tick}");
        next
    }

    fn vaccinate_agent(&mut self, agent_id: AgentId) {
        self.get_data_mut(AgentsPlugin)
            .agent_mut(agent_id)
            .vaccinated = true;
    }

    fn count_agents_in_state(&self, state: InfectionState) -> usize {
        self.get_agents()
            .iter()
            .filter(|agent| agent.state == state)
            .count()
    }

    fn get_agent_snapshot(&self, agent_id: AgentId) -> AgentSnapshot {
        self.get_agent(agent_id).into()
    }

    fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.get_agents().iter().map(AgentSnapshot::from).collect()
    }
}
