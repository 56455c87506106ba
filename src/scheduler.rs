//! Random activation: every tick, each agent acts exactly once, in a fresh uniformly random
//! order. Effects of an earlier activation are visible to every later one in the same tick.
use log::trace;

use crate::agents::AgentId;
use crate::context::Context;
use crate::define_data_plugin;
use crate::random::ContextRandomExt;

define_data_plugin!(SchedulerPlugin, Vec<AgentId>, Vec::new());

pub trait ContextSchedulerExt {
    /// Appends an agent to the activation list.
    fn schedule_agent(&mut self, agent_id: AgentId);

    /// The scheduled agents in the order they were added.
    fn get_scheduled_agents(&self) -> &[AgentId];

    /// Activates every scheduled agent once, in a random order, by calling `activate`.
    fn step_scheduler(&mut self, activate: impl FnMut(&mut Context, AgentId));
}

impl ContextSchedulerExt for Context {
    fn schedule_agent(&mut self, agent_id: AgentId) {
        self.get_data_mut(SchedulerPlugin).push(agent_id);
    }

    fn get_scheduled_agents(&self) -> &[AgentId] {
        match self.get_data_container(SchedulerPlugin) {
            Some(agents) => agents,
            None => &[],
        }
    }

    fn step_scheduler(&mut self, mut activate: impl FnMut(&mut Context, AgentId)) {
        let mut order = self.get_scheduled_agents().to_vec();
        self.shuffle(&mut order);
        trace!("activating {} agents", order.len());
        for agent_id in order {
            activate(self, agent_id);
        }
    }
}
