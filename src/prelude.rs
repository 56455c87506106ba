pub use crate::agents::{
    AgentId, AgentKind, AgentSnapshot, ContextAgentsExt, InfectionEvent, InfectionState,
};
pub use crate::context::Context;
pub use crate::define_data_plugin;
pub use crate::error::EpigridError;
pub use crate::grid::{ContextGridExt, Position};
pub use crate::interventions::ContextInterventionsExt;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{load_parameters, ContextParametersExt, Parameters};
pub use crate::random::ContextRandomExt;
pub use crate::report::ContextReportExt;
pub use crate::runner::{run_with_args, run_with_args_internal, BaseArgs};
pub use crate::scheduler::ContextSchedulerExt;
pub use crate::simulation::ContextSimulationExt;
pub use crate::statistics::{Collector, ContextStatisticsExt};
