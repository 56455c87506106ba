//! A discrete-time, spatial agent-based epidemic simulator.
//!
//! A fixed population of agents lives on a toroidal grid. Each tick every agent, in a random
//! order, progresses through a stochastic infection state machine, moves to a neighbouring
//! cell and may infect the agents it shares a cell with. Masks, vaccination, isolation,
//! social distancing, traveling agents and medics modify how the epidemic spreads, and a set
//! of statistics collectors records the state of the population once per tick.
//!
//! The central object of a simulation is the [`Context`]. It owns every piece of model state
//! (the parameters, the grid, the agents, the random source and the statistics) and each
//! module adds its operations to it through an extension trait:
//!
//! * [`ContextParametersExt`](parameters::ContextParametersExt) stores the validated
//!   [`Parameters`](parameters::Parameters).
//! * [`ContextGridExt`](grid::ContextGridExt) and [`ContextAgentsExt`](agents::ContextAgentsExt)
//!   hold the spatial grid and the population.
//! * [`ContextSimulationExt`](simulation::ContextSimulationExt) builds the population and
//!   advances the clock one tick at a time.
//! * [`ContextStatisticsExt`](statistics::ContextStatisticsExt) answers queries about the
//!   recorded history, and [`ContextReportExt`](report::ContextReportExt) exports it as CSV.
//!
//! ```
//! use epigrid::prelude::*;
//!
//! let mut context = Context::new();
//! context.init_random(42);
//! context.init_simulation(Parameters::default()).unwrap();
//! while context.is_running() && context.get_current_tick() < 50 {
//!     context.step();
//! }
//! let infected = context.get_series("state", "Infected");
//! assert!(!infected.is_empty());
//! ```
pub mod agents;
pub mod context;
pub mod error;
pub mod grid;
pub mod interventions;
pub mod log;
pub mod movement;
pub mod parameters;
pub mod prelude;
pub mod progression;
pub mod random;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod simulation;
pub mod statistics;
pub mod transmission;

mod hashing;

pub use context::Context;
pub use error::EpigridError;
pub use hashing::{HashMap, HashSet};

// Re-exported so models can use the same versions of these crates.
pub use rand;
