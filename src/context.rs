//! The `Context` owns all of the state of a running simulation.
//!
//! Every component stores its data in the `Context` through a *data plugin*: a marker type
//! declared with [`define_data_plugin!`] that names the container type and how to build it. The
//! container is created lazily the first time it is mutably accessed. Components expose their
//! behavior as extension traits on `Context` (`ContextGridExt`, `ContextAgentsExt`, ...), so the
//! `Context` is the single owner of the grid, the agents and the random source.
//!
//! The `Context` also keeps the simulation clock: the current tick and whether the simulation
//! is still running. Advancing the clock is the job of
//! [`ContextSimulationExt::step`](crate::simulation::ContextSimulationExt::step).
use std::any::{Any, TypeId};

use crate::HashMap;

/// A type that identifies a data container stored in the [`Context`].
pub trait DataPlugin: Any {
    type DataContainer: Any;

    /// Builds the container. Called once, the first time the container is requested.
    fn init(context: &Context) -> Self::DataContainer;
}

/// Defines a new data plugin. The third argument is either an expression producing the
/// container or a closure-like `|context| expr` that may read from the `Context`.
#[macro_export]
macro_rules! define_data_plugin {
    ($data_plugin:ident, $data_container:ty, |$ctx:ident| $body:expr) => {
        struct $data_plugin;

        impl $crate::context::DataPlugin for $data_plugin {
            type DataContainer = $data_container;

            #[allow(unused_variables)]
            fn init($ctx: &$crate::context::Context) -> Self::DataContainer {
                $body
            }
        }
    };

    ($data_plugin:ident, $data_container:ty, $default:expr) => {
        $crate::define_data_plugin!($data_plugin, $data_container, |_context| $default);
    };
}
pub use define_data_plugin;

pub struct Context {
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_tick: usize,
    running: bool,
}

impl Context {
    pub fn new() -> Context {
        Context {
            data_plugins: HashMap::default(),
            current_tick: 0,
            running: true,
        }
    }

    /// Returns a mutable reference to the container of the given plugin, creating it if it
    /// does not exist yet.
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        let type_id = TypeId::of::<T>();
        if !self.data_plugins.contains_key(&type_id) {
            let data_container = T::init(self);
            self.data_plugins.insert(type_id, Box::new(data_container));
        }
        self.data_plugins
            .get_mut(&type_id)
            .unwrap()
            .downcast_mut::<T::DataContainer>()
            .unwrap()
    }

    /// Returns the container of the given plugin if it has been created.
    pub fn get_data_container<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    /// Returns the container of the given plugin.
    ///
    /// # Panics
    ///
    /// Panics if the container has not been created with [`Context::get_data_mut`].
    pub fn get_data<T: DataPlugin>(&self, plugin: T) -> &T::DataContainer {
        self.get_data_container(plugin).unwrap_or_else(|| {
            panic!(
                "data plugin {} has not been initialized",
                std::any::type_name::<T>()
            )
        })
    }

    /// The index of the tick currently being (or about to be) simulated.
    pub fn get_current_tick(&self) -> usize {
        self.current_tick
    }

    /// Whether the simulation has not yet reached its termination condition.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Marks the simulation as finished. Further steps are still permitted.
    pub fn shutdown(&mut self) {
        self.running = false;
    }

    pub(crate) fn advance_tick(&mut self) {
        self.current_tick += 1;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
