//! Per-tick aggregate statistics over the agent population.
//!
//! A [`Collector`] turns the current state of the simulation into one count per named series.
//! Every snapshot evaluates all registered collectors and records their counts in the slot of
//! the current tick, so each series is a time history indexed by tick. Five collectors are
//! registered by [`ContextStatisticsExt::init_statistics`]:
//!
//! | Collector | Series |
//! |---|---|
//! | `state` | one per [`InfectionState`] |
//! | `mask` | `Wearing Mask`, `Not Wearing Mask` (living agents) |
//! | `vaccination` | `Vaccinated`, `Not Vaccinated` (living agents) |
//! | `age` | `0-9` to `90-99` (living agents) |
//! | `death_time` | `1-3` to `28-30`, ticks from infection to death, cumulative |
use std::collections::BTreeMap;

use log::trace;
use strum::IntoEnumIterator;

use crate::agents::{Agent, ContextAgentsExt, InfectionState};
use crate::context::Context;
use crate::define_data_plugin;
use crate::report::ContextReportExt;

/// An inclusive range of values with a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedRange {
    pub name: &'static str,
    pub min: usize,
    pub max: usize,
}

impl NamedRange {
    const fn new(name: &'static str, min: usize, max: usize) -> Self {
        NamedRange { name, min, max }
    }

    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Whether a real-valued `value` falls in `[min, max + 1)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn contains_real(&self, value: f64) -> bool {
        value >= self.min as f64 && value < (self.max + 1) as f64
    }
}

pub const AGE_BUCKETS: [NamedRange; 10] = [
    NamedRange::new("0-9", 0, 9),
    NamedRange::new("10-19", 10, 19),
    NamedRange::new("20-29", 20, 29),
    NamedRange::new("30-39", 30, 39),
    NamedRange::new("40-49", 40, 49),
    NamedRange::new("50-59", 50, 59),
    NamedRange::new("60-69", 60, 69),
    NamedRange::new("70-79", 70, 79),
    NamedRange::new("80-89", 80, 89),
    NamedRange::new("90-99", 90, 99),
];

pub const DEATH_TIME_BUCKETS: [NamedRange; 10] = [
    NamedRange::new("1-3", 1, 3),
    NamedRange::new("4-6", 4, 6),
    NamedRange::new("7-9", 7, 9),
    NamedRange::new("10-12", 10, 12),
    NamedRange::new("13-15", 13, 15),
    NamedRange::new("16-18", 16, 18),
    NamedRange::new("19-21", 19, 21),
    NamedRange::new("22-24", 22, 24),
    NamedRange::new("25-27", 25, 27),
    NamedRange::new("28-30", 28, 30),
];

/// A named group of series computed together from the state of the simulation.
pub trait Collector: 'static {
    fn name(&self) -> &str;

    /// The names of the series, in the order `tabulate` returns their values.
    fn series_names(&self) -> Vec<String>;

    /// One value per series for the current state of `context`.
    fn tabulate(&self, context: &Context) -> Vec<usize>;
}

fn count_living(context: &Context, predicate: impl Fn(&Agent) -> bool) -> usize {
    context
        .get_agents()
        .iter()
        .filter(|agent| agent.state().is_alive() && predicate(agent))
        .count()
}

/// Number of agents in each infection state.
pub struct StateCollector;

impl Collector for StateCollector {
    fn name(&self) -> &str {
        "state"
    }

    fn series_names(&self) -> Vec<String> {
        InfectionState::iter().map(|state| state.to_string()).collect()
    }

    fn tabulate(&self, context: &Context) -> Vec<usize> {
        InfectionState::iter()
            .map(|state| context.count_agents_in_state(state))
            .collect()
    }
}

/// Living agents with and without a mask.
pub struct MaskCollector;

impl Collector for MaskCollector {
    fn name(&self) -> &str {
        "mask"
    }

    fn series_names(&self) -> Vec<String> {
        vec!["Wearing Mask".to_string(), "Not Wearing Mask".to_string()]
    }

    fn tabulate(&self, context: &Context) -> Vec<usize> {
        vec![
            count_living(context, Agent::wears_mask),
            count_living(context, |agent| !agent.wears_mask()),
        ]
    }
}

/// Living agents with and without a vaccination.
pub struct VaccinationCollector;

impl Collector for VaccinationCollector {
    fn name(&self) -> &str {
        "vaccination"
    }

    fn series_names(&self) -> Vec<String> {
        vec!["Vaccinated".to_string(), "Not Vaccinated".to_string()]
    }

    fn tabulate(&self, context: &Context) -> Vec<usize> {
        vec![
            count_living(context, Agent::is_vaccinated),
            count_living(context, |agent| !agent.is_vaccinated()),
        ]
    }
}

/// Living agents per ten-year age group.
pub struct AgeCollector;

impl Collector for AgeCollector {
    fn name(&self) -> &str {
        "age"
    }

    fn series_names(&self) -> Vec<String> {
        AGE_BUCKETS.iter().map(|bucket| bucket.name.to_string()).collect()
    }

    fn tabulate(&self, context: &Context) -> Vec<usize> {
        AGE_BUCKETS
            .iter()
            .map(|bucket| count_living(context, |agent| bucket.contains_real(agent.age())))
            .collect()
    }
}

/// Deaths so far, grouped by the number of ticks between infection and death. Deaths outside
/// every bucket are not shown.
pub struct DeathTimeCollector;

impl Collector for DeathTimeCollector {
    fn name(&self) -> &str {
        "death_time"
    }

    fn series_names(&self) -> Vec<String> {
        DEATH_TIME_BUCKETS
            .iter()
            .map(|bucket| bucket.name.to_string())
            .collect()
    }

    fn tabulate(&self, context: &Context) -> Vec<usize> {
        let frequencies = context.get_death_time_frequencies();
        DEATH_TIME_BUCKETS
            .iter()
            .map(|bucket| {
                frequencies
                    .range(bucket.min..=bucket.max)
                    .map(|(_, count)| count)
                    .sum::<usize>()
            })
            .collect()
    }
}

struct CollectorEntry {
    collector: Box<dyn Collector>,
    name: String,
    series_names: Vec<String>,
    // history[series][tick]
    history: Vec<Vec<usize>>,
}

#[derive(Default)]
struct StatisticsData {
    collectors: Vec<CollectorEntry>,
    death_time_frequencies: BTreeMap<usize, usize>,
}

impl StatisticsData {
    fn entry(&self, collector: &str) -> Option<&CollectorEntry> {
        self.collectors.iter().find(|entry| entry.name == collector)
    }
}

define_data_plugin!(StatisticsPlugin, StatisticsData, StatisticsData::default());

pub trait ContextStatisticsExt {
    /// Registers the built-in collectors.
    fn init_statistics(&mut self);

    /// Registers an additional collector. It takes part in every later snapshot.
    ///
    /// # Panics
    ///
    /// Panics if a collector with the same name is already registered.
    fn add_collector(&mut self, collector: Box<dyn Collector>);

    /// Evaluates every collector and records the result in the slot of the current tick,
    /// replacing an earlier snapshot of the same tick. Rows are also written to the statistics
    /// reports, if any are open.
    fn collect_statistics(&mut self);

    /// Records the death of an agent that was infected for `duration` ticks.
    fn register_death(&mut self, duration: usize);

    /// Number of deaths per infection duration.
    fn get_death_time_frequencies(&self) -> &BTreeMap<usize, usize>;

    /// The full recorded history of one series, indexed by tick. Empty for an unknown series.
    fn get_series(&self, collector: &str, series: &str) -> &[usize];

    /// The value of one series at `tick`; zero if nothing was recorded.
    fn get_statistic(&self, collector: &str, series: &str, tick: usize) -> usize;

    fn collector_names(&self) -> Vec<&str>;

    /// Series names of a collector in registration order. Empty for an unknown collector.
    fn series_names(&self, collector: &str) -> &[String];
}

impl ContextStatisticsExt for Context {
    fn init_statistics(&mut self) {
        self.add_collector(Box::new(StateCollector));
        self.add_collector(Box::new(MaskCollector));
        self.add_collector(Box::new(VaccinationCollector));
        self.add_collector(Box::new(AgeCollector));
        self.add_collector(Box::new(DeathTimeCollector));
    }

    fn add_collector(&mut self, collector: Box<dyn Collector>) {
        let name = collector.name().to_string();
        let series_names = collector.series_names();
        let data = self.get_data_mut(StatisticsPlugin);
        assert!(
            data.entry(&name).is_none(),
            "collector {name} is already registered"
        );
        trace!("registered collector {name} with {} series", series_names.len());
        data.collectors.push(CollectorEntry {
            collector,
            name,
            history: vec![Vec::new(); series_names.len()],
            series_names,
        });
    }

    fn collect_statistics(&mut self) {
        let tick = self.get_current_tick();
        let context: &Context = self;
        let snapshot: Vec<Vec<usize>> = match context.get_data_container(StatisticsPlugin) {
            Some(data) => data
                .collectors
                .iter()
                .map(|entry| entry.collector.tabulate(context))
                .collect(),
            None => return,
        };

        for (entry, values) in self
            .get_data_mut(StatisticsPlugin)
            .collectors
            .iter_mut()
            .zip(&snapshot)
        {
            for (history, value) in entry.history.iter_mut().zip(values) {
                if history.len() <= tick {
                    history.resize(tick + 1, 0);
                }
                history[tick] = *value;
            }
        }

        let data = self.get_data(StatisticsPlugin);
        for (entry, values) in data.collectors.iter().zip(&snapshot) {
            self.send_statistics(&entry.name, tick, &entry.series_names, values);
        }
    }

    fn register_death(&mut self, duration: usize) {
        *self
            .get_data_mut(StatisticsPlugin)
            .death_time_frequencies
            .entry(duration)
            .or_insert(0) += 1;
    }

    fn get_death_time_frequencies(&self) -> &BTreeMap<usize, usize> {
        static EMPTY: BTreeMap<usize, usize> = BTreeMap::new();
        match self.get_data_container(StatisticsPlugin) {
            Some(data) => &data.death_time_frequencies,
            None => &EMPTY,
        }
    }

    fn get_series(&self, collector: &str, series: &str) -> &[usize] {
        self.get_data_container(StatisticsPlugin)
            .and_then(|data| data.entry(collector))
            .and_then(|entry| {
                let index = entry.series_names.iter().position(|name| name == series)?;
                Some(entry.history[index].as_slice())
            })
            .unwrap_or_default()
    }

    fn get_statistic(&self, collector: &str, series: &str, tick: usize) -> usize {
        self.get_series(collector, series)
            .get(tick)
            .copied()
            .unwrap_or(0)
    }

    fn collector_names(&self) -> Vec<&str> {
        match self.get_data_container(StatisticsPlugin) {
            Some(data) => data
                .collectors
                .iter()
                .map(|entry| entry.name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    fn series_names(&self, collector: &str) -> &[String] {
        self.get_data_container(StatisticsPlugin)
            .and_then(|data| data.entry(collector))
            .map(|entry| entry.series_names.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentKind, InfectionEvent};
    use crate::grid::ContextGridExt;
    use crate::parameters::{ContextParametersExt, Parameters};
    use crate::random::ContextRandomExt;

    fn setup(num_agents: usize) -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context
            .set_parameters(Parameters {
                num_agents,
                start_infection_rate: 0.0,
                vaccine_batch_size: 0,
                ..Parameters::default()
            })
            .unwrap();
        context.init_grid();
        for _ in 0..num_agents {
            context.add_agent(AgentKind::Regular);
        }
        context.init_statistics();
        context
    }

    #[test]
    fn built_in_collectors_are_registered() {
        let context = setup(1);
        assert_eq!(
            context.collector_names(),
            vec!["state", "mask", "vaccination", "age", "death_time"]
        );
        assert_eq!(
            context.series_names("state"),
            &["Susceptible", "Infected", "Isolated", "Deceased", "Recovered"]
        );
        assert_eq!(context.series_names("age").len(), 10);
        assert!(context.series_names("unknown").is_empty());
    }

    #[test]
    fn state_counts_sum_to_population() {
        let mut context = setup(10);
        context.collect_statistics();
        let total: usize = context
            .series_names("state")
            .iter()
            .map(|series| context.get_statistic("state", series, 0))
            .sum();
        assert_eq!(total, 10);
        assert_eq!(context.get_statistic("state", "Susceptible", 0), 10);
    }

    #[test]
    fn snapshot_of_same_tick_overwrites() {
        let mut context = setup(4);
        context.collect_statistics();
        let first = context.get_agents()[0].id();
        context.apply_infection_event(first, InfectionEvent::Infection);
        context.collect_statistics();
        assert_eq!(context.get_series("state", "Infected"), &[1]);

        context.advance_tick();
        context.collect_statistics();
        assert_eq!(context.get_series("state", "Infected"), &[1, 1]);
    }

    #[test]
    fn unrecorded_statistics_read_as_zero() {
        let context = setup(3);
        assert_eq!(context.get_statistic("state", "Susceptible", 5), 0);
        assert_eq!(context.get_statistic("nope", "Susceptible", 0), 0);
        assert!(context.get_series("state", "nope").is_empty());
    }

    #[test]
    fn living_collectors_skip_the_dead() {
        let mut context = setup(5);
        let first = context.get_agents()[0].id();
        context.apply_infection_event(first, InfectionEvent::Infection);
        context.apply_infection_event(first, InfectionEvent::Death);
        context.collect_statistics();

        let masks = context.get_statistic("mask", "Wearing Mask", 0)
            + context.get_statistic("mask", "Not Wearing Mask", 0);
        assert_eq!(masks, 4);
        assert_eq!(context.get_statistic("vaccination", "Not Vaccinated", 0), 4);
        let ages: usize = AGE_BUCKETS
            .iter()
            .map(|bucket| context.get_statistic("age", bucket.name, 0))
            .sum();
        assert_eq!(ages, 4);
    }

    #[test]
    fn age_buckets_are_half_open_decades() {
        assert!(AGE_BUCKETS[0].contains_real(9.99));
        assert!(!AGE_BUCKETS[0].contains_real(10.0));
        assert!(AGE_BUCKETS[9].contains_real(99.0));
        assert!(AGE_BUCKETS[1].contains_real(10.0));
    }

    #[test]
    fn death_times_are_bucketed_cumulatively() {
        let mut context = setup(1);
        for duration in [0, 2, 3, 4, 30, 31] {
            context.register_death(duration);
        }
        context.register_death(3);
        assert_eq!(context.get_death_time_frequencies().get(&3), Some(&2));

        context.collect_statistics();
        assert_eq!(context.get_statistic("death_time", "1-3", 0), 3);
        assert_eq!(context.get_statistic("death_time", "4-6", 0), 1);
        assert_eq!(context.get_statistic("death_time", "28-30", 0), 1);

        context.advance_tick();
        context.collect_statistics();
        assert_eq!(context.get_statistic("death_time", "1-3", 1), 3);
    }

    struct InfectedMedics;

    impl Collector for InfectedMedics {
        fn name(&self) -> &str {
            "infected_medics"
        }

        fn series_names(&self) -> Vec<String> {
            vec!["count".to_string()]
        }

        fn tabulate(&self, context: &Context) -> Vec<usize> {
            let count = context
                .get_agents()
                .iter()
                .filter(|agent| agent.is_medic() && agent.state() == InfectionState::Infected)
                .count();
            vec![count]
        }
    }

    #[test]
    fn custom_collector_takes_part_in_snapshots() {
        let mut context = setup(2);
        context.add_collector(Box::new(InfectedMedics));
        let medic = context.add_agent(AgentKind::Medic);
        context.apply_infection_event(medic, InfectionEvent::Infection);
        context.collect_statistics();
        assert_eq!(context.get_statistic("infected_medics", "count", 0), 1);
    }

    #[test]
    #[should_panic(expected = "collector state is already registered")]
    fn duplicate_collector_panics() {
        let mut context = setup(1);
        context.add_collector(Box::new(StateCollector));
    }
}
