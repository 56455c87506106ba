//! The configuration record of a simulation.
//!
//! `Parameters` holds every tunable value of the model. It deserializes from JSON with
//! snake_case field names; fields missing from the file keep their defaults. A record is
//! validated when it is stored in the `Context`, which is the only way the model reads it.
use std::fs;
use std::path::Path;

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::EpigridError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub num_agents: usize,
    pub num_traveling_agents: usize,
    pub num_medic_agents: usize,
    pub width: usize,
    pub height: usize,
    pub infection_rate: f64,
    pub death_rate: f64,
    pub start_infection_rate: f64,
    pub wear_mask_chance: f64,
    pub mask_effectiveness: f64,
    pub recovery_time_multiplier: f64,
    pub social_distance: usize,
    pub social_distance_chance: f64,
    pub isolation_duration: usize,
    pub isolation_chance: f64,
    pub curing_chance: f64,
    pub vaccine_ready_time: usize,
    pub vaccine_batch_size: usize,
    pub vaccine_effectiveness: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            num_agents: 100,
            num_traveling_agents: 0,
            num_medic_agents: 0,
            width: 15,
            height: 15,
            infection_rate: 0.7,
            death_rate: 0.02,
            start_infection_rate: 0.05,
            wear_mask_chance: 0.5,
            mask_effectiveness: 0.4,
            recovery_time_multiplier: 1.0,
            social_distance: 0,
            social_distance_chance: 0.5,
            isolation_duration: 7,
            isolation_chance: 0.1,
            curing_chance: 0.5,
            vaccine_ready_time: 15,
            vaccine_batch_size: 10,
            vaccine_effectiveness: 0.5,
        }
    }
}

/// The recommended interval of a tunable parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    const fn new(name: &'static str, min: f64, max: f64) -> Self {
        ParameterRange { name, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Recommended ranges for the parameters an interactive front end exposes as sliders.
pub const PARAMETER_RANGES: [ParameterRange; 17] = [
    ParameterRange::new("num_agents", 10.0, 1000.0),
    ParameterRange::new("num_traveling_agents", 0.0, 100.0),
    ParameterRange::new("num_medic_agents", 0.0, 100.0),
    ParameterRange::new("infection_rate", 0.1, 1.0),
    ParameterRange::new("death_rate", 0.01, 0.5),
    ParameterRange::new("start_infection_rate", 0.01, 0.2),
    ParameterRange::new("wear_mask_chance", 0.0, 1.0),
    ParameterRange::new("mask_effectiveness", 0.0, 1.0),
    ParameterRange::new("recovery_time_multiplier", 0.1, 5.0),
    ParameterRange::new("social_distance", 0.0, 5.0),
    ParameterRange::new("social_distance_chance", 0.0, 1.0),
    ParameterRange::new("isolation_duration", 0.0, 30.0),
    ParameterRange::new("isolation_chance", 0.0, 1.0),
    ParameterRange::new("curing_chance", 0.0, 1.0),
    ParameterRange::new("vaccine_ready_time", 0.0, 40.0),
    ParameterRange::new("vaccine_batch_size", 0.0, 100.0),
    ParameterRange::new("vaccine_effectiveness", 0.0, 1.0),
];

impl Parameters {
    /// Total number of agents across the regular, traveling and medic populations.
    pub fn total_population(&self) -> usize {
        self.num_agents + self.num_traveling_agents + self.num_medic_agents
    }

    /// Looks up a numeric parameter by its field name.
    #[allow(clippy::cast_precision_loss)]
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "num_agents" => self.num_agents as f64,
            "num_traveling_agents" => self.num_traveling_agents as f64,
            "num_medic_agents" => self.num_medic_agents as f64,
            "width" => self.width as f64,
            "height" => self.height as f64,
            "infection_rate" => self.infection_rate,
            "death_rate" => self.death_rate,
            "start_infection_rate" => self.start_infection_rate,
            "wear_mask_chance" => self.wear_mask_chance,
            "mask_effectiveness" => self.mask_effectiveness,
            "recovery_time_multiplier" => self.recovery_time_multiplier,
            "social_distance" => self.social_distance as f64,
            "social_distance_chance" => self.social_distance_chance,
            "isolation_duration" => self.isolation_duration as f64,
            "isolation_chance" => self.isolation_chance,
            "curing_chance" => self.curing_chance,
            "vaccine_ready_time" => self.vaccine_ready_time as f64,
            "vaccine_batch_size" => self.vaccine_batch_size as f64,
            "vaccine_effectiveness" => self.vaccine_effectiveness,
            _ => return None,
        };
        Some(value)
    }

    /// Names of the parameters whose value lies outside its recommended range.
    pub fn out_of_range(&self) -> Vec<&'static str> {
        PARAMETER_RANGES
            .iter()
            .filter(|range| self.get(range.name).is_some_and(|value| !range.contains(value)))
            .map(|range| range.name)
            .collect()
    }

    fn probabilities(&self) -> [(&'static str, f64); 9] {
        [
            ("infection_rate", self.infection_rate),
            ("death_rate", self.death_rate),
            ("start_infection_rate", self.start_infection_rate),
            ("wear_mask_chance", self.wear_mask_chance),
            ("mask_effectiveness", self.mask_effectiveness),
            ("social_distance_chance", self.social_distance_chance),
            ("isolation_chance", self.isolation_chance),
            ("curing_chance", self.curing_chance),
            ("vaccine_effectiveness", self.vaccine_effectiveness),
        ]
    }

    /// Checks that the record describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns `EpigridError::ConfigError` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), EpigridError> {
        if self.width == 0 || self.height == 0 {
            return Err(EpigridError::ConfigError(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        for (name, value) in self.probabilities() {
            if !(0.0..=1.0).contains(&value) {
                return Err(EpigridError::ConfigError(format!(
                    "{name} must be a probability in [0, 1], got {value}"
                )));
            }
        }
        if !self.recovery_time_multiplier.is_finite() || self.recovery_time_multiplier < 0.0 {
            return Err(EpigridError::ConfigError(format!(
                "recovery_time_multiplier must be finite and non-negative, got {}",
                self.recovery_time_multiplier
            )));
        }
        Ok(())
    }
}

/// Reads a `Parameters` record from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid parameters document.
pub fn load_parameters(path: &Path) -> Result<Parameters, EpigridError> {
    trace!("loading parameters from {}", path.display());
    let data = fs::read_to_string(path)?;
    let parameters: Parameters = serde_json::from_str(&data)?;
    Ok(parameters)
}

define_data_plugin!(ParametersPlugin, Option<Parameters>, None);

pub trait ContextParametersExt {
    /// Validates `parameters` and makes them the parameters of this simulation.
    ///
    /// # Errors
    ///
    /// Returns `EpigridError::ConfigError` if validation fails. The previously stored
    /// parameters, if any, are kept.
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), EpigridError>;

    /// # Panics
    ///
    /// Panics if no parameters have been set.
    fn get_parameters(&self) -> &Parameters;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), EpigridError> {
        parameters.validate()?;
        for name in parameters.out_of_range() {
            warn!(
                "parameter {name} = {} is outside its recommended range",
                parameters.get(name).unwrap_or_default()
            );
        }
        *self.get_data_mut(ParametersPlugin) = Some(parameters);
        Ok(())
    }

    fn get_parameters(&self) -> &Parameters {
        self.get_data_container(ParametersPlugin)
            .and_then(Option::as_ref)
            .expect("Parameters have not been set")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_are_valid_and_in_range() {
        let parameters = Parameters::default();
        assert!(parameters.validate().is_ok());
        assert!(parameters.out_of_range().is_empty());
    }

    #[test]
    fn zero_width_is_rejected() {
        let parameters = Parameters {
            width: 0,
            ..Parameters::default()
        };
        assert!(matches!(
            parameters.validate(),
            Err(EpigridError::ConfigError(_))
        ));
    }

    #[test]
    fn probability_above_one_is_rejected() {
        let parameters = Parameters {
            curing_chance: 1.5,
            ..Parameters::default()
        };
        match parameters.validate() {
            Err(EpigridError::ConfigError(message)) => assert!(message.contains("curing_chance")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn nan_probability_is_rejected() {
        let parameters = Parameters {
            infection_rate: f64::NAN,
            ..Parameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn oversized_vaccine_batch_is_valid() {
        // Only deploying such a batch fails.
        let parameters = Parameters {
            num_agents: 5,
            vaccine_batch_size: 6,
            ..Parameters::default()
        };
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn out_of_range_reports_names() {
        let parameters = Parameters {
            num_agents: 2,
            social_distance: 9,
            ..Parameters::default()
        };
        assert_eq!(
            parameters.out_of_range(),
            vec!["num_agents", "social_distance"]
        );
    }

    #[test]
    fn load_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "num_agents": 42, "infection_rate": 0.25 }}"#).unwrap();
        let parameters = load_parameters(file.path()).unwrap();
        assert_eq!(parameters.num_agents, 42);
        assert_eq!(parameters.infection_rate, 0.25);
        assert_eq!(parameters.width, Parameters::default().width);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "num_agnets": 42 }}"#).unwrap();
        assert!(matches!(
            load_parameters(file.path()),
            Err(EpigridError::JsonError(_))
        ));
    }

    #[test]
    fn load_rejects_negative_counts() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "num_medic_agents": -1 }}"#).unwrap();
        assert!(load_parameters(file.path()).is_err());
    }

    #[test]
    fn set_and_get_parameters() {
        let mut context = Context::new();
        let parameters = Parameters {
            num_agents: 12,
            ..Parameters::default()
        };
        context.set_parameters(parameters.clone()).unwrap();
        assert_eq!(context.get_parameters(), &parameters);
    }

    #[test]
    fn set_invalid_parameters_keeps_previous() {
        let mut context = Context::new();
        context.set_parameters(Parameters::default()).unwrap();
        let invalid = Parameters {
            height: 0,
            ..Parameters::default()
        };
        assert!(context.set_parameters(invalid).is_err());
        assert_eq!(context.get_parameters(), &Parameters::default());
    }

    #[test]
    #[should_panic(expected = "Parameters have not been set")]
    fn get_parameters_before_set_panics() {
        let context = Context::new();
        context.get_parameters();
    }
}
