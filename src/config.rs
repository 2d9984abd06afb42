use crate::error::{HeuristicGenError, HgResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub model: ModelParams,
    #[command(flatten)]
    pub fitness: FitnessParams,
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub battery: BatteryParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Maximum expression depth during sampling (at least 2).
    #[arg(long, default_value_t = 6)]
    pub max_depth: usize,
    #[arg(long, default_value_t = 4)]
    pub tournament_size: usize,
    /// Probability of picking a rule from the learned weights instead of uniformly.
    #[arg(long, default_value_t = 0.5)]
    pub mixture_weight_for_rules: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            tournament_size: 4,
            mixture_weight_for_rules: 0.5,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessParams {
    /// Program length above which the length penalty applies.
    #[arg(long, default_value_t = 12)]
    pub penalty_activation_program_length: usize,
    #[arg(long, default_value_t = 0.01)]
    pub program_length_penalty: f64,
}

impl Default for FitnessParams {
    fn default() -> Self {
        Self {
            penalty_activation_program_length: 12,
            program_length_penalty: 0.01,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 1000)]
    pub iterations: u64,
    /// Regenerate the graph battery every N iterations.
    #[arg(long, default_value_t = 100)]
    pub graph_change_period: u64,
    #[arg(long, default_value_t = 64)]
    pub population_size: usize,
    #[arg(long, default_value_t = 10)]
    pub checkpoint_period: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            graph_change_period: 100,
            population_size: 64,
            checkpoint_period: 10,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryParams {
    #[arg(long, default_value_t = 1000)]
    pub node_count: usize,
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.01, 0.02, 0.03, 0.04, 0.05])]
    pub erdos_renyi_probabilities: Vec<f64>,
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = vec![-1.1, -1.25, -1.5, -2.0, -2.5])]
    pub chung_lu_exponents: Vec<f64>,
    #[arg(long, default_value_t = 5)]
    pub chung_lu_min_degree: usize,
    #[arg(long, default_value_t = 100)]
    pub chung_lu_max_degree: usize,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            node_count: 1000,
            erdos_renyi_probabilities: vec![0.01, 0.02, 0.03, 0.04, 0.05],
            chung_lu_exponents: vec![-1.1, -1.25, -1.5, -2.0, -2.5],
            chung_lu_min_degree: 5,
            chung_lu_max_degree: 100,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> HgResult<()> {
        if self.max_depth < 2 {
            return Err(HeuristicGenError::Config(format!(
                "max_depth must be at least 2 (got {})",
                self.max_depth
            )));
        }
        if self.tournament_size < 1 {
            return Err(HeuristicGenError::Config(
                "tournament_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mixture_weight_for_rules) {
            return Err(HeuristicGenError::Config(format!(
                "mixture_weight_for_rules must lie in [0, 1] (got {})",
                self.mixture_weight_for_rules
            )));
        }
        Ok(())
    }
}

impl FitnessParams {
    pub fn validate(&self) -> HgResult<()> {
        if !(self.program_length_penalty >= 0.0) {
            return Err(HeuristicGenError::Config(format!(
                "program_length_penalty must be non-negative (got {})",
                self.program_length_penalty
            )));
        }
        Ok(())
    }
}

impl SearchParams {
    pub fn validate(&self) -> HgResult<()> {
        let positive = [
            ("iterations", self.iterations),
            ("graph_change_period", self.graph_change_period),
            ("population_size", self.population_size as u64),
            ("checkpoint_period", self.checkpoint_period),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(HeuristicGenError::Config(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl BatteryParams {
    pub fn validate(&self) -> HgResult<()> {
        if self.erdos_renyi_probabilities.is_empty() && self.chung_lu_exponents.is_empty() {
            return Err(HeuristicGenError::Config(
                "The graph battery is empty".to_string(),
            ));
        }
        if let Some(p) = self
            .erdos_renyi_probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(HeuristicGenError::Config(format!(
                "Edge probability {} is outside [0, 1]",
                p
            )));
        }
        if let Some(e) = self.chung_lu_exponents.iter().find(|e| **e >= -1.0) {
            return Err(HeuristicGenError::Config(format!(
                "Chung-Lu exponent {} must be less than -1",
                e
            )));
        }
        if self.chung_lu_min_degree < 1 || self.chung_lu_min_degree > self.chung_lu_max_degree {
            return Err(HeuristicGenError::Config(format!(
                "Invalid Chung-Lu degree range {}..{}",
                self.chung_lu_min_degree, self.chung_lu_max_degree
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> HgResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> HgResult<()> {
        self.model.validate()?;
        self.fitness.validate()?;
        self.search.validate()?;
        self.battery.validate()
    }

    /// Copies every flag the user typed explicitly from `cli` onto `self`.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(model.max_depth);
        update_if_present!(model.tournament_size);
        update_if_present!(model.mixture_weight_for_rules);

        update_if_present!(fitness.penalty_activation_program_length);
        update_if_present!(fitness.program_length_penalty);

        update_if_present!(search.iterations);
        update_if_present!(search.graph_change_period);
        update_if_present!(search.population_size);
        update_if_present!(search.checkpoint_period);

        update_if_present!(battery.node_count);
        update_if_present!(battery.erdos_renyi_probabilities);
        update_if_present!(battery.chung_lu_exponents);
        update_if_present!(battery.chung_lu_min_degree);
        update_if_present!(battery.chung_lu_max_degree);
    }
}
