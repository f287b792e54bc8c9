#![deny(warnings)]

//! Simulation facade: one `Config` in, one complete `Outputs` out.
//!
//! The facade validates the config, runs the projection and derives every
//! downstream view (KPIs, sensitivity grid, insights, SWOT, alert) from that
//! single projection so all consumers agree on the same numbers.

use serde::{Deserialize, Serialize};
use sim_core::{AlertLevel, Config, ConfigError, Outputs, Preset, Scenario};
use thiserror::Error;
use tracing::debug;

/// Seed used by [`run`] for volatile seasonality.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error, PartialEq)]
pub enum RunError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Run a simulation with the default seed.
pub fn run(config: &Config) -> Result<Outputs, RunError> {
    run_with_seed(config, DEFAULT_SEED)
}

/// Run a simulation. Identical `(config, seed)` pairs produce identical outputs.
pub fn run_with_seed(config: &Config, seed: u64) -> Result<Outputs, RunError> {
    config.validate()?;

    let projection = sim_econ::project(config, seed);
    let kpis = sim_econ::compute_kpis(config, &projection);
    let sensitivity = sim_econ::analyze_sensitivity(config, &projection);
    let (insights, swot) = sim_insights::generate(config, &kpis);
    let alert = sim_insights::evaluate_alert(kpis.cash_floor, kpis.runway_months);

    debug!(
        seed,
        seasonality = %config.seasonality,
        total_revenue = kpis.total_revenue,
        total_net = kpis.total_net,
        cash_floor = kpis.cash_floor,
        alert = %alert.level,
        "simulation run"
    );

    Ok(Outputs {
        month_one_snapshot: projection.month_one,
        kpis,
        sensitivity,
        insights,
        swot,
        alert,
        ledger: projection.ledger,
        seed,
    })
}

/// Caller-owned pairing of the current config and its outputs.
///
/// Every change replaces the config and recomputes the outputs wholesale. A
/// rejected config leaves the session untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSession {
    config: Config,
    outputs: Outputs,
    seed: u64,
}

impl SimulationSession {
    pub fn new(config: Config) -> Result<Self, RunError> {
        Self::with_seed(config, DEFAULT_SEED)
    }

    pub fn with_seed(config: Config, seed: u64) -> Result<Self, RunError> {
        let outputs = run_with_seed(&config, seed)?;
        Ok(Self {
            config,
            outputs,
            seed,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Replace the config and recompute.
    pub fn update(&mut self, config: Config) -> Result<&Outputs, RunError> {
        let outputs = run_with_seed(&config, self.seed)?;
        self.config = config;
        self.outputs = outputs;
        Ok(&self.outputs)
    }

    /// Overlay a preset on the current config and recompute.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<&Outputs, RunError> {
        let config = preset.apply(&self.config)?;
        self.update(config)
    }

    /// Replace the current config with a stored scenario's config.
    pub fn load(&mut self, scenario: &Scenario) -> Result<&Outputs, RunError> {
        self.update(scenario.config)
    }
}

/// Headline figures for one scenario in a comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub name: String,
    pub total_revenue: f64,
    pub total_net: f64,
    pub roi_pct: f64,
    pub cash_floor: f64,
    pub alert: AlertLevel,
}

impl ScenarioSummary {
    fn from_outputs(name: &str, outputs: &Outputs) -> Self {
        Self {
            name: name.to_string(),
            total_revenue: outputs.kpis.total_revenue,
            total_net: outputs.kpis.total_net,
            roi_pct: outputs.kpis.roi_pct,
            cash_floor: outputs.kpis.cash_floor,
            alert: outputs.alert.level,
        }
    }
}

/// Run each named config independently and summarize, preserving input order.
pub fn compare(
    scenarios: &[(String, Config)],
    seed: u64,
) -> Vec<Result<ScenarioSummary, RunError>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = scenarios
            .iter()
            .map(|(name, config)| {
                scope.spawn(move || {
                    run_with_seed(config, seed).map(|o| ScenarioSummary::from_outputs(name, &o))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}
