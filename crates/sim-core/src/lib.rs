#![deny(warnings)]

//! Core domain models and invariants for Profit Pilot.
//!
//! This crate defines the serializable input parameter set ([`Config`]), the
//! records a simulation run produces ([`Outputs`] and friends) and the
//! validation helpers that guarantee a `Config` is in range before any
//! computation starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

mod outputs;
mod preset;

pub use outputs::*;
pub use preset::Preset;

/// Number of simulated periods in one projection.
pub const MONTHS: usize = 12;

/// Largest money amount (and projected monthly revenue) a config may carry.
/// Keeps every ledger figure and 12-month total finite.
pub const MAX_AMOUNT: f64 = 1e15;

/// Largest revenue multiplier any seasonality pattern produces.
pub const PEAK_SEASONAL_MULTIPLIER: f64 = 1.5;

/// Monthly revenue pattern applied on top of compounding growth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seasonality {
    /// Flat multiplier of 1.
    #[default]
    Linear,
    /// Sinusoidal yearly cycle, ±30%.
    Seasonal,
    /// Seeded uniform noise in [0.8, 1.2).
    Volatile,
    /// Launch spike that fades exponentially.
    Decaying,
}

impl Seasonality {
    pub const ALL: [Seasonality; 4] = [
        Seasonality::Linear,
        Seasonality::Seasonal,
        Seasonality::Volatile,
        Seasonality::Decaying,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Seasonality::Linear => "linear",
            Seasonality::Seasonal => "seasonal",
            Seasonality::Volatile => "volatile",
            Seasonality::Decaying => "decaying",
        }
    }

    /// Parse a seasonality key, falling back to `Linear` for anything unknown
    /// so the recompute path stays total.
    pub fn from_key_lenient(key: &str) -> Seasonality {
        let key = key.trim();
        Seasonality::ALL
            .into_iter()
            .find(|s| s.key().eq_ignore_ascii_case(key))
            .unwrap_or_else(|| {
                warn!(seasonality = key, "unknown seasonality, using linear");
                Seasonality::Linear
            })
    }
}

impl fmt::Display for Seasonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

/// Immutable parameter set for one simulation run.
///
/// Percent fields are expressed on a 0–100 scale. Deserialization goes through
/// [`ConfigDraft`], so a `Config` read from JSON or YAML is always validated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConfigDraft")]
pub struct Config {
    /// Upfront capital in currency units (>= 0).
    pub investment: f64,
    /// Fixed monthly operating cost (>= 0).
    pub fixed_costs: f64,
    /// Monthly marketing spend (>= 0).
    pub marketing: f64,
    /// Gross margin percent on revenue, [0, 100].
    pub margin: f64,
    /// Percent of investment realized as baseline monthly revenue, [0, 100].
    pub demand: f64,
    /// Compounding monthly revenue growth in percent (>= 0).
    pub growth: f64,
    /// Percent of gross profit lost to risk and wastage, [0, 100].
    pub risk: f64,
    /// Borrowed capital (>= 0).
    pub loan_amount: f64,
    /// Annual interest rate in percent (>= 0).
    pub interest_rate: f64,
    /// Tax percent on positive pre-tax income, [0, 100].
    pub tax: f64,
    /// Customer count (>= 1).
    pub customers: u32,
    /// Head count.
    pub employees: u32,
    pub seasonality: Seasonality,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            investment: 50_000.0,
            fixed_costs: 2_000.0,
            marketing: 1_000.0,
            margin: 25.0,
            demand: 70.0,
            growth: 5.0,
            risk: 10.0,
            loan_amount: 0.0,
            interest_rate: 10.0,
            tax: 15.0,
            customers: 100,
            employees: 0,
            seasonality: Seasonality::Linear,
        }
    }
}

impl Config {
    /// Check every field against its declared domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("investment", self.investment),
            ("fixedCosts", self.fixed_costs),
            ("marketing", self.marketing),
            ("growth", self.growth),
            ("loanAmount", self.loan_amount),
            ("interestRate", self.interest_rate),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        for (field, value) in [
            ("investment", self.investment),
            ("fixedCosts", self.fixed_costs),
            ("marketing", self.marketing),
            ("loanAmount", self.loan_amount),
        ] {
            if value > MAX_AMOUNT {
                return Err(ConfigError::TooLarge { field, value });
            }
        }
        let percents = [
            ("margin", self.margin),
            ("demand", self.demand),
            ("risk", self.risk),
            ("tax", self.tax),
        ];
        for (field, value) in percents {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.customers == 0 {
            return Err(ConfigError::NoCustomers);
        }
        for (field, value) in [
            ("peak monthly revenue", self.peak_revenue_bound()),
            ("monthly interest", self.monthly_interest()),
        ] {
            if value.is_nan() || value > MAX_AMOUNT {
                return Err(ConfigError::TooLarge { field, value });
            }
        }
        Ok(())
    }

    /// Upper bound on any month's revenue: base revenue at the last month's
    /// growth, times the largest seasonal multiplier.
    pub fn peak_revenue_bound(&self) -> f64 {
        let growth = (1.0 + self.growth / 100.0).powi(MONTHS as i32 - 1);
        self.investment * (self.demand / 100.0) * growth * PEAK_SEASONAL_MULTIPLIER
    }

    /// Flat monthly debt service: annual interest on the loan spread over 12 months.
    pub fn monthly_interest(&self) -> f64 {
        (self.loan_amount * self.interest_rate / 100.0) / 12.0
    }

    /// Fixed monthly operating expenses.
    pub fn opex(&self) -> f64 {
        self.fixed_costs + self.marketing
    }

    /// Cash position before month 1.
    pub fn opening_cash(&self) -> f64 {
        -self.investment + self.loan_amount
    }
}

/// Loosely-typed form of [`Config`] where every field is optional.
///
/// Used for file input, stored scenarios and preset overlays. Unset numeric
/// fields default to 0, except `customers` which must be present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigDraft {
    pub investment: Option<f64>,
    pub fixed_costs: Option<f64>,
    pub marketing: Option<f64>,
    pub margin: Option<f64>,
    pub demand: Option<f64>,
    pub growth: Option<f64>,
    pub risk: Option<f64>,
    pub loan_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub tax: Option<f64>,
    pub customers: Option<u32>,
    pub employees: Option<u32>,
    pub seasonality: Option<String>,
}

impl ConfigDraft {
    /// Apply defaults and validate.
    pub fn build(self) -> Result<Config, ConfigError> {
        let customers = self.customers.ok_or(ConfigError::MissingField("customers"))?;
        let config = Config {
            investment: self.investment.unwrap_or(0.0),
            fixed_costs: self.fixed_costs.unwrap_or(0.0),
            marketing: self.marketing.unwrap_or(0.0),
            margin: self.margin.unwrap_or(0.0),
            demand: self.demand.unwrap_or(0.0),
            growth: self.growth.unwrap_or(0.0),
            risk: self.risk.unwrap_or(0.0),
            loan_amount: self.loan_amount.unwrap_or(0.0),
            interest_rate: self.interest_rate.unwrap_or(0.0),
            tax: self.tax.unwrap_or(0.0),
            customers,
            employees: self.employees.unwrap_or(0),
            seasonality: self
                .seasonality
                .as_deref()
                .map(Seasonality::from_key_lenient)
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Produce a new `Config` where every field set in this draft replaces the
    /// corresponding field of `base`.
    pub fn overlay(&self, base: &Config) -> Result<Config, ConfigError> {
        let config = Config {
            investment: self.investment.unwrap_or(base.investment),
            fixed_costs: self.fixed_costs.unwrap_or(base.fixed_costs),
            marketing: self.marketing.unwrap_or(base.marketing),
            margin: self.margin.unwrap_or(base.margin),
            demand: self.demand.unwrap_or(base.demand),
            growth: self.growth.unwrap_or(base.growth),
            risk: self.risk.unwrap_or(base.risk),
            loan_amount: self.loan_amount.unwrap_or(base.loan_amount),
            interest_rate: self.interest_rate.unwrap_or(base.interest_rate),
            tax: self.tax.unwrap_or(base.tax),
            customers: self.customers.unwrap_or(base.customers),
            employees: self.employees.unwrap_or(base.employees),
            seasonality: self
                .seasonality
                .as_deref()
                .map(Seasonality::from_key_lenient)
                .unwrap_or(base.seasonality),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<Config> for ConfigDraft {
    fn from(c: Config) -> Self {
        Self {
            investment: Some(c.investment),
            fixed_costs: Some(c.fixed_costs),
            marketing: Some(c.marketing),
            margin: Some(c.margin),
            demand: Some(c.demand),
            growth: Some(c.growth),
            risk: Some(c.risk),
            loan_amount: Some(c.loan_amount),
            interest_rate: Some(c.interest_rate),
            tax: Some(c.tax),
            customers: Some(c.customers),
            employees: Some(c.employees),
            seasonality: Some(c.seasonality.key().to_string()),
        }
    }
}

impl TryFrom<ConfigDraft> for Config {
    type Error = ConfigError;

    fn try_from(draft: ConfigDraft) -> Result<Self, Self::Error> {
        draft.build()
    }
}

/// A named, stored `Config` snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: i64,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub config: Config,
}

/// Reasons a `Config` is rejected before projection.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be within [0, 100], got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("{field} must not exceed 1e15, got {value:e}")]
    TooLarge { field: &'static str, value: f64 },
    #[error("customers must be at least 1")]
    NoCustomers,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}
