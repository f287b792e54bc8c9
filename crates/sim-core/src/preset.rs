//! Built-in business presets applied as partial overrides of a `Config`.

use crate::{Config, ConfigDraft, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Saas,
    Ecommerce,
    Restaurant,
    Agency,
    Manufacturing,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Saas,
        Preset::Ecommerce,
        Preset::Restaurant,
        Preset::Agency,
        Preset::Manufacturing,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Preset::Saas => "saas",
            Preset::Ecommerce => "ecommerce",
            Preset::Restaurant => "restaurant",
            Preset::Agency => "agency",
            Preset::Manufacturing => "manufacturing",
        }
    }

    /// Fields this preset replaces.
    pub fn overrides(self) -> ConfigDraft {
        let seasonality = |s: &str| Some(s.to_string());
        match self {
            Preset::Saas => ConfigDraft {
                investment: Some(100_000.0),
                fixed_costs: Some(8_000.0),
                marketing: Some(4_000.0),
                margin: Some(80.0),
                demand: Some(15.0),
                growth: Some(8.0),
                risk: Some(5.0),
                customers: Some(250),
                employees: Some(6),
                seasonality: seasonality("linear"),
                ..ConfigDraft::default()
            },
            Preset::Ecommerce => ConfigDraft {
                investment: Some(60_000.0),
                fixed_costs: Some(3_000.0),
                marketing: Some(5_000.0),
                margin: Some(35.0),
                demand: Some(60.0),
                growth: Some(4.0),
                risk: Some(8.0),
                customers: Some(1_500),
                employees: Some(4),
                seasonality: seasonality("seasonal"),
                ..ConfigDraft::default()
            },
            Preset::Restaurant => ConfigDraft {
                investment: Some(150_000.0),
                fixed_costs: Some(12_000.0),
                marketing: Some(1_500.0),
                margin: Some(65.0),
                demand: Some(30.0),
                growth: Some(1.0),
                risk: Some(12.0),
                loan_amount: Some(80_000.0),
                interest_rate: Some(7.5),
                customers: Some(3_000),
                employees: Some(14),
                seasonality: seasonality("seasonal"),
                ..ConfigDraft::default()
            },
            Preset::Agency => ConfigDraft {
                investment: Some(25_000.0),
                fixed_costs: Some(6_000.0),
                marketing: Some(800.0),
                margin: Some(55.0),
                demand: Some(70.0),
                growth: Some(3.0),
                risk: Some(6.0),
                customers: Some(12),
                employees: Some(5),
                seasonality: seasonality("linear"),
                ..ConfigDraft::default()
            },
            Preset::Manufacturing => ConfigDraft {
                investment: Some(400_000.0),
                fixed_costs: Some(25_000.0),
                marketing: Some(3_000.0),
                margin: Some(30.0),
                demand: Some(25.0),
                growth: Some(2.0),
                risk: Some(18.0),
                loan_amount: Some(250_000.0),
                interest_rate: Some(9.0),
                customers: Some(40),
                employees: Some(35),
                seasonality: seasonality("volatile"),
                ..ConfigDraft::default()
            },
        }
    }

    /// A new `Config` with this preset's fields replacing those of `base`.
    pub fn apply(self, base: &Config) -> Result<Config, ConfigError> {
        self.overrides().overlay(base)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Preset::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Seasonality;

    #[test]
    fn every_preset_yields_valid_config() {
        for p in Preset::ALL {
            let c = p.apply(&Config::default()).unwrap();
            assert!(c.validate().is_ok(), "{p} invalid");
        }
    }

    #[test]
    fn preset_keeps_untouched_fields() {
        let base = Config {
            tax: 21.0,
            ..Config::default()
        };
        let c = Preset::Saas.apply(&base).unwrap();
        assert_eq!(c.tax, 21.0);
        assert_eq!(c.margin, 80.0);
        let c = Preset::Manufacturing.apply(&base).unwrap();
        assert_eq!(c.seasonality, Seasonality::Volatile);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("SaaS".parse::<Preset>().unwrap(), Preset::Saas);
        assert_eq!(
            "bakery".parse::<Preset>(),
            Err(ConfigError::UnknownPreset("bakery".into()))
        );
    }
}
