//! Margin × demand sensitivity grid.

use crate::projector::{growth_factor, month_pnl, monthly_revenue, Projection};
use sim_core::{Config, Delta, SensitivityGrid};

/// Single-month net profit for each margin/demand perturbation.
///
/// Uses month-1 growth and the seasonal multiplier the projection drew for
/// month 1, so the centre cell equals `projection.ledger[0].net_profit`.
pub fn analyze_sensitivity(config: &Config, projection: &Projection) -> SensitivityGrid {
    let multiplier = projection.ledger[0].seasonal_multiplier;
    let growth = growth_factor(config.growth, 1);
    SensitivityGrid::from_fn(|margin_delta, demand_delta| {
        let perturbed = perturb(config, margin_delta, demand_delta);
        let revenue = monthly_revenue(&perturbed, growth, multiplier);
        month_pnl(&perturbed, revenue).net
    })
}

fn perturb(config: &Config, margin_delta: Delta, demand_delta: Delta) -> Config {
    Config {
        demand: config.demand * (1.0 + demand_delta.fraction()),
        margin: (config.margin * (1.0 + margin_delta.fraction())).min(100.0),
        ..*config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project;
    use proptest::prelude::*;
    use sim_core::Seasonality;

    #[test]
    fn centre_matches_month_one_for_each_pattern() {
        for seasonality in Seasonality::ALL {
            let c = Config {
                seasonality,
                loan_amount: 30_000.0,
                ..Config::default()
            };
            let p = project(&c, 99);
            let grid = analyze_sensitivity(&c, &p);
            assert_eq!(grid.centre(), p.ledger[0].net_profit, "{seasonality}");
        }
    }

    #[test]
    fn higher_margin_and_demand_help() {
        let c = Config::default();
        let grid = analyze_sensitivity(&c, &project(&c, 0));
        assert!(grid.get(Delta::Up, Delta::Up) > grid.centre());
        assert!(grid.get(Delta::Down, Delta::Down) < grid.centre());
        assert!(grid.get(Delta::Up, Delta::Flat) > grid.get(Delta::Down, Delta::Flat));
    }

    #[test]
    fn margin_is_capped_at_hundred() {
        let c = Config {
            margin: 95.0,
            ..Config::default()
        };
        let capped = perturb(&c, Delta::Up, Delta::Flat);
        assert_eq!(capped.margin, 100.0);
        let full = Config {
            margin: 100.0,
            ..c
        };
        let grid = analyze_sensitivity(&full, &project(&full, 0));
        assert_eq!(grid.get(Delta::Up, Delta::Flat), grid.centre());
    }

    proptest! {
        #[test]
        fn centre_is_exact(investment in 0.0f64..1e6,
                           margin in 0.0f64..=100.0,
                           demand in 0.0f64..=100.0,
                           growth in 0.0f64..50.0,
                           risk in 0.0f64..=100.0,
                           tax in 0.0f64..=100.0,
                           seed in any::<u64>()) {
            let c = Config { investment, margin, demand, growth, risk, tax, seasonality: Seasonality::Volatile, ..Config::default() };
            let p = project(&c, seed);
            prop_assert_eq!(analyze_sensitivity(&c, &p).centre(), p.ledger[0].net_profit);
        }
    }
}
