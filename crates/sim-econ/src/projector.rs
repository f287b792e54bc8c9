//! Monthly projection loop.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_core::{Config, LedgerEntry, MonthOneSnapshot, Seasonality, MONTHS};
use std::f64::consts::PI;
use tracing::debug;

/// Profit and loss breakdown for one month.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonthPnl {
    pub revenue: f64,
    pub cogs: f64,
    pub risk_loss: f64,
    /// `cogs + risk_loss`.
    pub total_cogs: f64,
    pub opex: f64,
    pub ebitda: f64,
    pub interest: f64,
    pub pre_tax: f64,
    pub tax: f64,
    pub net: f64,
}

impl MonthPnl {
    pub fn total_cost(&self) -> f64 {
        self.total_cogs + self.opex + self.interest + self.tax
    }
}

/// Result of running the 12-month loop.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub ledger: [LedgerEntry; MONTHS],
    pub month_one: MonthOneSnapshot,
    /// Minimum cumulative cash over the 12 month-end balances.
    pub lowest_cash: f64,
    /// First month with positive net profit.
    pub break_even_month: Option<u32>,
    pub total_ebitda: f64,
}

/// Compounding growth factor `(1 + growth/100)^(month-1)`.
pub fn growth_factor(growth: f64, month: u32) -> f64 {
    (1.0 + growth / 100.0).powi(month as i32 - 1)
}

/// Revenue multiplier for `month` (1-based). Only `Volatile` draws from `rng`.
pub fn seasonal_multiplier(seasonality: Seasonality, month: u32, rng: &mut ChaCha8Rng) -> f64 {
    let i = f64::from(month);
    match seasonality {
        Seasonality::Linear => 1.0,
        Seasonality::Seasonal => 1.0 + 0.3 * ((i - 1.0) * PI / 6.0).sin(),
        Seasonality::Volatile => rng.gen_range(0.8..1.2),
        Seasonality::Decaying => 1.5 * (-0.1 * i).exp(),
    }
}

/// Revenue for one month given its growth factor and seasonal multiplier.
pub fn monthly_revenue(config: &Config, growth_factor: f64, multiplier: f64) -> f64 {
    let base = config.investment * (config.demand / 100.0);
    base * growth_factor * multiplier
}

/// Costs, tax and net profit for a month with the given revenue.
///
/// Shared by the projection loop and the sensitivity grid so both agree bit
/// for bit on month 1.
pub fn month_pnl(config: &Config, revenue: f64) -> MonthPnl {
    let cogs = revenue * (1.0 - config.margin / 100.0);
    let risk_loss = (revenue - cogs) * (config.risk / 100.0);
    let total_cogs = cogs + risk_loss;
    let opex = config.opex();
    let interest = config.monthly_interest();
    let ebitda = revenue - total_cogs - opex;
    let pre_tax = ebitda - interest;
    let tax = if pre_tax > 0.0 {
        pre_tax * (config.tax / 100.0)
    } else {
        0.0
    };
    MonthPnl {
        revenue,
        cogs,
        risk_loss,
        total_cogs,
        opex,
        ebitda,
        interest,
        pre_tax,
        tax,
        net: pre_tax - tax,
    }
}

/// Run the 12-month simulation. The same `(config, seed)` always yields the
/// same ledger.
pub fn project(config: &Config, seed: u64) -> Projection {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ledger = [LedgerEntry::default(); MONTHS];
    let mut month_one = MonthOneSnapshot::default();
    let mut cash = config.opening_cash();
    let mut lowest_cash = f64::INFINITY;
    let mut break_even_month = None;
    let mut total_ebitda = 0.0;

    for (slot, month) in ledger.iter_mut().zip(1u32..) {
        let multiplier = seasonal_multiplier(config.seasonality, month, &mut rng);
        let revenue = monthly_revenue(config, growth_factor(config.growth, month), multiplier);
        let pnl = month_pnl(config, revenue);
        cash += pnl.net;
        total_ebitda += pnl.ebitda;

        *slot = LedgerEntry {
            month_index: month,
            revenue,
            total_cost: pnl.total_cost(),
            net_profit: pnl.net,
            cash_balance: cash,
            seasonal_multiplier: multiplier,
        };

        lowest_cash = lowest_cash.min(cash);
        if break_even_month.is_none() && pnl.net > 0.0 {
            break_even_month = Some(month);
        }
        if month == 1 {
            month_one = MonthOneSnapshot {
                revenue,
                cogs: pnl.total_cogs,
                opex: pnl.opex,
                interest_and_tax: pnl.interest + pnl.tax,
                net: pnl.net,
            };
        }
    }

    debug!(seed, lowest_cash, ?break_even_month, total_ebitda, "projected 12 months");
    Projection {
        ledger,
        month_one,
        lowest_cash,
        break_even_month,
        total_ebitda,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn example() -> Config {
        Config {
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

    #[test]
    fn month_one_matches_worked_example() {
        let c = example();
        let pnl = month_pnl(&c, monthly_revenue(&c, growth_factor(c.growth, 1), 1.0));
        assert_eq!(pnl.revenue, 35_000.0);
        assert_eq!(pnl.cogs, 26_250.0);
        assert_eq!(pnl.risk_loss, 875.0);
        assert_eq!(pnl.total_cogs, 27_125.0);
        assert_eq!(pnl.opex, 3_000.0);
        assert_eq!(pnl.ebitda, 4_875.0);
        assert_eq!(pnl.interest, 0.0);
        assert_eq!(pnl.tax, 731.25);
        assert_eq!(pnl.net, 4_143.75);

        let p = project(&c, 0);
        assert_eq!(p.ledger[0].net_profit, 4_143.75);
        assert_eq!(p.month_one.net, 4_143.75);
        assert_eq!(p.month_one.cogs, 27_125.0);
        assert_eq!(p.month_one.interest_and_tax, 731.25);
        assert_eq!(p.ledger[0].cash_balance, -50_000.0 + 4_143.75);
        assert_eq!(p.break_even_month, Some(1));
    }

    #[test]
    fn zero_margin_loses_exactly_opex() {
        let c = Config {
            margin: 0.0,
            ..example()
        };
        let pnl = month_pnl(&c, monthly_revenue(&c, 1.0, 1.0));
        assert_eq!(pnl.cogs, pnl.revenue);
        assert_eq!(pnl.ebitda, -3_000.0);
        assert_eq!(pnl.tax, 0.0);
        assert_eq!(pnl.net, -3_000.0 - c.monthly_interest());

        let p = project(&c, 0);
        assert!(p.ledger.iter().all(|e| e.net_profit == -3_000.0));
        assert_eq!(p.break_even_month, None);
        assert_eq!(p.lowest_cash, -50_000.0 - 12.0 * 3_000.0);
    }

    #[test]
    fn full_margin_no_risk_has_no_cogs() {
        let c = Config {
            margin: 100.0,
            risk: 0.0,
            loan_amount: 10_000.0,
            ..example()
        };
        let pnl = month_pnl(&c, 35_000.0);
        assert_eq!(pnl.cogs, 0.0);
        assert_eq!(pnl.risk_loss, 0.0);
        assert_eq!(pnl.total_cogs, 0.0);
        let pre_tax = 35_000.0 - 3_000.0 - c.monthly_interest();
        assert_eq!(pnl.net, pre_tax - pre_tax * 0.15);
    }

    #[test]
    fn flat_revenue_without_growth() {
        let c = Config {
            growth: 0.0,
            ..example()
        };
        let p = project(&c, 7);
        assert!(p.ledger.iter().all(|e| e.revenue == p.ledger[0].revenue));
    }

    #[test]
    fn ledger_is_ordered_and_cumulative() {
        let c = Config {
            loan_amount: 20_000.0,
            ..example()
        };
        let p = project(&c, 1);
        let mut cash = c.opening_cash();
        for (i, e) in p.ledger.iter().enumerate() {
            assert_eq!(e.month_index as usize, i + 1);
            cash += e.net_profit;
            assert_eq!(e.cash_balance, cash);
            assert!((e.revenue - e.total_cost - e.net_profit).abs() < 1e-6);
        }
    }

    #[test]
    fn seasonal_pattern_peaks_in_month_four() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(seasonal_multiplier(Seasonality::Seasonal, 1, &mut rng), 1.0);
        let peak = seasonal_multiplier(Seasonality::Seasonal, 4, &mut rng);
        assert!((peak - 1.3).abs() < 1e-12);
        let trough = seasonal_multiplier(Seasonality::Seasonal, 10, &mut rng);
        assert!((trough - 0.7).abs() < 1e-12);
    }

    #[test]
    fn decaying_pattern_fades() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let m1 = seasonal_multiplier(Seasonality::Decaying, 1, &mut rng);
        let m12 = seasonal_multiplier(Seasonality::Decaying, 12, &mut rng);
        assert!((m1 - 1.5 * (-0.1f64).exp()).abs() < 1e-12);
        assert!(m12 < m1);
    }

    #[test]
    fn volatile_is_seeded() {
        let c = Config {
            seasonality: Seasonality::Volatile,
            ..example()
        };
        let a = project(&c, 42);
        let b = project(&c, 42);
        let other = project(&c, 43);
        assert_eq!(a, b);
        assert_ne!(a.ledger, other.ledger);
        for e in &a.ledger {
            assert!((0.8..1.2).contains(&e.seasonal_multiplier));
        }
    }

    proptest! {
        #[test]
        fn exactly_twelve_entries_and_floor_is_min(investment in 0.0f64..1e6,
                                                   demand in 0.0f64..=100.0,
                                                   margin in 0.0f64..=100.0,
                                                   growth in 0.0f64..30.0,
                                                   seed in any::<u64>()) {
            let c = Config { investment, demand, margin, growth, seasonality: Seasonality::Volatile, ..example() };
            let p = project(&c, seed);
            prop_assert_eq!(p.ledger.len(), MONTHS);
            let min = p.ledger.iter().map(|e| e.cash_balance).fold(f64::INFINITY, f64::min);
            prop_assert_eq!(p.lowest_cash, min);
            prop_assert!(p.ledger.iter().all(|e| e.revenue.is_finite() && e.net_profit.is_finite()));
        }
    }
}
