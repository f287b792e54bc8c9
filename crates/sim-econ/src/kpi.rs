//! Summary KPIs derived from a projection.

use crate::Projection;
use sim_core::{Config, Kpis, Metric, MONTHS};

const PERIODS: f64 = MONTHS as f64;

/// `num / den`, or `fallback` when the denominator is zero or the quotient
/// overflows.
fn ratio_or(num: f64, den: f64, fallback: f64) -> f64 {
    if den == 0.0 {
        return fallback;
    }
    let r = num / den;
    if r.is_finite() {
        r
    } else {
        fallback
    }
}

fn finite_or(value: f64, sentinel: Metric) -> Metric {
    if value.is_finite() {
        Metric::Value(value)
    } else {
        sentinel
    }
}

/// Derive the KPI set from ledger totals and config.
pub fn compute_kpis(config: &Config, projection: &Projection) -> Kpis {
    let total_revenue: f64 = projection.ledger.iter().map(|e| e.revenue).sum();
    let total_net: f64 = projection.ledger.iter().map(|e| e.net_profit).sum();
    let avg_monthly_net = total_net / PERIODS;
    let customers = f64::from(config.customers);

    let cac = config.marketing / customers;
    let arpu = (total_revenue / PERIODS) / customers;
    let ltv = arpu * (config.margin / 100.0) * PERIODS;

    let annual_opex = config.opex() * PERIODS;
    let opex_ratio_pct = if annual_opex == 0.0 {
        Metric::Value(0.0)
    } else if total_revenue > 0.0 {
        finite_or(annual_opex / total_revenue * 100.0, Metric::Infinite)
    } else {
        Metric::Infinite
    };

    let payback_months = if avg_monthly_net > 0.0 {
        finite_or(
            (config.investment - config.loan_amount) / avg_monthly_net,
            Metric::Never,
        )
    } else {
        Metric::Never
    };
    let runway_months = if avg_monthly_net < 0.0 {
        finite_or(config.investment / avg_monthly_net.abs(), Metric::Infinite)
    } else {
        Metric::Infinite
    };

    let effective_margin = (config.margin / 100.0) * (1.0 - config.risk / 100.0);
    let break_even_revenue = if effective_margin > 0.0 {
        finite_or(
            (config.opex() + config.monthly_interest()) / effective_margin,
            Metric::Infinite,
        )
    } else {
        Metric::Infinite
    };

    Kpis {
        total_revenue,
        total_net,
        total_ebitda: projection.total_ebitda,
        avg_monthly_net,
        net_margin: ratio_or(total_net, total_revenue, 0.0),
        roi_pct: ratio_or(total_net, config.investment, 0.0) * 100.0,
        cac,
        arpu,
        ltv,
        ltv_cac_ratio: ratio_or(ltv, cac, 0.0),
        roas: ratio_or(total_revenue, config.marketing * PERIODS, 0.0),
        opex_ratio_pct,
        payback_months,
        runway_months,
        effective_margin,
        break_even_revenue,
        cash_floor: projection.lowest_cash,
        revenue_per_employee: ratio_or(total_revenue, f64::from(config.employees), 0.0),
        break_even_month: projection.break_even_month,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project;
    use proptest::prelude::*;
    use sim_core::{ConfigError, KpiKind, Seasonality, MAX_AMOUNT};

    fn flat() -> Config {
        Config {
            investment: 50_000.0,
            fixed_costs: 2_000.0,
            marketing: 1_000.0,
            margin: 25.0,
            demand: 70.0,
            growth: 0.0,
            risk: 10.0,
            loan_amount: 0.0,
            interest_rate: 10.0,
            tax: 15.0,
            customers: 100,
            employees: 5,
            seasonality: Seasonality::Linear,
        }
    }

    fn kpis(c: &Config) -> Kpis {
        compute_kpis(c, &project(c, 0))
    }

    #[test]
    fn flat_business_figures() {
        let c = flat();
        let k = kpis(&c);
        assert_eq!(k.total_revenue, 12.0 * 35_000.0);
        assert_eq!(k.total_net, 12.0 * 4_143.75);
        assert_eq!(k.avg_monthly_net, 4_143.75);
        assert_eq!(k.cac, 10.0);
        assert_eq!(k.arpu, 350.0);
        assert_eq!(k.ltv, 350.0 * 0.25 * 12.0);
        assert_eq!(k.ltv_cac_ratio, k.ltv / 10.0);
        assert_eq!(k.roas, 35.0);
        assert_eq!(k.revenue_per_employee, 84_000.0);
        assert_eq!(k.runway_months, Metric::Infinite);
        assert_eq!(k.payback_months, Metric::Value(50_000.0 / 4_143.75));
        assert_eq!(k.effective_margin, 0.25 * 0.9);
        assert_eq!(k.break_even_revenue, Metric::Value(3_000.0 / (0.25 * 0.9)));
        assert_eq!(k.cash_floor, -50_000.0 + 4_143.75);
        assert_eq!(k.break_even_month, Some(1));
    }

    #[test]
    fn no_marketing_gives_zero_ratios() {
        let c = Config {
            marketing: 0.0,
            ..flat()
        };
        let k = kpis(&c);
        assert_eq!(k.cac, 0.0);
        assert_eq!(k.ltv_cac_ratio, 0.0);
        assert_eq!(k.roas, 0.0);
    }

    #[test]
    fn losses_give_finite_runway_and_no_payback() {
        let c = Config {
            margin: 0.0,
            ..flat()
        };
        let k = kpis(&c);
        assert_eq!(k.avg_monthly_net, -3_000.0);
        assert_eq!(k.runway_months, Metric::Value(50_000.0 / 3_000.0));
        assert_eq!(k.payback_months, Metric::Never);
        assert_eq!(k.break_even_revenue, Metric::Infinite);
        assert_eq!(k.get(KpiKind::BreakEvenMonth), Metric::Never);
    }

    #[test]
    fn zero_revenue_and_zero_investment_are_defined() {
        let c = Config {
            investment: 0.0,
            employees: 0,
            ..flat()
        };
        let k = kpis(&c);
        assert_eq!(k.total_revenue, 0.0);
        assert_eq!(k.net_margin, 0.0);
        assert_eq!(k.roi_pct, 0.0);
        assert_eq!(k.revenue_per_employee, 0.0);
        assert_eq!(k.opex_ratio_pct, Metric::Infinite);
        let c = Config {
            fixed_costs: 0.0,
            marketing: 0.0,
            ..c
        };
        assert_eq!(kpis(&c).opex_ratio_pct, Metric::Value(0.0));
    }

    proptest! {
        #[test]
        fn no_kpi_is_nan(investment in 0.0f64..1e6,
                         fixed_costs in 0.0f64..1e5,
                         marketing in 0.0f64..1e5,
                         margin in 0.0f64..=100.0,
                         demand in 0.0f64..=100.0,
                         risk in 0.0f64..=100.0,
                         loan_amount in 0.0f64..1e6,
                         employees in 0u32..500) {
            let c = Config { investment, fixed_costs, marketing, margin, demand, risk, loan_amount, employees, ..flat() };
            let k = kpis(&c);
            for (kind, m) in k.iter() {
                if let Some(v) = m.value() {
                    prop_assert!(v.is_finite(), "{:?} = {}", kind, v);
                }
            }
            if k.avg_monthly_net >= 0.0 {
                prop_assert!(!k.runway_months.is_finite());
                prop_assert_eq!(k.runway_months, Metric::Infinite);
            } else if let Metric::Value(v) = k.runway_months {
                prop_assert!(v >= 0.0);
            }
            prop_assert_ne!(k.runway_months, Metric::Never);
        }

        #[test]
        fn accepted_configs_never_overflow(investment in 0.0f64..=MAX_AMOUNT,
                                           growth in 0.0f64..1e6,
                                           margin in 0.0f64..=100.0,
                                           risk in 0.0f64..=100.0,
                                           loan_amount in 0.0f64..=MAX_AMOUNT,
                                           interest_rate in 0.0f64..1e4,
                                           pattern in 0usize..4) {
            let c = Config {
                investment, growth, margin, risk, loan_amount, interest_rate,
                demand: 100.0,
                seasonality: Seasonality::ALL[pattern],
                ..flat()
            };
            if let Err(e) = c.validate() {
                let too_large = matches!(e, ConfigError::TooLarge { .. });
                prop_assert!(too_large, "{}", e);
                return Ok(());
            }
            let p = project(&c, 3);
            for e in &p.ledger {
                prop_assert!(e.revenue.is_finite() && e.total_cost.is_finite());
                prop_assert!(e.net_profit.is_finite() && e.cash_balance.is_finite());
            }
            let k = compute_kpis(&c, &p);
            for (kind, m) in k.iter() {
                if let Some(v) = m.value() {
                    prop_assert!(v.is_finite(), "{:?} = {}", kind, v);
                }
            }
        }
    }

    #[test]
    fn runaway_growth_is_rejected() {
        let c = Config {
            growth: 1e40,
            margin: 100.0,
            ..flat()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::TooLarge { field: "peak monthly revenue", .. })
        ));
        // 0 * inf would poison the ledger with NaN
        let c = Config {
            investment: 0.0,
            growth: 1e40,
            ..flat()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::TooLarge { field: "peak monthly revenue", .. })
        ));
    }

    #[test]
    fn largest_accepted_amounts_stay_finite() {
        let c = Config {
            investment: MAX_AMOUNT,
            fixed_costs: MAX_AMOUNT,
            marketing: MAX_AMOUNT,
            loan_amount: MAX_AMOUNT,
            interest_rate: 600.0,
            demand: 50.0,
            margin: 100.0,
            risk: 50.0,
            ..flat()
        };
        assert_eq!(c.validate(), Ok(()));
        let p = project(&c, 0);
        assert!(p.ledger.iter().all(|e| e.cash_balance.is_finite()));
        let k = compute_kpis(&c, &p);
        assert!(k.total_net.is_finite());
        assert!(k.iter().all(|(_, m)| m.value().map_or(true, f64::is_finite)));
    }
}
