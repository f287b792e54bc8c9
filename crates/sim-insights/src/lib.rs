#![deny(warnings)]

//! Rule-based advice: textual tips, SWOT quadrants and the cash-health alert.
//!
//! Every rule reads only KPI and config values, so the output is a pure
//! function of one run.

use sim_core::{
    Alert, AlertLevel, Config, Insight, InsightKind, Kpis, Metric, Seasonality, Swot, SwotFactor,
};
use tracing::debug;

/// Months of runway below which the runway tip fires.
pub const CRITICAL_RUNWAY_MONTHS: f64 = 6.0;
/// Cash floor below which the alert is at least a warning.
pub const CASH_WARNING_FLOOR: f64 = 1_000.0;

fn insight(kind: InsightKind, message: String) -> Insight {
    Insight {
        kind,
        tone: kind.tone(),
        message,
    }
}

/// Evaluate the tip rules in their fixed order. Never returns an empty list.
pub fn generate_insights(config: &Config, kpis: &Kpis) -> Vec<Insight> {
    let mut tips = Vec::new();

    match config.seasonality {
        Seasonality::Volatile => tips.push(insight(
            InsightKind::VolatilityAlert,
            format!(
                "Demand can swing 20% either way month to month. Keep at least {:.0} \
                 (two months of operating costs) in reserve.",
                config.opex() * 2.0
            ),
        )),
        Seasonality::Decaying => tips.push(insight(
            InsightKind::HypeCycleDecay,
            "Revenue fades after the launch spike. Invest in retention and repeat \
             business before the hype wears off."
                .to_string(),
        )),
        Seasonality::Linear | Seasonality::Seasonal => {}
    }

    if let Metric::Value(runway) = kpis.runway_months {
        if runway < CRITICAL_RUNWAY_MONTHS {
            tips.push(insight(
                InsightKind::CriticalRunway,
                format!(
                    "Only {runway:.1} months of runway at the current burn rate. \
                     Cut costs or raise capital now."
                ),
            ));
        }
    }

    let ratio = kpis.ltv_cac_ratio;
    if ratio > 5.0 {
        tips.push(insight(
            InsightKind::ScaleOpportunity,
            format!("LTV:CAC of {ratio:.1} leaves room to spend more on acquisition and scale."),
        ));
    } else if ratio > 0.0 && ratio < 3.0 {
        tips.push(insight(
            InsightKind::EfficiencyWarning,
            format!(
                "LTV:CAC of {ratio:.1} is below 3. Acquisition costs consume most of \
                 each customer's value."
            ),
        ));
    }

    if kpis.cash_floor < 0.0 {
        tips.push(insight(
            InsightKind::FinancingNeeded,
            format!(
                "Cash bottoms out at {:.0}. Line up at least {:.0} of financing to stay solvent.",
                kpis.cash_floor,
                kpis.cash_floor.abs()
            ),
        ));
    }

    if tips.is_empty() {
        tips.push(insight(
            InsightKind::HealthyBusiness,
            "Unit economics and cash position look healthy. Keep monitoring costs as you grow."
                .to_string(),
        ));
    }

    debug!(count = tips.len(), "insights generated");
    tips
}

fn or_filler(mut factors: Vec<SwotFactor>, filler: SwotFactor) -> Vec<SwotFactor> {
    if factors.is_empty() {
        factors.push(filler);
    }
    factors
}

/// Populate the four SWOT quadrants. No quadrant is ever empty.
pub fn build_swot(config: &Config, kpis: &Kpis) -> Swot {
    let mut strengths = Vec::new();
    if config.margin > 50.0 {
        strengths.push(SwotFactor::HighMargin);
    }
    if kpis.ltv_cac_ratio > 3.0 {
        strengths.push(SwotFactor::StrongUnitEconomics);
    }
    if kpis.roi_pct > 100.0 {
        strengths.push(SwotFactor::FastCapitalReturn);
    }
    if kpis.cash_floor >= 0.0 {
        strengths.push(SwotFactor::SelfFundingCash);
    }

    let mut weaknesses = Vec::new();
    if config.margin < 20.0 {
        weaknesses.push(SwotFactor::ThinMargin);
    }
    if matches!(kpis.opex_ratio_pct, Metric::Value(v) if v > 50.0)
        || kpis.opex_ratio_pct == Metric::Infinite
    {
        weaknesses.push(SwotFactor::HeavyOverhead);
    }
    if kpis.payback_months == Metric::Never {
        weaknesses.push(SwotFactor::NoPayback);
    }

    let mut opportunities = Vec::new();
    if config.growth > 10.0 {
        opportunities.push(SwotFactor::RapidGrowth);
    }
    if kpis.ltv_cac_ratio > 5.0 {
        opportunities.push(SwotFactor::ScaleMarketing);
    }
    if config.seasonality == Seasonality::Seasonal {
        opportunities.push(SwotFactor::SeasonalPeaks);
    }

    let mut threats = Vec::new();
    if config.risk > 15.0 {
        threats.push(SwotFactor::HighRisk);
    }
    match config.seasonality {
        Seasonality::Volatile => threats.push(SwotFactor::DemandVolatility),
        Seasonality::Decaying => threats.push(SwotFactor::FadingDemand),
        Seasonality::Linear | Seasonality::Seasonal => {}
    }
    if config.loan_amount > 0.0 && config.interest_rate > 12.0 {
        threats.push(SwotFactor::ExpensiveDebt);
    }

    Swot {
        strengths: or_filler(strengths, SwotFactor::StableOperations),
        weaknesses: or_filler(weaknesses, SwotFactor::NoMajorWeakness),
        opportunities: or_filler(opportunities, SwotFactor::MarketExpansion),
        threats: or_filler(threats, SwotFactor::Competition),
    }
}

/// Tips and SWOT together.
pub fn generate(config: &Config, kpis: &Kpis) -> (Vec<Insight>, Swot) {
    (generate_insights(config, kpis), build_swot(config, kpis))
}

/// Classify cash health. First match wins: negative floor with finite runway
/// is critical, a floor under [`CASH_WARNING_FLOOR`] is a warning.
pub fn evaluate_alert(cash_floor: f64, runway_months: Metric) -> Alert {
    match runway_months {
        Metric::Value(runway) if cash_floor < 0.0 => Alert {
            level: AlertLevel::Critical,
            message: format!("Cash runs out in about {runway:.1} months at the current burn rate."),
        },
        _ if cash_floor < CASH_WARNING_FLOOR => Alert {
            level: AlertLevel::Warning,
            message: format!("Cash dips to {cash_floor:.0} during the year."),
        },
        _ => Alert {
            level: AlertLevel::None,
            message: "Cash stays above the safety floor all year.".to_string(),
        },
    }
}
