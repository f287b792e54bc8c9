//! Records produced by one simulation run.

use crate::MONTHS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One simulated month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// 1-based month number.
    pub month_index: u32,
    pub revenue: f64,
    /// COGS + risk loss + opex + interest + tax.
    pub total_cost: f64,
    pub net_profit: f64,
    /// Cumulative cash after this month.
    pub cash_balance: f64,
    /// Revenue multiplier contributed by the seasonality pattern.
    pub seasonal_multiplier: f64,
}

/// The month-1 figures shown on the summary card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOneSnapshot {
    pub revenue: f64,
    /// COGS including risk loss.
    pub cogs: f64,
    pub opex: f64,
    pub interest_and_tax: f64,
    pub net: f64,
}

/// A KPI value that may be a sentinel instead of a number.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Value(f64),
    /// The quantity is never reached (e.g. payback with no profit).
    Never,
    /// Unbounded (e.g. runway while not burning cash).
    Infinite,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::Never | Metric::Infinite => None,
        }
    }

    /// True for a plain number, false for either sentinel.
    pub fn is_finite(self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{v:.2}"),
            Metric::Never => f.write_str("never"),
            Metric::Infinite => f.write_str("infinite"),
        }
    }
}

/// Closed set of KPIs a run reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KpiKind {
    TotalRevenue,
    TotalNet,
    TotalEbitda,
    AvgMonthlyNet,
    NetMargin,
    RoiPct,
    Cac,
    Arpu,
    Ltv,
    LtvCacRatio,
    Roas,
    OpexRatioPct,
    PaybackMonths,
    RunwayMonths,
    EffectiveMargin,
    BreakEvenRevenue,
    CashFloor,
    RevenuePerEmployee,
    BreakEvenMonth,
}

impl KpiKind {
    pub const ALL: [KpiKind; 19] = [
        KpiKind::TotalRevenue,
        KpiKind::TotalNet,
        KpiKind::TotalEbitda,
        KpiKind::AvgMonthlyNet,
        KpiKind::NetMargin,
        KpiKind::RoiPct,
        KpiKind::Cac,
        KpiKind::Arpu,
        KpiKind::Ltv,
        KpiKind::LtvCacRatio,
        KpiKind::Roas,
        KpiKind::OpexRatioPct,
        KpiKind::PaybackMonths,
        KpiKind::RunwayMonths,
        KpiKind::EffectiveMargin,
        KpiKind::BreakEvenRevenue,
        KpiKind::CashFloor,
        KpiKind::RevenuePerEmployee,
        KpiKind::BreakEvenMonth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            KpiKind::TotalRevenue => "Total revenue",
            KpiKind::TotalNet => "Total net profit",
            KpiKind::TotalEbitda => "Total EBITDA",
            KpiKind::AvgMonthlyNet => "Avg monthly net",
            KpiKind::NetMargin => "Net margin",
            KpiKind::RoiPct => "ROI %",
            KpiKind::Cac => "CAC",
            KpiKind::Arpu => "ARPU",
            KpiKind::Ltv => "LTV",
            KpiKind::LtvCacRatio => "LTV:CAC",
            KpiKind::Roas => "ROAS",
            KpiKind::OpexRatioPct => "Opex ratio %",
            KpiKind::PaybackMonths => "Payback (months)",
            KpiKind::RunwayMonths => "Runway (months)",
            KpiKind::EffectiveMargin => "Effective margin",
            KpiKind::BreakEvenRevenue => "Break-even revenue",
            KpiKind::CashFloor => "Cash floor",
            KpiKind::RevenuePerEmployee => "Revenue / employee",
            KpiKind::BreakEvenMonth => "Break-even month",
        }
    }
}

/// Summary ratios derived from a ledger and its config.
///
/// Fields that can hit a zero denominator carry a [`Metric`]; everything else
/// is always a finite number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_net: f64,
    pub total_ebitda: f64,
    pub avg_monthly_net: f64,
    /// Net profit as a fraction of revenue.
    pub net_margin: f64,
    pub roi_pct: f64,
    pub cac: f64,
    pub arpu: f64,
    pub ltv: f64,
    pub ltv_cac_ratio: f64,
    pub roas: f64,
    pub opex_ratio_pct: Metric,
    /// `(investment - loanAmount) / avgMonthlyNet`. Negative when the loan
    /// exceeds the investment, so it is not always a duration.
    pub payback_months: Metric,
    pub runway_months: Metric,
    /// Margin fraction left after risk loss.
    pub effective_margin: f64,
    pub break_even_revenue: Metric,
    pub cash_floor: f64,
    pub revenue_per_employee: f64,
    pub break_even_month: Option<u32>,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Value(0.0)
    }
}

impl Kpis {
    pub fn get(&self, kind: KpiKind) -> Metric {
        match kind {
            KpiKind::TotalRevenue => Metric::Value(self.total_revenue),
            KpiKind::TotalNet => Metric::Value(self.total_net),
            KpiKind::TotalEbitda => Metric::Value(self.total_ebitda),
            KpiKind::AvgMonthlyNet => Metric::Value(self.avg_monthly_net),
            KpiKind::NetMargin => Metric::Value(self.net_margin),
            KpiKind::RoiPct => Metric::Value(self.roi_pct),
            KpiKind::Cac => Metric::Value(self.cac),
            KpiKind::Arpu => Metric::Value(self.arpu),
            KpiKind::Ltv => Metric::Value(self.ltv),
            KpiKind::LtvCacRatio => Metric::Value(self.ltv_cac_ratio),
            KpiKind::Roas => Metric::Value(self.roas),
            KpiKind::OpexRatioPct => self.opex_ratio_pct,
            KpiKind::PaybackMonths => self.payback_months,
            KpiKind::RunwayMonths => self.runway_months,
            KpiKind::EffectiveMargin => Metric::Value(self.effective_margin),
            KpiKind::BreakEvenRevenue => self.break_even_revenue,
            KpiKind::CashFloor => Metric::Value(self.cash_floor),
            KpiKind::RevenuePerEmployee => Metric::Value(self.revenue_per_employee),
            KpiKind::BreakEvenMonth => self
                .break_even_month
                .map(|m| Metric::Value(f64::from(m)))
                .unwrap_or(Metric::Never),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (KpiKind, Metric)> + '_ {
        KpiKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

/// One axis step of the sensitivity grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delta {
    /// -10%
    Down,
    Flat,
    /// +10%
    Up,
}

impl Delta {
    pub const ALL: [Delta; 3] = [Delta::Down, Delta::Flat, Delta::Up];

    pub fn fraction(self) -> f64 {
        match self {
            Delta::Down => -0.1,
            Delta::Flat => 0.0,
            Delta::Up => 0.1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Delta::Down => "-10",
            Delta::Flat => "+0",
            Delta::Up => "+10",
        }
    }

    fn index(self) -> usize {
        match self {
            Delta::Down => 0,
            Delta::Flat => 1,
            Delta::Up => 2,
        }
    }
}

/// 3×3 single-month net profit outcomes, rows by margin delta and columns by
/// demand delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    cells: [[f64; 3]; 3],
}

impl SensitivityGrid {
    pub fn from_fn(mut f: impl FnMut(Delta, Delta) -> f64) -> Self {
        let mut cells = [[0.0; 3]; 3];
        for m in Delta::ALL {
            for d in Delta::ALL {
                cells[m.index()][d.index()] = f(m, d);
            }
        }
        Self { cells }
    }

    pub fn get(&self, margin: Delta, demand: Delta) -> f64 {
        self.cells[margin.index()][demand.index()]
    }

    pub fn centre(&self) -> f64 {
        self.get(Delta::Flat, Delta::Flat)
    }

    /// `"{marginRow}{demandCol}"`, e.g. `"+10-10"`.
    pub fn key(margin: Delta, demand: Delta) -> String {
        format!("{}{}", margin.label(), demand.label())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Delta, Delta, f64)> + '_ {
        Delta::ALL
            .into_iter()
            .flat_map(move |m| Delta::ALL.into_iter().map(move |d| (m, d, self.get(m, d))))
    }

    pub fn to_keyed(&self) -> BTreeMap<String, f64> {
        self.iter()
            .map(|(m, d, v)| (Self::key(m, d), v))
            .collect()
    }
}

/// How an insight should be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Warning,
    Opportunity,
    Positive,
}

/// Closed set of heuristic tips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightKind {
    VolatilityAlert,
    HypeCycleDecay,
    CriticalRunway,
    ScaleOpportunity,
    EfficiencyWarning,
    FinancingNeeded,
    HealthyBusiness,
}

impl InsightKind {
    pub fn tone(self) -> Tone {
        match self {
            InsightKind::ScaleOpportunity => Tone::Opportunity,
            InsightKind::HealthyBusiness => Tone::Positive,
            InsightKind::VolatilityAlert
            | InsightKind::HypeCycleDecay
            | InsightKind::CriticalRunway
            | InsightKind::EfficiencyWarning
            | InsightKind::FinancingNeeded => Tone::Warning,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            InsightKind::VolatilityAlert => "Volatility alert",
            InsightKind::HypeCycleDecay => "Hype cycle decay",
            InsightKind::CriticalRunway => "Critical runway",
            InsightKind::ScaleOpportunity => "Scale opportunity",
            InsightKind::EfficiencyWarning => "Efficiency warning",
            InsightKind::FinancingNeeded => "Financing needed",
            InsightKind::HealthyBusiness => "Healthy business",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub tone: Tone,
    pub message: String,
}

/// Short labels that populate the SWOT quadrants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwotFactor {
    HighMargin,
    StrongUnitEconomics,
    FastCapitalReturn,
    SelfFundingCash,
    StableOperations,
    ThinMargin,
    HeavyOverhead,
    NoPayback,
    NoMajorWeakness,
    RapidGrowth,
    ScaleMarketing,
    SeasonalPeaks,
    MarketExpansion,
    HighRisk,
    DemandVolatility,
    FadingDemand,
    ExpensiveDebt,
    Competition,
}

impl SwotFactor {
    pub fn label(self) -> &'static str {
        match self {
            SwotFactor::HighMargin => "High gross margin",
            SwotFactor::StrongUnitEconomics => "Strong unit economics",
            SwotFactor::FastCapitalReturn => "Capital returned within the year",
            SwotFactor::SelfFundingCash => "Cash stays positive",
            SwotFactor::StableOperations => "Stable baseline operations",
            SwotFactor::ThinMargin => "Thin margins",
            SwotFactor::HeavyOverhead => "Heavy fixed overhead",
            SwotFactor::NoPayback => "Investment never pays back",
            SwotFactor::NoMajorWeakness => "No critical weaknesses detected",
            SwotFactor::RapidGrowth => "Rapid growth trajectory",
            SwotFactor::ScaleMarketing => "Room to scale marketing",
            SwotFactor::SeasonalPeaks => "Seasonal peaks to exploit",
            SwotFactor::MarketExpansion => "Market expansion",
            SwotFactor::HighRisk => "High operational risk",
            SwotFactor::DemandVolatility => "Volatile demand",
            SwotFactor::FadingDemand => "Fading demand after launch",
            SwotFactor::ExpensiveDebt => "Expensive debt",
            SwotFactor::Competition => "General market competition",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Swot {
    pub strengths: Vec<SwotFactor>,
    pub weaknesses: Vec<SwotFactor>,
    pub opportunities: Vec<SwotFactor>,
    pub threats: Vec<SwotFactor>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            AlertLevel::None => "none",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        })
    }
}

/// Overall cash-health classification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

/// Everything one run produces. Always rebuilt wholesale from a `Config`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outputs {
    pub month_one_snapshot: MonthOneSnapshot,
    pub kpis: Kpis,
    pub sensitivity: SensitivityGrid,
    pub insights: Vec<Insight>,
    pub swot: Swot,
    pub alert: Alert,
    pub ledger: [LedgerEntry; MONTHS],
    /// Seed used for volatile seasonality.
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_keys_are_unambiguous() {
        let grid = SensitivityGrid::from_fn(|m, d| m.fraction() * 10.0 + d.fraction());
        let keyed = grid.to_keyed();
        assert_eq!(keyed.len(), 9);
        assert_eq!(keyed["+10-10"], grid.get(Delta::Up, Delta::Down));
        assert_eq!(keyed["+0+0"], grid.centre());
        assert_eq!(keyed["-10+0"], grid.get(Delta::Down, Delta::Flat));
    }

    #[test]
    fn kpi_iteration_covers_closed_set() {
        let kpis = Kpis {
            runway_months: Metric::Infinite,
            payback_months: Metric::Never,
            ..Kpis::default()
        };
        let all: Vec<_> = kpis.iter().collect();
        assert_eq!(all.len(), KpiKind::ALL.len());
        assert_eq!(kpis.get(KpiKind::RunwayMonths), Metric::Infinite);
        assert_eq!(kpis.get(KpiKind::BreakEvenMonth), Metric::Never);
    }

    #[test]
    fn metric_display_and_serde() {
        assert_eq!(Metric::Value(1.5).to_string(), "1.50");
        assert_eq!(Metric::Never.to_string(), "never");
        assert_eq!(serde_json::to_string(&Metric::Infinite).unwrap(), "\"infinite\"");
        assert_eq!(serde_json::to_string(&Metric::Value(2.0)).unwrap(), "{\"value\":2.0}");
    }
}
