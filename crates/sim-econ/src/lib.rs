#![deny(warnings)]

//! Financial models for Profit Pilot.
//!
//! This crate provides the numeric core of a simulation run:
//! - the 12-month projection loop with seeded seasonality ([`project`])
//! - summary KPIs derived from a projection ([`compute_kpis`])
//! - the 3×3 margin/demand sensitivity grid ([`analyze_sensitivity`])
//!
//! All functions are pure; degenerate denominators produce sentinel values
//! rather than errors or NaN.

mod kpi;
mod projector;
mod sensitivity;

pub use kpi::compute_kpis;
pub use projector::{
    growth_factor, month_pnl, monthly_revenue, project, seasonal_multiplier, MonthPnl, Projection,
};
pub use sensitivity::analyze_sensitivity;
