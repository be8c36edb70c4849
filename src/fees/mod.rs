//! Tiered subscription pricing.
//!
//! Vehicle classes carry versioned fee schedules; a usage count maps to one
//! of four fixed price tiers:
//!
//! ```text
//! usage ≤ 100 → tier 1
//! usage ≤ 300 → tier 2
//! usage ≤ 500 → tier 3
//! otherwise   → tier 4
//! ```

mod calculator;
mod schedule;

pub use calculator::FeeCalculator;
pub use schedule::{FeeSchedule, FeeScheduleStore, NewFeeSchedule, Tier, VehicleClass};
