//! Tiered subscription fee quoting.

use crate::error::{Error, Result};
use crate::fees::schedule::{FeeScheduleStore, Tier};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;

/// Quotes subscription fees from the active schedule of a vehicle class.
///
/// A pure read over the schedule store: no quote mutates anything.
pub struct FeeCalculator {
    store: Arc<FeeScheduleStore>,
}

impl FeeCalculator {
    /// Create a calculator over a schedule store.
    #[must_use]
    pub fn new(store: Arc<FeeScheduleStore>) -> Self {
        Self { store }
    }

    /// Quote the subscription fee for a vehicle class at today's date.
    ///
    /// Class names are case-insensitive. The usage count selects one of four
    /// fixed tiers (upper bounds 100, 300, 500 inclusive).
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the class is unknown or no schedule is
    /// active today.
    pub fn quote(&self, vehicle_class_name: &str, usage_count: u32) -> Result<u64> {
        self.quote_at(vehicle_class_name, usage_count, Utc::now().date_naive())
    }

    /// Quote the subscription fee as of an explicit date.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the class is unknown or no schedule is
    /// active on `date`.
    pub fn quote_at(
        &self,
        vehicle_class_name: &str,
        usage_count: u32,
        date: NaiveDate,
    ) -> Result<u64> {
        let class = self
            .store
            .find_class(vehicle_class_name)
            .ok_or_else(|| Error::NotFound(format!("vehicle class '{vehicle_class_name}'")))?;

        let schedule = self.store.active_schedule(class.id, date).ok_or_else(|| {
            Error::NotFound(format!("active fee schedule for '{}' on {date}", class.name))
        })?;

        let tier = Tier::for_usage(usage_count);
        let price = schedule.price_for(tier);
        debug!(
            "Quoted {price} for class '{}' at usage {usage_count} ({tier:?})",
            class.name
        );
        Ok(price)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fees::schedule::NewFeeSchedule;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn calculator_with_schedule() -> FeeCalculator {
        let store = Arc::new(FeeScheduleStore::new());
        let class = store.add_class("car").expect("add class");
        store
            .add_schedule(NewFeeSchedule {
                vehicle_class_id: class,
                effective_from: date(2026, 1, 1),
                effective_to: date(2026, 12, 31),
                tier1_price: 1000,
                tier2_price: 2000,
                tier3_price: 3000,
                tier4_price: 4000,
            })
            .expect("add schedule");
        FeeCalculator::new(store)
    }

    #[test]
    fn test_quote_tier_boundaries() {
        let calc = calculator_with_schedule();
        let on = date(2026, 6, 1);
        assert_eq!(calc.quote_at("car", 1, on).expect("quote"), 1000);
        assert_eq!(calc.quote_at("car", 100, on).expect("quote"), 1000);
        assert_eq!(calc.quote_at("car", 101, on).expect("quote"), 2000);
        assert_eq!(calc.quote_at("car", 300, on).expect("quote"), 2000);
        assert_eq!(calc.quote_at("car", 301, on).expect("quote"), 3000);
        assert_eq!(calc.quote_at("car", 500, on).expect("quote"), 3000);
        assert_eq!(calc.quote_at("car", 501, on).expect("quote"), 4000);
    }

    #[test]
    fn test_quote_is_case_insensitive() {
        let calc = calculator_with_schedule();
        let on = date(2026, 6, 1);
        let lower = calc.quote_at("car", 50, on).expect("quote");
        let upper = calc.quote_at("CAR", 50, on).expect("quote");
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_quote_unknown_class() {
        let calc = calculator_with_schedule();
        let result = calc.quote_at("bus", 50, date(2026, 6, 1));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_quote_outside_schedule_range() {
        let calc = calculator_with_schedule();
        let result = calc.quote_at("car", 50, date(2027, 6, 1));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
