//! Vehicle classes and versioned fee schedules.
//!
//! A vehicle class is a billing category ("car", "motorcycle"); each class
//! carries versioned fee schedules, one active per date. Schedules for the
//! same class must never overlap while both are live, and the overlap check
//! runs inside a single write-lock critical section so concurrent creation
//! cannot admit two overlapping schedules.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// One of the four usage-count price bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Usage count up to 100.
    Tier1,
    /// Usage count 101 to 300.
    Tier2,
    /// Usage count 301 to 500.
    Tier3,
    /// Usage count above 500.
    Tier4,
}

impl Tier {
    /// Map a usage count to its tier. Upper bounds are inclusive.
    #[must_use]
    pub fn for_usage(usage_count: u32) -> Self {
        match usage_count {
            0..=100 => Self::Tier1,
            101..=300 => Self::Tier2,
            301..=500 => Self::Tier3,
            _ => Self::Tier4,
        }
    }
}

/// A billing category with its own fee schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleClass {
    /// Class identifier.
    pub id: Uuid,
    /// Normalized name (lowercase, alphabetic only).
    pub name: String,
    /// Soft-delete flag.
    pub deleted: bool,
}

/// A versioned price list for one vehicle class.
///
/// Prices are in minor currency units (cents). The schedule is active for
/// dates in `[effective_from, effective_to]`, both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Schedule identifier.
    pub id: Uuid,
    /// Class this schedule prices.
    pub vehicle_class_id: Uuid,
    /// First day the schedule applies.
    pub effective_from: NaiveDate,
    /// Last day the schedule applies.
    pub effective_to: NaiveDate,
    /// Price for usage counts up to 100.
    pub tier1_price: u64,
    /// Price for usage counts 101 to 300.
    pub tier2_price: u64,
    /// Price for usage counts 301 to 500.
    pub tier3_price: u64,
    /// Price for usage counts above 500.
    pub tier4_price: u64,
    /// Soft-delete flag.
    pub deleted: bool,
}

impl FeeSchedule {
    /// Price for the given tier.
    #[must_use]
    pub fn price_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Tier1 => self.tier1_price,
            Tier::Tier2 => self.tier2_price,
            Tier::Tier3 => self.tier3_price,
            Tier::Tier4 => self.tier4_price,
        }
    }

    /// Whether the schedule is live and applies on `date`.
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        !self.deleted && self.effective_from <= date && date <= self.effective_to
    }

    fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.effective_from <= to && from <= self.effective_to
    }
}

/// Fields for creating a fee schedule.
#[derive(Debug, Clone)]
pub struct NewFeeSchedule {
    /// Class the schedule prices.
    pub vehicle_class_id: Uuid,
    /// First day the schedule applies.
    pub effective_from: NaiveDate,
    /// Last day the schedule applies.
    pub effective_to: NaiveDate,
    /// Price for usage counts up to 100.
    pub tier1_price: u64,
    /// Price for usage counts 101 to 300.
    pub tier2_price: u64,
    /// Price for usage counts 301 to 500.
    pub tier3_price: u64,
    /// Price for usage counts above 500.
    pub tier4_price: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    classes: Vec<VehicleClass>,
    schedules: Vec<FeeSchedule>,
}

/// In-memory store of vehicle classes and their fee schedules.
///
/// All mutation runs under one write lock, so the uniqueness and overlap
/// invariants hold under concurrent creation.
#[derive(Debug, Default)]
pub struct FeeScheduleStore {
    inner: RwLock<StoreInner>,
}

impl FeeScheduleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vehicle class.
    ///
    /// The name is normalized to lowercase. At most one non-deleted class may
    /// exist per normalized name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the name is empty or contains
    /// non-alphabetic characters, or if a live class with that name exists.
    pub fn add_class(&self, name: &str) -> Result<Uuid> {
        let normalized = normalize_class_name(name)?;

        let mut inner = self.inner.write();
        if inner
            .classes
            .iter()
            .any(|c| !c.deleted && c.name == normalized)
        {
            return Err(Error::validation(
                "class.name",
                format!("vehicle class '{normalized}' already exists"),
            ));
        }

        let id = Uuid::new_v4();
        inner.classes.push(VehicleClass {
            id,
            name: normalized.clone(),
            deleted: false,
        });
        info!("Registered vehicle class '{normalized}' ({id})");
        Ok(id)
    }

    /// Soft-delete a vehicle class.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no live class has this id.
    pub fn remove_class(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write();
        let class = inner
            .classes
            .iter_mut()
            .find(|c| c.id == id && !c.deleted)
            .ok_or_else(|| Error::NotFound(format!("vehicle class {id}")))?;
        class.deleted = true;
        debug!("Soft-deleted vehicle class {id}");
        Ok(())
    }

    /// Look up a live vehicle class by name (case-insensitive).
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<VehicleClass> {
        let normalized = name.trim().to_lowercase();
        self.inner
            .read()
            .classes
            .iter()
            .find(|c| !c.deleted && c.name == normalized)
            .cloned()
    }

    /// Add a fee schedule for a vehicle class.
    ///
    /// The date-range overlap check and the insert run under one write lock:
    /// two concurrent creations can never both pass the check.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the date range is empty or inverted, or
    /// if it overlaps a live schedule for the same class; `Error::NotFound`
    /// if the class does not exist.
    pub fn add_schedule(&self, new: NewFeeSchedule) -> Result<Uuid> {
        if new.effective_to <= new.effective_from {
            return Err(Error::validation(
                "schedule.effective_to",
                "must be after effective_from",
            ));
        }

        let mut inner = self.inner.write();
        if !inner
            .classes
            .iter()
            .any(|c| c.id == new.vehicle_class_id && !c.deleted)
        {
            return Err(Error::NotFound(format!(
                "vehicle class {}",
                new.vehicle_class_id
            )));
        }

        let overlap = inner.schedules.iter().any(|s| {
            !s.deleted
                && s.vehicle_class_id == new.vehicle_class_id
                && s.overlaps(new.effective_from, new.effective_to)
        });
        if overlap {
            return Err(Error::validation(
                "schedule.effective_from",
                "date range overlaps an existing schedule for this class",
            ));
        }

        let id = Uuid::new_v4();
        inner.schedules.push(FeeSchedule {
            id,
            vehicle_class_id: new.vehicle_class_id,
            effective_from: new.effective_from,
            effective_to: new.effective_to,
            tier1_price: new.tier1_price,
            tier2_price: new.tier2_price,
            tier3_price: new.tier3_price,
            tier4_price: new.tier4_price,
            deleted: false,
        });
        info!(
            "Added fee schedule {id} for class {} ({} to {})",
            new.vehicle_class_id, new.effective_from, new.effective_to
        );
        Ok(id)
    }

    /// Soft-delete a fee schedule.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no live schedule has this id.
    pub fn remove_schedule(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write();
        let schedule = inner
            .schedules
            .iter_mut()
            .find(|s| s.id == id && !s.deleted)
            .ok_or_else(|| Error::NotFound(format!("fee schedule {id}")))?;
        schedule.deleted = true;
        debug!("Soft-deleted fee schedule {id}");
        Ok(())
    }

    /// The live schedule for a class that applies on `date`, if any.
    #[must_use]
    pub fn active_schedule(&self, vehicle_class_id: Uuid, date: NaiveDate) -> Option<FeeSchedule> {
        self.inner
            .read()
            .schedules
            .iter()
            .find(|s| s.vehicle_class_id == vehicle_class_id && s.is_active_on(date))
            .cloned()
    }
}

/// Normalize a class name to lowercase, rejecting anything non-alphabetic.
fn normalize_class_name(name: &str) -> Result<String> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::validation("class.name", "must not be empty"));
    }
    if !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::validation(
            "class.name",
            "must contain only alphabetic characters",
        ));
    }
    Ok(normalized)
}
