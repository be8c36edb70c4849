//! Ledger persistence seam and the in-memory implementation.

use crate::config::GatewayKind;
use crate::error::{Error, Result};
use crate::ledger::record::{LedgerFilter, LedgerUpdate, PaymentLedgerRecord, PaymentStatus};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};
use uuid::Uuid;

/// Backing store for payment ledger records.
///
/// Implementations map store faults to `Error::Persistence`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new record.
    ///
    /// Implementations must enforce, atomically with the insert, that at
    /// most one live SUCCESS record exists per `(gateway, reference)`; a
    /// conflicting insert fails with `Error::Persistence` and writes
    /// nothing. This backs notification dedupe under concurrent delivery.
    async fn insert(&self, record: PaymentLedgerRecord) -> Result<()>;

    /// Fetch a record by id, including soft-deleted ones.
    async fn get(&self, id: Uuid) -> Result<Option<PaymentLedgerRecord>>;

    /// List records passing the filter; soft-deleted records never appear.
    async fn list(&self, filter: &LedgerFilter) -> Result<Vec<PaymentLedgerRecord>>;

    /// Replace the mutable fields of a record.
    async fn update(&self, id: Uuid, update: LedgerUpdate) -> Result<()>;

    /// Mark a record deleted; the record is retained.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    /// Remove a record entirely.
    async fn hard_delete(&self, id: Uuid) -> Result<()>;

    /// Find the live SUCCESS record for a gateway order, if one exists.
    ///
    /// `(gateway, reference)` is the dedupe key for replayed notifications;
    /// earlier FAILED attempts for the same order do not count.
    async fn find_successful(
        &self,
        gateway: GatewayKind,
        reference: &str,
    ) -> Result<Option<PaymentLedgerRecord>>;
}

/// In-memory ledger store.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<HashMap<Uuid, PaymentLedgerRecord>>,
}

impl InMemoryLedger {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, including soft-deleted ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn insert(&self, record: PaymentLedgerRecord) -> Result<()> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(Error::Persistence(format!(
                "record {} already exists",
                record.id
            )));
        }
        // SUCCESS uniqueness on (gateway, reference), checked under the same
        // write lock as the insert so concurrent deliveries cannot both land.
        if record.status == PaymentStatus::Success {
            if let Some(gateway) = record.gateway {
                let conflict = records.values().any(|r| {
                    !r.deleted
                        && r.status == PaymentStatus::Success
                        && r.gateway == Some(gateway)
                        && r.reference == record.reference
                });
                if conflict {
                    return Err(Error::Persistence(format!(
                        "successful payment already recorded for order {}",
                        record.reference
                    )));
                }
            }
        }
        trace!("Inserting ledger record {}", record.id);
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PaymentLedgerRecord>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn list(&self, filter: &LedgerFilter) -> Result<Vec<PaymentLedgerRecord>> {
        let records = self.records.read();
        let mut matched: Vec<_> = records.values().filter(|r| filter.matches(r)).cloned().collect();
        matched.sort_by_key(|r| r.created_at);
        Ok(matched)
    }

    async fn update(&self, id: Uuid, update: LedgerUpdate) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&id)
            .filter(|r| !r.deleted)
            .ok_or_else(|| Error::NotFound(format!("ledger record {id}")))?;
        record.payer_id = update.payer_id;
        record.parking_area_id = update.parking_area_id;
        record.amount = update.amount;
        record.status = update.status;
        record.details = update.details;
        debug!("Updated ledger record {id}");
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&id)
            .filter(|r| !r.deleted)
            .ok_or_else(|| Error::NotFound(format!("ledger record {id}")))?;
        record.deleted = true;
        debug!("Soft-deleted ledger record {id}");
        Ok(())
    }

    async fn hard_delete(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.write();
        records
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("ledger record {id}")))?;
        debug!("Hard-deleted ledger record {id}");
        Ok(())
    }

    async fn find_successful(
        &self,
        gateway: GatewayKind,
        reference: &str,
    ) -> Result<Option<PaymentLedgerRecord>> {
        Ok(self
            .records
            .read()
            .values()
            .find(|r| {
                !r.deleted
                    && r.status == PaymentStatus::Success
                    && r.gateway == Some(gateway)
                    && r.reference == reference
            })
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ledger::record::PaymentDetails;
    use chrono::Utc;
    use uuid::Uuid;

    fn success_record(gateway: GatewayKind, reference: &str) -> PaymentLedgerRecord {
        PaymentLedgerRecord {
            id: Uuid::new_v4(),
            payer_id: "payer-1".to_string(),
            parking_area_id: "area-7".to_string(),
            amount: "4500.00".to_string(),
            status: PaymentStatus::Success,
            method: crate::ledger::record::PaymentMethod::Card,
            gateway: Some(gateway),
            reference: reference.to_string(),
            details: PaymentDetails::Card {
                number: "************4564".to_string(),
                holder: "S Perera".to_string(),
                expiry_month: "09".to_string(),
                expiry_year: "27".to_string(),
            },
            subscription_start: Some(Utc::now()),
            subscription_end: Some(Utc::now()),
            created_at: Utc::now(),
            deleted: false,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_second_success_for_same_order() {
        let store = InMemoryLedger::new();
        store
            .insert(success_record(GatewayKind::GatewayA, "SUB-2026-0042"))
            .await
            .expect("first insert");

        let result = store
            .insert(success_record(GatewayKind::GatewayA, "SUB-2026-0042"))
            .await;
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_allows_same_order_on_other_gateway() {
        let store = InMemoryLedger::new();
        store
            .insert(success_record(GatewayKind::GatewayA, "SUB-2026-0042"))
            .await
            .expect("gateway A insert");
        store
            .insert(success_record(GatewayKind::GatewayB, "SUB-2026-0042"))
            .await
            .expect("gateway B insert");
    }

    #[tokio::test]
    async fn test_insert_allows_failed_record_for_recorded_order() {
        let store = InMemoryLedger::new();
        store
            .insert(success_record(GatewayKind::GatewayA, "SUB-2026-0042"))
            .await
            .expect("success insert");

        let mut failed = success_record(GatewayKind::GatewayA, "SUB-2026-0042");
        failed.status = PaymentStatus::Failed;
        failed.subscription_start = None;
        failed.subscription_end = None;
        store.insert(failed).await.expect("failed insert");
        assert_eq!(store.len(), 2);
    }
}
