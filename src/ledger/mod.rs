//! Payment ledger: record types, persistence seam, and lifecycle manager.
//!
//! Records are append-style: the gateway path never mutates a record after
//! creation, and the only transition a bank-transfer record makes is
//! PENDING → soft-deleted. Administrative updates are trusted full replaces
//! of the mutable fields.

mod record;
mod store;

pub use record::{
    LedgerFilter, LedgerUpdate, PaymentDetails, PaymentLedgerRecord, PaymentMethod, PaymentStatus,
};
pub use store::{InMemoryLedger, LedgerStore};

use crate::error::{Error, Result};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Maximum number of receipt images on a bank-transfer submission.
pub const MAX_RECEIPT_IMAGES: usize = 5;

/// A manual bank-transfer submission.
#[derive(Debug, Clone)]
pub struct BankTransferSubmission {
    /// Paying account.
    pub payer_id: String,
    /// Parking area the subscription is for.
    pub parking_area_id: String,
    /// Transferred amount as entered by the payer.
    pub amount: String,
    /// Bank the transfer was made to.
    pub bank_name: String,
    /// Branch of the receiving account.
    pub branch: String,
    /// Payer's transfer reference.
    pub reference: String,
    /// Stored file references for the uploaded receipts.
    pub receipt_images: Vec<String>,
}

/// Lifecycle manager over a [`LedgerStore`].
///
/// Adds input validation and a per-call timeout on every store operation;
/// the store client itself enforces nothing.
pub struct LedgerManager {
    store: Arc<dyn LedgerStore>,
    store_timeout: Duration,
}

impl LedgerManager {
    /// Create a manager over a store with the given per-call timeout.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Submit a manual bank transfer, creating a PENDING record.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the submission carries no receipt
    /// images or more than [`MAX_RECEIPT_IMAGES`], or `Error::Persistence`
    /// if the store write fails.
    pub async fn submit_bank_transfer(
        &self,
        submission: BankTransferSubmission,
    ) -> Result<PaymentLedgerRecord> {
        if submission.receipt_images.is_empty() {
            return Err(Error::validation(
                "submission.receipt_images",
                "at least one receipt image is required",
            ));
        }
        if submission.receipt_images.len() > MAX_RECEIPT_IMAGES {
            return Err(Error::validation(
                "submission.receipt_images",
                format!("at most {MAX_RECEIPT_IMAGES} receipt images are accepted"),
            ));
        }

        let record = PaymentLedgerRecord {
            id: Uuid::new_v4(),
            payer_id: submission.payer_id,
            parking_area_id: submission.parking_area_id,
            amount: submission.amount,
            status: PaymentStatus::Pending,
            method: PaymentMethod::BankTransfer,
            gateway: None,
            reference: submission.reference.clone(),
            details: PaymentDetails::BankTransfer {
                bank_name: submission.bank_name,
                branch: submission.branch,
                reference: submission.reference,
                receipt_images: submission.receipt_images,
            },
            subscription_start: None,
            subscription_end: None,
            created_at: Utc::now(),
            deleted: false,
        };

        self.timed(self.store.insert(record.clone())).await?;
        info!("Recorded bank-transfer submission {}", record.id);
        Ok(record)
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this id, or
    /// `Error::Persistence` on a store fault.
    pub async fn get(&self, id: Uuid) -> Result<PaymentLedgerRecord> {
        self.timed(self.store.get(id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("ledger record {id}")))
    }

    /// List records passing the filter; soft-deleted records never appear.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` on a store fault.
    pub async fn list(&self, filter: &LedgerFilter) -> Result<Vec<PaymentLedgerRecord>> {
        self.timed(self.store.list(filter)).await
    }

    /// Replace the mutable fields of a record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown or soft-deleted record, or
    /// `Error::Persistence` on a store fault.
    pub async fn update(&self, id: Uuid, update: LedgerUpdate) -> Result<()> {
        self.timed(self.store.update(id, update)).await
    }

    /// Soft-delete a record; it is retained but excluded from listings.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown or already-deleted record,
    /// or `Error::Persistence` on a store fault.
    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        self.timed(self.store.soft_delete(id)).await
    }

    /// Remove a record entirely.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown record, or
    /// `Error::Persistence` on a store fault.
    pub async fn hard_delete(&self, id: Uuid) -> Result<()> {
        self.timed(self.store.hard_delete(id)).await
    }

    /// Run a store call under the configured timeout.
    async fn timed<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| Error::Persistence("store call timed out".to_string()))?
    }
}
