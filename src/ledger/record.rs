//! Payment ledger record types.

use crate::config::GatewayKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome status of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting manual confirmation (bank transfers only).
    Pending,
    /// Verified successful payment.
    Success,
    /// Rejected or failed payment.
    Failed,
}

/// How the payer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Card payment through a gateway.
    Card,
    /// Mobile wallet payment.
    Mobile,
    /// Manual bank transfer with uploaded receipts.
    BankTransfer,
    /// QR-code payment.
    Qr,
}

/// Method-specific payment detail.
///
/// A tagged variant rather than one loose object with optional fields for
/// both shapes: a record holds bank fields or card fields, never a mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentDetails {
    /// Manual bank transfer.
    BankTransfer {
        /// Bank the transfer was made to.
        bank_name: String,
        /// Branch of the receiving account.
        branch: String,
        /// Payer's transfer reference.
        reference: String,
        /// Stored file references for 1 to 5 receipt images.
        receipt_images: Vec<String>,
    },
    /// Gateway card payment.
    Card {
        /// Masked card number as reported by the gateway.
        number: String,
        /// Cardholder name.
        holder: String,
        /// Expiry month; empty string when the gateway omitted the expiry.
        expiry_month: String,
        /// Expiry year; empty string when the gateway omitted the expiry.
        expiry_year: String,
    },
}

/// One payment attempt in the ledger.
///
/// Records are created once per attempt and never mutated afterwards on the
/// gateway path; every inbound notification produces a fresh record. Bank
/// transfer records start PENDING and only ever leave via soft-delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLedgerRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Paying account.
    pub payer_id: String,
    /// Parking area the subscription is for (reference, not ownership).
    pub parking_area_id: String,
    /// Amount exactly as the gateway or payer reported it (e.g. `"1000.00"`).
    pub amount: String,
    /// Outcome status.
    pub status: PaymentStatus,
    /// How the payer paid.
    pub method: PaymentMethod,
    /// Gateway that processed the payment, if any.
    pub gateway: Option<GatewayKind>,
    /// Order id (gateway path) or payer-supplied reference (bank transfer).
    pub reference: String,
    /// Method-specific detail.
    pub details: PaymentDetails,
    /// Subscription start; set only on SUCCESS records.
    pub subscription_start: Option<DateTime<Utc>>,
    /// Subscription end; set only on SUCCESS records.
    pub subscription_end: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
}

/// Mutable fields replaced wholesale by [`update`](crate::ledger::LedgerManager::update).
///
/// Updates are trusted writes from an authenticated administrative caller;
/// nothing here recomputes `amount` or re-verifies a signature.
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    /// New payer id.
    pub payer_id: String,
    /// New parking area reference.
    pub parking_area_id: String,
    /// New amount string.
    pub amount: String,
    /// New status.
    pub status: PaymentStatus,
    /// New method-specific detail.
    pub details: PaymentDetails,
}

/// Filter for listing ledger records. Soft-deleted records are always
/// excluded regardless of the filter.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Restrict to one payer.
    pub payer_id: Option<String>,
    /// Restrict to one parking area.
    pub parking_area_id: Option<String>,
    /// Restrict to one status.
    pub status: Option<PaymentStatus>,
}

impl LedgerFilter {
    /// Whether a record passes the filter.
    #[must_use]
    pub fn matches(&self, record: &PaymentLedgerRecord) -> bool {
        if record.deleted {
            return false;
        }
        if let Some(payer) = &self.payer_id {
            if &record.payer_id != payer {
                return false;
            }
        }
        if let Some(area) = &self.parking_area_id {
            if &record.parking_area_id != area {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        true
    }
}
