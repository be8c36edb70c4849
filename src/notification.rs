//! Inbound gateway notification handling.
//!
//! The gateway reports payment outcomes asynchronously with a form-encoded
//! POST. Processing is a small state machine: a received notification is
//! verified against its layered signature and ends in exactly one of two
//! terminal outcomes, each producing exactly one ledger record:
//!
//! ```text
//! RECEIVED ──verify──► VERIFIED_SUCCESS   (SUCCESS record + area attachment)
//!              └──────► VERIFIED_FAILED   (FAILED record, no attachment)
//! ```
//!
//! Retries belong to the gateway; a replayed delivery of an already-recorded
//! order is answered as a no-op success without a second record or a second
//! attachment.

use crate::config::{BillingConfig, GatewayKind};
use crate::error::{Error, Result};
use crate::ledger::{LedgerStore, PaymentDetails, PaymentLedgerRecord, PaymentMethod, PaymentStatus};
use crate::signature::SignatureEngine;
use async_trait::async_trait;
use chrono::{Months, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An inbound payment notification, exactly as the gateway posts it.
///
/// Field names follow the gateway wire protocol. Card fields are absent for
/// some payment instruments; they default to empty strings, never `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayNotification {
    /// Merchant the payment was made to.
    pub merchant_id: String,
    /// Merchant-side order id.
    pub order_id: String,
    /// Paid amount, formatted by the gateway.
    #[serde(rename = "payhere_amount")]
    pub amount: String,
    /// Currency code.
    #[serde(rename = "payhere_currency")]
    pub currency: String,
    /// Gateway status code; `"2"` is a completed payment.
    pub status_code: String,
    /// Layered hash signature over the notification fields.
    pub md5sig: String,
    /// Payer id, passed through from the initiation request.
    #[serde(rename = "custom_1")]
    pub payer_id: String,
    /// Parking area id, passed through from the initiation request.
    #[serde(rename = "custom_2")]
    pub parking_area_id: String,
    /// Gateway's own payment id.
    #[serde(default)]
    pub payment_id: String,
    /// Masked card number.
    #[serde(rename = "card_no", default)]
    pub card_number: String,
    /// Cardholder name.
    #[serde(rename = "card_holder_name", default)]
    pub card_holder: String,
    /// Card expiry in `MM/YY` format, or empty.
    #[serde(rename = "card_exp", default)]
    pub card_expiry: String,
}

impl GatewayNotification {
    /// Parse a notification from a form-encoded request body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the body is not valid form encoding or
    /// a required field is missing.
    pub fn from_form(body: &str) -> Result<Self> {
        serde_urlencoded::from_str(body)
            .map_err(|e| Error::validation("notification", e.to_string()))
    }

    /// Split the card expiry on its literal `/` separator.
    ///
    /// An absent expiry yields two empty strings rather than an omission; a
    /// malformed one keeps whatever came before the separator as the month.
    #[must_use]
    pub fn split_card_expiry(&self) -> (String, String) {
        if self.card_expiry.is_empty() {
            return (String::new(), String::new());
        }
        match self.card_expiry.split_once('/') {
            Some((month, year)) => (month.to_string(), year.to_string()),
            None => (self.card_expiry.clone(), String::new()),
        }
    }
}

/// Narrow seam to the parking-area subsystem.
///
/// The only mutation this crate performs on a parking area is attaching the
/// ledger record of a verified subscription payment.
#[async_trait]
pub trait ParkingAreaDirectory: Send + Sync {
    /// Attach an active subscription payment to a parking area.
    ///
    /// Implementations may fail with any error kind; the processor rewraps
    /// whatever comes back as [`Error::Activation`] so callers can always
    /// tell an attachment failure apart from a ledger fault.
    async fn attach_subscription(&self, parking_area_id: &str, payment_record_id: Uuid)
        -> Result<()>;
}

/// Terminal outcome of processing one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Signature verified; a SUCCESS record exists for the order.
    Accepted {
        /// The SUCCESS record (newly created, or pre-existing on replay).
        record_id: Uuid,
        /// True when this delivery was a replay of a recorded order.
        duplicate: bool,
    },
    /// Verification failed; a FAILED record was written.
    Rejected {
        /// The FAILED record for this delivery.
        record_id: Uuid,
    },
}

impl NotificationOutcome {
    /// Whether the notification was accepted.
    #[must_use]
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The ledger record this outcome refers to.
    #[must_use]
    pub fn record_id(&self) -> Uuid {
        match self {
            Self::Accepted { record_id, .. } | Self::Rejected { record_id } => *record_id,
        }
    }
}

/// Orchestrates signature verification, ledger writes, and parking-area
/// activation for inbound gateway notifications.
pub struct NotificationProcessor {
    engine: SignatureEngine,
    gateway: GatewayKind,
    store: Arc<dyn LedgerStore>,
    areas: Arc<dyn ParkingAreaDirectory>,
    store_timeout: Duration,
}

impl NotificationProcessor {
    /// Create a processor from billing configuration and collaborators.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the gateway credentials are invalid.
    pub fn new(
        config: &BillingConfig,
        store: Arc<dyn LedgerStore>,
        areas: Arc<dyn ParkingAreaDirectory>,
    ) -> Result<Self> {
        Ok(Self {
            engine: SignatureEngine::new(&config.gateway)?,
            gateway: config.gateway.gateway,
            store,
            areas,
            store_timeout: config.store_timeout(),
        })
    }

    /// The signature engine, for issuing outbound initiation hashes.
    #[must_use]
    pub fn engine(&self) -> &SignatureEngine {
        &self.engine
    }

    /// Process one inbound notification end-to-end.
    ///
    /// A verified notification persists a SUCCESS record and attaches it to
    /// the parking area; a failed verification persists a FAILED record and
    /// attaches nothing. Both are `Ok` outcomes; `Err` is reserved for store
    /// and collaborator faults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` if the ledger write fails or times out,
    /// and `Error::Activation` if the parking-area attachment fails after
    /// the SUCCESS record was written.
    pub async fn process(&self, notification: &GatewayNotification) -> Result<NotificationOutcome> {
        let verified = self.engine.verify_notification(
            &notification.order_id,
            &notification.amount,
            &notification.currency,
            &notification.status_code,
            &notification.md5sig,
        );

        if !verified {
            return self.record_failure(notification).await;
        }

        // Replayed delivery of an order we already recorded: answer success
        // without a second record or a second attachment.
        if let Some(existing) = self
            .timed(
                self.store
                    .find_successful(self.gateway, &notification.order_id),
            )
            .await?
        {
            info!(
                "Duplicate notification for order {}; keeping record {}",
                notification.order_id, existing.id
            );
            return Ok(NotificationOutcome::Accepted {
                record_id: existing.id,
                duplicate: true,
            });
        }

        let subscription_start = Utc::now();
        let subscription_end = subscription_start + Months::new(12);
        let record = self.build_record(
            notification,
            PaymentStatus::Success,
            Some(subscription_start),
            Some(subscription_end),
        );
        let record_id = record.id;

        // The store enforces SUCCESS uniqueness on (gateway, reference)
        // atomically; losing an insert race to a concurrent delivery of the
        // same order is answered like any other replay.
        if let Err(insert_err) = self.timed(self.store.insert(record)).await {
            if let Some(existing) = self
                .timed(
                    self.store
                        .find_successful(self.gateway, &notification.order_id),
                )
                .await?
            {
                info!(
                    "Concurrent delivery for order {}; keeping record {}",
                    notification.order_id, existing.id
                );
                return Ok(NotificationOutcome::Accepted {
                    record_id: existing.id,
                    duplicate: true,
                });
            }
            return Err(insert_err);
        }

        // Activation is awaited before success is reported. The SUCCESS
        // record is already written at this point; a failure here surfaces
        // as Activation, never Persistence, so the caller knows the payment
        // is recorded and only the area attachment needs repair.
        self.areas
            .attach_subscription(&notification.parking_area_id, record_id)
            .await
            .map_err(|e| match e {
                Error::Activation(_) => e,
                other => Error::Activation(other.to_string()),
            })?;

        info!(
            "Verified payment {} for order {}; record {record_id} attached to area {}",
            notification.payment_id, notification.order_id, notification.parking_area_id
        );
        Ok(NotificationOutcome::Accepted {
            record_id,
            duplicate: false,
        })
    }

    /// Persist the FAILED record for an unverified notification.
    async fn record_failure(
        &self,
        notification: &GatewayNotification,
    ) -> Result<NotificationOutcome> {
        let record = self.build_record(notification, PaymentStatus::Failed, None, None);
        let record_id = record.id;
        self.timed(self.store.insert(record)).await?;

        warn!(
            "Rejected notification for order {}; recorded failure {record_id}",
            notification.order_id
        );
        Ok(NotificationOutcome::Rejected { record_id })
    }

    fn build_record(
        &self,
        notification: &GatewayNotification,
        status: PaymentStatus,
        subscription_start: Option<chrono::DateTime<Utc>>,
        subscription_end: Option<chrono::DateTime<Utc>>,
    ) -> PaymentLedgerRecord {
        let (expiry_month, expiry_year) = notification.split_card_expiry();
        debug!(
            "Building {status:?} record for order {}",
            notification.order_id
        );
        PaymentLedgerRecord {
            id: Uuid::new_v4(),
            payer_id: notification.payer_id.clone(),
            parking_area_id: notification.parking_area_id.clone(),
            amount: notification.amount.clone(),
            status,
            method: PaymentMethod::Card,
            gateway: Some(self.gateway),
            reference: notification.order_id.clone(),
            details: PaymentDetails::Card {
                number: notification.card_number.clone(),
                holder: notification.card_holder.clone(),
                expiry_month,
                expiry_year,
            },
            subscription_start,
            subscription_end,
            created_at: Utc::now(),
            deleted: false,
        }
    }

    /// Run a store call under the configured timeout.
    async fn timed<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| Error::Persistence("store call timed out".to_string()))?
    }
}
