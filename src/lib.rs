//! # parkbill
//!
//! Subscription billing and payment-notification verification for the
//! ParkBill parking back office.
//!
//! This crate is the billing subsystem only. It provides:
//! - Tiered subscription fee quoting over versioned per-class fee schedules
//! - Outbound payment-initiation hashes for the third-party gateway
//! - Verification of inbound asynchronous payment notifications against the
//!   gateway's layered hash signature
//! - A payment ledger with a small per-record state machine
//!
//! City/district reference data, vehicle CRUD, image storage, authentication
//! and all UI live elsewhere and are reached only through narrow data
//! contracts (a parking-area id, a stored file reference).
//!
//! ## Example
//!
//! ```rust,no_run
//! use parkbill::{
//!     BillingConfig, GatewayConfig, GatewayNotification, InMemoryLedger,
//!     NotificationProcessor, ParkingAreaDirectory,
//! };
//! use std::sync::Arc;
//!
//! # struct Areas;
//! # #[async_trait::async_trait]
//! # impl ParkingAreaDirectory for Areas {
//! #     async fn attach_subscription(&self, _: &str, _: uuid::Uuid) -> parkbill::Result<()> {
//! #         Ok(())
//! #     }
//! # }
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BillingConfig::new(GatewayConfig::from_env()?);
//!     let processor = NotificationProcessor::new(
//!         &config,
//!         Arc::new(InMemoryLedger::new()),
//!         Arc::new(Areas),
//!     )?;
//!
//!     let notification = GatewayNotification::from_form("...")?;
//!     let outcome = processor.process(&notification).await?;
//!     println!("accepted: {}", outcome.accepted());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod notification;
pub mod signature;

pub use config::{BillingConfig, GatewayConfig, GatewayKind};
pub use error::{Error, Result};
pub use fees::{FeeCalculator, FeeSchedule, FeeScheduleStore, NewFeeSchedule, Tier, VehicleClass};
pub use ledger::{
    BankTransferSubmission, InMemoryLedger, LedgerFilter, LedgerManager, LedgerStore, LedgerUpdate,
    PaymentDetails, PaymentLedgerRecord, PaymentMethod, PaymentStatus,
};
pub use notification::{
    GatewayNotification, NotificationOutcome, NotificationProcessor, ParkingAreaDirectory,
};
pub use signature::{InitiationResponse, SignatureEngine, SUCCESS_STATUS_CODE};
