//! End-to-end billing flow tests.
//!
//! Drives the full subscription path: quote a fee, issue the initiation
//! hash, then play back the gateway's asynchronous notification and check
//! the ledger and parking-area activation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Months, NaiveDate};
use md5::{Digest, Md5};
use parkbill::{
    BillingConfig, FeeCalculator, FeeScheduleStore, GatewayConfig, GatewayNotification,
    InMemoryLedger, LedgerFilter, LedgerStore, NewFeeSchedule, NotificationProcessor,
    ParkingAreaDirectory, PaymentStatus, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

const MERCHANT_ID: &str = "1211149";
const SECRET: &str = "sandbox-secret-001";

/// Parking-area collaborator double that records activations.
#[derive(Default)]
struct Areas {
    activated: Mutex<Vec<(String, Uuid)>>,
}

#[async_trait::async_trait]
impl ParkingAreaDirectory for Areas {
    async fn attach_subscription(&self, parking_area_id: &str, payment_record_id: Uuid) -> Result<()> {
        self.activated
            .lock()
            .push((parking_area_id.to_string(), payment_record_id));
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Sign a notification body the way the gateway does.
fn gateway_signature(order_id: &str, amount: &str, status_code: &str) -> String {
    let hashed_secret = hex::encode_upper(Md5::digest(SECRET.as_bytes()));
    let payload = format!("{MERCHANT_ID}{order_id}{amount}LKR{status_code}{hashed_secret}");
    hex::encode_upper(Md5::digest(payload.as_bytes()))
}

#[tokio::test]
async fn test_quote_initiate_notify_activate() {
    // Fee setup: one class, one schedule covering today.
    let schedules = Arc::new(FeeScheduleStore::new());
    let car = schedules.add_class("car").expect("add class");
    schedules
        .add_schedule(NewFeeSchedule {
            vehicle_class_id: car,
            effective_from: date(2000, 1, 1),
            effective_to: date(2099, 12, 31),
            tier1_price: 450_000,
            tier2_price: 550_000,
            tier3_price: 650_000,
            tier4_price: 750_000,
        })
        .expect("add schedule");

    let calculator = FeeCalculator::new(schedules);
    let fee = calculator.quote("Car", 120).expect("quote");
    assert_eq!(fee, 550_000); // tier 2: 101..=300
    let amount = format!("{}.{:02}", fee / 100, fee % 100);
    assert_eq!(amount, "5500.00");

    // Billing setup.
    let config = BillingConfig::new(GatewayConfig::new(MERCHANT_ID, SECRET).expect("config"));
    let ledger = Arc::new(InMemoryLedger::new());
    let areas = Arc::new(Areas::default());
    let processor =
        NotificationProcessor::new(&config, ledger.clone(), areas.clone()).expect("processor");

    // Outbound initiation hash for the client redirect.
    let initiation = processor.engine().initiation("SUB-2026-0042", &amount, "LKR");
    assert_eq!(initiation.merchant_id, MERCHANT_ID);
    assert_eq!(initiation.hash.len(), 32);

    // The gateway calls back with a form-encoded notification.
    let md5sig = gateway_signature("SUB-2026-0042", &amount, "2");
    let body = format!(
        "merchant_id={MERCHANT_ID}&order_id=SUB-2026-0042&payhere_amount={amount}\
         &payhere_currency=LKR&status_code=2&md5sig={md5sig}&custom_1=payer-17\
         &custom_2=area-3&payment_id=320041&card_no=************4564\
         &card_holder_name=S+Perera&card_exp=09%2F27"
    );
    let notification = GatewayNotification::from_form(&body).expect("parse");
    let outcome = processor.process(&notification).await.expect("process");
    assert!(outcome.accepted());

    // One SUCCESS record, subscription running one calendar year.
    let records = ledger.list(&LedgerFilter::default()).await.expect("list");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.amount, amount);
    let start = record.subscription_start.expect("start");
    let end = record.subscription_end.expect("end");
    assert_eq!(end, start + Months::new(12));

    // Activation happened exactly once, with this record's id.
    let activated = areas.activated.lock();
    assert_eq!(activated.len(), 1);
    assert_eq!(activated[0], ("area-3".to_string(), record.id));
}

#[tokio::test]
async fn test_forged_notification_leaves_area_untouched() {
    let config = BillingConfig::new(GatewayConfig::new(MERCHANT_ID, SECRET).expect("config"));
    let ledger = Arc::new(InMemoryLedger::new());
    let areas = Arc::new(Areas::default());
    let processor =
        NotificationProcessor::new(&config, ledger.clone(), areas.clone()).expect("processor");

    // Signed with the wrong secret.
    let wrong_secret = hex::encode_upper(Md5::digest(b"guessed-secret"));
    let forged_sig = hex::encode_upper(Md5::digest(
        format!("{MERCHANT_ID}SUB-2026-0042{}LKR2{wrong_secret}", "5500.00").as_bytes(),
    ));
    let body = format!(
        "merchant_id={MERCHANT_ID}&order_id=SUB-2026-0042&payhere_amount=5500.00\
         &payhere_currency=LKR&status_code=2&md5sig={forged_sig}&custom_1=payer-17\
         &custom_2=area-3&payment_id=320041"
    );
    let notification = GatewayNotification::from_form(&body).expect("parse");
    let outcome = processor.process(&notification).await.expect("process");
    assert!(!outcome.accepted());

    let records = ledger.list(&LedgerFilter::default()).await.expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, PaymentStatus::Failed);
    assert!(areas.activated.lock().is_empty());
}

#[tokio::test]
async fn test_replayed_notification_activates_once() {
    let config = BillingConfig::new(GatewayConfig::new(MERCHANT_ID, SECRET).expect("config"));
    let ledger = Arc::new(InMemoryLedger::new());
    let areas = Arc::new(Areas::default());
    let processor =
        NotificationProcessor::new(&config, ledger.clone(), areas.clone()).expect("processor");

    let md5sig = gateway_signature("SUB-2026-0042", "5500.00", "2");
    let body = format!(
        "merchant_id={MERCHANT_ID}&order_id=SUB-2026-0042&payhere_amount=5500.00\
         &payhere_currency=LKR&status_code=2&md5sig={md5sig}&custom_1=payer-17\
         &custom_2=area-3&payment_id=320041"
    );
    let notification = GatewayNotification::from_form(&body).expect("parse");

    let first = processor.process(&notification).await.expect("process");
    let replay = processor.process(&notification).await.expect("process");

    assert!(first.accepted());
    assert!(replay.accepted());
    assert_eq!(replay.record_id(), first.record_id());

    let records = ledger.list(&LedgerFilter::default()).await.expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(areas.activated.lock().len(), 1);
}
