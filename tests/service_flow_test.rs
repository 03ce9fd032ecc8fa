//! End-to-end service flows over the in-memory Unit of Work.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use common::{MemoryUnitOfWork, RecordingMailer};
use green_campus::config::Config;
use green_campus::domain::{
    ActivityType, ChartRequest, EnergyCategory, EnergyTypeFilter, NewActivity, NewProduct,
    PricingEngine, SensorPayload, UserRole,
};
use green_campus::errors::AppError;
use green_campus::services::{
    today, AuthService, Authenticator, EnergyAnalytics, EnergyService, InventoryManager,
    InventoryService, RewardsManager, RewardsService,
};

fn fixture() -> (Arc<MemoryUnitOfWork>, Arc<RecordingMailer>) {
    (Arc::new(MemoryUnitOfWork::default()), Arc::new(RecordingMailer::default()))
}

#[tokio::test]
async fn signup_requires_verification_before_login() {
    let (uow, mailer) = fixture();
    let auth = Authenticator::new(uow.clone(), mailer.clone(), Config::for_testing());

    let user = assert_ok!(
        auth.signup("Student@Campus.ac.uk".into(), "correct-horse-1".into(), UserRole::Normal)
            .await
    );
    assert!(!user.verified);
    assert_eq!(user.email, "student@campus.ac.uk");

    let mail = mailer.sent_to("student@campus.ac.uk");
    assert_eq!(mail.len(), 1);
    assert!(mail[0].text.starts_with("Your signup code is"));

    let err = assert_err!(auth.login("student@campus.ac.uk".into(), "correct-horse-1".into()).await);
    assert!(matches!(err, AppError::EmailNotVerified));

    let err = assert_err!(auth.verify_email("student@campus.ac.uk", "000000x").await);
    assert!(matches!(err, AppError::Validation(_)));

    let code = user.otp.as_ref().map(|o| o.code().to_string()).unwrap();
    let verified = assert_ok!(auth.verify_email("student@campus.ac.uk", &code).await);
    assert!(verified.verified);
    assert!(verified.otp.is_none());

    let token = assert_ok!(auth.login("student@campus.ac.uk".into(), "correct-horse-1".into()).await);
    let claims = assert_ok!(auth.verify_token(&token.access_token));
    assert_eq!(claims.sub, user.id);
}

#[tokio::test]
async fn duplicate_email_and_bad_password_are_rejected() {
    let (uow, mailer) = fixture();
    let auth = Authenticator::new(uow, mailer, Config::for_testing());

    assert_ok!(auth.signup("a@campus.ac.uk".into(), "long-enough-1".into(), UserRole::Vendor).await);
    let err = assert_err!(auth.signup("A@campus.ac.uk".into(), "long-enough-1".into(), UserRole::Normal).await);
    assert!(matches!(err, AppError::Conflict(_)));

    let err = assert_err!(auth.login("a@campus.ac.uk".into(), "wrong-password".into()).await);
    assert!(matches!(err, AppError::InvalidCredentials));

    let err = assert_err!(auth.signup("b@campus.ac.uk".into(), "long-enough-1".into(), UserRole::Admin).await);
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn listing_applies_tiered_discount_and_tops_up_by_name() {
    let (uow, _) = fixture();
    let inventory = InventoryManager::new(uow.clone(), PricingEngine::default());
    let vendor = Uuid::new_v4();

    let listing = || NewProduct {
        name: "Greek Yoghurt".into(),
        category: "dairy".into(),
        expiry_date: today() + Duration::days(1),
        units: 4,
        marked_price: dec!(8.00),
        discount: Some(dec!(50)),
        location: "Library Cafe".into(),
    };

    let product = assert_ok!(inventory.add_product(vendor, listing()).await);
    assert_eq!(product.final_price, dec!(1.00));

    let topped_up = assert_ok!(inventory.add_product(vendor, listing()).await);
    assert_eq!(topped_up.id, product.id);
    assert_eq!(topped_up.units, 8);

    let expiring = assert_ok!(inventory.expiring(1).await);
    assert_eq!(expiring.len(), 1);

    let other_vendor = Uuid::new_v4();
    let err = assert_err!(inventory.delete_product(other_vendor, UserRole::Vendor, product.id).await);
    assert!(matches!(err, AppError::Forbidden | AppError::NotFound));
    assert_ok!(inventory.delete_product(vendor, UserRole::Vendor, product.id).await);
}

#[tokio::test]
async fn implausible_activity_earns_nothing() {
    let (uow, mailer) = fixture();
    let rewards = RewardsManager::new(uow.clone(), mailer.clone());
    let user = Uuid::new_v4();

    let err = assert_err!(
        rewards
            .log_activity(
                user,
                NewActivity {
                    activity_date: today() + Duration::days(365),
                    activity_type: ActivityType::Walking,
                    steps: Some(5000),
                    distance_km: None,
                },
            )
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));

    let err = assert_err!(
        rewards
            .log_activity(
                user,
                NewActivity {
                    activity_date: today(),
                    activity_type: ActivityType::Cycling,
                    steps: None,
                    distance_km: Some(dec!(100000000)),
                },
            )
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));

    assert!(assert_ok!(rewards.list_activities(user).await).is_empty());
}

#[tokio::test]
async fn redemption_spends_points_once_and_vouchers_claim_once() {
    let (uow, mailer) = fixture();
    let auth = Authenticator::new(uow.clone(), mailer.clone(), Config::for_testing());
    let rewards = RewardsManager::new(uow.clone(), mailer.clone());

    let user = assert_ok!(auth.signup("rider@campus.ac.uk".into(), "long-enough-1".into(), UserRole::Normal).await);

    assert_ok!(
        rewards
            .log_activity(
                user.id,
                NewActivity {
                    activity_date: today() - Duration::days(1),
                    activity_type: ActivityType::Cycling,
                    steps: None,
                    distance_km: Some(dec!(160)),
                },
            )
            .await
    );
    assert_eq!(assert_ok!(rewards.balance(user.id).await).total, dec!(80));

    let voucher = assert_ok!(rewards.redeem(user.id, 60).await);
    assert_eq!(voucher.remaining.total, dec!(20));
    assert_eq!(voucher.redemption.voucher_code.len(), 8);
    assert_eq!(mailer.sent_to("rider@campus.ac.uk").len(), 2);

    let err = assert_err!(rewards.redeem(user.id, 30).await);
    assert!(matches!(err, AppError::InsufficientPoints { requested: 30, .. }));

    let vendor = Uuid::new_v4();
    let code = voucher.redemption.voucher_code.clone();
    let claimed = assert_ok!(rewards.claim_voucher(vendor, &code).await);
    assert_eq!(claimed.claimed_by, Some(vendor));

    let err = assert_err!(rewards.claim_voucher(vendor, &code).await);
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn ingested_readings_show_up_as_building_traces() {
    let (uow, _) = fixture();
    let energy = EnergyAnalytics::new(uow);
    let now = Utc::now();

    let reading = |value| SensorPayload {
        timestamp: now - Duration::hours(1),
        building: "Main Library".into(),
        building_code: "LIB".into(),
        zone: "Central".into(),
        value,
    };
    let stored = assert_ok!(
        energy
            .ingest(vec![
                (EnergyCategory::Electricity, reading(410.0)),
                (EnergyCategory::Gas, reading(31.5)),
            ])
            .await
    );
    assert_eq!(stored, 2);

    let chart = assert_ok!(
        energy
            .usage_traces(ChartRequest {
                buildings: vec!["Main Library".into(), "Nowhere".into()],
                energy_type: EnergyTypeFilter::Electricity,
                start_date: None,
                end_date: None,
            })
            .await
    );
    assert_eq!(chart.traces.len(), 1);
    assert_eq!(chart.traces[0].name, "Main Library - Electricity");
    assert_eq!(chart.traces[0].y, vec![410.0]);
}
