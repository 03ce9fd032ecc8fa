//! Rewards service - activity logging, the eco-points balance, voucher
//! redemption and the personal dashboard.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::try_join;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::activity::{electricity_units, split_series};
use crate::domain::ledger::voucher_code;
use crate::domain::pricing::round_money;
use crate::domain::{
    ActivityLog, ActivityType, CyclingPoint, DailyAverage, EcoPoints, Ledger, NewActivity,
    Redemption, VoucherResponse, WalkingPoint,
};
use super::today;
use crate::errors::{AppResult, OptionExt};
use crate::infra::{DayAverage, EmailMessage, Mailer, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Everything the rewards page plots.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RewardsDashboard {
    pub walking: Vec<WalkingPoint>,
    pub cycling: Vec<CyclingPoint>,
    /// Campus-wide per-day averages
    pub averages: Vec<DailyAverage>,
    pub eco_points: EcoPoints,
    pub days_since_signup: i64,
    /// Electricity units the balance is equivalent to
    #[schema(value_type = String)]
    pub electricity_units: Decimal,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RewardsService: Send + Sync {
    async fn log_activity(&self, user_id: Uuid, entry: NewActivity) -> AppResult<ActivityLog>;

    async fn list_activities(&self, user_id: Uuid) -> AppResult<Vec<ActivityLog>>;

    /// Current balance and its pound value.
    async fn balance(&self, user_id: Uuid) -> AppResult<EcoPoints>;

    /// Spend `points` on a voucher and email it to the user.
    async fn redeem(&self, user_id: Uuid, points: i64) -> AppResult<VoucherResponse>;

    async fn list_redemptions(&self, user_id: Uuid) -> AppResult<Vec<Redemption>>;

    /// Mark a voucher as used at a vendor's counter.
    async fn claim_voucher(&self, vendor_id: Uuid, code: &str) -> AppResult<Redemption>;

    async fn dashboard(&self, user_id: Uuid) -> AppResult<RewardsDashboard>;
}

/// Rebuild a user's ledger from their logs and earlier redemptions.
pub(crate) fn ledger_from(logs: &[ActivityLog], redemptions: &[Redemption]) -> Ledger {
    Ledger::new(logs, redemptions.iter().flat_map(|r| r.debits.iter()))
}

/// Merge the walking and cycling averages into one row per day.
fn merge_averages(walking: Vec<DayAverage>, cycling: Vec<DayAverage>) -> Vec<DailyAverage> {
    let mut days: BTreeMap<NaiveDate, DailyAverage> = BTreeMap::new();
    let row = |date| DailyAverage {
        date,
        steps: Decimal::ZERO,
        distance_km: Decimal::ZERO,
    };
    for avg in walking {
        days.entry(avg.activity_date).or_insert_with(|| row(avg.activity_date)).steps =
            round_money(avg.average.unwrap_or_default());
    }
    for avg in cycling {
        days.entry(avg.activity_date)
            .or_insert_with(|| row(avg.activity_date))
            .distance_km = round_money(avg.average.unwrap_or_default());
    }
    days.into_values().collect()
}

fn voucher_email(to: &str, redemption: &Redemption) -> EmailMessage {
    let html = format!(
        "<div style=\"font-family:Arial, sans-serif; padding: 20px;\">\
         <h2>Eco Points Voucher</h2>\
         <p>Hello {to},</p>\
         <p>You have successfully redeemed <strong>{points} Eco Points</strong>.</p>\
         <p>This equals <strong>£{value:.2}</strong> in rewards.</p>\
         <p>Voucher code: <strong>{code}</strong></p>\
         <p style=\"font-size: 0.9em; color: #666;\">Present this voucher at participating \
         partners before {expires}. It is valid for one-time use only.</p>\
         </div>",
        to = to,
        points = redemption.points,
        value = redemption.value,
        code = redemption.voucher_code,
        expires = redemption.expires_at.format("%Y-%m-%d"),
    );
    EmailMessage::text(
        to,
        "Your Eco Points Voucher is Here!",
        format!(
            "Redeemed {} points.\n{}",
            redemption.points,
            redemption.qr_payload()
        ),
    )
    .with_html(html)
}

pub struct RewardsManager<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
}

impl<U: UnitOfWork> RewardsManager<U> {
    pub fn new(uow: Arc<U>, mailer: Arc<dyn Mailer>) -> Self {
        Self { uow, mailer }
    }

    async fn ledger(&self, user_id: Uuid) -> AppResult<Ledger> {
        let (activities, rewards) = (self.uow.activities(), self.uow.rewards());
        let (logs, redemptions) = try_join!(
            activities.list_for_user(user_id),
            rewards.list_for_user(user_id),
        )?;
        Ok(ledger_from(&logs, &redemptions))
    }

    async fn daily_averages(&self) -> AppResult<Vec<DailyAverage>> {
        let activities = self.uow.activities();
        let (walking, cycling) = try_join!(
            activities.daily_averages(ActivityType::Walking),
            activities.daily_averages(ActivityType::Cycling),
        )?;
        Ok(merge_averages(walking, cycling))
    }
}

#[async_trait]
impl<U: UnitOfWork> RewardsService for RewardsManager<U> {
    async fn log_activity(&self, user_id: Uuid, entry: NewActivity) -> AppResult<ActivityLog> {
        entry.ensure_not_after(today())?;
        let log = ActivityLog::record(user_id, entry)?;
        let log = self.uow.activities().insert(log).await?;
        tracing::debug!(user_id = %user_id, points = %log.eco_points, "Logged activity");
        Ok(log)
    }

    async fn list_activities(&self, user_id: Uuid) -> AppResult<Vec<ActivityLog>> {
        self.uow.activities().list_for_user(user_id).await
    }

    async fn balance(&self, user_id: Uuid) -> AppResult<EcoPoints> {
        Ok(EcoPoints::from_ledger(&self.ledger(user_id).await?))
    }

    async fn redeem(&self, user_id: Uuid, points: i64) -> AppResult<VoucherResponse> {
        let user = self.uow.users().find_by_id(user_id).await?.ok_or_not_found()?;

        let redemption = self
            .uow
            .redeem(
                user_id,
                Box::new(move |ledger: &Ledger| {
                    let debits = ledger.plan_redemption(points)?;
                    let code = voucher_code(&mut rand::thread_rng());
                    Ok(Redemption::issue(user_id, points, debits, code))
                }),
            )
            .await?;
        tracing::info!(user_id = %user_id, points, code = %redemption.voucher_code, "Redeemed eco points");

        // Committed already; a failed mail is logged, not surfaced.
        if let Err(e) = self.mailer.send(voucher_email(&user.email, &redemption)).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to email voucher");
        }

        let remaining = self.balance(user_id).await?;
        Ok(VoucherResponse {
            qr_payload: redemption.qr_payload(),
            redemption,
            remaining,
        })
    }

    async fn list_redemptions(&self, user_id: Uuid) -> AppResult<Vec<Redemption>> {
        self.uow.rewards().list_for_user(user_id).await
    }

    async fn claim_voucher(&self, vendor_id: Uuid, code: &str) -> AppResult<Redemption> {
        let rewards = self.uow.rewards();
        let mut redemption = rewards.find_by_code(code).await?.ok_or_not_found()?;
        redemption.claim(vendor_id, Utc::now())?;
        rewards.mark_claimed(&redemption).await?;
        tracing::info!(code = %redemption.voucher_code, vendor_id = %vendor_id, "Voucher claimed");
        Ok(redemption)
    }

    async fn dashboard(&self, user_id: Uuid) -> AppResult<RewardsDashboard> {
        let (users, activities, rewards) =
            (self.uow.users(), self.uow.activities(), self.uow.rewards());
        let (user, logs, redemptions, averages) = try_join!(
            users.find_by_id(user_id),
            activities.list_for_user(user_id),
            rewards.list_for_user(user_id),
            self.daily_averages(),
        )?;
        let user = user.ok_or_not_found()?;

        let eco_points = EcoPoints::from_ledger(&ledger_from(&logs, &redemptions));
        let (walking, cycling) = split_series(&logs);
        Ok(RewardsDashboard {
            walking,
            cycling,
            averages,
            electricity_units: electricity_units(eco_points.total),
            eco_points,
            days_since_signup: user.days_since_signup(Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::errors::AppError;
    use crate::infra::{MockMailer, MockRewardRepository, MockUnitOfWork, RewardRepository};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn averages_merge_by_day() {
        let walking = vec![
            DayAverage { activity_date: day(1), average: Some(dec!(6500.333)) },
            DayAverage { activity_date: day(2), average: Some(dec!(7000)) },
        ];
        let cycling = vec![DayAverage { activity_date: day(2), average: Some(dec!(12.25)) }];

        let merged = merge_averages(walking, cycling);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].steps, dec!(6500.33));
        assert_eq!(merged[0].distance_km, Decimal::ZERO);
        assert_eq!(merged[1].distance_km, dec!(12.25));
    }

    #[test]
    fn voucher_email_carries_the_payload() {
        let r = Redemption::issue(Uuid::nil(), 60, vec![], "AB12CD34".into());
        let mail = voucher_email("u@campus.ac.uk", &r);
        assert_eq!(mail.subject, "Your Eco Points Voucher is Here!");
        assert!(mail.text.starts_with("Redeemed 60 points."));
        assert!(mail.text.contains("60 Eco Points = £1.20 | Code: AB12CD34"));
        assert!(mail.html.unwrap().contains("AB12CD34"));
    }

    #[tokio::test]
    async fn double_claim_is_a_conflict() {
        let mut issued = Redemption::issue(Uuid::new_v4(), 20, vec![], "ZZZZ9999".into());
        issued.claim(Uuid::new_v4(), Utc::now()).unwrap();

        let mut rewards = MockRewardRepository::new();
        rewards
            .expect_find_by_code()
            .returning(move |_| Ok(Some(issued.clone())));
        rewards.expect_mark_claimed().never();
        let rewards: Arc<dyn RewardRepository> = Arc::new(rewards);
        let mut uow = MockUnitOfWork::new();
        uow.expect_rewards().returning(move || rewards.clone());

        let svc = RewardsManager::new(Arc::new(uow), Arc::new(MockMailer::new()));
        let err = svc.claim_voucher(Uuid::new_v4(), "zzzz9999").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn redeem_for_unknown_user_is_not_found() {
        let mut users = crate::infra::MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None::<User>));
        let users: Arc<dyn crate::infra::UserRepository> = Arc::new(users);
        let mut uow = MockUnitOfWork::new();
        uow.expect_users().returning(move || users.clone());
        uow.expect_redeem().never();

        let svc = RewardsManager::new(Arc::new(uow), Arc::new(MockMailer::new()));
        assert!(matches!(svc.redeem(Uuid::new_v4(), 10).await, Err(AppError::NotFound)));
    }
}
