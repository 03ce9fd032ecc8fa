//! Eco-points ledger.
//!
//! Accruals are activity logs and are never rewritten. A redemption is its
//! own entry carrying the per-log debits that funded it, chosen oldest
//! first. The balance is total accrued minus total debited.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::activity::{points_value, ActivityLog};
use crate::config::{MIN_REDEMPTION_POINTS, VOUCHER_CODE_LENGTH, VOUCHER_VALIDITY_DAYS};
use crate::errors::{AppError, AppResult};

const VOUCHER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Points taken from one activity log by a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Debit {
    pub log_id: Uuid,
    #[schema(value_type = String)]
    pub points: Decimal,
}

#[derive(Debug, Clone)]
struct Entry {
    log_id: Uuid,
    date: NaiveDate,
    created_at: DateTime<Utc>,
    remaining: Decimal,
}

/// A user's accruals with the debits already taken against them.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<Entry>,
    accrued: Decimal,
    debited: Decimal,
}

impl Ledger {
    pub fn new<'a>(
        logs: impl IntoIterator<Item = &'a ActivityLog>,
        prior_debits: impl IntoIterator<Item = &'a Debit>,
    ) -> Self {
        let mut taken: HashMap<Uuid, Decimal> = HashMap::new();
        let mut debited = Decimal::ZERO;
        for debit in prior_debits {
            *taken.entry(debit.log_id).or_default() += debit.points;
            debited += debit.points;
        }

        let mut accrued = Decimal::ZERO;
        let mut entries: Vec<Entry> = logs
            .into_iter()
            .map(|log| {
                accrued += log.eco_points;
                let used = taken.get(&log.id).copied().unwrap_or_default();
                Entry {
                    log_id: log.id,
                    date: log.activity_date,
                    created_at: log.created_at,
                    remaining: (log.eco_points - used).max(Decimal::ZERO),
                }
            })
            .collect();
        entries.sort_by_key(|e| (e.date, e.created_at));

        Self {
            entries,
            accrued,
            debited,
        }
    }

    pub fn balance(&self) -> Decimal {
        (self.accrued - self.debited).max(Decimal::ZERO)
    }

    /// Choose the debits for redeeming `requested` points, oldest log first.
    pub fn plan_redemption(&self, requested: i64) -> AppResult<Vec<Debit>> {
        if requested < MIN_REDEMPTION_POINTS {
            return Err(AppError::validation(format!(
                "At least {} points must be redeemed",
                MIN_REDEMPTION_POINTS
            )));
        }
        let balance = self.balance();
        let mut outstanding = Decimal::from(requested);
        if outstanding > balance {
            return Err(AppError::InsufficientPoints {
                requested,
                available: balance,
            });
        }

        let mut debits = Vec::new();
        for entry in &self.entries {
            if outstanding.is_zero() {
                break;
            }
            if entry.remaining <= Decimal::ZERO {
                continue;
            }
            let take = entry.remaining.min(outstanding);
            outstanding -= take;
            debits.push(Debit {
                log_id: entry.log_id,
                points: take,
            });
        }

        if !outstanding.is_zero() {
            // Balance and per-log remainders disagree; refuse rather than under-debit.
            return Err(AppError::internal(format!(
                "ledger inconsistent: {} points unallocated",
                outstanding
            )));
        }
        Ok(debits)
    }
}

/// A redemption entry and the voucher it issued.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Redemption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    #[schema(value_type = String)]
    pub value: Decimal,
    pub voucher_code: String,
    pub debits: Vec<Debit>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<Uuid>,
}

impl Redemption {
    pub fn issue(user_id: Uuid, points: i64, debits: Vec<Debit>, code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            points,
            value: points_value(Decimal::from(points)),
            voucher_code: code,
            debits,
            issued_at: now,
            expires_at: now + Duration::days(VOUCHER_VALIDITY_DAYS),
            claimed_at: None,
            claimed_by: None,
        }
    }

    /// Text encoded into the voucher QR code.
    pub fn qr_payload(&self) -> String {
        format!(
            "{} Eco Points = £{:.2} | Code: {}",
            self.points, self.value, self.voucher_code
        )
    }

    /// Mark the voucher as used. A voucher can be claimed once.
    pub fn claim(&mut self, by: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        if self.claimed_at.is_some() {
            return Err(AppError::conflict("Voucher has already been claimed"));
        }
        if now > self.expires_at {
            return Err(AppError::validation("Voucher has expired"));
        }
        self.claimed_at = Some(now);
        self.claimed_by = Some(by);
        Ok(())
    }
}

/// Random voucher code of uppercase letters and digits.
pub fn voucher_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..VOUCHER_CODE_LENGTH)
        .map(|_| char::from(VOUCHER_ALPHABET[rng.gen_range(0..VOUCHER_ALPHABET.len())]))
        .collect()
}

/// Balance summary returned by the rewards endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EcoPoints {
    #[schema(value_type = String)]
    pub total: Decimal,
    #[schema(value_type = String)]
    pub value: Decimal,
}

impl EcoPoints {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let total = ledger.balance();
        Self {
            total,
            value: points_value(total),
        }
    }
}

/// Voucher details returned after a redemption.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoucherResponse {
    pub redemption: Redemption,
    pub qr_payload: String,
    pub remaining: EcoPoints,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activity::ActivityType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn log(day: u32, points: Decimal) -> ActivityLog {
        ActivityLog {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            activity_date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            activity_type: ActivityType::Walking,
            steps: Some(0),
            distance_km: None,
            eco_points: points,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balance_sums_accruals() {
        let logs = vec![log(1, dec!(60)), log(2, dec!(40))];
        let ledger = Ledger::new(&logs, &[]);
        let summary = EcoPoints::from_ledger(&ledger);
        assert_eq!(summary.total, dec!(100));
        assert_eq!(summary.value, dec!(2.00));
    }

    #[test]
    fn redeeming_sixty_of_eighty_leaves_twenty() {
        let logs = vec![log(2, dec!(30)), log(1, dec!(50))];
        let ledger = Ledger::new(&logs, &[]);

        let debits = ledger.plan_redemption(60).unwrap();
        assert_eq!(debits.len(), 2);
        assert_eq!(debits[0], Debit { log_id: logs[1].id, points: dec!(50) });
        assert_eq!(debits[1], Debit { log_id: logs[0].id, points: dec!(10) });

        let after = Ledger::new(&logs, &debits);
        assert_eq!(after.balance(), dec!(20));
    }

    #[test]
    fn later_redemptions_skip_consumed_logs() {
        let logs = vec![log(1, dec!(50)), log(2, dec!(30))];
        let first = Ledger::new(&logs, &[]).plan_redemption(50).unwrap();
        let second = Ledger::new(&logs, &first).plan_redemption(20).unwrap();
        assert_eq!(second, vec![Debit { log_id: logs[1].id, points: dec!(20) }]);
    }

    #[test]
    fn redemption_bounds_are_enforced() {
        let logs = vec![log(1, dec!(25))];
        let ledger = Ledger::new(&logs, &[]);
        assert!(matches!(ledger.plan_redemption(9), Err(AppError::Validation(_))));
        assert!(matches!(
            ledger.plan_redemption(26),
            Err(AppError::InsufficientPoints { requested: 26, .. })
        ));
        assert!(ledger.plan_redemption(25).is_ok());
    }

    #[test]
    fn voucher_codes_are_uppercase_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(42);
        let code = voucher_code(&mut rng);
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn qr_payload_names_points_value_and_code() {
        let r = Redemption::issue(Uuid::nil(), 60, vec![], "AB12CD34".into());
        assert_eq!(r.qr_payload(), "60 Eco Points = £1.20 | Code: AB12CD34");
    }

    #[test]
    fn vouchers_claim_once() {
        let mut r = Redemption::issue(Uuid::nil(), 10, vec![], "ZZZZ9999".into());
        let vendor = Uuid::new_v4();
        r.claim(vendor, Utc::now()).unwrap();
        assert!(matches!(r.claim(vendor, Utc::now()), Err(AppError::Conflict(_))));
    }

    #[test]
    fn expired_vouchers_cannot_be_claimed() {
        let mut r = Redemption::issue(Uuid::nil(), 10, vec![], "ZZZZ9999".into());
        let later = r.expires_at + Duration::seconds(1);
        assert!(matches!(r.claim(Uuid::nil(), later), Err(AppError::Validation(_))));
    }
}
