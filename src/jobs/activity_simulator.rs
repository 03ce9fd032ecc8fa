//! Backfills plausible walking and cycling history for every user.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::config::{ACTIVITY_BACKFILL_START, STEPS_PER_KM};
use crate::domain::{ActivityLog, ActivityType, NewActivity};
use crate::errors::{AppError, AppResult};
use crate::infra::{ActivityRepository, UserRepository};

/// Fills each user's history from the day after their last log through
/// `until`.
pub struct ActivitySimulator {
    users: Arc<dyn UserRepository>,
    activities: Arc<dyn ActivityRepository>,
}

impl ActivitySimulator {
    pub fn new(users: Arc<dyn UserRepository>, activities: Arc<dyn ActivityRepository>) -> Self {
        Self { users, activities }
    }

    /// Returns the number of logs written.
    pub async fn run(&self, until: NaiveDate) -> AppResult<usize> {
        let mut rng = StdRng::from_entropy();
        let mut written = 0;

        for user in self.users.list().await? {
            let from = match self.activities.last_logged_date(user.id).await? {
                Some(last) => last + Duration::days(1),
                None => backfill_start()?,
            };

            for day in days_between(from, until) {
                for entry in simulate_day(day, &mut rng) {
                    let log = ActivityLog::record(user.id, entry)?;
                    match self.activities.insert(log).await {
                        Ok(_) => written += 1,
                        Err(AppError::Conflict(msg)) => tracing::debug!("{}", msg),
                        Err(e) => return Err(e),
                    }
                }
            }
            tracing::debug!(user = %user.email, "Activity backfilled");
        }

        tracing::info!(logs = written, "Activity simulator finished");
        Ok(written)
    }
}

fn backfill_start() -> AppResult<NaiveDate> {
    let (y, m, d) = ACTIVITY_BACKFILL_START;
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| AppError::internal("invalid backfill start"))
}

fn days_between(from: NaiveDate, until: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= until)
}

/// A walk every day and, half the time, a ride.
pub fn simulate_day<R: Rng + ?Sized>(day: NaiveDate, rng: &mut R) -> Vec<NewActivity> {
    let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
    let steps: i32 = if weekend {
        rng.gen_range(8000..=13000)
    } else {
        rng.gen_range(4000..=10000)
    };

    let mut entries = vec![NewActivity {
        activity_date: day,
        activity_type: ActivityType::Walking,
        steps: Some(steps),
        distance_km: Decimal::from_f64_retain(f64::from(steps) / STEPS_PER_KM)
            .map(|d| d.round_dp(2)),
    }];

    if rng.gen_bool(0.5) {
        let km: f64 = rng.gen_range(3.5..=20.0);
        entries.push(NewActivity {
            activity_date: day,
            activity_type: ActivityType::Cycling,
            steps: None,
            distance_km: Decimal::from_f64_retain(km).map(|d| d.round_dp(2)),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::infra::{MockActivityRepository, MockUserRepository};
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekend_walks_are_longer() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let saturday = simulate_day(day(2025, 4, 5), &mut rng);
            let steps = saturday[0].steps.unwrap();
            assert!((8000..=13000).contains(&steps));

            let monday = simulate_day(day(2025, 4, 7), &mut rng);
            let steps = monday[0].steps.unwrap();
            assert!((4000..=10000).contains(&steps));
        }
    }

    #[test]
    fn rides_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let rides: Vec<NewActivity> = (0..100)
            .flat_map(|_| simulate_day(day(2025, 4, 8), &mut rng))
            .filter(|e| e.activity_type == ActivityType::Cycling)
            .collect();
        assert!(!rides.is_empty());
        for ride in rides {
            let km = ride.distance_km.unwrap();
            assert!(km >= Decimal::new(35, 1) && km <= Decimal::from(20));
        }
    }

    #[test]
    fn range_is_inclusive_and_empty_when_reversed() {
        assert_eq!(days_between(day(2025, 4, 1), day(2025, 4, 3)).count(), 3);
        assert_eq!(days_between(day(2025, 4, 4), day(2025, 4, 3)).count(), 0);
    }

    #[tokio::test]
    async fn resumes_after_the_last_logged_day() {
        let user = User::new(Uuid::new_v4(), "a@campus.ac.uk".into(), "hash".into(), UserRole::Normal);
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users.expect_list().returning(move || Ok(vec![user.clone()]));

        let mut activities = MockActivityRepository::new();
        activities
            .expect_last_logged_date()
            .with(eq(user_id))
            .returning(|_| Ok(Some(NaiveDate::from_ymd_opt(2025, 4, 8).unwrap())));
        activities
            .expect_insert()
            .withf(|log| log.activity_date == NaiveDate::from_ymd_opt(2025, 4, 9).unwrap())
            .returning(Ok);

        let simulator = ActivitySimulator::new(Arc::new(users), Arc::new(activities));
        let written = simulator.run(day(2025, 4, 9)).await.unwrap();
        assert!((1..=2).contains(&written));
    }

    #[tokio::test]
    async fn nothing_to_do_when_up_to_date() {
        let user = User::new(Uuid::new_v4(), "a@campus.ac.uk".into(), "hash".into(), UserRole::Normal);
        let mut users = MockUserRepository::new();
        users.expect_list().returning(move || Ok(vec![user.clone()]));

        let mut activities = MockActivityRepository::new();
        activities
            .expect_last_logged_date()
            .returning(|_| Ok(Some(NaiveDate::from_ymd_opt(2025, 4, 9).unwrap())));
        activities.expect_insert().never();

        let simulator = ActivitySimulator::new(Arc::new(users), Arc::new(activities));
        assert_eq!(simulator.run(day(2025, 4, 9)).await.unwrap(), 0);
    }
}
