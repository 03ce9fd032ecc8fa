//! Tiered discount pricing.
//!
//! A product's final price is its marked price scaled by a discount rate
//! raised to a power that grows as expiry approaches:
//!
//! | expiry          | final price        |
//! |-----------------|--------------------|
//! | <= today + 1    | marked * rate^3    |
//! | <= today + 2    | marked * rate^2    |
//! | <= today + 3    | marked * rate      |
//! | later           | marked             |
//!
//! With an explicit discount percentage `d`, `rate = 1 - d/100`. Without
//! one, the rate comes from the category band according to
//! [`FallbackDiscount`].

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::product::Category;
use crate::errors::{AppError, AppResult};

/// How the rate is chosen when a product carries no explicit discount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FallbackDiscount {
    /// Draw uniformly from the category band on every pricing call.
    Random,
    /// Use the centre of the category band. Deterministic.
    #[default]
    Midpoint,
    /// Rate 1: no markdown without an explicit discount.
    None,
}

impl std::str::FromStr for FallbackDiscount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "midpoint" => Ok(Self::Midpoint),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown discount fallback '{}', expected random, midpoint or none",
                other
            )),
        }
    }
}

/// Inputs the pricing function depends on.
#[derive(Debug, Clone, Copy)]
pub struct PriceInput {
    pub category: Category,
    pub marked_price: Decimal,
    /// Percentage 0-100
    pub discount: Option<Decimal>,
    pub expiry_date: NaiveDate,
}

/// Stateless pricing engine parameterised by the fallback policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine {
    fallback: FallbackDiscount,
}

impl PricingEngine {
    pub fn new(fallback: FallbackDiscount) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> FallbackDiscount {
        self.fallback
    }

    /// Price with the thread-local RNG. `None` means no tier applies.
    pub fn price(&self, input: &PriceInput, today: NaiveDate) -> AppResult<Option<Decimal>> {
        self.price_with(input, today, &mut rand::thread_rng())
    }

    pub fn price_with<R: Rng + ?Sized>(
        &self,
        input: &PriceInput,
        today: NaiveDate,
        rng: &mut R,
    ) -> AppResult<Option<Decimal>> {
        if input.marked_price.is_sign_negative() {
            return Err(AppError::validation("Marked price cannot be negative"));
        }

        let Some(exponent) = expiry_tier(input.expiry_date, today) else {
            return Ok(None);
        };

        let rate = self.discount_rate(input.category, input.discount, rng)?;
        let factor = (0..exponent).fold(Decimal::ONE, |acc, _| acc * rate);
        Ok(Some(round_money(input.marked_price * factor)))
    }

    /// Final price for storage: the tiered price, or the marked price when
    /// the product is outside the discount window.
    pub fn final_price(&self, input: &PriceInput, today: NaiveDate) -> AppResult<Decimal> {
        Ok(self
            .price(input, today)?
            .unwrap_or_else(|| round_money(input.marked_price)))
    }

    fn discount_rate<R: Rng + ?Sized>(
        &self,
        category: Category,
        discount: Option<Decimal>,
        rng: &mut R,
    ) -> AppResult<Decimal> {
        if let Some(pct) = discount {
            if pct < Decimal::ZERO || pct > dec!(100) {
                return Err(AppError::validation("Discount must be between 0 and 100"));
            }
            return Ok(Decimal::ONE - pct / dec!(100));
        }

        let [high, low] = category.band();
        let rate = match self.fallback {
            FallbackDiscount::None => Decimal::ONE,
            FallbackDiscount::Midpoint => Decimal::from(high + low) / dec!(200),
            FallbackDiscount::Random => {
                // Basis points keep the draw exact in decimal.
                let bp = rng.gen_range(low * 100..=high * 100);
                Decimal::new(i64::from(bp), 4)
            }
        };
        Ok(rate)
    }
}

/// Exponent applied to the rate for a product expiring on `expiry`.
pub fn expiry_tier(expiry: NaiveDate, today: NaiveDate) -> Option<u32> {
    match (expiry - today).num_days() {
        d if d <= 1 => Some(3),
        2 => Some(2),
        3 => Some(1),
        _ => None,
    }
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn input(days: i64, discount: Option<Decimal>) -> PriceInput {
        PriceInput {
            category: Category::Dairy,
            marked_price: dec!(4.00),
            discount,
            expiry_date: today() + Duration::days(days),
        }
    }

    #[test]
    fn fifty_percent_expiring_tomorrow_is_cubed() {
        let engine = PricingEngine::default();
        let price = engine.price(&input(1, Some(dec!(50))), today()).unwrap();
        assert_eq!(price, Some(dec!(4.00) * dec!(0.125)));
    }

    #[test]
    fn tiers_follow_days_to_expiry() {
        let engine = PricingEngine::default();
        let d = Some(dec!(50));
        assert_eq!(engine.price(&input(2, d), today()).unwrap(), Some(dec!(1.00)));
        assert_eq!(engine.price(&input(3, d), today()).unwrap(), Some(dec!(2.00)));
        assert_eq!(engine.price(&input(4, d), today()).unwrap(), None);
    }

    #[test]
    fn already_expired_gets_steepest_tier() {
        let engine = PricingEngine::default();
        let price = engine.price(&input(-2, Some(dec!(50))), today()).unwrap();
        assert_eq!(price, Some(dec!(0.50)));
    }

    #[test]
    fn midpoint_fallback_is_deterministic() {
        let engine = PricingEngine::new(FallbackDiscount::Midpoint);
        // Dairy band [80, 40] -> 0.6, tomorrow -> 0.216
        let a = engine.price(&input(1, None), today()).unwrap();
        let b = engine.price(&input(1, None), today()).unwrap();
        assert_eq!(a, Some(dec!(0.86)));
        assert_eq!(a, b);
    }

    #[test]
    fn none_fallback_keeps_marked_price() {
        let engine = PricingEngine::new(FallbackDiscount::None);
        assert_eq!(engine.price(&input(1, None), today()).unwrap(), Some(dec!(4.00)));
    }

    #[test]
    fn random_fallback_stays_inside_band() {
        let engine = PricingEngine::new(FallbackDiscount::Random);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let price = engine
                .price_with(&input(3, None), today(), &mut rng)
                .unwrap()
                .unwrap();
            assert!(price >= dec!(1.60) && price <= dec!(3.20), "{}", price);
        }
    }

    #[test]
    fn negative_marked_price_is_rejected() {
        let mut bad = input(1, Some(dec!(10)));
        bad.marked_price = dec!(-1);
        let err = PricingEngine::default().price(&bad, today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn out_of_range_discount_is_rejected() {
        let err = PricingEngine::default()
            .price(&input(1, Some(dec!(120))), today())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn final_price_falls_back_to_marked() {
        let engine = PricingEngine::default();
        assert_eq!(engine.final_price(&input(10, None), today()).unwrap(), dec!(4.00));
    }

    #[test]
    fn fallback_parses_from_env_strings() {
        assert_eq!("Random".parse(), Ok(FallbackDiscount::Random));
        assert_eq!("none".parse(), Ok(FallbackDiscount::None));
        assert!("sometimes".parse::<FallbackDiscount>().is_err());
    }
}
