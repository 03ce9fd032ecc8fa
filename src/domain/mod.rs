//! Domain layer - Core business entities and logic
//!
//! Pure types and calculations: pricing, the eco-points ledger, energy
//! chart shaping. Nothing here touches the database or the network.

pub mod activity;
pub mod energy;
pub mod ledger;
pub mod otp;
pub mod password;
pub mod pricing;
pub mod product;
pub mod user;

pub use activity::{ActivityLog, ActivityType, CyclingPoint, DailyAverage, NewActivity, WalkingPoint};
pub use energy::{
    Building, ChartRequest, ChartResponse, EnergyCategory, EnergyDashboard, EnergyReading,
    EnergyTypeFilter, LabelledSeries, SensorPayload, Trace,
};
pub use ledger::{Debit, EcoPoints, Ledger, Redemption, VoucherResponse};
pub use otp::OneTimeCode;
pub use password::Password;
pub use pricing::{FallbackDiscount, PriceInput, PricingEngine};
pub use product::{Category, CategoryOffers, NewProduct, Product, ProductPatch};
pub use user::{AccountResponse, User, UserResponse, UserRole};
