//! HTTP request handlers.

pub mod account_handler;
pub mod auth_handler;
pub mod energy_handler;
pub mod product_handler;
pub mod rewards_handler;

pub use account_handler::account_routes;
pub use auth_handler::auth_routes;
pub use energy_handler::energy_routes;
pub use product_handler::{offer_routes, product_routes};
pub use rewards_handler::{activity_routes, rewards_routes};
