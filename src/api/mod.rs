//! HTTP surface: auth, inventory and offers, rewards, energy charts.
//!
//! Handlers stay thin and delegate to the service traits held in
//! [`AppState`]; JWT checks and the auth rate limit live in `middleware`.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
