//! Settings read from the environment plus fixed business constants
//! (pricing bands, eco-point rates, simulator ranges).

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
