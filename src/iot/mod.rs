//! Simulated campus metering: building catalogue, sensor bus, reading
//! generator and the ingest worker that stores readings.

pub mod bus;
mod catalog;
mod ingest;
mod simulator;

pub use bus::{BusMessage, SensorBus};
pub use catalog::{AccommodationBuilding, BuildingCatalog, Meter, UniversityBuilding};
pub use ingest::{SensorIngest, Subscriptions};
pub use simulator::{generate_reading, SensorSimulator};
