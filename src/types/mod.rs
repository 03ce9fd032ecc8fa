//! Response shapes shared by handlers.

mod response;

pub use response::{MessageResponse, NoContent};
