//! Application state shared by handlers.

mod state;

pub use state::ServiceState;
