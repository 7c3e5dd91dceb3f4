//! API middleware components

pub mod logging;

pub use logging::logging_middleware;
pub(crate) use logging::route_path;
