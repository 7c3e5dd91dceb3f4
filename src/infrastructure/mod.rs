//! Infrastructure layer - External service implementations

pub mod account;
pub mod logging;
pub mod notification;
pub mod storage;
