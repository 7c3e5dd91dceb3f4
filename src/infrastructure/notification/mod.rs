//! Activation notifier implementations
//!
//! The activation link points at a front-end page, not at the API. Mail clients open links with
//! GET, while `/api/1.0/users/token/{token}` only accepts POST, so the page reads the token from
//! its last path segment and submits it.

mod log;
mod smtp;

#[cfg(test)]
pub mod mock;

pub use log::LogNotifier;
pub use smtp::{SmtpConfig, SmtpNotifier};

/// Append the token to the activation page URL as its last path segment
pub fn activation_link(activation_url: &str, token: &str) -> String {
    format!("{}/{}", activation_url.trim_end_matches('/'), token)
}
