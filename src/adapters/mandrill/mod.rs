//! Mandrill transactional email integration
//!
//! Messages are posted to `messages/send.json` with the API key in the body.
//! The response is either an array of per-recipient results or an error
//! document `{status, code, name, message}`.

pub mod client;
pub mod models;

pub use client::MandrillClient;
