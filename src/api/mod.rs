//! HTTP access to the remote configuration endpoints.

mod client;

pub use client::ConfigClient;
