//! wa-cloud: WhatsApp Business Cloud API client
//!
//! A library for talking to the Graph API with retries, backoff and
//! client-side rate limiting, plus verification and decoding of the
//! webhook deliveries the platform sends back.

pub mod client;
pub mod config;
pub mod time;
pub mod transport;
pub mod webhook;
