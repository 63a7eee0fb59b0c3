//! Fixed-window request limiting.
//!
//! Counters live in a shared store so every API instance sees the same
//! window. The per-tenant rule is a coarse availability guard and knows
//! nothing about users or identities.

mod config;
mod ports;
mod service;

pub use config::{RateLimitDecision, RateLimitRule, TENANT_REQUEST_WINDOW_SECONDS};
pub use ports::{AttemptInfo, RateLimitRepository};
pub use service::RateLimitService;

#[cfg(test)]
mod tests;
