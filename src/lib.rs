//! Turnstile - Per-Client Request Admission Gate
//!
//! This crate implements an in-memory request-rate governor for HTTP
//! services: each distinct client is admitted at most once per fixed
//! interval, and excess requests are rejected with a 429 response. State is
//! process-local; there is no shared store and no cross-instance
//! coordination.

pub mod admission;
pub mod config;
pub mod error;
pub mod http;
