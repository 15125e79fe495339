//! Gatekeeper - Multi-Window Admission Controller
//!
//! This crate decides whether a caller may hit an AI-backed endpoint. Each
//! subject is held to a per-endpoint cooldown, a per-endpoint hourly cap and
//! a daily cap shared across endpoints. State is in-memory and per-process.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
