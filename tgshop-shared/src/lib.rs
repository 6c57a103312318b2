//! # tgshop Shared Library
//!
//! Data model, store access and transactional business rules used by the
//! tgshop API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, migrations and the unit-of-work wrapper
//! - `models`: one module per table with its queries
//! - `referral`: referral code generation
//! - `services`: multi-row operations that must commit atomically

pub mod db;
pub mod models;
pub mod referral;
pub mod services;

/// Current version of the tgshop shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
