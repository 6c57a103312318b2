//! # tgshop API Server Library
//!
//! Request router and transaction handler for the tgshop storefront.
//!
//! ## Modules
//!
//! - `app`: Application state and axum router builder
//! - `config`: Configuration management
//! - `error`: Error taxonomy and its HTTP mapping
//! - `handler`: Transport-neutral request router (`ApiRequest` → `ApiResponse`)
//! - `identity`: Trusted caller identity taken from `X-User-Id`
//! - `response`: Uniform JSON + CORS response envelope
//! - `routes`: One module per operation

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod identity;
pub mod response;
pub mod routes;
