//! Router-level middleware.
//!
//! - `http`: transport concerns applied to every route
//! - `dpop`: proof-of-possession check for protected `/api/v1/*` routes

pub mod dpop;
pub mod http;
