/*
 * Responsibility
 * - Crate root: expose the DPoP core (services) and the HTTP surface (api/app)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
