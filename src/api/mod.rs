/*
 * Responsibility
 * - Versioned HTTP API modules
 */
pub mod v1;
