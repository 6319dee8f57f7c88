/*!
 * Verified DPoP context extractor
 *
 * Responsibility:
 * - Hand the verified (client id, claims) pair to handlers
 * - The type lives in `types`, the axum glue in `core`
 */

mod core;
mod types;

pub use core::DpopCtxExtractor;
pub use types::DpopCtx;
