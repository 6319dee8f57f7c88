mod dpop_ctx;

pub use dpop_ctx::{DpopCtx, DpopCtxExtractor};
