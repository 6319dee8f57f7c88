/// Factory: build `DpopService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::DpopService;
use crate::services::dpop::DpopPolicy;

pub fn build_dpop_service(config: &Config) -> Arc<DpopService> {
    let policy = DpopPolicy {
        freshness_window_seconds: config.dpop_freshness_window_seconds,
        clock_skew_seconds: config.dpop_clock_skew_seconds,
    };

    Arc::new(DpopService::in_memory(
        policy,
        config.public_base_url.clone(),
    ))
}
