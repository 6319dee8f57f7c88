pub mod clock;
pub mod dpop;
pub mod dpop_service;
pub mod factory;
pub mod registry;
pub mod replay;

pub use dpop_service::DpopService;
pub use factory::build_dpop_service;
