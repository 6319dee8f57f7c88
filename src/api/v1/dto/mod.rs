pub mod registration;
pub mod secure;
