pub mod memory;
pub mod store;

pub use memory::InMemoryReplayStore;
pub use store::ReplayStore;
