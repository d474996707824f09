pub mod config;
pub mod container;
pub mod factory;
pub mod storage;
pub mod time;

pub use container::DateContainer;
pub use factory::{DateContainerFactory, Granularity};
pub use storage::errors::ErrorType;
pub use storage::{DateStorage, StoreResult};
pub use time::{Instant, Zone};
