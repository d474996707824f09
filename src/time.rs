pub mod instant;
pub mod zone;

use chrono::{DateTime, FixedOffset};

pub use instant::Instant;
pub use zone::Zone;

pub type DTF = DateTime<FixedOffset>;
