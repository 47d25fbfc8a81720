pub mod config;
pub mod counted_set;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use counted_set::CountedSet;
pub use error::SidelineError;
pub use types::*;
