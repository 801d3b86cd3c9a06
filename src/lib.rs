pub mod config;
pub mod edgar;
pub mod persist;
pub mod utils;

// Re-exports
pub use config::Config;
pub use edgar::xbrl::{Fact, XbrlError, XbrlInstance};
pub use persist::{load_attributes, FactSink, LoadStats, MemorySink};
