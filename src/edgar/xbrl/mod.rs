//! The XBRL fact-extraction engine.
//!
//! Parses one instance document, resolves its context graph and yields a
//! normalized stream of facts ready for idempotent persistence. Pure
//! computation over already-resident bytes: nothing here performs I/O or
//! persists anything.

pub mod context;
pub mod error;
pub mod facts;
pub mod instance;

pub use error::{Result, XbrlError};
pub use facts::{Fact, DEFAULT_NAMESPACE, MAX_VALUE_DIGITS};
pub use instance::{XbrlInstance, DEI_PREFIX, XBRL_INSTANCE_NS};
