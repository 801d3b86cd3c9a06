pub mod filing;
pub mod index;
pub mod xbrl;

pub use index::IndexRecord;
pub use xbrl::{Fact, XbrlInstance};
