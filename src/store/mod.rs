pub mod scan_store;
pub mod tally;

pub use scan_store::{now_timestamp, ScanData, ScanStore};
pub use tally::Tallies;
