pub mod price_sample;
pub mod log_entry;
pub mod report;

pub use price_sample::*;
pub use log_entry::*;
pub use report::*;
