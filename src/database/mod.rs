pub mod connection;
pub mod migrations;
pub mod price_store;

pub use connection::*;
pub use migrations::*;
pub use price_store::*;
