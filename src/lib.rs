pub mod config;
pub mod error;
pub mod db;
pub mod remote;
pub mod scan;

pub use config::Config;
pub use error::{SpmapError, Result};
pub use scan::{scan_to_store, ScanOptions, ScanSnapshot};
