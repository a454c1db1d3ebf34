use anyhow::Result;

pub mod config;
pub mod delay;
pub mod error;
pub mod priority;
pub mod processor;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::IncidentError;
pub use processor::IncidentProcessor;
pub use types::{IncidentEvent, IncidentResponse, Payload};

pub const APP_NAME: &str = "busbreakdown";

pub fn set_up_logger(calling_module: &str, verbose: bool) -> Result<()> {
    jluszcz_rust_utils::set_up_logger(APP_NAME, calling_module, verbose)
}
