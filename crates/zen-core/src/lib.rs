pub mod config;
pub mod error;

pub use config::ZenConfig;
pub use error::{Result, ZenError};
