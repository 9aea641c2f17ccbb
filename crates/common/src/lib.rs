pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use error::{Result, TriageError};
pub use ids::*;
