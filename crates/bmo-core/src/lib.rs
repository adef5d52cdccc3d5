//! Shared configuration and error types for the BMO conversation backend.

pub mod config;
pub mod error;

pub use config::BmoConfig;
pub use error::{BmoError, Result};
