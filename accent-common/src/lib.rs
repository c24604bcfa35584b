//! # Accent Common Library
//!
//! Shared code for the accent identification service:
//! - Error types
//! - Bootstrap configuration loading

pub mod config;
pub mod error;

pub use error::{Error, Result};
