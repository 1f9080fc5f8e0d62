//! # Coach Common Library
//!
//! Shared code for the coaching services:
//! - Error types
//! - Configuration model and layered resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
