//! # VRoom Common Library
//!
//! Shared code for the VRoom crates:
//! - Error type
//! - Bootstrap configuration loading and resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
