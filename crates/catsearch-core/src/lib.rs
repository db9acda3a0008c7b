//! catsearch-core - Core types and traits for the catalog search engine
//!
//! This crate provides the foundational types, traits, and error handling
//! used throughout the catsearch system.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{Result, SearchError};
pub use traits::*;
pub use types::*;
