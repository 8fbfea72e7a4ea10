//! # QueryDesk Domain
//!
//! Domain types shared by the QueryDesk API client core.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures
//! - The structured API error shape returned by the backend
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other QueryDesk crates
//! - Only external dependencies allowed
//! - Pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use constants::{UNHANDLED_ERROR_CODE, UNHANDLED_ERROR_MESSAGE};
pub use errors::*;
pub use types::*;
