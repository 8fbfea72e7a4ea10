//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of common traits
//! - Time control is re-exported from [`crate::time`]
//!
//! ## Usage
//!
//! ```rust
//! use querydesk_common::testing::{MockClock, MockTokenGrantClient};
//!
//! let clock = MockClock::new();
//! clock.advance(std::time::Duration::from_secs(5));
//!
//! let grants = MockTokenGrantClient::new();
//! assert_eq!(grants.call_count(), 0);
//! ```

pub mod mocks;

pub use mocks::MockTokenGrantClient;

pub use crate::time::{Clock, MockClock, SystemClock};
