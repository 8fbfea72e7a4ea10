//! Observability infrastructure
//!
//! Structured logging through `tracing`. Library code only emits events;
//! binaries call [`init_logging`] once at startup to install a subscriber.

pub mod logging;

pub use logging::init_logging;
