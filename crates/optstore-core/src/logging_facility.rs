//! Structured logging facility for optstore
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! ```rust
//! use optstore_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! The option store owns lifecycle events for its public operations.
//! Engines log internal details at `debug` only.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
