//! Crate-agnostic primitives shared by the pipeline engine and the sample
//! host binary: duration (de)serialization, tracing/logging bootstrap, a
//! small borrow-or-own helper, and build metadata.

pub mod bow;
pub mod duration;
pub mod metrics;
pub mod telemetry;
pub mod version;

pub use bow::OwnedOrBorrowed;
