//! Shared test utilities for the overlay layer workspace.
//!
//! This crate provides:
//! - [`RecordingRenderer`], an in-memory map renderer that records every call
//! - [`FakeTransport`], canned JSON responses with request capture
//! - Layer and feature fixtures, plus paths to the shipped catalog
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Use it only from integration tests under `tests/`. A crate's own unit
//! tests would see a second copy of its types.

pub mod fixtures;
pub mod paths;
pub mod renderer;
pub mod transport;

pub use fixtures::*;
pub use paths::*;
pub use renderer::RecordingRenderer;
pub use transport::FakeTransport;
