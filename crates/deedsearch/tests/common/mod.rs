//! Shared test utilities for deedsearch integration tests.
//!
//! This module provides:
//! - `FakeApi`, a scripted in-memory backend that records every call
//! - `TestHarness`, wiring the fake backend, stores and notifier together
//! - Builders for records, search responses and saved groups

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{drain, Call, FakeApi, TestHarness};
