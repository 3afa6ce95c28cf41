//! Shared test utilities for lingocast integration tests.
//!
//! - `TestHarness`: a pipeline on an in-memory store with fake collaborators
//! - `fakes`: counting test doubles for OCR and both external services
//! - `fixtures`: PDFs built in memory with lopdf
//! - `http_stub`: a one-shot HTTP responder for adapter tests

pub mod fakes;
pub mod fixtures;
pub mod harness;
pub mod http_stub;

pub use harness::TestHarness;
